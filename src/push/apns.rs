use std::{fs, sync::Mutex, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
};

use super::ChannelSender;
use crate::{
    configuration::ApnsConfig,
    error::Error,
    types::{ApnsAps, ApnsBody, Claims, PushMessage},
};

const PRODUCTION_HOST: &str = "https://api.push.apple.com";
const SANDBOX_HOST: &str = "https://api.sandbox.push.apple.com";

/// Apple rejects provider tokens older than an hour.
const TOKEN_REFRESH_SECS: i64 = 50 * 60;
const EXPIRATION_SECS: i64 = 60 * 60;
const TEST_ALERT: &str = "This is a test notification";

struct ProviderToken {
    value: String,
    issued_at: i64,
}

pub struct ApnsSender {
    http: Client,
    host: String,
    config: ApnsConfig,
    key: EncodingKey,
    token: Mutex<Option<ProviderToken>>,
}

impl ApnsSender {
    pub fn new(
        config: ApnsConfig,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<ApnsSender, Error> {
        let pem = fs::read(&config.key_path).with_context(|| {
            format!("could not read APN key {}", config.key_path)
        })?;
        let key = EncodingKey::from_ec_pem(&pem)?;
        let http = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()?;
        let host = if config.production {
            PRODUCTION_HOST
        } else {
            SANDBOX_HOST
        };

        Ok(ApnsSender {
            http,
            host: host.to_owned(),
            config,
            key,
            token: Mutex::new(None),
        })
    }

    #[cfg(test)]
    fn with_host(mut self, host: String) -> ApnsSender {
        self.host = host;
        self
    }

    fn provider_token(&self, now: i64) -> Result<String, Error> {
        let mut cached = self
            .token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(token) = cached.as_ref() {
            if now - token.issued_at < TOKEN_REFRESH_SECS {
                return Ok(token.value.to_owned());
            }
        }

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.config.key_id.to_owned());
        let claims = Claims {
            iss: self.config.team_id.to_owned(),
            iat: now,
        };
        let value = encode(&header, &claims, &self.key)?;

        *cached = Some(ProviderToken {
            value: value.to_owned(),
            issued_at: now,
        });

        Ok(value)
    }
}

pub(super) fn apns_body(message: &PushMessage) -> ApnsBody {
    match message {
        PushMessage::Notification(payload) => ApnsBody {
            aps: ApnsAps {
                alert: payload.alert.to_owned(),
            },
            message: Some(payload.content.to_owned()),
            sender: Some(payload.sender.to_owned()),
        },
        PushMessage::Test => ApnsBody {
            aps: ApnsAps {
                alert: String::from(TEST_ALERT),
            },
            message: None,
            sender: None,
        },
    }
}

#[async_trait]
impl ChannelSender for ApnsSender {
    async fn send(
        &self,
        message: &PushMessage,
        token: &str,
    ) -> Result<(), Error> {
        let now = Utc::now().timestamp();
        let bearer = format!("bearer {}", self.provider_token(now)?);

        let mut header_map = HeaderMap::new();
        let mut authorization = HeaderValue::from_str(&bearer)?;
        authorization.set_sensitive(true);
        header_map.insert(AUTHORIZATION, authorization);
        header_map.insert(
            "apns-topic",
            HeaderValue::from_str(&self.config.bundle_id)?,
        );
        header_map.insert("apns-push-type", HeaderValue::from_static("alert"));
        header_map.insert(
            "apns-expiration",
            HeaderValue::from_str(&(now + EXPIRATION_SECS).to_string())?,
        );

        let url = format!("{}/3/device/{}", self.host, token);
        let response = self
            .http
            .post(url)
            .headers(header_map)
            .json(&apns_body(message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::PushRejected(status.as_u16()));
        }

        Ok(())
    }
}
