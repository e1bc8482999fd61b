use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};

use super::ChannelSender;
use crate::{
    error::Error,
    types::{PushMessage, UnifiedPushObject},
};

/// Webhook style delivery: the subscription token is the endpoint URL.
#[derive(Debug)]
pub struct UnifiedPushSender {
    http: Client,
}

impl UnifiedPushSender {
    /// `timeout` bounds the whole request, `connect_timeout` only the dial.
    pub fn new(
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<UnifiedPushSender, Error> {
        let http = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()?;

        Ok(UnifiedPushSender { http })
    }
}

pub(super) fn webhook_body(message: &PushMessage) -> Result<Vec<u8>, Error> {
    match message {
        PushMessage::Notification(payload) => {
            Ok(serde_json::to_vec(&UnifiedPushObject::from(&payload.body))?)
        },
        PushMessage::Test => Ok(b"test".to_vec()),
    }
}

#[async_trait]
impl ChannelSender for UnifiedPushSender {
    async fn send(
        &self,
        message: &PushMessage,
        token: &str,
    ) -> Result<(), Error> {
        let body = webhook_body(message)?;
        let response = self
            .http
            .post(token)
            .header(CONTENT_TYPE, "application/json; charset=UTF-8")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::PushRejected(status.as_u16()));
        }

        Ok(())
    }
}
