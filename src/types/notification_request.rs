use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{error::Error, model::NewSubscription, types::ChannelType};

#[derive(Debug, Deserialize)]
pub struct NotificationRequest {
    pub r#type: Option<String>,
    pub token: Option<String>,
    pub jwt: Option<String>,
    pub instance: Option<String>,
}

impl NotificationRequest {
    /// All four fields must be present and non-blank.
    pub fn validate(&self) -> Result<NewSubscription, Error> {
        let r#type = required("type", &self.r#type)?;
        let token = required("token", &self.token)?;
        let jwt = required("jwt", &self.jwt)?;
        let instance = required("instance", &self.instance)?;

        Ok(NewSubscription {
            channel_type: ChannelType::from_str(r#type)?,
            token: token.to_owned(),
            jwt: jwt.to_owned(),
            instance: instance.to_lowercase(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteNotificationRequest {
    pub jwts: Option<Vec<String>>,
    pub token: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum DeleteTarget {
    Jwts(Vec<String>),
    Token(String),
}

impl DeleteNotificationRequest {
    /// Exactly one of `jwts` or `token` selects the rows to delete.
    pub fn target(&self) -> Result<DeleteTarget, Error> {
        let jwts: Vec<String> = self
            .jwts
            .iter()
            .flatten()
            .filter(|jwt| !jwt.trim().is_empty())
            .cloned()
            .collect();
        let token = self.token.as_deref().map(str::trim).unwrap_or_default();

        match (jwts.is_empty(), token.is_empty()) {
            (false, true) => Ok(DeleteTarget::Jwts(jwts)),
            (true, false) => Ok(DeleteTarget::Token(token.to_owned())),
            (true, true) => {
                Err(Error::MissingParams(String::from("jwts or token")))
            },
            (false, false) => Err(Error::InvalidOption {
                option: String::from(
                    "only one of jwts or token can be provided",
                ),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TestNotificationRequest {
    pub jwt: Option<String>,
}

impl TestNotificationRequest {
    pub fn validate(&self) -> Result<&str, Error> {
        required("jwt", &self.jwt)
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: &'static str,
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct TestResponse {
    pub queued: bool,
}

fn required<'a>(
    name: &str,
    value: &'a Option<String>,
) -> Result<&'a str, Error> {
    match value.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::MissingParams(name.to_owned())),
    }
}
