use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use sqlx::FromRow;

use crate::types::ChannelType;

/// Placeholder rendered wherever a stored credential would be serialized.
pub const REDACTED_JWT: &str = "**SECRET**";

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: i32,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub channel_type: String,
    pub token: String,
    #[serde(serialize_with = "redact")]
    pub jwt: String,
    pub instance: String,
    pub test: bool,
    pub last_reply_id: Option<i64>,
    pub last_mention_id: Option<i64>,
    pub last_message_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn channel(&self) -> ChannelType {
        ChannelType::from(self.channel_type.as_str())
    }

    pub fn cursors(&self) -> Cursors {
        Cursors {
            reply: self.last_reply_id,
            mention: self.last_mention_id,
            message: self.last_message_id,
        }
    }
}

fn redact<S>(_jwt: &str, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(REDACTED_JWT)
}

/// Per-kind bookmarks of one subscription. `None` means never checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursors {
    pub reply: Option<i64>,
    pub mention: Option<i64>,
    pub message: Option<i64>,
}

/// Fields accepted from the registration layer.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub channel_type: ChannelType,
    pub token: String,
    pub jwt: String,
    pub instance: String,
}
