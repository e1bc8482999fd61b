//! Home server (Lemmy v3 API) wire types
//!
//! Only the fields the notifier reads or forwards are modelled; anything else
//! the server sends is dropped during deserialization.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// =============================================================================
// Sort
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortType {
    New,
    Old,
}

impl fmt::Display for SortType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SortType::New => write!(f, "New"),
            SortType::Old => write!(f, "Old"),
        }
    }
}

// =============================================================================
// Entities
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    pub actor_id: String,
}

impl Person {
    pub fn shown_name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i32,
    pub creator_id: i32,
    pub post_id: i32,
    pub content: String,
    #[serde(default)]
    pub removed: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(deserialize_with = "published_at")]
    pub published: DateTime<Utc>,
    #[serde(default)]
    pub ap_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i32,
    pub name: String,
    pub community_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    pub actor_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentReply {
    pub id: i64,
    pub recipient_id: i32,
    pub comment_id: i32,
    #[serde(default)]
    pub read: bool,
    #[serde(deserialize_with = "published_at")]
    pub published: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonMention {
    pub id: i64,
    pub recipient_id: i32,
    pub comment_id: i32,
    #[serde(default)]
    pub read: bool,
    #[serde(deserialize_with = "published_at")]
    pub published: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivateMessage {
    pub id: i64,
    pub creator_id: i32,
    pub recipient_id: i32,
    pub content: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub read: bool,
    #[serde(deserialize_with = "published_at")]
    pub published: DateTime<Utc>,
}

// =============================================================================
// Views
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentReplyView {
    pub comment_reply: CommentReply,
    pub comment: Comment,
    pub creator: Person,
    pub post: Post,
    pub community: Community,
    pub recipient: Person,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonMentionView {
    pub person_mention: PersonMention,
    pub comment: Comment,
    pub creator: Person,
    pub post: Post,
    pub community: Community,
    pub recipient: Person,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivateMessageView {
    pub private_message: PrivateMessage,
    pub creator: Person,
    pub recipient: Person,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct GetRepliesResponse {
    pub replies: Vec<CommentReplyView>,
}

#[derive(Debug, Deserialize)]
pub struct GetPersonMentionsResponse {
    pub mentions: Vec<PersonMentionView>,
}

#[derive(Debug, Deserialize)]
pub struct PrivateMessagesResponse {
    pub private_messages: Vec<PrivateMessageView>,
}

/// Older servers publish naive timestamps without an offset; those are UTC.
fn published_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;

    if let Ok(date) = DateTime::parse_from_rfc3339(&value) {
        return Ok(date.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(&value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|date| date.and_utc())
        .map_err(serde::de::Error::custom)
}
