//! Push notification types
//!
//! Channel tags, the channel-agnostic payload produced by the normalizer, and
//! the wire bodies each channel sends.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::{
    error::Error,
    types::{CommentReplyView, PersonMentionView, PrivateMessageView},
};

// =============================================================================
// Channel Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    Apn,
    UnifiedPush,
    Unsupported,
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChannelType::Apn => write!(f, "apn"),
            ChannelType::UnifiedPush => write!(f, "unifiedPush"),
            ChannelType::Unsupported => write!(f, "unsupported"),
        }
    }
}

impl From<ChannelType> for String {
    fn from(value: ChannelType) -> Self {
        value.to_string()
    }
}

/// Total mapping used for stored rows: unknown tags become `Unsupported`.
impl From<&str> for ChannelType {
    fn from(value: &str) -> Self {
        match value {
            "apn" => ChannelType::Apn,
            "unifiedPush" => ChannelType::UnifiedPush,
            _ => ChannelType::Unsupported,
        }
    }
}

/// Strict parsing used at the registration boundary.
impl FromStr for ChannelType {
    type Err = Error;

    fn from_str(value: &str) -> Result<ChannelType, Self::Err> {
        match ChannelType::from(value) {
            ChannelType::Unsupported => Err(Error::InvalidOption {
                option: format!(
                    "type '{}'. Valid options: apn, unifiedPush",
                    value
                ),
            }),
            channel => Ok(channel),
        }
    }
}

// =============================================================================
// Normalized Payload
// =============================================================================

/// Reply projection forwarded to push providers instead of the full view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlimCommentReplyView {
    pub comment_reply_id: i64,
    pub comment_content: String,
    pub comment_removed: bool,
    pub comment_deleted: bool,
    pub creator_name: String,
    pub creator_actor_id: String,
    pub post_name: String,
    pub community_name: String,
    pub community_actor_id: String,
    pub recipient_name: String,
    pub recipient_actor_id: String,
}

#[derive(Debug, Clone)]
pub enum PushBody {
    Mention(PersonMentionView),
    Reply(SlimCommentReplyView),
    Message(PrivateMessageView),
}

#[derive(Debug, Clone)]
pub struct PushPayload {
    pub alert: String,
    pub content: String,
    pub sender: String,
    pub body: PushBody,
}

/// What a channel sender is asked to deliver.
#[derive(Debug, Clone)]
pub enum PushMessage {
    Notification(PushPayload),
    Test,
}

// =============================================================================
// Wire Bodies
// =============================================================================

/// Webhook body: exactly one of the three keys is present.
#[derive(Debug, Serialize)]
pub struct UnifiedPushObject<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mention: Option<&'a PersonMentionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<&'a SlimCommentReplyView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a PrivateMessageView>,
}

impl<'a> From<&'a PushBody> for UnifiedPushObject<'a> {
    fn from(body: &'a PushBody) -> Self {
        let mut object = UnifiedPushObject {
            mention: None,
            reply: None,
            message: None,
        };

        match body {
            PushBody::Mention(mention) => object.mention = Some(mention),
            PushBody::Reply(reply) => object.reply = Some(reply),
            PushBody::Message(message) => object.message = Some(message),
        }

        object
    }
}

#[derive(Debug, Serialize)]
pub struct ApnsAps {
    pub alert: String,
}

#[derive(Debug, Serialize)]
pub struct ApnsBody {
    pub aps: ApnsAps,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
}

// =============================================================================
// JWT Claims
// =============================================================================

/// APNs provider token claims.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub iat: i64,
}

impl From<CommentReplyView> for SlimCommentReplyView {
    fn from(reply: CommentReplyView) -> Self {
        SlimCommentReplyView {
            comment_reply_id: reply.comment_reply.id,
            comment_content: reply.comment.content,
            comment_removed: reply.comment.removed,
            comment_deleted: reply.comment.deleted,
            creator_name: reply.creator.name,
            creator_actor_id: reply.creator.actor_id,
            post_name: reply.post.name,
            community_name: reply.community.name,
            community_actor_id: reply.community.actor_id,
            recipient_name: reply.recipient.name,
            recipient_actor_id: reply.recipient.actor_id,
        }
    }
}
