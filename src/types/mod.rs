//! Types module
//!
//! Home server wire types, push payloads, and registration request bodies.

mod lemmy;
mod notification_request;
mod push;

pub use lemmy::{
    Comment, CommentReply, CommentReplyView, Community,
    GetPersonMentionsResponse, GetRepliesResponse, Person, PersonMention,
    PersonMentionView, Post, PrivateMessage, PrivateMessageView,
    PrivateMessagesResponse, SortType,
};
pub use notification_request::{
    DeleteNotificationRequest, DeleteResponse, DeleteTarget,
    NotificationRequest, TestNotificationRequest, TestResponse, TokenQuery,
};
pub use push::{
    ApnsAps, ApnsBody, ChannelType, Claims, PushBody, PushMessage,
    PushPayload, SlimCommentReplyView, UnifiedPushObject,
};
