use chrono::{DateTime, Utc};

use super::cursor::UnreadItem;
use crate::types::{
    CommentReplyView, PersonMentionView, PrivateMessageView, PushBody,
    PushPayload, SlimCommentReplyView,
};

impl UnreadItem for CommentReplyView {
    fn id(&self) -> i64 {
        self.comment_reply.id
    }

    fn published(&self) -> DateTime<Utc> {
        self.comment_reply.published
    }

    fn normalize(self) -> PushPayload {
        let content = self.comment.content.to_owned();
        let sender = self.creator.shown_name().to_owned();

        PushPayload {
            alert: String::from("You have a new reply"),
            content,
            sender,
            body: PushBody::Reply(SlimCommentReplyView::from(self)),
        }
    }
}

impl UnreadItem for PersonMentionView {
    fn id(&self) -> i64 {
        self.person_mention.id
    }

    fn published(&self) -> DateTime<Utc> {
        self.person_mention.published
    }

    fn normalize(self) -> PushPayload {
        PushPayload {
            alert: String::from("You were mentioned in a comment"),
            content: self.comment.content.to_owned(),
            sender: self.creator.shown_name().to_owned(),
            body: PushBody::Mention(self),
        }
    }
}

impl UnreadItem for PrivateMessageView {
    fn id(&self) -> i64 {
        self.private_message.id
    }

    fn published(&self) -> DateTime<Utc> {
        self.private_message.published
    }

    fn normalize(self) -> PushPayload {
        let sender = self.creator.shown_name().to_owned();

        PushPayload {
            alert: format!("You have a new message from {}", sender),
            content: self.private_message.content.to_owned(),
            sender,
            body: PushBody::Message(self),
        }
    }
}
