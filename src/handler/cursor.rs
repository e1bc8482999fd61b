//! Cursor bookkeeping
//!
//! Decides which unread items are new for one subscription and one item kind,
//! and where that kind's cursor moves to afterwards.
//!
//! Two strategies exist and a store is operated under exactly one of them:
//!
//! * `Identifier` remembers the highest item id seen. Items with an id
//!   strictly greater than the cursor are new. The first check of a kind only
//!   records a baseline so a backlog of unread items is never pushed.
//! * `Timestamp` remembers the wall clock time (epoch milliseconds) of the last
//!   check. Items published strictly after `cursor - skew` are new.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};

use crate::{error::Error, model::Cursors, types::PushPayload};

/// A home server item that can be pushed.
pub trait UnreadItem {
    fn id(&self) -> i64;
    fn published(&self) -> DateTime<Utc>;
    fn normalize(self) -> PushPayload;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Reply,
    Mention,
    Message,
}

impl ItemKind {
    pub fn cursor(self, cursors: &Cursors) -> Option<i64> {
        match self {
            ItemKind::Reply => cursors.reply,
            ItemKind::Mention => cursors.mention,
            ItemKind::Message => cursors.message,
        }
    }

    pub fn set_cursor(self, cursors: &mut Cursors, value: i64) {
        match self {
            ItemKind::Reply => cursors.reply = Some(value),
            ItemKind::Mention => cursors.mention = Some(value),
            ItemKind::Message => cursors.message = Some(value),
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ItemKind::Reply => write!(f, "reply"),
            ItemKind::Mention => write!(f, "mention"),
            ItemKind::Message => write!(f, "message"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStrategy {
    Identifier,
    Timestamp,
}

impl fmt::Display for CursorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CursorStrategy::Identifier => write!(f, "id"),
            CursorStrategy::Timestamp => write!(f, "timestamp"),
        }
    }
}

impl FromStr for CursorStrategy {
    type Err = Error;

    fn from_str(value: &str) -> Result<CursorStrategy, Self::Err> {
        match value.trim() {
            "id" | "identifier" => Ok(CursorStrategy::Identifier),
            "timestamp" => Ok(CursorStrategy::Timestamp),
            other => Err(Error::InvalidOption {
                option: format!(
                    "cursor strategy '{}'. Valid options: id, timestamp",
                    other
                ),
            }),
        }
    }
}

/// Outcome of filtering one page of unread items.
#[derive(Debug)]
pub struct Selection<T> {
    /// Items to push, in the order the server returned them.
    pub items: Vec<T>,
    /// Cursor to persist once the whole subscription check succeeds.
    pub cursor: i64,
    /// The kind was never checked before; nothing must be pushed.
    pub first_check: bool,
}

impl CursorStrategy {
    pub fn select<T: UnreadItem>(
        self,
        cursor: Option<i64>,
        items: Vec<T>,
        skew: Duration,
        now: DateTime<Utc>,
    ) -> Selection<T> {
        match self {
            CursorStrategy::Identifier => select_by_identifier(cursor, items),
            CursorStrategy::Timestamp => {
                select_by_timestamp(cursor, items, skew, now)
            },
        }
    }
}

fn select_by_identifier<T: UnreadItem>(
    cursor: Option<i64>,
    items: Vec<T>,
) -> Selection<T> {
    let newest = items.iter().map(UnreadItem::id).max().unwrap_or(0);

    let Some(last) = cursor else {
        return Selection {
            items: Vec::new(),
            cursor: newest,
            first_check: true,
        };
    };

    Selection {
        items: items.into_iter().filter(|item| item.id() > last).collect(),
        cursor: last.max(newest),
        first_check: false,
    }
}

fn select_by_timestamp<T: UnreadItem>(
    cursor: Option<i64>,
    items: Vec<T>,
    skew: Duration,
    now: DateTime<Utc>,
) -> Selection<T> {
    let now_ms = now.timestamp_millis();
    let last = cursor.unwrap_or(now_ms);
    let lower_bound = last - skew.num_milliseconds();

    Selection {
        items: items
            .into_iter()
            .filter(|item| item.published().timestamp_millis() > lower_bound)
            .collect(),
        cursor: last.max(now_ms),
        first_check: false,
    }
}
