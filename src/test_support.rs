//! In-memory stand-ins for the database, home servers and push channels.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::{
    dao::SubscriptionStore,
    error::Error,
    handler::UnreadItem,
    model::{Cursors, Subscription},
    provider::{HomeServerClient, HomeServerConnector},
    push::ChannelSender,
    types::{
        Comment, CommentReply, CommentReplyView, Community, Person,
        PersonMention, PersonMentionView, Post, PrivateMessage,
        PrivateMessageView, PushBody, PushMessage, PushPayload, SortType,
    },
};

fn created() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn alice() -> Person {
    Person {
        id: 3,
        name: String::from("alice"),
        display_name: Some(String::from("Alice")),
        avatar: None,
        actor_id: String::from("https://a.example/u/alice"),
    }
}

fn bob() -> Person {
    Person {
        id: 2,
        name: String::from("bob"),
        display_name: None,
        avatar: None,
        actor_id: String::from("https://a.example/u/bob"),
    }
}

fn comment(id: i64, content: String, published: DateTime<Utc>) -> Comment {
    Comment {
        id: id as i32,
        creator_id: 3,
        post_id: 9,
        content,
        removed: false,
        deleted: false,
        published,
        ap_id: None,
    }
}

fn post() -> Post {
    Post {
        id: 9,
        name: String::from("A post"),
        community_id: 1,
    }
}

fn community() -> Community {
    Community {
        id: 1,
        name: String::from("rust"),
        title: None,
        actor_id: String::from("https://a.example/c/rust"),
    }
}

pub fn fixture_reply(id: i64, published: DateTime<Utc>) -> CommentReplyView {
    CommentReplyView {
        comment_reply: CommentReply {
            id,
            recipient_id: 2,
            comment_id: id as i32,
            read: false,
            published,
        },
        comment: comment(id, format!("reply {}", id), published),
        creator: alice(),
        post: post(),
        community: community(),
        recipient: bob(),
    }
}

pub fn fixture_mention(id: i64) -> PersonMentionView {
    PersonMentionView {
        person_mention: PersonMention {
            id,
            recipient_id: 2,
            comment_id: id as i32,
            read: false,
            published: created(),
        },
        comment: comment(id, format!("mention {}", id), created()),
        creator: alice(),
        post: post(),
        community: community(),
        recipient: bob(),
    }
}

pub fn fixture_message(id: i64) -> PrivateMessageView {
    PrivateMessageView {
        private_message: PrivateMessage {
            id,
            creator_id: 3,
            recipient_id: 2,
            content: format!("message {}", id),
            deleted: false,
            read: false,
            published: created(),
        },
        creator: alice(),
        recipient: bob(),
    }
}

pub fn test_payload(id: i64) -> PushPayload {
    fixture_reply(id, created()).normalize()
}

pub fn subscription(
    id: i32,
    instance: &str,
    jwt: &str,
    channel_type: &str,
) -> Subscription {
    Subscription {
        id,
        channel_type: channel_type.to_owned(),
        token: format!("token-{}", id),
        jwt: jwt.to_owned(),
        instance: instance.to_owned(),
        test: false,
        last_reply_id: None,
        last_mention_id: None,
        last_message_id: None,
        created_at: created(),
        updated_at: created(),
    }
}

// =============================================================================
// Push channel
// =============================================================================

#[derive(Debug, Clone)]
pub struct SentPush {
    pub token: String,
    pub is_test: bool,
    pub item_id: Option<i64>,
}

#[derive(Debug, Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<SentPush>>,
    failing: bool,
}

impl RecordingSender {
    pub fn new() -> Arc<RecordingSender> {
        Arc::new(RecordingSender::default())
    }

    /// Records every send, then reports it as rejected.
    pub fn failing() -> Arc<RecordingSender> {
        Arc::new(RecordingSender {
            sent: Mutex::new(Vec::new()),
            failing: true,
        })
    }

    pub fn sent(&self) -> Vec<SentPush> {
        self.sent.lock().unwrap().clone()
    }

    pub async fn wait_for(&self, count: usize) -> Vec<SentPush> {
        for _ in 0..200 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {} sends, saw {}", count, self.sent().len());
    }
}

#[async_trait]
impl ChannelSender for RecordingSender {
    async fn send(&self, message: &PushMessage, token: &str) -> Result<(), Error> {
        let item_id = match message {
            PushMessage::Test => None,
            PushMessage::Notification(payload) => Some(match &payload.body {
                PushBody::Reply(reply) => reply.comment_reply_id,
                PushBody::Mention(mention) => mention.person_mention.id,
                PushBody::Message(message) => message.private_message.id,
            }),
        };

        self.sent.lock().unwrap().push(SentPush {
            token: token.to_owned(),
            is_test: matches!(message, PushMessage::Test),
            item_id,
        });

        if self.failing {
            return Err(Error::PushRejected(503));
        }

        Ok(())
    }
}

// =============================================================================
// Subscription store
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Subscription>>,
    listings: Mutex<usize>,
    fail_listing: Mutex<bool>,
}

impl MemoryStore {
    pub fn with(rows: Vec<Subscription>) -> Arc<MemoryStore> {
        Arc::new(MemoryStore {
            rows: Mutex::new(rows),
            ..MemoryStore::default()
        })
    }

    pub fn get(&self, id: i32) -> Subscription {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.id == id)
            .cloned()
            .unwrap()
    }

    pub fn listings(&self) -> usize {
        *self.listings.lock().unwrap()
    }

    pub fn fail_listing(&self) {
        *self.fail_listing.lock().unwrap() = true;
    }

    /// Same effect as a test request arriving through the API.
    pub fn queue_test(&self, id: i32) {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|row| row.id == id) {
            row.test = true;
        }
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<Subscription>, Error> {
        *self.listings.lock().unwrap() += 1;

        if *self.fail_listing.lock().unwrap() {
            return Err(Error::SQL(sqlx::Error::PoolClosed));
        }

        Ok(self.rows.lock().unwrap().clone())
    }

    async fn update_cursors(
        &self,
        id: i32,
        cursors: Cursors,
        test_sent: bool,
    ) -> Result<(), Error> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| Error::NotFound(format!("subscription {}", id)))?;

        row.last_reply_id = cursors.reply;
        row.last_mention_id = cursors.mention;
        row.last_message_id = cursors.message;
        if test_sent {
            row.test = false;
        }
        row.updated_at = Utc::now();

        Ok(())
    }
}

/// Accepts connections and never answers. Returns the `http://` base URL.
pub async fn silent_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            open.push(socket);
        }
    });

    format!("http://{}", address)
}

// =============================================================================
// Home server
// =============================================================================

#[derive(Debug, Default, Clone)]
struct Inbox {
    replies: Vec<CommentReplyView>,
    mentions: Vec<PersonMentionView>,
    messages: Vec<PrivateMessageView>,
    failing: bool,
}

type ConnectHook = Box<dyn Fn(&str, &str) + Send + Sync>;

/// Counts queries running at the same time, per home server and overall.
#[derive(Debug, Default)]
pub struct ConcurrencyGauge {
    active: Mutex<HashMap<String, usize>>,
    peaks: Mutex<HashMap<String, usize>>,
    total_active: AtomicUsize,
    total_peak: AtomicUsize,
}

impl ConcurrencyGauge {
    fn enter(&self, instance: &str) {
        let mut active = self.active.lock().unwrap();
        let count = active.entry(instance.to_owned()).or_default();
        *count += 1;

        let mut peaks = self.peaks.lock().unwrap();
        let peak = peaks.entry(instance.to_owned()).or_default();
        *peak = (*peak).max(*count);

        let total = self.total_active.fetch_add(1, Ordering::SeqCst) + 1;
        self.total_peak.fetch_max(total, Ordering::SeqCst);
    }

    fn leave(&self, instance: &str) {
        if let Some(count) = self.active.lock().unwrap().get_mut(instance) {
            *count -= 1;
        }
        self.total_active.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self, instance: &str) -> usize {
        self.peaks
            .lock()
            .unwrap()
            .get(instance)
            .copied()
            .unwrap_or_default()
    }

    pub fn total_peak(&self) -> usize {
        self.total_peak.load(Ordering::SeqCst)
    }
}

/// Serves one inbox per credential. Unknown credentials have nothing unread.
#[derive(Default)]
pub struct FakeConnector {
    inboxes: Mutex<HashMap<String, Inbox>>,
    connections: Mutex<Vec<(String, String)>>,
    hook: Mutex<Option<ConnectHook>>,
    latency: Mutex<Duration>,
    gauge: Arc<ConcurrencyGauge>,
}

impl FakeConnector {
    pub fn new() -> Arc<FakeConnector> {
        Arc::new(FakeConnector::default())
    }

    fn update(&self, jwt: &str, apply: impl FnOnce(&mut Inbox)) {
        let mut inboxes = self.inboxes.lock().unwrap();
        apply(inboxes.entry(jwt.to_owned()).or_default());
    }

    pub fn set_replies(&self, jwt: &str, replies: Vec<CommentReplyView>) {
        self.update(jwt, |inbox| inbox.replies = replies);
    }

    pub fn set_mentions(&self, jwt: &str, mentions: Vec<PersonMentionView>) {
        self.update(jwt, |inbox| inbox.mentions = mentions);
    }

    pub fn set_messages(&self, jwt: &str, messages: Vec<PrivateMessageView>) {
        self.update(jwt, |inbox| inbox.messages = messages);
    }

    /// Every query made with `jwt` fails as if the server timed out.
    pub fn fail(&self, jwt: &str) {
        self.update(jwt, |inbox| inbox.failing = true);
    }

    /// Runs `hook(instance, jwt)` each time a client is built.
    pub fn on_connect(&self, hook: impl Fn(&str, &str) + Send + Sync + 'static) {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }

    /// Every query waits this long before answering.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn gauge(&self) -> Arc<ConcurrencyGauge> {
        self.gauge.clone()
    }

    pub fn connections(&self) -> Vec<(String, String)> {
        self.connections.lock().unwrap().clone()
    }
}

impl HomeServerConnector for FakeConnector {
    fn connect(
        &self,
        instance: &str,
        jwt: &str,
    ) -> Result<Box<dyn HomeServerClient>, Error> {
        self.connections
            .lock()
            .unwrap()
            .push((instance.to_owned(), jwt.to_owned()));

        if let Some(hook) = self.hook.lock().unwrap().as_ref() {
            hook(instance, jwt);
        }

        let inbox = self
            .inboxes
            .lock()
            .unwrap()
            .get(jwt)
            .cloned()
            .unwrap_or_default();

        Ok(Box::new(FakeClient {
            instance: instance.to_owned(),
            inbox,
            latency: *self.latency.lock().unwrap(),
            gauge: self.gauge.clone(),
        }))
    }
}

struct FakeClient {
    instance: String,
    inbox: Inbox,
    latency: Duration,
    gauge: Arc<ConcurrencyGauge>,
}

impl FakeClient {
    async fn answer<T: Clone>(&self, items: &[T]) -> Result<Vec<T>, Error> {
        if !self.latency.is_zero() {
            self.gauge.enter(&self.instance);
            tokio::time::sleep(self.latency).await;
            self.gauge.leave(&self.instance);
        }

        if self.inbox.failing {
            return Err(Error::HomeServer {
                instance: self.instance.to_owned(),
                status: 504,
            });
        }

        Ok(items.to_vec())
    }
}

#[async_trait]
impl HomeServerClient for FakeClient {
    async fn get_unread_replies(
        &self,
        _limit: i64,
        _sort: SortType,
    ) -> Result<Vec<CommentReplyView>, Error> {
        self.answer(&self.inbox.replies).await
    }

    async fn get_unread_mentions(
        &self,
        _limit: i64,
        _sort: SortType,
    ) -> Result<Vec<PersonMentionView>, Error> {
        self.answer(&self.inbox.mentions).await
    }

    async fn get_unread_private_messages(
        &self,
        _limit: i64,
    ) -> Result<Vec<PrivateMessageView>, Error> {
        self.answer(&self.inbox.messages).await
    }
}
