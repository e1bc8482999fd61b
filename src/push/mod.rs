//! Push channel senders and the dispatcher that routes messages to them.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore};
use tracing::{debug, warn};

use crate::{
    configuration::Config,
    error::Error,
    types::{ChannelType, PushMessage},
};

pub use self::{apns::ApnsSender, unified_push::UnifiedPushSender};

mod apns;
mod unified_push;

/// One outbound delivery mechanism.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    async fn send(&self, message: &PushMessage, token: &str)
        -> Result<(), Error>;
}

/// Routes a message to the sender registered for a channel type.
pub struct Dispatcher {
    senders: HashMap<ChannelType, Arc<dyn ChannelSender>>,
    permits: Arc<Semaphore>,
    in_flight: Arc<InFlight>,
}

/// Sends scheduled but not finished yet.
#[derive(Debug, Default)]
pub struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    fn start(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn finish(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("channels", &self.senders.keys().collect::<Vec<_>>())
            .field("available_permits", &self.permits.available_permits())
            .field("in_flight", &self.in_flight.count.load(Ordering::SeqCst))
            .finish()
    }
}

impl Dispatcher {
    pub fn new(max_tasks: usize) -> Dispatcher {
        Dispatcher {
            senders: HashMap::new(),
            permits: Arc::new(Semaphore::new(max_tasks)),
            in_flight: Arc::new(InFlight::default()),
        }
    }

    /// Webhook delivery is always available; APNs only when configured.
    pub fn from_config(config: &Config) -> Result<Dispatcher, Error> {
        let connect_timeout = Duration::from_secs(config.webhook_connect_timeout);
        let timeout = Duration::from_secs(config.push_timeout);
        let unified_push = UnifiedPushSender::new(connect_timeout, timeout)?;
        let mut dispatcher = Dispatcher::new(config.max_push_tasks)
            .with_sender(ChannelType::UnifiedPush, Arc::new(unified_push));

        if let Some(apns) = &config.apns {
            let sender = ApnsSender::new(apns.clone(), connect_timeout, timeout)?;
            dispatcher = dispatcher.with_sender(ChannelType::Apn, Arc::new(sender));
        }

        Ok(dispatcher)
    }

    pub fn with_sender(
        mut self,
        channel: ChannelType,
        sender: Arc<dyn ChannelSender>,
    ) -> Dispatcher {
        if channel != ChannelType::Unsupported {
            self.senders.insert(channel, sender);
        }
        self
    }

    /// Schedules a send and returns immediately. Returns `false` when the
    /// channel has no sender and nothing was scheduled.
    pub fn dispatch(
        &self,
        channel: ChannelType,
        token: &str,
        message: PushMessage,
    ) -> bool {
        let Some(sender) = self.senders.get(&channel) else {
            match channel {
                ChannelType::Unsupported => {
                    warn!("Unsupported channel type, notification dropped")
                },
                _ => debug!("Channel {} is disabled, notification dropped", channel),
            }
            return false;
        };

        send_push_task(
            sender.clone(),
            self.permits.clone(),
            self.in_flight.clone(),
            channel,
            token.to_owned(),
            message,
        );

        true
    }

    /// Resolves once every scheduled send has finished.
    pub async fn flush(&self) {
        loop {
            let idle = self.in_flight.idle.notified();
            if self.in_flight.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            idle.await;
        }
    }
}

pub fn send_push_task(
    sender: Arc<dyn ChannelSender>,
    permits: Arc<Semaphore>,
    in_flight: Arc<InFlight>,
    channel: ChannelType,
    token: String,
    message: PushMessage,
) {
    in_flight.start();
    tokio::spawn(async move {
        // Acquire permit to limit concurrent push tasks
        match permits.acquire_owned().await {
            Ok(_permit) => {
                if let Err(e) = sender.send(&message, &token).await {
                    warn!("Push notification over {} failed: {}", channel, e);
                };
            },
            Err(_) => tracing::error!("Push notification semaphore closed"),
        };
        in_flight.finish();
    });
}
