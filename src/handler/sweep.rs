//! One pass over every subscription
//!
//! Subscriptions are grouped by home server. Groups are checked concurrently
//! up to a bound; subscriptions of the same home server are checked one after
//! another. A failing subscription is logged and left untouched so the next
//! sweep retries it from the same cursors.

use std::{
    collections::BTreeMap,
    ops::Add,
    sync::Arc,
    time::Duration,
};

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info};

use super::cursor::{CursorStrategy, ItemKind, UnreadItem};
use crate::{
    configuration::{AppState, Config, State},
    dao::SubscriptionStore,
    error::Error,
    model::{Cursors, Subscription},
    provider::{HomeServerConnector, LemmyConnector},
    push::Dispatcher,
    types::{PushMessage, SortType},
};

#[derive(Debug, Clone, Copy)]
pub struct SweepSettings {
    pub page_limit: i64,
    pub strategy: CursorStrategy,
    pub skew: chrono::Duration,
    pub max_concurrent_instances: usize,
}

impl From<&Config> for SweepSettings {
    fn from(config: &Config) -> Self {
        SweepSettings {
            page_limit: config.page_limit,
            strategy: config.cursor_strategy,
            skew: chrono::Duration::seconds(config.cursor_skew),
            max_concurrent_instances: config.max_concurrent_instances,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Subscriptions whose check completed and whose cursors were stored.
    pub checked: usize,
    /// Subscriptions left untouched because a query or the store failed.
    pub failed: usize,
    /// Sends handed to the dispatcher, test notifications included.
    pub dispatched: usize,
}

impl Add for SweepReport {
    type Output = SweepReport;

    fn add(self, other: SweepReport) -> SweepReport {
        SweepReport {
            checked: self.checked + other.checked,
            failed: self.failed + other.failed,
            dispatched: self.dispatched + other.dispatched,
        }
    }
}

#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn SubscriptionStore>,
    connector: Arc<dyn HomeServerConnector>,
    dispatcher: Arc<Dispatcher>,
    settings: SweepSettings,
}

impl Engine {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        connector: Arc<dyn HomeServerConnector>,
        dispatcher: Arc<Dispatcher>,
        settings: SweepSettings,
    ) -> Engine {
        Engine {
            store,
            connector,
            dispatcher,
            settings,
        }
    }

    /// Engine wired to the production database, home servers and senders.
    pub fn from_state(app_state: &AppState<State>) -> Result<Engine, Error> {
        let config = &app_state.config;
        let connector = LemmyConnector::new(Duration::from_secs(
            config.query_timeout,
        ))?;
        Ok(Engine::new(
            Arc::new(app_state.database.subscription.clone()),
            Arc::new(connector),
            app_state.dispatcher.clone(),
            SweepSettings::from(config),
        ))
    }

    pub async fn sweep(&self) -> SweepReport {
        info!("Starting notification check");

        let subscriptions = match self.store.list_all().await {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                error!("Could not load subscriptions: {}", e);
                return SweepReport::default();
            },
        };

        info!("Found {} accounts to check", subscriptions.len());

        let groups = group_by_instance(subscriptions);
        info!(
            "Found {} instances to check: [{}]",
            groups.len(),
            groups.keys().cloned().collect::<Vec<String>>().join(", ")
        );

        let report = stream::iter(groups)
            .map(|(instance, subscriptions)| {
                self.check_instance(instance, subscriptions)
            })
            .buffer_unordered(self.settings.max_concurrent_instances.max(1))
            .fold(SweepReport::default(), |total, report| async move {
                total + report
            })
            .await;

        info!(
            "Notification check done: {} checked, {} failed, {} dispatched",
            report.checked, report.failed, report.dispatched
        );

        report
    }

    /// Waits until every send scheduled by earlier sweeps has finished.
    pub async fn flush(&self) {
        self.dispatcher.flush().await;
    }

    async fn check_instance(
        &self,
        instance: String,
        subscriptions: Vec<Subscription>,
    ) -> SweepReport {
        let mut report = SweepReport::default();

        for subscription in subscriptions {
            debug!(
                "Checking notifications for id {} on instance: {}",
                subscription.id, instance
            );

            let (cursors, dispatched) =
                match self.check_subscription(&subscription).await {
                    Ok(result) => result,
                    Err(e) => {
                        error!(
                            "Notification check failed for id {} on instance {}: {}",
                            subscription.id, instance, e
                        );
                        report.failed += 1;
                        continue;
                    },
                };

            report.dispatched += dispatched;

            match self
                .store
                .update_cursors(subscription.id, cursors, subscription.test)
                .await
            {
                Ok(()) => report.checked += 1,
                Err(e) => {
                    error!(
                        "Could not store cursors for id {}: {}",
                        subscription.id, e
                    );
                    report.failed += 1;
                },
            }
        }

        report
    }

    /// Queries every item kind, dispatches what is new and returns the
    /// cursors to store together with the number of sends scheduled.
    /// Nothing is dispatched unless all three queries succeed.
    pub async fn check_subscription(
        &self,
        subscription: &Subscription,
    ) -> Result<(Cursors, usize), Error> {
        let client = self
            .connector
            .connect(&subscription.instance, &subscription.jwt)?;
        let limit = self.settings.page_limit;
        let now = Utc::now();

        let replies = client.get_unread_replies(limit, SortType::New).await?;
        let mentions = client.get_unread_mentions(limit, SortType::New).await?;
        let messages = client.get_unread_private_messages(limit).await?;

        let mut cursors = subscription.cursors();
        let mut dispatched = 0;

        dispatched += self.dispatch_new(
            subscription,
            ItemKind::Reply,
            replies,
            &mut cursors,
            now,
        );
        dispatched += self.dispatch_new(
            subscription,
            ItemKind::Mention,
            mentions,
            &mut cursors,
            now,
        );
        dispatched += self.dispatch_new(
            subscription,
            ItemKind::Message,
            messages,
            &mut cursors,
            now,
        );

        if subscription.test {
            info!("Found queued test notification for id {}", subscription.id);
            if self.dispatcher.dispatch(
                subscription.channel(),
                &subscription.token,
                PushMessage::Test,
            ) {
                dispatched += 1;
            }
        }

        Ok((cursors, dispatched))
    }

    fn dispatch_new<T: UnreadItem>(
        &self,
        subscription: &Subscription,
        kind: ItemKind,
        items: Vec<T>,
        cursors: &mut Cursors,
        now: DateTime<Utc>,
    ) -> usize {
        let selection = self.settings.strategy.select(
            kind.cursor(cursors),
            items,
            self.settings.skew,
            now,
        );
        kind.set_cursor(cursors, selection.cursor);

        if selection.first_check {
            debug!(
                "First {} check for id {}, cursor set to {}",
                kind, subscription.id, selection.cursor
            );
            return 0;
        }

        if !selection.items.is_empty() {
            info!(
                "Found {} new {} notifications for id {}",
                selection.items.len(),
                kind,
                subscription.id
            );
        }

        let channel = subscription.channel();
        selection
            .items
            .into_iter()
            .map(|item| {
                self.dispatcher.dispatch(
                    channel,
                    &subscription.token,
                    PushMessage::Notification(item.normalize()),
                )
            })
            .filter(|scheduled| *scheduled)
            .count()
    }
}

fn group_by_instance(
    subscriptions: Vec<Subscription>,
) -> BTreeMap<String, Vec<Subscription>> {
    let mut groups: BTreeMap<String, Vec<Subscription>> = BTreeMap::new();

    for subscription in subscriptions {
        groups
            .entry(subscription.instance.to_owned())
            .or_default()
            .push(subscription);
    }

    groups
}
