//! # Cache Actor
//!
//! The background half of a [`ResourceCache`](crate::ResourceCache). One actor runs per
//! open lifetime of a cache and owns everything that lifetime needs: the change
//! subscription, the coalescing flags, and the receiving end of the fetch results.
//! Like any actor it handles one event at a time, so none of that state needs a lock.
//!
//! ## Event loop
//!
//! The loop is biased, in this order:
//!
//! 1. **Commands** from the handle (`Refresh`, `Close`). A close always wins.
//! 2. **Fetch outcomes** from spawned fetch tasks.
//! 3. **Change signals** from the subscription. A burst is drained and counted as one.
//! 4. **Invalidations** from the session-local bus.
//! 5. **Resubscribe timer**, armed only while the subscription is down.
//!
//! ## Coalescing
//!
//! At most one fetch is in flight. A trigger that arrives while a fetch is running only
//! sets `pending`; when the running fetch lands its result is applied and, if `pending`
//! was set, exactly one follow-up fetch starts. Any number of triggers during one fetch
//! therefore cost one extra read.
//!
//! ## Epoch guard
//!
//! Every publish compares the actor's epoch with the cache's current epoch inside the
//! `watch` sender's lock. Closing or reopening the cache bumps the epoch first, so
//! anything this actor produces afterwards is discarded, including a fetch that resolves
//! after the close.

use crate::cache::{CacheState, Shared};
use crate::channel::{ChangeChannel, Subscription};
use crate::config::ReconnectConfig;
use crate::fetcher::CollectionFetcher;
use crate::message::{CacheCommand, FetchOutcome};
use crate::resource::{ResourceName, ResourceSpec};
use crate::store::ChangeSignal;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub(crate) struct CacheActor {
    spec: ResourceSpec,
    fetcher: CollectionFetcher,
    channel: ChangeChannel,
    reconnect: ReconnectConfig,
    commands: mpsc::UnboundedReceiver<CacheCommand>,
    invalidations: Option<broadcast::Receiver<ResourceName>>,
    shared: Arc<Shared>,
    epoch: u64,
    subscription: Option<Subscription>,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    outcomes: mpsc::UnboundedReceiver<FetchOutcome>,
    in_flight: bool,
    pending: bool,
    resubscribe_attempt: u32,
    resubscribe_at: Option<Instant>,
    refresh_requested: bool,
}

/// How one subscribe attempt ended.
enum Connect {
    Live,
    Down,
    /// The handle closed the cache while the attempt was pending.
    Closed,
}

/// Everything an actor borrows from its cache handle.
pub(crate) struct ActorParts {
    pub spec: ResourceSpec,
    pub fetcher: CollectionFetcher,
    pub channel: ChangeChannel,
    pub reconnect: ReconnectConfig,
    pub invalidations: Option<broadcast::Receiver<ResourceName>>,
    pub shared: Arc<Shared>,
    pub epoch: u64,
}

impl CacheActor {
    pub(crate) fn new(parts: ActorParts, commands: mpsc::UnboundedReceiver<CacheCommand>) -> Self {
        let (outcome_tx, outcomes) = mpsc::unbounded_channel();
        Self {
            spec: parts.spec,
            fetcher: parts.fetcher,
            channel: parts.channel,
            reconnect: parts.reconnect,
            commands,
            invalidations: parts.invalidations,
            shared: parts.shared,
            epoch: parts.epoch,
            subscription: None,
            outcome_tx,
            outcomes,
            in_flight: false,
            pending: false,
            resubscribe_attempt: 0,
            resubscribe_at: None,
            refresh_requested: false,
        }
    }

    /// Runs until the handle sends `Close` or is dropped.
    ///
    /// The subscription is established before the initial fetch is issued, so a change
    /// landing between the two still triggers a refetch instead of being lost. A subscribe
    /// attempt that fails or times out does not hold the fetch back.
    pub(crate) async fn run(mut self) {
        info!(resource = %self.spec.name, epoch = self.epoch, "Cache opened");

        if !matches!(self.connect().await, Connect::Closed) {
            // The initial fetch covers any refresh asked for while subscribing
            self.refresh_requested = false;
            self.start_fetch();
            self.receive().await;
        }

        if let Some(mut subscription) = self.subscription.take() {
            subscription.close();
        }
        info!(resource = %self.spec.name, epoch = self.epoch, "Cache actor stopped");
    }

    async fn receive(&mut self) {
        let resource = self.spec.name.clone();
        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(CacheCommand::Refresh) => {
                        if self.subscription.is_none() {
                            match self.connect().await {
                                Connect::Closed => break,
                                Connect::Live => debug!(%resource, "Resubscribed on refresh"),
                                Connect::Down => {}
                            }
                            self.refresh_requested = false;
                        }
                        self.request_fetch("refresh");
                    }
                    Some(CacheCommand::Close) | None => break,
                },

                Some(outcome) = self.outcomes.recv() => self.on_fetched(outcome),

                signal = next_signal(&mut self.subscription) => match signal {
                    Some(ChangeSignal) => {
                        let coalesced = self
                            .subscription
                            .as_mut()
                            .map(Subscription::drain)
                            .unwrap_or(0);
                        debug!(%resource, coalesced, "Change signal");
                        self.request_fetch("signal");
                    }
                    None => self.on_subscription_lost(),
                },

                invalidated = next_invalidation(&mut self.invalidations) => match invalidated {
                    Ok(name) if name == resource => self.request_fetch("invalidated"),
                    Ok(_) => {}
                    Err(RecvError::Lagged(missed)) => {
                        debug!(%resource, missed, "Invalidations lagged");
                        self.request_fetch("invalidated");
                    }
                    Err(RecvError::Closed) => self.invalidations = None,
                },

                _ = sleep_until(self.resubscribe_at) => {
                    self.resubscribe_at = None;
                    let connected = self.connect().await;
                    let refresh = std::mem::take(&mut self.refresh_requested);
                    match connected {
                        Connect::Closed => break,
                        Connect::Live => self.request_fetch("resubscribed"),
                        Connect::Down if refresh => self.request_fetch("refresh"),
                        Connect::Down => {}
                    }
                }
            }
        }
    }

    /// Publishes a state change unless this actor's lifetime has ended.
    fn publish(&self, modify: impl FnOnce(&mut CacheState)) -> bool {
        self.shared.publish(self.epoch, modify)
    }

    fn request_fetch(&mut self, reason: &'static str) {
        if self.in_flight {
            if !self.pending {
                debug!(resource = %self.spec.name, reason, "Refetch queued");
            }
            self.pending = true;
            return;
        }
        debug!(resource = %self.spec.name, reason, "Refetch");
        self.start_fetch();
    }

    fn start_fetch(&mut self) {
        self.in_flight = true;
        self.publish(|state| state.loading = true);

        let fetcher = self.fetcher.clone();
        let spec = self.spec.clone();
        let epoch = self.epoch;
        let outcome_tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = fetcher.fetch(&spec).await;
            let _ = outcome_tx.send(FetchOutcome { epoch, result });
        });
    }

    fn on_fetched(&mut self, outcome: FetchOutcome) {
        self.in_flight = false;
        if outcome.epoch != self.epoch {
            debug!(resource = %self.spec.name, epoch = outcome.epoch, "Stale fetch ignored");
            return;
        }

        let follow_up = std::mem::take(&mut self.pending);
        let applied = self.publish(|state| {
            match outcome.result {
                Ok(collection) => {
                    state.collection = collection;
                    state.error = None;
                    state.revision += 1;
                }
                // The previous collection stays visible.
                Err(error) => state.error = Some(error),
            }
            state.loading = follow_up;
        });
        if !applied {
            debug!(resource = %self.spec.name, "Fetch landed after close");
            return;
        }

        if follow_up {
            self.start_fetch();
        }
    }

    /// Tries to subscribe. On failure the resubscribe timer is armed.
    ///
    /// Commands keep being read while the attempt is pending: `Close` abandons it, and a
    /// `Refresh` is remembered in `refresh_requested` for the caller.
    async fn connect(&mut self) -> Connect {
        let channel = self.channel.clone();
        let resource = self.spec.name.clone();
        let subscribing = async move { channel.subscribe(&resource).await };
        tokio::pin!(subscribing);

        let result = loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(CacheCommand::Refresh) => self.refresh_requested = true,
                    Some(CacheCommand::Close) | None => {
                        debug!(resource = %self.spec.name, "Closed while subscribing");
                        return Connect::Closed;
                    }
                },

                result = &mut subscribing => break result,
            }
        };

        match result {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                self.resubscribe_attempt = 0;
                self.resubscribe_at = None;
                self.publish(|state| state.live = true);
                Connect::Live
            }
            Err(error) => {
                warn!(resource = %self.spec.name, %error, "Subscription unavailable");
                self.schedule_resubscribe();
                Connect::Down
            }
        }
    }

    fn on_subscription_lost(&mut self) {
        warn!(resource = %self.spec.name, "Subscription lost");
        self.subscription = None;
        self.publish(|state| state.live = false);
        self.schedule_resubscribe();
    }

    fn schedule_resubscribe(&mut self) {
        let delay = self
            .reconnect
            .jittered_delay(self.resubscribe_attempt, jitter_seed());
        self.resubscribe_attempt = self.resubscribe_attempt.saturating_add(1);
        self.resubscribe_at = Some(Instant::now() + delay);
        debug!(
            resource = %self.spec.name,
            attempt = self.resubscribe_attempt,
            delay_ms = delay.as_millis() as u64,
            "Resubscribe scheduled"
        );
    }
}

async fn next_signal(subscription: &mut Option<Subscription>) -> Option<ChangeSignal> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}

async fn next_invalidation(
    invalidations: &mut Option<broadcast::Receiver<ResourceName>>,
) -> Result<ResourceName, RecvError> {
    match invalidations {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn jitter_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::from(elapsed.subsec_nanos()))
        .unwrap_or(0)
}
