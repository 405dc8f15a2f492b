use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use futures_util::{future::LocalBoxFuture, stream, Stream};
use log::*;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use crate::{
    live::{ChangeFeed, ChangeNotice, Topic},
    market_api::MarketError,
};

/// The complete state of a watched scope as of `revision`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot<T> {
    pub topic: Topic,
    pub revision: u64,
    pub data: T,
}

/// Re-reads the full scope of a subscription from the store.
pub type SnapshotLoader<T> = Box<dyn Fn() -> LocalBoxFuture<'static, Result<T, MarketError>>>;

/// A push-based view of one [`Topic`].
///
/// The first call to [`LiveSubscription::next`] yields the current state. Every later call waits for a write that
/// touches the topic and yields the state after it. Bursts of writes are coalesced into one snapshot. The
/// subscription ends when every producer of the feed is gone.
pub struct LiveSubscription<T> {
    topic: Topic,
    receiver: broadcast::Receiver<ChangeNotice>,
    revision: Arc<AtomicU64>,
    loader: SnapshotLoader<T>,
    primed: bool,
}

impl<T> std::fmt::Debug for LiveSubscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSubscription").field("topic", &self.topic).field("primed", &self.primed).finish()
    }
}

impl<T> LiveSubscription<T> {
    /// Listens on `feed` from this moment, so no write that commits while the first snapshot loads is missed.
    pub fn new(topic: Topic, feed: &ChangeFeed, loader: SnapshotLoader<T>) -> Self {
        Self { topic, receiver: feed.subscribe(), revision: feed.revision_counter(), loader, primed: false }
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub async fn next(&mut self) -> Option<Result<Snapshot<T>, MarketError>> {
        if !self.primed {
            self.primed = true;
            let revision = self.revision.load(Ordering::SeqCst);
            return Some(self.load(revision).await);
        }
        loop {
            match self.receiver.recv().await {
                Ok(notice) if notice.concerns(&self.topic) => {
                    let revision = self.drain_pending(notice.revision);
                    return Some(self.load(revision).await);
                },
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    // Snapshots are complete, so one reload covers everything that was skipped
                    debug!("📡️ Watcher of {} lagged by {skipped} notices. Reloading.", self.topic);
                    let revision = self.drain_pending(self.revision.load(Ordering::SeqCst));
                    return Some(self.load(revision).await);
                },
                Err(RecvError::Closed) => {
                    debug!("📡️ Change feed closed. Subscription to {} has ended", self.topic);
                    return None;
                },
            }
        }
    }

    /// Consumes notices that are already queued and returns the newest revision relevant to this topic.
    fn drain_pending(&mut self, mut revision: u64) -> u64 {
        loop {
            match self.receiver.try_recv() {
                Ok(notice) if notice.concerns(&self.topic) => revision = revision.max(notice.revision),
                Ok(_) => {},
                Err(TryRecvError::Lagged(_)) => revision = revision.max(self.revision.load(Ordering::SeqCst)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return revision,
            }
        }
    }

    async fn load(&self, revision: u64) -> Result<Snapshot<T>, MarketError> {
        let data = (self.loader)().await?;
        trace!("📡️ Snapshot of {} at revision {revision}", self.topic);
        Ok(Snapshot { topic: self.topic.clone(), revision, data })
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Snapshot<T>, MarketError>>
    where T: 'static {
        stream::unfold(self, |mut sub| async move { sub.next().await.map(|item| (item, sub)) })
    }
}
