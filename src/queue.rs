//! Evaluation queue: evaluations run off the save path
//!
//! Events are sharded by user id: each shard is one worker task draining one
//! bounded channel, so a user's events are evaluated in the order they were
//! enqueued while different users proceed in parallel.

use crate::account::UserId;
use crate::handler::{Outcome, SaveEventHandler};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One pending evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveEvent {
    pub user: UserId,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue shard {0} is full")]
    Full(usize),

    #[error("queue is shut down")]
    Closed,
}

/// Counters accumulated by the workers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub evaluated: usize,
    pub notified: usize,
    pub failed: usize,
}

impl QueueStats {
    fn record(&mut self, outcome: Outcome) {
        self.evaluated += 1;
        if outcome == Outcome::Notified {
            self.notified += 1;
        }
    }

    fn merge(&mut self, other: QueueStats) {
        self.evaluated += other.evaluated;
        self.notified += other.notified;
        self.failed += other.failed;
    }
}

pub struct EvaluationQueue {
    senders: Vec<mpsc::Sender<SaveEvent>>,
    workers: Vec<JoinHandle<QueueStats>>,
}

impl EvaluationQueue {
    /// Spawn `shards` workers on the current tokio runtime.
    ///
    /// `shards` and `capacity` are raised to 1 if zero.
    pub fn start(handler: Arc<SaveEventHandler>, shards: usize, capacity: usize) -> Self {
        let shards = shards.max(1);
        let capacity = capacity.max(1);
        let mut senders = Vec::with_capacity(shards);
        let mut workers = Vec::with_capacity(shards);

        for shard in 0..shards {
            let (tx, rx) = mpsc::channel(capacity);
            senders.push(tx);
            workers.push(tokio::spawn(run_shard(shard, handler.clone(), rx)));
        }

        Self { senders, workers }
    }

    pub fn shard_count(&self) -> usize {
        self.senders.len()
    }

    /// The shard that owns `user`
    pub fn shard_for(&self, user: UserId) -> usize {
        // usize fits any shard count, so the remainder always converts
        (user.get() % self.senders.len() as u64) as usize
    }

    /// Enqueue without waiting. Fails when the shard is full.
    pub fn try_enqueue(&self, event: SaveEvent) -> Result<(), QueueError> {
        let shard = self.shard_for(event.user);
        self.senders[shard].try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full(shard),
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })
    }

    /// Enqueue, waiting for room in the shard.
    pub async fn enqueue(&self, event: SaveEvent) -> Result<(), QueueError> {
        let shard = self.shard_for(event.user);
        self.senders[shard]
            .send(event)
            .await
            .map_err(|_| QueueError::Closed)
    }

    /// Stop accepting events, drain what is queued, and return the totals.
    pub async fn shutdown(self) -> QueueStats {
        drop(self.senders);
        let mut total = QueueStats::default();
        for (shard, worker) in self.workers.into_iter().enumerate() {
            match worker.await {
                Ok(stats) => total.merge(stats),
                Err(e) => tracing::warn!(shard, error = %e, "queue worker terminated abnormally"),
            }
        }
        total
    }
}

async fn run_shard(
    shard: usize,
    handler: Arc<SaveEventHandler>,
    mut rx: mpsc::Receiver<SaveEvent>,
) -> QueueStats {
    let mut stats = QueueStats::default();
    while let Some(event) = rx.recv().await {
        match handler.handle(event.user).await {
            Ok(outcome) => stats.record(outcome),
            Err(e) => {
                // Dropped, not retried: the user's next save re-evaluates.
                stats.failed += 1;
                tracing::warn!(shard, user = %event.user, error = %e, "evaluation abandoned");
            }
        }
    }
    tracing::debug!(shard, evaluated = stats.evaluated, "queue worker stopped");
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{InMemoryAccountDirectory, UserAccount};
    use crate::eligibility::Thresholds;
    use crate::notify::RecordingDispatcher;
    use crate::storage::InMemoryStateStore;

    fn handler(dispatcher: Arc<RecordingDispatcher>) -> Arc<SaveEventHandler> {
        let accounts = Arc::new(InMemoryAccountDirectory::new());
        for id in 0..10 {
            accounts.upsert(UserAccount::new(id, format!("User{}", id)).with_edit_count(id));
        }
        Arc::new(SaveEventHandler::new(
            accounts,
            Arc::new(InMemoryStateStore::new()),
            dispatcher,
            Thresholds::new(5, 0),
        ))
    }

    #[tokio::test]
    async fn drains_everything_on_shutdown() {
        let dispatcher = Arc::new(RecordingDispatcher::new());
        let queue = EvaluationQueue::start(handler(dispatcher.clone()), 3, 16);

        for id in 0..10 {
            queue.enqueue(SaveEvent { user: UserId::new(id) }).await.unwrap();
        }
        let stats = queue.shutdown().await;

        assert_eq!(stats.evaluated, 10);
        assert_eq!(stats.notified, 5);
        assert_eq!(stats.failed, 0);
        assert_eq!(dispatcher.count(), 5);
    }

    #[tokio::test]
    async fn users_map_to_stable_shards() {
        let dispatcher = Arc::new(RecordingDispatcher::new());
        let queue = EvaluationQueue::start(handler(dispatcher), 4, 1);

        assert_eq!(queue.shard_count(), 4);
        assert_eq!(queue.shard_for(UserId::new(6)), 2);
        assert_eq!(queue.shard_for(UserId::new(6)), queue.shard_for(UserId::new(10)));
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn zero_shards_still_runs() {
        let dispatcher = Arc::new(RecordingDispatcher::new());
        let queue = EvaluationQueue::start(handler(dispatcher), 0, 0);
        assert_eq!(queue.shard_count(), 1);
        queue.try_enqueue(SaveEvent { user: UserId::new(7) }).unwrap();
        assert_eq!(queue.shutdown().await.notified, 1);
    }

    #[tokio::test]
    async fn full_shard_is_reported() {
        let dispatcher = Arc::new(RecordingDispatcher::new());
        let queue = EvaluationQueue::start(handler(dispatcher), 1, 1);

        // The worker has not been polled yet on the current-thread runtime,
        // so the single slot stays occupied.
        queue.try_enqueue(SaveEvent { user: UserId::new(1) }).unwrap();
        let err = queue.try_enqueue(SaveEvent { user: UserId::new(2) }).unwrap_err();
        assert_eq!(err.clone(), QueueError::Full(0));
        assert_eq!(err.to_string(), "queue shard 0 is full");

        assert_eq!(queue.shutdown().await.evaluated, 1);
    }

    #[tokio::test]
    async fn failed_evaluations_are_counted() {
        let dispatcher = Arc::new(RecordingDispatcher::failing());
        let queue = EvaluationQueue::start(handler(dispatcher), 2, 4);
        queue.enqueue(SaveEvent { user: UserId::new(8) }).await.unwrap();

        let stats = queue.shutdown().await;
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.notified, 0);
    }
}
