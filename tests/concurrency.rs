//! At-most-once dispatch under concurrent save events
//!
//! Run with: `cargo test --test concurrency`

mod common;

use common::{account, now, pipeline};
use std::sync::Arc;
use tokio::task::JoinSet;
use twl_notifier::{
    FixedClock, InMemoryStateStore, NotificationState, NotificationStateStore, OpenStore, Outcome,
    RecordingDispatcher, SaveEventHandler, SqliteStateStore, Thresholds, UserId,
};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_saves_by_one_user_dispatch_once() {
    let p = pipeline(InMemoryStateStore::new());
    p.accounts.upsert(account(1, 650, 365));

    let mut tasks = JoinSet::new();
    for _ in 0..32 {
        let handler = p.handler.clone();
        tasks.spawn(async move { handler.handle(UserId::new(1)).await });
    }

    let mut notified = 0;
    while let Some(result) = tasks.join_next().await {
        if result.unwrap().unwrap() == Outcome::Notified {
            notified += 1;
        }
    }

    assert_eq!(notified, 1);
    assert_eq!(p.dispatcher.count(), 1);
    assert_eq!(p.handler.active_locks(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn users_are_evaluated_independently() {
    let p = pipeline(InMemoryStateStore::new());
    for id in 0..20 {
        let edits = if id % 2 == 0 { 650 } else { 50 };
        p.accounts.upsert(account(id, edits, 365));
    }

    let mut tasks = JoinSet::new();
    for id in 0..20 {
        for _ in 0..3 {
            let handler = p.handler.clone();
            tasks.spawn(async move { handler.handle(UserId::new(id)).await });
        }
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    assert_eq!(p.dispatcher.count(), 10);
    for id in 0..20 {
        let expected = if id % 2 == 0 {
            NotificationState::Yes
        } else {
            NotificationState::No
        };
        assert_eq!(p.store.get(UserId::new(id)).unwrap(), expected);
        assert!(p.dispatcher.count_for(UserId::new(id)) <= 1);
    }
}

/// Two handlers (two processes in production) share one database file.
/// Their per-user locks are separate, so only the store's compare-and-set
/// stands between them and a double notification.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn handlers_sharing_a_database_dispatch_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.db");

    let p = pipeline(SqliteStateStore::open(&path).unwrap());
    p.accounts.upsert(account(9, 650, 365));

    let other_dispatcher = Arc::new(RecordingDispatcher::new());
    let other = Arc::new(
        SaveEventHandler::new(
            p.accounts.clone(),
            Arc::new(SqliteStateStore::open(&path).unwrap()),
            other_dispatcher.clone(),
            Thresholds::new(500, 182),
        )
        .with_clock(Arc::new(FixedClock(now()))),
    );

    let mut tasks = JoinSet::new();
    for i in 0..16 {
        let handler = if i % 2 == 0 { p.handler.clone() } else { other.clone() };
        tasks.spawn(async move { handler.handle(UserId::new(9)).await });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    assert_eq!(p.dispatcher.count() + other_dispatcher.count(), 1);
    assert_eq!(p.store.get(UserId::new(9)).unwrap(), NotificationState::Yes);
}
