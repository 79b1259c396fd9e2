//! Shared fixtures for the integration tests
//!
//! Builds a full pipeline (accounts, state store, recording dispatcher,
//! handler) around a fixed clock, so account ages are exact.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use twl_notifier::{
    FixedClock, InMemoryAccountDirectory, NotificationStateStore, RecordingDispatcher,
    SaveEventHandler, Thresholds, UserAccount,
};

/// The instant every fixture clock is frozen at
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// An attached account registered `days` before `now()`
pub fn account(id: u64, edits: u64, days: i64) -> UserAccount {
    UserAccount::new(id, format!("User{}", id))
        .with_edit_count(edits)
        .with_registration(now() - Duration::days(days))
}

pub struct Pipeline<S: NotificationStateStore + 'static> {
    pub accounts: Arc<InMemoryAccountDirectory>,
    pub store: Arc<S>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub handler: Arc<SaveEventHandler>,
}

/// Pipeline with the reference thresholds (500 edits, 182 days)
pub fn pipeline<S: NotificationStateStore + 'static>(store: S) -> Pipeline<S> {
    let accounts = Arc::new(InMemoryAccountDirectory::new());
    let store = Arc::new(store);
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let handler = Arc::new(
        SaveEventHandler::new(
            accounts.clone(),
            store.clone(),
            dispatcher.clone(),
            Thresholds::new(500, 182),
        )
        .with_clock(Arc::new(FixedClock(now()))),
    );
    Pipeline {
        accounts,
        store,
        dispatcher,
        handler,
    }
}
