//! SaveEventHandler: one eligibility evaluation per content save
//!
//! The evaluation for a user runs under that user's lock, so two saves by
//! the same user never race between reading the state and dispatching.
//! The final `no -> yes` transition is additionally a compare-and-set on
//! the store, which keeps the at-most-once guarantee when several processes
//! share one store.

use crate::account::{AccountError, GlobalAccountDirectory, UserId};
use crate::eligibility::Thresholds;
use crate::notify::{DispatchError, NotificationDispatcher, NotificationEvent};
use crate::storage::{NotificationState, NotificationStateStore, StorageError};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Why an evaluation was abandoned
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("global account unavailable: {0}")]
    AccountUnavailable(#[from] AccountError),

    #[error("notification state unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),

    #[error("dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),
}

/// What a completed evaluation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No global account, or the local account is not attached to it
    Unattached,
    /// State was already `yes`
    AlreadyNotified,
    /// Thresholds not met; state is `no`
    NotEligible,
    /// Notification dispatched; state is `yes`
    Notified,
}

/// Source of "now" for account-age calculations
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub struct SaveEventHandler {
    accounts: Arc<dyn GlobalAccountDirectory>,
    store: Arc<dyn NotificationStateStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    thresholds: Thresholds,
    clock: Arc<dyn Clock>,
    /// Per-user evaluation locks; entries are dropped once uncontended
    locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl SaveEventHandler {
    pub fn new(
        accounts: Arc<dyn GlobalAccountDirectory>,
        store: Arc<dyn NotificationStateStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        thresholds: Thresholds,
    ) -> Self {
        Self {
            accounts,
            store,
            dispatcher,
            thresholds,
            clock: Arc::new(SystemClock),
            locks: DashMap::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Evaluate `user` after one of their saves.
    pub async fn handle(&self, user: UserId) -> Result<Outcome, HandlerError> {
        let lock = self.locks.entry(user).or_default().clone();
        let result = {
            let _guard = lock.lock().await;
            self.evaluate(user).await
        };
        drop(lock);
        // Only the map holds it now: nobody is waiting on this user.
        self.locks.remove_if(&user, |_, l| Arc::strong_count(l) == 1);
        result
    }

    async fn evaluate(&self, user: UserId) -> Result<Outcome, HandlerError> {
        let account = match self.accounts.global_account(user).await? {
            Some(account) if account.attached => account,
            _ => {
                tracing::debug!(%user, "skipping unattached account");
                return Ok(Outcome::Unattached);
            }
        };

        match self.store.get(user)? {
            NotificationState::Yes => return Ok(Outcome::AlreadyNotified),
            NotificationState::No => {}
            NotificationState::Unset => {
                // First touch: "evaluated, not notified" is distinct from "never seen".
                let marked = self.store.compare_and_set(
                    user,
                    NotificationState::Unset,
                    NotificationState::No,
                )?;
                if !marked && self.store.get(user)? == NotificationState::Yes {
                    return Ok(Outcome::AlreadyNotified);
                }
            }
        }

        if !self.thresholds.is_met(&account, self.clock.now()) {
            tracing::debug!(
                %user,
                edits = account.global_edit_count,
                "not eligible yet"
            );
            return Ok(Outcome::NotEligible);
        }

        if !self
            .store
            .compare_and_set(user, NotificationState::No, NotificationState::Yes)?
        {
            return Ok(Outcome::AlreadyNotified);
        }

        if let Err(e) = self.dispatcher.dispatch(&NotificationEvent::eligible(user)).await {
            // Release the claim so the next save retries.
            if let Err(rollback) =
                self.store
                    .compare_and_set(user, NotificationState::Yes, NotificationState::No)
            {
                tracing::error!(
                    %user,
                    error = %rollback,
                    "failed to release notification claim; user will not be retried until reset with `state set`"
                );
            }
            return Err(e.into());
        }

        tracing::info!(%user, name = %account.name, "eligibility notification sent");
        Ok(Outcome::Notified)
    }

    /// Number of users with a live evaluation lock
    pub fn active_locks(&self) -> usize {
        self.locks.len()
    }
}
