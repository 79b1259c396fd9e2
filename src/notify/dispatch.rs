//! NotificationDispatcher trait and the bundled dispatchers

use super::registry::ELIGIBLE_KIND;
use crate::account::UserId;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Mutex;
use thiserror::Error;

/// A notification handed to the delivery system
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationEvent {
    pub kind: String,
    /// The user the event is about
    pub agent: UserId,
    pub recipients: Vec<UserId>,
}

impl NotificationEvent {
    /// A `twl-eligible` event. The agent is its own recipient.
    pub fn eligible(user: UserId) -> Self {
        Self {
            kind: ELIGIBLE_KIND.to_string(),
            agent: user,
            recipients: vec![user],
        }
    }
}

/// Errors from notification delivery
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("notification transport unavailable: {0}")]
    Unavailable(String),

    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// Delivery of notification events
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, event: &NotificationEvent) -> Result<(), DispatchError>;
}

/// Dispatcher that only writes the event to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn dispatch(&self, event: &NotificationEvent) -> Result<(), DispatchError> {
        tracing::info!(
            kind = %event.kind,
            agent = %event.agent,
            recipients = event.recipients.len(),
            "notification dispatched"
        );
        Ok(())
    }
}

/// Dispatcher that keeps every event it receives
///
/// Can be switched into a failing mode to exercise error paths.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    events: Mutex<Vec<NotificationEvent>>,
    failing: Mutex<bool>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher that rejects every event until `set_failing(false)`
    pub fn failing() -> Self {
        let dispatcher = Self::default();
        dispatcher.set_failing(true);
        dispatcher
    }

    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut flag) = self.failing.lock() {
            *flag = failing;
        }
    }

    /// Events delivered so far
    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Events delivered to one user
    pub fn count_for(&self, user: UserId) -> usize {
        self.events
            .lock()
            .map(|e| e.iter().filter(|ev| ev.recipients.contains(&user)).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn dispatch(&self, event: &NotificationEvent) -> Result<(), DispatchError> {
        if self.failing.lock().map(|f| *f).unwrap_or(true) {
            return Err(DispatchError::Unavailable("recording dispatcher set to fail".to_string()));
        }
        self.events
            .lock()
            .map_err(|_| DispatchError::Unavailable("event log poisoned".to_string()))?
            .push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eligible_event_targets_agent() {
        let event = NotificationEvent::eligible(UserId::new(4));
        assert_eq!(event.kind, "twl-eligible");
        assert_eq!(event.agent, UserId::new(4));
        assert_eq!(event.recipients, vec![UserId::new(4)]);
    }

    #[tokio::test]
    async fn recording_dispatcher_records_and_fails_on_demand() {
        let dispatcher = RecordingDispatcher::new();
        let event = NotificationEvent::eligible(UserId::new(1));

        dispatcher.dispatch(&event).await.unwrap();
        assert_eq!(dispatcher.count_for(UserId::new(1)), 1);

        dispatcher.set_failing(true);
        assert!(dispatcher.dispatch(&event).await.is_err());
        assert_eq!(dispatcher.count(), 1);
    }

    #[tokio::test]
    async fn log_dispatcher_accepts_everything() {
        let event = NotificationEvent::eligible(UserId::new(1));
        assert!(LogDispatcher.dispatch(&event).await.is_ok());
    }
}
