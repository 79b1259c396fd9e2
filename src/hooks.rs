//! Inbound port: the three events a host fires at this crate
//!
//! `on_content_saved` never fails and never waits on an evaluation: it
//! enqueues and returns. Everything that can go wrong afterwards is logged
//! by the queue workers.

use crate::account::UserId;
use crate::config::TwlConfig;
use crate::handler::SaveEventHandler;
use crate::notify::{NotificationKind, NotificationRegistry, UserLocator, ELIGIBLE_KIND};
use crate::preferences::{PreferenceKind, PreferenceRegistry};
use crate::queue::{EvaluationQueue, QueueError, QueueStats, SaveEvent};
use crate::storage::NOTIFIED_PREFERENCE;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const ELIGIBLE_ICON_PATH: &str = "TheWikipediaLibrary/modules/icons/twl-eligible.svg";
pub const ELIGIBLE_PRESENTATION_MODEL: &str = "TwlEligiblePresentationModel";

/// A content edit that the host has persisted
///
/// Only `user` is read; the rest is carried so hosts can forward their
/// event unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSaved {
    #[serde(default)]
    pub page: String,
    pub user: UserId,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub flags: u32,
    #[serde(default)]
    pub revision: Option<u64>,
    #[serde(default)]
    pub edit_result: Option<serde_json::Value>,
}

impl ContentSaved {
    /// A bare event for `user`
    pub fn by(user: u64) -> Self {
        Self {
            page: String::new(),
            user: UserId::new(user),
            summary: String::new(),
            flags: 0,
            revision: None,
            edit_result: None,
        }
    }
}

/// What `on_content_saved` did with the event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookResult {
    /// Notifications are switched off
    Disabled,
    /// Queued for evaluation
    Deferred,
    /// Could not be queued
    Dropped(QueueError),
}

pub struct Hooks {
    send_notifications: bool,
    queue: EvaluationQueue,
}

impl Hooks {
    pub fn new(send_notifications: bool, queue: EvaluationQueue) -> Self {
        Self {
            send_notifications,
            queue,
        }
    }

    /// Start the evaluation queue with the configured shard count and capacity.
    pub fn from_config(config: &TwlConfig, handler: Arc<SaveEventHandler>) -> Self {
        let queue = EvaluationQueue::start(handler, config.workers, config.queue_capacity);
        Self::new(config.send_notifications, queue)
    }

    pub fn on_content_saved(&self, event: &ContentSaved) -> HookResult {
        if !self.send_notifications {
            return HookResult::Disabled;
        }
        match self.queue.try_enqueue(SaveEvent { user: event.user }) {
            Ok(()) => HookResult::Deferred,
            Err(e) => {
                tracing::warn!(user = %event.user, error = %e, "save event dropped");
                HookResult::Dropped(e)
            }
        }
    }

    /// Like `on_content_saved`, but waits for queue capacity instead of
    /// dropping. For batch feeds where backpressure is acceptable.
    pub async fn on_content_saved_wait(&self, event: &ContentSaved) -> HookResult {
        if !self.send_notifications {
            return HookResult::Disabled;
        }
        match self.queue.enqueue(SaveEvent { user: event.user }).await {
            Ok(()) => HookResult::Deferred,
            Err(e) => {
                tracing::warn!(user = %event.user, error = %e, "save event dropped");
                HookResult::Dropped(e)
            }
        }
    }

    /// Register the API-only preference that stores the notification state.
    pub fn on_preference_registration(preferences: &mut PreferenceRegistry) {
        preferences.register(NOTIFIED_PREFERENCE, PreferenceKind::Api);
    }

    /// Declare the `twl-eligible` notification kind in the host's `system` category.
    pub fn on_notification_registration(registry: &mut NotificationRegistry) {
        registry.register_kind(NotificationKind {
            name: ELIGIBLE_KIND.to_string(),
            category: "system".to_string(),
            group: "positive".to_string(),
            section: "message".to_string(),
            presentation_model: ELIGIBLE_PRESENTATION_MODEL.to_string(),
            locators: vec![UserLocator::EventAgent],
            can_notify_agent: true,
        });
        registry.register_icon(ELIGIBLE_KIND, ELIGIBLE_ICON_PATH);
    }

    /// Drain pending evaluations and stop the workers.
    pub async fn shutdown(self) -> QueueStats {
        self.queue.shutdown().await
    }
}
