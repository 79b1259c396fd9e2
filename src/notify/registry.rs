//! Notification kind declarations

use serde::Serialize;
use std::collections::BTreeMap;

/// The one notification kind this crate sends
pub const ELIGIBLE_KIND: &str = "twl-eligible";

/// How the recipients of an event are found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserLocator {
    /// The event's agent is the recipient
    EventAgent,
}

/// Declaration of a notification kind, consumed by the renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationKind {
    pub name: String,
    /// Category the host already defines, e.g. its built-in `system`
    pub category: String,
    /// "positive" or "negative"
    pub group: String,
    pub section: String,
    pub presentation_model: String,
    pub locators: Vec<UserLocator>,
    pub can_notify_agent: bool,
}

/// Everything declared during notification registration
#[derive(Debug, Clone, Default, Serialize)]
pub struct NotificationRegistry {
    pub kinds: BTreeMap<String, NotificationKind>,
    /// Icon name -> asset path
    pub icons: BTreeMap<String, String>,
}

impl NotificationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_kind(&mut self, kind: NotificationKind) {
        self.kinds.insert(kind.name.clone(), kind);
    }

    pub fn register_icon(&mut self, name: impl Into<String>, path: impl Into<String>) {
        self.icons.insert(name.into(), path.into());
    }

    pub fn kind(&self, name: &str) -> Option<&NotificationKind> {
        self.kinds.get(name)
    }
}
