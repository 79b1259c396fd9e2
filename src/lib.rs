//! twl-notifier: one-time eligibility notifications
//!
//! Tells a wiki user, exactly once, that their global account has reached a
//! minimum edit count and age.
//!
//! # Core Concepts
//!
//! - **Eligibility**: global edit count and account age both meet the
//!   configured thresholds (inclusive)
//! - **Notification state**: per-user `unset | no | yes`, forward-only
//! - **Hooks**: the inbound port a host calls on content saves and at
//!   registration time
//!
//! # Example
//!
//! ```
//! use twl_notifier::is_eligible;
//!
//! assert!(is_eligible(182 * 86_400, 500, 500, 182));
//! ```

pub mod account;
pub mod config;
pub mod eligibility;
pub mod handler;
pub mod hooks;
pub mod notify;
pub mod preferences;
pub mod queue;
pub mod storage;
pub mod telemetry;

pub use account::{AccountError, GlobalAccountDirectory, InMemoryAccountDirectory, UserAccount, UserId};
pub use config::{ConfigError, TwlConfig};
pub use eligibility::{is_eligible, Thresholds};
pub use handler::{Clock, FixedClock, HandlerError, Outcome, SaveEventHandler, SystemClock};
pub use hooks::{ContentSaved, HookResult, Hooks};
pub use notify::{
    DispatchError, LogDispatcher, NotificationDispatcher, NotificationEvent, NotificationRegistry,
    RecordingDispatcher,
};
pub use preferences::{PreferenceKind, PreferenceRegistry};
pub use queue::{EvaluationQueue, QueueError, QueueStats, SaveEvent};
pub use storage::{
    InMemoryStateStore, NotificationState, NotificationStateStore, OpenStore, SqliteStateStore,
    StorageError, StorageResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
