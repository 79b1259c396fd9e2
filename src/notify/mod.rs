//! Notifications: the `twl-eligible` kind and its delivery
//!
//! Rendering and transport live outside this crate. Here we only declare the
//! kind (for whatever renders it) and hand events to a dispatcher.

mod dispatch;
mod registry;

pub use dispatch::{DispatchError, LogDispatcher, NotificationDispatcher, NotificationEvent, RecordingDispatcher};
pub use registry::{NotificationKind, NotificationRegistry, UserLocator, ELIGIBLE_KIND};
