//! UserId and UserAccount

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a wiki user
///
/// Serializes as the plain numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner numeric value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::str::FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// A user's global account, as seen by this crate
///
/// Owned by the identity system; read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    /// Account name, used in log output only
    #[serde(default)]
    pub name: String,
    /// When the global account was registered. `None` for accounts that
    /// predate registration tracking.
    #[serde(default)]
    pub registration: Option<DateTime<Utc>>,
    /// Edits across all attached wikis
    #[serde(default)]
    pub global_edit_count: u64,
    /// Whether the local account is attached to the global identity
    #[serde(default)]
    pub attached: bool,
}

impl UserAccount {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: UserId(id),
            name: name.into(),
            registration: None,
            global_edit_count: 0,
            attached: true,
        }
    }

    pub fn with_registration(mut self, registration: DateTime<Utc>) -> Self {
        self.registration = Some(registration);
        self
    }

    pub fn with_edit_count(mut self, count: u64) -> Self {
        self.global_edit_count = count;
        self
    }

    pub fn with_attached(mut self, attached: bool) -> Self {
        self.attached = attached;
        self
    }

    /// Seconds between registration and `now`.
    ///
    /// A missing registration counts as "registered now". Clock skew that
    /// puts registration in the future also yields zero.
    pub fn age_seconds(&self, now: DateTime<Utc>) -> i64 {
        match self.registration {
            Some(registered) => (now - registered).num_seconds().max(0),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn user_id_parses_and_displays() {
        let id: UserId = " 42 ".parse().unwrap();
        assert_eq!(id, UserId::new(42));
        assert_eq!(id.to_string(), "42");
        assert!("abc".parse::<UserId>().is_err());
    }

    #[test]
    fn age_counts_seconds_since_registration() {
        let now = Utc::now();
        let account = UserAccount::new(1, "Alice").with_registration(now - Duration::days(2));
        assert_eq!(account.age_seconds(now), 2 * 86_400);
    }

    #[test]
    fn missing_registration_is_age_zero() {
        let account = UserAccount::new(1, "Alice");
        assert_eq!(account.age_seconds(Utc::now()), 0);
    }

    #[test]
    fn future_registration_is_age_zero() {
        let now = Utc::now();
        let account = UserAccount::new(1, "Alice").with_registration(now + Duration::hours(1));
        assert_eq!(account.age_seconds(now), 0);
    }

    #[test]
    fn account_deserializes_with_defaults() {
        let account: UserAccount = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        assert_eq!(account.id, UserId::new(7));
        assert_eq!(account.global_edit_count, 0);
        assert!(!account.attached);
        assert!(account.registration.is_none());
    }
}
