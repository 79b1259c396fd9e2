//! Eligibility: the edit-count and account-age threshold

use crate::account::UserAccount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// True iff both thresholds are met. Bounds are inclusive.
pub fn is_eligible(
    account_age_seconds: i64,
    global_edit_count: i64,
    min_edit_count: i64,
    min_age_days: i64,
) -> bool {
    global_edit_count >= min_edit_count
        && account_age_seconds >= min_age_days.saturating_mul(SECONDS_PER_DAY)
}

/// The two configured thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub min_edit_count: u64,
    pub min_age_days: u64,
}

impl Thresholds {
    pub fn new(min_edit_count: u64, min_age_days: u64) -> Self {
        Self {
            min_edit_count,
            min_age_days,
        }
    }

    /// Evaluate an account at `now`.
    pub fn is_met(&self, account: &UserAccount, now: DateTime<Utc>) -> bool {
        is_eligible(
            account.age_seconds(now),
            clamp(account.global_edit_count),
            clamp(self.min_edit_count),
            clamp(self.min_age_days),
        )
    }
}

fn clamp(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const EDITS: i64 = 500;
    const DAYS: i64 = 182;

    #[test]
    fn below_edit_count_is_not_eligible() {
        for edits in [0, 1, 499] {
            assert!(!is_eligible(365 * SECONDS_PER_DAY, edits, EDITS, DAYS));
        }
    }

    #[test]
    fn below_age_is_not_eligible() {
        for age in [0, 1, DAYS * SECONDS_PER_DAY - 1] {
            assert!(!is_eligible(age, 10_000, EDITS, DAYS));
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(is_eligible(DAYS * SECONDS_PER_DAY, EDITS, EDITS, DAYS));
    }

    #[test]
    fn zero_thresholds_admit_everyone() {
        assert!(is_eligible(0, 0, 0, 0));
    }

    #[test]
    fn huge_age_threshold_does_not_overflow() {
        assert!(!is_eligible(i64::MAX - 1, 1, 0, i64::MAX));
    }

    #[test]
    fn thresholds_evaluate_accounts() {
        let now = Utc::now();
        let thresholds = Thresholds::new(500, 182);

        let veteran = UserAccount::new(1, "User1")
            .with_edit_count(650)
            .with_registration(now - Duration::days(365));
        let newcomer = UserAccount::new(2, "User2")
            .with_edit_count(50)
            .with_registration(now - Duration::days(180));

        assert!(thresholds.is_met(&veteran, now));
        assert!(!thresholds.is_met(&newcomer, now));
    }

    #[test]
    fn unknown_registration_fails_nonzero_age_threshold() {
        let account = UserAccount::new(1, "Old").with_edit_count(10_000);
        assert!(!Thresholds::new(500, 182).is_met(&account, Utc::now()));
        assert!(Thresholds::new(500, 0).is_met(&account, Utc::now()));
    }
}
