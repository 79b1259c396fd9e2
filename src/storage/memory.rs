//! In-memory notification state store

use super::traits::{NotificationState, NotificationStateStore, StorageResult};
use crate::account::UserId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Notification state kept in a concurrent map. Nothing is persisted.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    states: DashMap<UserId, NotificationState>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with a stored record
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl NotificationStateStore for InMemoryStateStore {
    fn get(&self, user: UserId) -> StorageResult<NotificationState> {
        Ok(self.states.get(&user).map(|r| *r).unwrap_or_default())
    }

    fn set(&self, user: UserId, state: NotificationState) -> StorageResult<()> {
        match state {
            NotificationState::Unset => {
                self.states.remove(&user);
            }
            _ => {
                self.states.insert(user, state);
            }
        }
        Ok(())
    }

    fn compare_and_set(
        &self,
        user: UserId,
        expected: NotificationState,
        new: NotificationState,
    ) -> StorageResult<bool> {
        // The entry holds the shard lock, so read and write are one step.
        match self.states.entry(user) {
            Entry::Occupied(mut entry) => {
                if *entry.get() != expected {
                    return Ok(false);
                }
                if new == NotificationState::Unset {
                    entry.remove();
                } else {
                    entry.insert(new);
                }
                Ok(true)
            }
            Entry::Vacant(entry) => {
                if expected != NotificationState::Unset {
                    return Ok(false);
                }
                if new != NotificationState::Unset {
                    entry.insert(new);
                }
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_user_is_unset() {
        let store = InMemoryStateStore::new();
        assert_eq!(store.get(UserId::new(1)).unwrap(), NotificationState::Unset);
    }

    #[test]
    fn set_unset_removes_record() {
        let store = InMemoryStateStore::new();
        store.set(UserId::new(1), NotificationState::No).unwrap();
        assert_eq!(store.len(), 1);
        store.set(UserId::new(1), NotificationState::Unset).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn compare_and_set_only_swaps_expected() {
        let store = InMemoryStateStore::new();
        let user = UserId::new(9);

        assert!(!store.compare_and_set(user, NotificationState::No, NotificationState::Yes).unwrap());
        assert!(store.compare_and_set(user, NotificationState::Unset, NotificationState::No).unwrap());
        assert!(store.compare_and_set(user, NotificationState::No, NotificationState::Yes).unwrap());
        assert!(!store.compare_and_set(user, NotificationState::No, NotificationState::Yes).unwrap());
        assert_eq!(store.get(user).unwrap(), NotificationState::Yes);
    }
}
