//! GlobalAccountDirectory trait and the in-memory directory

use super::types::{UserAccount, UserId};
use async_trait::async_trait;
use dashmap::DashMap;
use std::path::Path;
use thiserror::Error;

/// Errors from global account lookup
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("account service unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid account file: {0}")]
    Parse(String),
}

/// Result type for account lookups
pub type AccountResult<T> = Result<T, AccountError>;

/// Lookup of global accounts by local user id
///
/// `Ok(None)` means the user has no global account at all; callers treat
/// that the same as an unattached account.
#[async_trait]
pub trait GlobalAccountDirectory: Send + Sync {
    async fn global_account(&self, user: UserId) -> AccountResult<Option<UserAccount>>;
}

/// Directory backed by a concurrent map
///
/// Used by the CLI (populated from an account file) and by tests.
#[derive(Debug, Default)]
pub struct InMemoryAccountDirectory {
    accounts: DashMap<UserId, UserAccount>,
}

impl InMemoryAccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load accounts from a YAML or JSON file holding a list of accounts.
    ///
    /// JSON is valid YAML, so a single parser covers both.
    pub fn from_file(path: impl AsRef<Path>) -> AccountResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let accounts: Vec<UserAccount> = serde_yaml::from_str(&contents)
            .map_err(|e| AccountError::Parse(format!("{}: {}", path.display(), e)))?;
        let directory = Self::new();
        for account in accounts {
            directory.upsert(account);
        }
        Ok(directory)
    }

    /// Insert or replace an account
    pub fn upsert(&self, account: UserAccount) {
        self.accounts.insert(account.id, account);
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl GlobalAccountDirectory for InMemoryAccountDirectory {
    async fn global_account(&self, user: UserId) -> AccountResult<Option<UserAccount>> {
        Ok(self.accounts.get(&user).map(|r| r.clone()))
    }
}
