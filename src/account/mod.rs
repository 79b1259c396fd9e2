//! Global (federated) accounts
//!
//! The global account is the source of truth for registration time and
//! edit count. This crate only reads it, through `GlobalAccountDirectory`.

mod directory;
mod types;

pub use directory::{AccountError, AccountResult, GlobalAccountDirectory, InMemoryAccountDirectory};
pub use types::{UserAccount, UserId};
