//! Zero-knowledge vault protocol for Lockbox.
//!
//! Builds on `lockbox-crypto` to provide:
//! - Account registration, unlock and master password change
//! - A caller-owned unlocked session holding the identity private key
//! - Secret sealing with one envelope per authorized principal
//! - Group keypairs shared through per-member envelopes
//! - Access resolution across direct and group envelopes
//!
//! Storage, authentication and transport are the embedder's business: every
//! operation takes the records and principal ids it needs as arguments and
//! returns records to persist.

pub mod access;
pub mod account;
pub mod config;
pub mod error;
pub mod group;
pub mod membership;
pub mod secrets;
pub mod session;
pub mod types;

pub use access::{open_secret, resolve_and_decrypt, resolve_data_key};
pub use account::{change_master_password, register, unlock_keypair};
pub use config::VaultConfig;
pub use error::{DenyReason, PreconditionError, VaultError, VaultResult};
pub use group::{add_member, create_group, open_group_private_key, CreatedGroup};
pub use membership::{MembershipLookup, MembershipRegistry};
pub use secrets::{reseal_secret, seal_secret};
pub use session::{UnlockedIdentity, VaultSession};
pub use types::*;
