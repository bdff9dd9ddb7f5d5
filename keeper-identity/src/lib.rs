//! Installation identity for keeper.
//!
//! This crate handles:
//! - Deriving a short, prefixed identity token for an installation
//! - Persisting it write-once, either as a plain identity file or as an
//!   obfuscated token injected into the host's `.env`
//! - Durable per-domain registration markers
//!
//! # Design Principles
//!
//! - **Stable**: an intact artifact is returned unchanged on every call
//! - **First writer wins**: concurrent first starts converge on one value
//! - **Never fatal**: an unwritable root degrades to an in-memory identity
//!
//! The token cipher is keyed from material stored beside the artifact. It
//! obfuscates; it does not protect against anyone who can read the host's files.

mod cipher;
pub mod env_file;
mod error;
mod flag_file;
mod store;
mod strategy;

pub use cipher::{DerivedKey, TokenCipher};
pub use env_file::EnvFileStore;
pub use error::{IdentityError, IdentityResult};
pub use flag_file::{FlagFileStore, IDENTITY_FILE, REGISTERED_FLAG_PREFIX};
pub use store::{Identity, IdentityProvider, IdentityStore, StorageKind};
pub use strategy::{AppSecret, IdentitySeed, IdentityStrategy};
