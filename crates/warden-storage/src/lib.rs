//! Persistence for the Warden access controller.
//!
//! This crate keeps the credential configuration (door PIN, admin password and
//! the 50 authorized card slots) and the access audit trail in SQLite.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool manager with embedded migrations
//! - [`CredentialRepository`], [`AccessLogRepository`] - Data access traits
//! - [`CredentialStore`] - Write-through cache the security engine reads from
//!
//! The engine never touches the database from its step function. It borrows
//! the cached [`warden_core::CredentialConfig`] from the store; only the admin
//! console and the audit task perform I/O.
//!
//! # Example
//!
//! ```no_run
//! use warden_core::CardUid;
//! use warden_storage::{CredentialStore, Database, DatabaseConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("warden.db")).await?;
//! let store = CredentialStore::from_database(&db).await?;
//!
//! let uid: CardUid = "DE AD BE EF".parse()?;
//! let slot = store.add_card(uid).await?;
//! assert!(store.is_authorized(uid));
//! println!("card stored in slot {slot}");
//! # Ok(())
//! # }
//! ```
//!
//! # Security
//!
//! The PIN and admin password are stored as entered because the device has
//! to compare them against raw keypad input. The audit trail never records
//! the PIN itself; keypad entries carry [`models::MASKED_PIN`].

pub mod connection;
pub mod error;
pub mod models;
pub mod repositories;
pub mod store;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use models::AccessLog;
pub use repositories::{
    AccessLogRepository, CredentialRepository, SqliteAccessLogRepository,
    SqliteCredentialRepository,
};
pub use store::CredentialStore;
