//! Cached credential configuration backed by a repository.

use crate::connection::Database;
use crate::error::StorageResult;
use crate::repositories::{CredentialRepository, SqliteCredentialRepository};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;
use warden_core::{AdminPassword, CardUid, CredentialConfig, Pin};

/// Owner of the live [`CredentialConfig`].
///
/// Readers borrow the configuration through [`read`](Self::read); nothing is
/// copied per evaluation. Every mutation updates the cache first and then
/// persists it. A failed write is returned to the caller while the cache keeps
/// the new value, so the device behaves consistently until the next reboot.
///
/// The guard returned by `read` must not be held across an `.await`.
#[derive(Debug)]
pub struct CredentialStore<R = SqliteCredentialRepository> {
    repository: R,
    cache: RwLock<CredentialConfig>,
}

impl CredentialStore<SqliteCredentialRepository> {
    /// Open the store over a migrated database.
    pub async fn from_database(db: &Database) -> StorageResult<Self> {
        Self::open(SqliteCredentialRepository::new(db.pool().clone())).await
    }
}

impl<R: CredentialRepository> CredentialStore<R> {
    /// Load the persisted configuration, seeding factory defaults on first
    /// boot.
    pub async fn open(repository: R) -> StorageResult<Self> {
        let config = match repository.load().await? {
            Some(config) => {
                info!(cards = config.card_count(), "credentials loaded");
                config
            }
            None => {
                let config = CredentialConfig::default();
                repository.replace_all(&config).await?;
                info!("credential defaults installed");
                config
            }
        };

        Ok(Self {
            repository,
            cache: RwLock::new(config),
        })
    }

    /// Borrow the live configuration.
    pub fn read(&self) -> RwLockReadGuard<'_, CredentialConfig> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CredentialConfig> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clone of the live configuration.
    pub fn snapshot(&self) -> CredentialConfig {
        self.read().clone()
    }

    pub fn is_authorized(&self, uid: CardUid) -> bool {
        self.read().is_authorized(uid)
    }

    pub async fn set_door_pin(&self, pin: Pin) -> StorageResult<()> {
        self.write().set_door_pin(pin.clone());
        info!("door PIN changed");
        self.repository.save_door_pin(&pin).await
    }

    pub async fn set_admin_password(&self, password: AdminPassword) -> StorageResult<()> {
        self.write().set_admin_password(password.clone());
        info!("admin password changed");
        self.repository.save_admin_password(&password).await
    }

    /// Authorize a card, returning its slot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Credential` for a duplicate or when every slot
    /// is taken; nothing is written in either case.
    pub async fn add_card(&self, uid: CardUid) -> StorageResult<usize> {
        let slot = self.write().add_card(uid)?;
        info!(%uid, slot, "card authorized");
        self.repository.insert_card(slot, uid).await?;
        Ok(slot)
    }

    /// Revoke a card.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Credential` if the card was not authorized.
    pub async fn remove_card(&self, uid: CardUid) -> StorageResult<()> {
        self.write().remove_card(uid)?;
        info!(%uid, "card revoked");
        self.repository.delete_card(uid).await?;
        Ok(())
    }

    /// Restore the factory PIN and password and revoke every card.
    pub async fn factory_reset(&self) -> StorageResult<()> {
        let defaults = CredentialConfig::default();
        *self.write() = defaults.clone();
        info!("credentials reset to factory defaults");
        self.repository.replace_all(&defaults).await
    }
}
