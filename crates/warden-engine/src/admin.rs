//! Remote administration touchpoints.
//!
//! The console is a typed API over the [`CredentialStore`]; whatever
//! transport carries the commands is out of scope. Every mutation needs an
//! active session opened with the admin password.

use crate::error::{EngineError, EngineResult};
use std::sync::Arc;
use tracing::{info, warn};
use warden_core::{AdminPassword, CardUid, Error, Pin};
use warden_storage::{CredentialRepository, CredentialStore, SqliteCredentialRepository};

/// Administrative session over the credential store.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use warden_engine::AdminConsole;
/// use warden_storage::{CredentialStore, Database};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Database::in_memory().await?;
/// let store = Arc::new(CredentialStore::from_database(&db).await?);
/// let mut console = AdminConsole::new(store);
///
/// assert!(console.login("123456"));
/// console.add_card("DE AD BE EF").await?;
/// console.set_door_pin("4821").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AdminConsole<R = SqliteCredentialRepository> {
    store: Arc<CredentialStore<R>>,
    logged_in: bool,
}

impl<R: CredentialRepository> AdminConsole<R> {
    pub fn new(store: Arc<CredentialStore<R>>) -> Self {
        Self {
            store,
            logged_in: false,
        }
    }

    /// Open a session if `password` matches the admin password.
    pub fn login(&mut self, password: &str) -> bool {
        if self.check_admin_password(password) {
            self.logged_in = true;
            info!("admin session opened");
        } else {
            warn!("admin login rejected");
        }
        self.logged_in
    }

    pub fn logout(&mut self) {
        if self.logged_in {
            info!("admin session closed");
        }
        self.logged_in = false;
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// Constant-time comparison against the stored admin password.
    pub fn check_admin_password(&self, candidate: &str) -> bool {
        self.store.read().admin_password().verify(candidate)
    }

    fn require_session(&self) -> EngineResult<()> {
        if self.logged_in {
            Ok(())
        } else {
            Err(Error::NotAuthenticated.into())
        }
    }

    /// Replace the door PIN: exactly four keys from `0-9`, `A-D` and `*`.
    pub async fn set_door_pin(&self, pin: &str) -> EngineResult<()> {
        self.require_session()?;
        let pin = Pin::new(pin)?;
        self.store.set_door_pin(pin).await?;
        Ok(())
    }

    /// Replace the admin password (1-9 characters). The current session
    /// stays open.
    pub async fn set_admin_password(&self, password: &str) -> EngineResult<()> {
        self.require_session()?;
        let password = AdminPassword::new(password)?;
        self.store.set_admin_password(password).await?;
        Ok(())
    }

    /// Authorize a card given as hex (spaces and a `0x` prefix allowed),
    /// returning the slot it was stored in.
    pub async fn add_card(&self, uid: &str) -> EngineResult<usize> {
        self.require_session()?;
        let uid: CardUid = uid.parse()?;
        Ok(self.store.add_card(uid).await?)
    }

    pub async fn remove_card(&self, uid: &str) -> EngineResult<()> {
        self.require_session()?;
        let uid: CardUid = uid.parse()?;
        self.store.remove_card(uid).await?;
        Ok(())
    }

    /// Occupied slots in slot order.
    pub fn list_cards(&self) -> EngineResult<Vec<(usize, CardUid)>> {
        self.require_session()?;
        Ok(self.store.read().cards().collect())
    }

    /// Restore factory credentials and revoke every card.
    ///
    /// The admin password reverts too; the session is closed.
    pub async fn factory_reset(&mut self) -> EngineResult<()> {
        self.require_session()?;
        let result = self.store.factory_reset().await;
        self.logout();
        result.map_err(EngineError::from)
    }
}
