use crate::error::{StorageError, StorageResult};
use warden_core::{AdminPassword, CardUid, CredentialConfig, Pin};

/// Row of the single-row `credentials` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredCredentials {
    pub door_pin: String,
    pub admin_password: String,
}

/// Row of the `authorized_cards` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct StoredCard {
    pub slot: i64,
    pub uid: i64,
}

impl StoredCard {
    pub fn new(slot: usize, uid: CardUid) -> Self {
        Self {
            slot: slot as i64,
            uid: i64::from(uid.as_u32()),
        }
    }
}

/// Rebuild the in-memory configuration from stored rows
///
/// # Errors
///
/// Returns `StorageError::Corrupt` if a stored value no longer passes
/// validation.
pub fn assemble(secrets: StoredCredentials, cards: &[StoredCard]) -> StorageResult<CredentialConfig> {
    let pin = Pin::new(&secrets.door_pin)
        .map_err(|e| StorageError::Corrupt(format!("door PIN: {e}")))?;
    let password = AdminPassword::new(&secrets.admin_password)
        .map_err(|e| StorageError::Corrupt(format!("admin password: {e}")))?;

    let mut config = CredentialConfig::new(pin, password);
    for card in cards {
        let slot = usize::try_from(card.slot)
            .map_err(|_| StorageError::Corrupt(format!("card slot {}", card.slot)))?;
        let uid = u32::try_from(card.uid)
            .ok()
            .and_then(CardUid::new)
            .ok_or_else(|| StorageError::Corrupt(format!("card uid {}", card.uid)))?;
        config
            .set_slot(slot, Some(uid))
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;
    }
    Ok(config)
}
