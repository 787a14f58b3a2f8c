use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warden_core::{CardUid, Modality};

/// Placeholder stored in place of a keypad credential.
pub const MASKED_PIN: &str = "PIN";

/// Access log entry for one credential presented to the device
///
/// Both accepted and rejected credentials are recorded. The PIN itself is
/// never stored; keypad entries carry [`MASKED_PIN`] as their credential.
///
/// # Fields
///
/// * `id` - Auto-increment primary key
/// * `modality` - `"keypad"` or `"card"`
/// * `credential` - Card identifier in hex, or `"PIN"`
/// * `granted` - Whether the credential was accepted
/// * `state` - Security state the credential was evaluated in
/// * `timestamp` - When the credential was evaluated
/// * `created_at` - When the row was written
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use warden_core::{CardUid, Modality};
/// use warden_storage::models::AccessLog;
///
/// let uid = CardUid::new(0xDEAD_BEEF).unwrap();
/// let log = AccessLog::card(uid, false, "ARMED", Utc::now());
///
/// assert_eq!(log.credential, "DEADBEEF");
/// assert_eq!(log.get_modality(), Some(Modality::Card));
/// assert!(log.was_denied());
///
/// let pin = AccessLog::keypad(true, "ENTRY_DELAY", Utc::now());
/// assert_eq!(pin.credential, "PIN");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccessLog {
    pub id: i64,
    pub modality: String,
    pub credential: String,
    pub granted: bool,
    pub state: String,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AccessLog {
    /// Create a new access log entry
    pub fn new(
        modality: Modality,
        credential: impl Into<String>,
        granted: bool,
        state: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0, // Will be set by database
            modality: modality.to_string(),
            credential: credential.into(),
            granted,
            state: state.into(),
            timestamp,
            created_at: Utc::now(),
        }
    }

    /// Entry for a card read
    pub fn card(
        uid: CardUid,
        granted: bool,
        state: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(Modality::Card, uid.to_string(), granted, state, timestamp)
    }

    /// Entry for a completed PIN, with the PIN masked
    pub fn keypad(granted: bool, state: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(Modality::Keypad, MASKED_PIN, granted, state, timestamp)
    }

    /// Get the modality as an enum
    pub fn get_modality(&self) -> Option<Modality> {
        match self.modality.as_str() {
            "keypad" => Some(Modality::Keypad),
            "card" => Some(Modality::Card),
            _ => None,
        }
    }

    pub fn was_granted(&self) -> bool {
        self.granted
    }

    pub fn was_denied(&self) -> bool {
        !self.granted
    }
}
