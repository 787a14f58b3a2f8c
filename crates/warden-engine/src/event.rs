//! Events emitted by the security state machine.
//!
//! The machine only queues events; the runtime drains them after every
//! step, logs them and persists credential outcomes to the audit trail.

use crate::state::{SecurityState, StateTransition};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warden_core::{AlarmIntensity, CardUid, Modality, Tick};
use warden_storage::models::AccessLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SecurityEvent {
    StateChanged(StateTransition),

    /// A credential was accepted in `state`.
    CredentialAccepted {
        modality: Modality,
        card: Option<CardUid>,
        state: SecurityState,
        at: Tick,
    },

    /// A credential was rejected in `state`; `failed_attempts` is the shared
    /// counter after this step.
    CredentialRejected {
        modality: Modality,
        card: Option<CardUid>,
        state: SecurityState,
        failed_attempts: u8,
        at: Tick,
    },

    /// The alarm got louder after a rejection while triggered.
    AlarmRaised { intensity: AlarmIntensity, at: Tick },

    LockoutEngaged { failed_attempts: u8, at: Tick },

    LockoutExpired { at: Tick },

    DoorUnlocked { at: Tick },

    DoorLocked { at: Tick },
}

impl SecurityEvent {
    /// Tick the event was raised at.
    pub fn at(&self) -> Tick {
        match *self {
            SecurityEvent::StateChanged(transition) => transition.at,
            SecurityEvent::CredentialAccepted { at, .. }
            | SecurityEvent::CredentialRejected { at, .. }
            | SecurityEvent::AlarmRaised { at, .. }
            | SecurityEvent::LockoutEngaged { at, .. }
            | SecurityEvent::LockoutExpired { at }
            | SecurityEvent::DoorUnlocked { at }
            | SecurityEvent::DoorLocked { at } => at,
        }
    }

    /// Audit trail row for a credential outcome.
    ///
    /// Keypad credentials are masked; other events return `None`.
    pub fn to_access_log(&self, timestamp: DateTime<Utc>) -> Option<AccessLog> {
        let (modality, card, granted, state) = match *self {
            SecurityEvent::CredentialAccepted {
                modality,
                card,
                state,
                ..
            } => (modality, card, true, state),
            SecurityEvent::CredentialRejected {
                modality,
                card,
                state,
                ..
            } => (modality, card, false, state),
            _ => return None,
        };

        let state = state.to_string();
        Some(match (modality, card) {
            (Modality::Card, Some(uid)) => AccessLog::card(uid, granted, state, timestamp),
            (Modality::Card, None) => {
                AccessLog::new(Modality::Card, "UNKNOWN", granted, state, timestamp)
            }
            (Modality::Keypad, _) => AccessLog::keypad(granted, state, timestamp),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_rejection_logs_uid() {
        let event = SecurityEvent::CredentialRejected {
            modality: Modality::Card,
            card: CardUid::new(0xCAFE_F00D),
            state: SecurityState::Armed,
            failed_attempts: 2,
            at: Tick::from_millis(3000),
        };

        let log = event.to_access_log(Utc::now()).unwrap();
        assert_eq!(log.credential, "CAFEF00D");
        assert_eq!(log.state, "ARMED");
        assert!(log.was_denied());
        assert_eq!(event.at(), Tick::from_millis(3000));
    }

    #[test]
    fn test_keypad_acceptance_is_masked() {
        let event = SecurityEvent::CredentialAccepted {
            modality: Modality::Keypad,
            card: None,
            state: SecurityState::EntryDelay,
            at: Tick::ZERO,
        };

        let log = event.to_access_log(Utc::now()).unwrap();
        assert_eq!(log.credential, "PIN");
        assert_eq!(log.state, "ENTRY_DELAY");
        assert!(log.was_granted());
    }

    #[test]
    fn test_non_credential_events_not_logged() {
        let event = SecurityEvent::DoorUnlocked { at: Tick::ZERO };
        assert!(event.to_access_log(Utc::now()).is_none());
    }

    #[test]
    fn test_serialized_tag() {
        let event = SecurityEvent::LockoutExpired {
            at: Tick::from_millis(12),
        };
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["event"], "lockout_expired");
        assert_eq!(json["at"], 12);
    }
}
