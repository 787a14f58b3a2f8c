//! Logging and persistence of security events.

use crate::event::SecurityEvent;
use chrono::Utc;
use tracing::{info, warn};
use warden_core::{CardUid, Modality};
use warden_storage::{AccessLogRepository, SqliteAccessLogRepository};

/// Sink for drained [`SecurityEvent`]s.
///
/// Every event is logged. Credential outcomes are also written to the
/// access log when a repository is attached; a failed write is logged and
/// otherwise ignored.
#[derive(Debug, Clone, Default)]
pub struct AuditTrail {
    repository: Option<SqliteAccessLogRepository>,
}

impl AuditTrail {
    /// Log only, persist nothing.
    pub fn log_only() -> Self {
        Self::default()
    }

    pub fn with_repository(repository: SqliteAccessLogRepository) -> Self {
        Self {
            repository: Some(repository),
        }
    }

    pub async fn record(&self, event: &SecurityEvent) {
        log_event(event);

        let Some(repository) = &self.repository else {
            return;
        };
        let Some(entry) = event.to_access_log(Utc::now()) else {
            return;
        };
        if let Err(error) = repository.create(&entry).await {
            warn!(%error, "access log entry not written");
        }
    }
}

fn credential_label(modality: Modality, card: Option<CardUid>) -> String {
    match (modality, card) {
        (Modality::Card, Some(uid)) => uid.to_string(),
        (Modality::Card, None) => "unreadable card".to_string(),
        (Modality::Keypad, _) => "PIN".to_string(),
    }
}

fn log_event(event: &SecurityEvent) {
    match *event {
        SecurityEvent::StateChanged(transition) => {
            info!(from = %transition.from, to = %transition.to, at = %transition.at, "security state changed");
        }
        SecurityEvent::CredentialAccepted {
            modality,
            card,
            state,
            ..
        } => {
            info!(%modality, credential = %credential_label(modality, card), %state, "credential accepted");
        }
        SecurityEvent::CredentialRejected {
            modality,
            card,
            state,
            failed_attempts,
            ..
        } => {
            warn!(
                %modality,
                credential = %credential_label(modality, card),
                %state,
                failed_attempts,
                "credential rejected"
            );
        }
        SecurityEvent::AlarmRaised { intensity, .. } => {
            warn!(%intensity, "alarm intensity raised");
        }
        SecurityEvent::LockoutEngaged {
            failed_attempts, ..
        } => {
            warn!(failed_attempts, "brute force detected, lockout engaged");
        }
        SecurityEvent::LockoutExpired { .. } => {
            info!("lockout expired, alarm remains active");
        }
        SecurityEvent::DoorUnlocked { .. } => info!("door unlocked"),
        SecurityEvent::DoorLocked { .. } => info!("door relocked"),
    }
}
