//! Security state machine timing.

use serde::{Deserialize, Serialize};
use warden_core::constants::{
    ALARM_BLINK_MS, ALARM_INTENSITY_INITIAL, ALARM_INTENSITY_MAX, ALARM_INTENSITY_STEP,
    AUTO_LOCK_DELAY_MS, BOOT_SETTLE_MS, BRUTE_FORCE_LIMIT, DISARM_WINDOW_MS, ENTRY_DELAY_MS,
    EXIT_BLINK_MS, EXIT_DELAY_MS, LOCKOUT_MS, LOCKOUT_SIREN_MS,
};
use warden_core::{AlarmIntensity, Error, Result};

/// Durations and limits of the security state machine, in milliseconds.
///
/// Every field defaults to the firmware constant of the same name, so a JSON
/// override only needs the values it changes:
///
/// ```
/// use warden_engine::SecurityTiming;
///
/// let timing: SecurityTiming = serde_json::from_str(r#"{"entry_delay_ms": 8000}"#).unwrap();
/// assert_eq!(timing.entry_delay_ms, 8000);
/// assert_eq!(timing.exit_delay_ms, 10000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityTiming {
    pub boot_settle_ms: u32,
    pub entry_delay_ms: u32,
    pub disarm_window_ms: u32,
    pub auto_lock_delay_ms: u32,
    pub exit_delay_ms: u32,
    pub exit_blink_ms: u32,
    pub alarm_blink_ms: u32,
    pub lockout_ms: u32,
    pub lockout_siren_ms: u32,
    pub brute_force_limit: u8,
    pub alarm_initial: u8,
    pub alarm_step: u8,
    pub alarm_max: u8,
}

impl Default for SecurityTiming {
    fn default() -> Self {
        Self {
            boot_settle_ms: BOOT_SETTLE_MS,
            entry_delay_ms: ENTRY_DELAY_MS,
            disarm_window_ms: DISARM_WINDOW_MS,
            auto_lock_delay_ms: AUTO_LOCK_DELAY_MS,
            exit_delay_ms: EXIT_DELAY_MS,
            exit_blink_ms: EXIT_BLINK_MS,
            alarm_blink_ms: ALARM_BLINK_MS,
            lockout_ms: LOCKOUT_MS,
            lockout_siren_ms: LOCKOUT_SIREN_MS,
            brute_force_limit: BRUTE_FORCE_LIMIT,
            alarm_initial: ALARM_INTENSITY_INITIAL,
            alarm_step: ALARM_INTENSITY_STEP,
            alarm_max: ALARM_INTENSITY_MAX,
        }
    }
}

impl SecurityTiming {
    pub fn initial_intensity(&self) -> AlarmIntensity {
        AlarmIntensity::new(self.alarm_initial)
    }

    pub fn max_intensity(&self) -> AlarmIntensity {
        AlarmIntensity::new(self.alarm_max)
    }

    /// Reject values the state machine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for a zero brute-force limit, a zero blink
    /// cadence or an alarm intensity outside 0-100 % ordered initial <= max.
    pub fn validate(&self) -> Result<()> {
        if self.brute_force_limit == 0 {
            return Err(Error::Config("brute_force_limit must be at least 1".into()));
        }
        if self.alarm_blink_ms == 0 || self.exit_blink_ms == 0 || self.lockout_siren_ms == 0 {
            return Err(Error::Config("blink cadences must be positive".into()));
        }
        if self.alarm_max > 100 || self.alarm_initial > self.alarm_max {
            return Err(Error::Config(format!(
                "alarm intensity must satisfy initial <= max <= 100, got {} / {}",
                self.alarm_initial, self.alarm_max
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let timing = SecurityTiming::default();
        timing.validate().unwrap();
        assert_eq!(timing.initial_intensity().percent(), 10);
        assert_eq!(timing.max_intensity().percent(), 50);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let timing = SecurityTiming {
            brute_force_limit: 0,
            ..SecurityTiming::default()
        };
        assert!(matches!(timing.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_inverted_intensity_rejected() {
        let timing = SecurityTiming {
            alarm_initial: 60,
            ..SecurityTiming::default()
        };
        assert!(timing.validate().is_err());
    }
}
