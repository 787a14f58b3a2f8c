//! Security states and transition records.
//!
//! # Valid Transitions
//!
//! - Armed → Disarmed / EntryDelay / Locked
//! - EntryDelay → Disarmed / Triggered / Locked
//! - Triggered → Disarmed / Locked
//! - Locked → Triggered
//! - Disarmed → ExitDelay
//! - ExitDelay → Armed
//!
//! Lockout expiry deliberately returns to `Triggered`, never `Armed`: the
//! alarm keeps sounding until someone presents a valid credential.

use serde::{Deserialize, Serialize};
use std::fmt;
use warden_core::Tick;

/// Lifecycle state of the protected opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityState {
    /// Monitoring motion and credentials.
    Armed,

    /// Grace period after motion; a valid credential disarms silently.
    EntryDelay,

    /// Grace period for leaving after the door relocks.
    ExitDelay,

    /// Alarm sounding until a valid credential is presented.
    Triggered,

    /// Door unlocked for the disarm window.
    Disarmed,

    /// Brute-force penalty; all input is discarded.
    Locked,
}

impl fmt::Display for SecurityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SecurityState::Armed => "ARMED",
            SecurityState::EntryDelay => "ENTRY_DELAY",
            SecurityState::ExitDelay => "EXIT_DELAY",
            SecurityState::Triggered => "TRIGGERED",
            SecurityState::Disarmed => "DISARMED",
            SecurityState::Locked => "LOCKED",
        };
        f.write_str(name)
    }
}

impl SecurityState {
    /// Check if transition to `target` is allowed from this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_engine::SecurityState;
    ///
    /// assert!(SecurityState::Locked.can_transition_to(SecurityState::Triggered));
    /// assert!(!SecurityState::Locked.can_transition_to(SecurityState::Armed));
    /// ```
    pub fn can_transition_to(self, target: SecurityState) -> bool {
        use SecurityState::*;

        matches!(
            (self, target),
            (Armed, Disarmed | EntryDelay | Locked)
                | (EntryDelay, Disarmed | Triggered | Locked)
                | (Triggered, Disarmed | Locked)
                | (Locked, Triggered)
                | (Disarmed, ExitDelay)
                | (ExitDelay, Armed)
        )
    }

    /// Whether credentials presented in this state are evaluated.
    pub fn accepts_credentials(self) -> bool {
        matches!(
            self,
            SecurityState::Armed | SecurityState::EntryDelay | SecurityState::Triggered
        )
    }
}

/// A single state transition, stamped with the tick it happened at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: SecurityState,
    pub to: SecurityState,
    pub at: Tick,
}

impl StateTransition {
    pub fn new(from: SecurityState, to: SecurityState, at: Tick) -> Self {
        Self { from, to, at }
    }

    /// Milliseconds since the transition, as seen at `now`.
    pub fn elapsed(&self, now: Tick) -> u32 {
        now.elapsed_since(self.at)
    }
}

impl fmt::Display for StateTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} at {}", self.from, self.to, self.at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use SecurityState::*;

    const ALL: [SecurityState; 6] = [Armed, EntryDelay, ExitDelay, Triggered, Disarmed, Locked];

    #[rstest]
    #[case(Armed, Disarmed)]
    #[case(Armed, EntryDelay)]
    #[case(Armed, Locked)]
    #[case(EntryDelay, Disarmed)]
    #[case(EntryDelay, Triggered)]
    #[case(EntryDelay, Locked)]
    #[case(Triggered, Disarmed)]
    #[case(Triggered, Locked)]
    #[case(Locked, Triggered)]
    #[case(Disarmed, ExitDelay)]
    #[case(ExitDelay, Armed)]
    fn test_valid_transitions(#[case] from: SecurityState, #[case] to: SecurityState) {
        assert!(from.can_transition_to(to));
    }

    #[rstest]
    #[case(Locked, Armed)]
    #[case(Locked, Disarmed)]
    #[case(Disarmed, Armed)]
    #[case(ExitDelay, Triggered)]
    #[case(Triggered, Armed)]
    #[case(Armed, Triggered)]
    fn test_invalid_transitions(#[case] from: SecurityState, #[case] to: SecurityState) {
        assert!(!from.can_transition_to(to));
    }

    #[test]
    fn test_no_self_transitions() {
        for state in ALL {
            assert!(!state.can_transition_to(state), "{state}");
        }
    }

    #[test]
    fn test_every_state_has_an_exit() {
        for state in ALL {
            assert!(ALL.iter().any(|&to| state.can_transition_to(to)), "{state}");
        }
    }

    #[test]
    fn test_display_matches_serde() {
        for state in ALL {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{state}\""));
        }
    }

    #[test]
    fn test_credentials_evaluated() {
        assert!(Armed.accepts_credentials());
        assert!(Triggered.accepts_credentials());
        assert!(!Locked.accepts_credentials());
        assert!(!ExitDelay.accepts_credentials());
        assert!(!Disarmed.accepts_credentials());
    }

    #[test]
    fn test_transition_elapsed_wraps() {
        let transition = StateTransition::new(Armed, EntryDelay, Tick::from_millis(u32::MAX - 9));
        assert_eq!(transition.elapsed(Tick::from_millis(10)), 20);
        assert_eq!(transition.to_string(), format!("ARMED -> ENTRY_DELAY at {}ms", u32::MAX - 9));
    }
}
