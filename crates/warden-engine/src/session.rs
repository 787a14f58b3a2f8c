use crate::state::SecurityState;
use serde::{Deserialize, Serialize};
use warden_core::{AlarmIntensity, Tick};

/// Mutable state of the security state machine.
///
/// The machine is the only writer; everything else sees a copy through
/// [`SecurityStateMachine::session`](crate::SecurityStateMachine::session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritySession {
    pub state: SecurityState,

    /// Reference point for the current state's timeout.
    ///
    /// While disarmed this moves once more, to the door-close request, so
    /// the auto-lock settle is timed from the relock.
    pub state_entered_at: Tick,

    /// Invalid credentials since the last success or lockout expiry.
    pub failed_attempts: u8,

    pub alarm_level: AlarmIntensity,

    /// Door-open request and unlock notice already issued this disarm.
    pub door_unlock_acknowledged: bool,

    /// Door-close requested; waiting for the settle time before exit delay.
    pub auto_lock_pending: bool,

    /// Last tone or indicator alternation.
    pub toggled_at: Tick,

    /// Phase of the current alternation (high tone / indicator on).
    pub toggle_phase: bool,
}

impl SecuritySession {
    pub fn new(alarm_level: AlarmIntensity) -> Self {
        Self {
            state: SecurityState::Armed,
            state_entered_at: Tick::ZERO,
            failed_attempts: 0,
            alarm_level,
            door_unlock_acknowledged: false,
            auto_lock_pending: false,
            toggled_at: Tick::ZERO,
            toggle_phase: false,
        }
    }

    /// Milliseconds spent in the current state (or auto-lock phase).
    pub fn time_in_state(&self, now: Tick) -> u32 {
        now.elapsed_since(self.state_entered_at)
    }
}
