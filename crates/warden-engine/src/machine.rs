//! Security state machine.
//!
//! The machine owns the [`SecuritySession`] and is advanced by
//! [`SecurityStateMachine::update`], once per main-loop iteration. Each step
//! is non-blocking: it polls the sensor sources it is handed, requests door
//! and feedback actions, and queues [`SecurityEvent`]s for the runtime.
//!
//! # Credential evaluation
//!
//! In `Armed`, `EntryDelay` and `Triggered` both modalities are polled every
//! step. A valid credential from either wins; otherwise an invalid one from
//! either counts as a single failed attempt. Keypad and card failures share
//! one counter, and reaching the brute-force limit forces `Locked` from any
//! of the three states within the same step.
//!
//! # Examples
//!
//! ```
//! use warden_core::{CredentialConfig, Tick};
//! use warden_engine::{SecurityState, SecurityStateMachine, SecurityTiming, StepContext};
//! use warden_hardware::MotionLatch;
//! use warden_hardware::mock::{MockDoor, MockFeedback};
//! use warden_keypad::{PinOutcome, PinSource};
//! use warden_rfid::{CardScanResult, CardSource};
//! use warden_core::Pin;
//!
//! struct NoKeys;
//! impl PinSource for NoKeys {
//!     fn poll(&mut self, _: Tick, _: Option<&Pin>) -> PinOutcome { PinOutcome::Idle }
//!     fn discard_pending(&mut self) {}
//! }
//!
//! struct NoCards;
//! impl CardSource for NoCards {
//!     fn take_scan(&mut self) -> Option<CardScanResult> { None }
//!     fn discard_pending(&mut self) {}
//! }
//!
//! let (mut door, _) = MockDoor::new();
//! let (mut feedback, _) = MockFeedback::new();
//! let motion = MotionLatch::new();
//! let config = CredentialConfig::default();
//! let mut machine = SecurityStateMachine::new(SecurityTiming::default());
//!
//! let mut step = |machine: &mut SecurityStateMachine, ms: u32| {
//!     let mut ctx = StepContext {
//!         now: Tick::from_millis(ms),
//!         pin: &mut NoKeys,
//!         cards: &mut NoCards,
//!         motion: &motion,
//!         door: &mut door,
//!         feedback: &mut feedback,
//!         credentials: Some(&config),
//!     };
//!     machine.update(&mut ctx);
//! };
//!
//! motion.trigger();
//! step(&mut machine, 2500);
//! assert_eq!(machine.state(), SecurityState::EntryDelay);
//!
//! step(&mut machine, 7500);
//! assert_eq!(machine.state(), SecurityState::Triggered);
//! ```

use crate::event::SecurityEvent;
use crate::session::SecuritySession;
use crate::state::{SecurityState, StateTransition};
use crate::timing::SecurityTiming;
use std::collections::VecDeque;
use tracing::{debug, trace, warn};
use warden_core::constants::{
    ALARM_TONE_HIGH, ALARM_TONE_LOW, ERROR_CHIRP_MS, KEY_CHIRP_MS, LOCKOUT_TONE, SIREN_TONE_HIGH,
    SIREN_TONE_LOW, SUCCESS_CHIRP_MS,
};
use warden_core::{CardUid, CredentialConfig, Modality, Tick};
use warden_hardware::{
    DoorActuator, DoorPosition, FeedbackRequest, FeedbackSink, IndicatorCommand, MotionSensor,
};
use warden_keypad::{PinOutcome, PinSource};
use warden_rfid::CardSource;

/// Maximum number of state transitions kept in history.
///
/// A full disarm cycle is three transitions, so this covers the last thirty
/// or so cycles.
pub const MAX_HISTORY_SIZE: usize = 100;

/// Events kept when the runtime falls behind; the oldest are dropped.
const MAX_PENDING_EVENTS: usize = 256;

/// Collaborators for one step of the machine.
///
/// `credentials` is borrowed from the credential store for the duration of
/// the step. `None` means nothing is authorized.
pub struct StepContext<'a> {
    pub now: Tick,
    pub pin: &'a mut dyn PinSource,
    pub cards: &'a mut dyn CardSource,
    pub motion: &'a dyn MotionSensor,
    pub door: &'a mut dyn DoorActuator,
    pub feedback: &'a mut dyn FeedbackSink,
    pub credentials: Option<&'a CredentialConfig>,
}

impl StepContext<'_> {
    fn move_door(&mut self, position: DoorPosition) {
        if let Err(error) = self.door.request(position) {
            warn!(%error, %position, "door request failed");
        }
    }

    fn signal(&mut self, request: FeedbackRequest) {
        if let Err(error) = self.feedback.submit(request) {
            warn!(%error, %request, "feedback request failed");
        }
    }

    fn indicator(&mut self, on: bool) {
        let command = if on {
            IndicatorCommand::On
        } else {
            IndicatorCommand::Off
        };
        self.signal(FeedbackRequest::indicator(command));
    }

    fn discard_inputs(&mut self) {
        self.pin.discard_pending();
        self.cards.discard_pending();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthOutcome {
    None,
    Valid,
    Invalid,
}

/// Per-modality results of one credential poll.
#[derive(Debug, Clone, Copy, Default)]
struct Presented {
    pin: Option<bool>,
    card: Option<(Option<CardUid>, bool)>,
    /// The sentinel key cleared the PIN entry.
    wake: bool,
}

impl Presented {
    fn outcome(&self) -> AuthOutcome {
        let card_valid = self.card.is_some_and(|(_, authorized)| authorized);
        if self.pin == Some(true) || card_valid {
            AuthOutcome::Valid
        } else if self.pin == Some(false) || self.card.is_some() {
            AuthOutcome::Invalid
        } else {
            AuthOutcome::None
        }
    }
}

/// The access-control orchestrator.
#[derive(Debug)]
pub struct SecurityStateMachine {
    timing: SecurityTiming,
    session: SecuritySession,
    settled: bool,
    history: VecDeque<StateTransition>,
    events: VecDeque<SecurityEvent>,
}

impl SecurityStateMachine {
    pub fn new(timing: SecurityTiming) -> Self {
        Self {
            session: SecuritySession::new(timing.initial_intensity()),
            timing,
            settled: false,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
            events: VecDeque::new(),
        }
    }

    /// Clear stale sensor events, relock the door and enter `Armed`.
    pub fn start(&mut self, ctx: &mut StepContext<'_>) {
        ctx.motion.discard_pending();
        ctx.discard_inputs();
        ctx.move_door(DoorPosition::Closed);

        self.session = SecuritySession::new(self.timing.initial_intensity());
        self.session.state_entered_at = ctx.now;
        self.session.toggled_at = ctx.now;
        debug!(at = %ctx.now, "security state machine started");
    }

    /// Advance the machine by one step.
    ///
    /// Nothing happens until the boot settle time has passed since the tick
    /// counter's origin.
    pub fn update(&mut self, ctx: &mut StepContext<'_>) {
        if !self.settled {
            if !ctx.now.has_elapsed(Tick::ZERO, self.timing.boot_settle_ms) {
                return;
            }
            self.settled = true;
            debug!(at = %ctx.now, "sensors settled");
        }

        match self.session.state {
            SecurityState::Armed => self.step_armed(ctx),
            SecurityState::EntryDelay => self.step_entry_delay(ctx),
            SecurityState::Triggered => self.step_triggered(ctx),
            SecurityState::Locked => self.step_locked(ctx),
            SecurityState::Disarmed => self.step_disarmed(ctx),
            SecurityState::ExitDelay => self.step_exit_delay(ctx),
        }
    }

    fn step_armed(&mut self, ctx: &mut StepContext<'_>) {
        let presented = self.poll_credentials(ctx);
        match self.settle_credentials(&presented, ctx.now) {
            AuthOutcome::Valid => self.disarm(ctx),
            AuthOutcome::Invalid => self.check_brute_force(ctx),
            AuthOutcome::None => {
                let motion = ctx.motion.take_motion();
                if motion || presented.wake {
                    trace!(motion, wake = presented.wake, "entry delay started");
                    ctx.move_door(DoorPosition::Closed);
                    self.transition(SecurityState::EntryDelay, ctx.now);
                }
            }
        }
    }

    fn step_entry_delay(&mut self, ctx: &mut StepContext<'_>) {
        if ctx
            .now
            .has_elapsed(self.session.state_entered_at, self.timing.entry_delay_ms)
        {
            self.session.alarm_level = self.timing.initial_intensity();
            self.transition(SecurityState::Triggered, ctx.now);
        }

        let presented = self.poll_credentials(ctx);
        match self.settle_credentials(&presented, ctx.now) {
            AuthOutcome::Valid => self.disarm(ctx),
            AuthOutcome::Invalid => {
                ctx.signal(FeedbackRequest::chirp(ERROR_CHIRP_MS));
                self.check_brute_force(ctx);
            }
            AuthOutcome::None => {}
        }
    }

    fn step_triggered(&mut self, ctx: &mut StepContext<'_>) {
        if self.alternate(ctx.now, self.timing.alarm_blink_ms) {
            let pitch = if self.session.toggle_phase {
                ALARM_TONE_HIGH
            } else {
                ALARM_TONE_LOW
            };
            ctx.signal(FeedbackRequest::tone(pitch, self.session.alarm_level));
            ctx.indicator(self.session.toggle_phase);
        }

        let presented = self.poll_credentials(ctx);
        match self.settle_credentials(&presented, ctx.now) {
            AuthOutcome::Valid => self.disarm(ctx),
            AuthOutcome::Invalid => {
                self.session.alarm_level = self
                    .session
                    .alarm_level
                    .raised(self.timing.alarm_step, self.timing.alarm_max);
                self.emit(SecurityEvent::AlarmRaised {
                    intensity: self.session.alarm_level,
                    at: ctx.now,
                });
                self.check_brute_force(ctx);
            }
            AuthOutcome::None => {}
        }
    }

    fn step_locked(&mut self, ctx: &mut StepContext<'_>) {
        if self.alternate(ctx.now, self.timing.lockout_siren_ms) {
            let pitch = if self.session.toggle_phase {
                SIREN_TONE_HIGH
            } else {
                SIREN_TONE_LOW
            };
            ctx.indicator(self.session.toggle_phase);
            ctx.signal(FeedbackRequest::tone(pitch, self.session.alarm_level));
        }

        ctx.discard_inputs();

        if ctx
            .now
            .has_elapsed(self.session.state_entered_at, self.timing.lockout_ms)
        {
            self.session.failed_attempts = 0;
            self.emit(SecurityEvent::LockoutExpired { at: ctx.now });
            self.transition(SecurityState::Triggered, ctx.now);
            ctx.discard_inputs();
        }
    }

    fn step_disarmed(&mut self, ctx: &mut StepContext<'_>) {
        if !self.session.auto_lock_pending {
            if !ctx
                .now
                .has_elapsed(self.session.state_entered_at, self.timing.disarm_window_ms)
            {
                if !self.session.door_unlock_acknowledged {
                    ctx.move_door(DoorPosition::Open);
                    self.session.door_unlock_acknowledged = true;
                    self.emit(SecurityEvent::DoorUnlocked { at: ctx.now });
                }
                return;
            }

            ctx.move_door(DoorPosition::Closed);
            self.session.auto_lock_pending = true;
            self.session.state_entered_at = ctx.now;
            self.emit(SecurityEvent::DoorLocked { at: ctx.now });
        }

        if ctx
            .now
            .has_elapsed(self.session.state_entered_at, self.timing.auto_lock_delay_ms)
        {
            self.session.auto_lock_pending = false;
            self.transition(SecurityState::ExitDelay, ctx.now);
        }
    }

    fn step_exit_delay(&mut self, ctx: &mut StepContext<'_>) {
        if self.alternate(ctx.now, self.timing.exit_blink_ms) {
            ctx.indicator(self.session.toggle_phase);
        }

        if ctx
            .now
            .has_elapsed(self.session.state_entered_at, self.timing.exit_delay_ms)
        {
            ctx.indicator(false);
            ctx.motion.discard_pending();
            ctx.discard_inputs();
            self.transition(SecurityState::Armed, ctx.now);
        }
    }

    /// Flip the alternation phase if `period_ms` has passed.
    fn alternate(&mut self, now: Tick, period_ms: u32) -> bool {
        if !now.has_elapsed(self.session.toggled_at, period_ms) {
            return false;
        }
        self.session.toggled_at = now;
        self.session.toggle_phase = !self.session.toggle_phase;
        true
    }

    fn poll_credentials(&mut self, ctx: &mut StepContext<'_>) -> Presented {
        let configured_pin = ctx.credentials.map(CredentialConfig::door_pin);
        let pin_outcome = ctx.pin.poll(ctx.now, configured_pin);
        if pin_outcome.consumed_key() {
            ctx.signal(FeedbackRequest::chirp(KEY_CHIRP_MS));
        }

        let card = ctx.cards.take_scan().map(|scan| {
            let uid = scan.card_uid();
            let authorized = uid
                .zip(ctx.credentials)
                .is_some_and(|(uid, config)| config.is_authorized(uid));
            (uid, authorized)
        });

        Presented {
            pin: match pin_outcome {
                PinOutcome::Valid => Some(true),
                PinOutcome::Invalid => Some(false),
                _ => None,
            },
            card,
            wake: pin_outcome == PinOutcome::Cancelled,
        }
    }

    /// Update the shared failure counter and record each modality's outcome.
    fn settle_credentials(&mut self, presented: &Presented, now: Tick) -> AuthOutcome {
        let outcome = presented.outcome();
        match outcome {
            AuthOutcome::Valid => self.session.failed_attempts = 0,
            AuthOutcome::Invalid => {
                self.session.failed_attempts = self.session.failed_attempts.saturating_add(1);
            }
            AuthOutcome::None => return outcome,
        }

        let state = self.session.state;
        if let Some(granted) = presented.pin {
            self.record(Modality::Keypad, None, granted, state, now);
        }
        if let Some((uid, granted)) = presented.card {
            self.record(Modality::Card, uid, granted, state, now);
        }
        outcome
    }

    fn record(
        &mut self,
        modality: Modality,
        card: Option<CardUid>,
        granted: bool,
        state: SecurityState,
        at: Tick,
    ) {
        let event = if granted {
            SecurityEvent::CredentialAccepted {
                modality,
                card,
                state,
                at,
            }
        } else {
            SecurityEvent::CredentialRejected {
                modality,
                card,
                state,
                failed_attempts: self.session.failed_attempts,
                at,
            }
        };
        self.emit(event);
    }

    fn disarm(&mut self, ctx: &mut StepContext<'_>) {
        if self.session.state == SecurityState::Triggered {
            ctx.signal(FeedbackRequest::Stop);
            ctx.indicator(false);
        }
        ctx.signal(FeedbackRequest::chirp(SUCCESS_CHIRP_MS));

        self.session.failed_attempts = 0;
        self.session.door_unlock_acknowledged = false;
        self.session.auto_lock_pending = false;
        self.transition(SecurityState::Disarmed, ctx.now);
    }

    fn check_brute_force(&mut self, ctx: &mut StepContext<'_>) {
        if self.session.failed_attempts < self.timing.brute_force_limit {
            return;
        }

        self.session.alarm_level = self.timing.max_intensity();
        self.emit(SecurityEvent::LockoutEngaged {
            failed_attempts: self.session.failed_attempts,
            at: ctx.now,
        });
        self.transition(SecurityState::Locked, ctx.now);
        ctx.signal(FeedbackRequest::tone(LOCKOUT_TONE, self.session.alarm_level));
        ctx.indicator(true);
    }

    fn transition(&mut self, to: SecurityState, now: Tick) {
        let from = self.session.state;
        debug_assert!(from.can_transition_to(to), "{from} -> {to}");

        let transition = StateTransition::new(from, to, now);
        self.session.state = to;
        self.session.state_entered_at = now;
        self.session.toggled_at = now;
        self.session.toggle_phase = false;

        if self.history.len() == MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(transition);
        self.emit(SecurityEvent::StateChanged(transition));
    }

    fn emit(&mut self, event: SecurityEvent) {
        if self.events.len() == MAX_PENDING_EVENTS {
            self.events.pop_front();
            warn!("security event queue full, oldest event dropped");
        }
        self.events.push_back(event);
    }

    /// Take every queued event, oldest first.
    pub fn drain_events(&mut self) -> impl Iterator<Item = SecurityEvent> + '_ {
        self.events.drain(..)
    }

    pub fn state(&self) -> SecurityState {
        self.session.state
    }

    pub fn session(&self) -> &SecuritySession {
        &self.session
    }

    pub fn timing(&self) -> &SecurityTiming {
        &self.timing
    }

    /// Whether the boot settle time has passed.
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Get the last `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use warden_core::{AlarmIntensity, Pin};
    use warden_hardware::MotionLatch;
    use warden_hardware::mock::{MockDoor, MockDoorHandle, MockFeedback, MockFeedbackHandle};
    use warden_rfid::CardScanResult;

    const GOOD_CARD: u32 = 0xA1B2_C3D4;
    const BAD_CARD: u32 = 0x0BAD_CAFE;

    #[derive(Default)]
    struct ScriptedPin {
        outcomes: VecDeque<PinOutcome>,
        polls: usize,
        discards: usize,
    }

    impl PinSource for ScriptedPin {
        fn poll(&mut self, _now: Tick, _pin: Option<&Pin>) -> PinOutcome {
            self.polls += 1;
            self.outcomes.pop_front().unwrap_or(PinOutcome::Idle)
        }

        fn discard_pending(&mut self) {
            self.discards += 1;
            self.outcomes.clear();
        }
    }

    #[derive(Default)]
    struct ScriptedCards {
        pending: Option<CardScanResult>,
        discards: usize,
    }

    impl ScriptedCards {
        fn present(&mut self, raw: u32) {
            self.pending = Some(CardScanResult {
                uid: raw.to_be_bytes(),
                is_new: true,
            });
        }
    }

    impl CardSource for ScriptedCards {
        fn take_scan(&mut self) -> Option<CardScanResult> {
            self.pending.take()
        }

        fn discard_pending(&mut self) {
            self.discards += 1;
            self.pending = None;
        }
    }

    struct Rig {
        machine: SecurityStateMachine,
        pin: ScriptedPin,
        cards: ScriptedCards,
        motion: MotionLatch,
        door: MockDoor,
        door_handle: MockDoorHandle,
        feedback: MockFeedback,
        feedback_handle: MockFeedbackHandle,
        config: Option<CredentialConfig>,
        now: Tick,
    }

    impl Rig {
        fn new() -> Self {
            let mut config = CredentialConfig::default();
            config.add_card(CardUid::new(GOOD_CARD).unwrap()).unwrap();
            Self::with_config(Some(config))
        }

        fn with_config(config: Option<CredentialConfig>) -> Self {
            let (door, door_handle) = MockDoor::new();
            let (feedback, feedback_handle) = MockFeedback::new();
            let mut rig = Self {
                machine: SecurityStateMachine::new(SecurityTiming::default()),
                pin: ScriptedPin::default(),
                cards: ScriptedCards::default(),
                motion: MotionLatch::new(),
                door,
                door_handle,
                feedback,
                feedback_handle,
                config,
                now: Tick::ZERO,
            };
            let mut ctx = StepContext {
                now: rig.now,
                pin: &mut rig.pin,
                cards: &mut rig.cards,
                motion: &rig.motion,
                door: &mut rig.door,
                feedback: &mut rig.feedback,
                credentials: rig.config.as_ref(),
            };
            rig.machine.start(&mut ctx);
            rig
        }

        /// Started and past the boot settle time, in `Armed`.
        fn armed() -> Self {
            let mut rig = Self::new();
            rig.advance(SecurityTiming::default().boot_settle_ms);
            rig.door_handle.clear();
            rig.feedback_handle.clear_history();
            let _ = rig.events();
            rig
        }

        fn step(&mut self) {
            let mut ctx = StepContext {
                now: self.now,
                pin: &mut self.pin,
                cards: &mut self.cards,
                motion: &self.motion,
                door: &mut self.door,
                feedback: &mut self.feedback,
                credentials: self.config.as_ref(),
            };
            self.machine.update(&mut ctx);
        }

        /// Step once per millisecond.
        fn advance(&mut self, ms: u32) {
            for _ in 0..ms {
                self.now = self.now.wrapping_add(1);
                self.step();
            }
        }

        fn pin(&mut self, outcome: PinOutcome) {
            self.pin.outcomes.push_back(outcome);
            self.advance(1);
        }

        fn card(&mut self, raw: u32) {
            self.cards.present(raw);
            self.advance(1);
        }

        fn events(&mut self) -> Vec<SecurityEvent> {
            self.machine.drain_events().collect()
        }

        fn state(&self) -> SecurityState {
            self.machine.state()
        }

        fn failed(&self) -> u8 {
            self.machine.session().failed_attempts
        }

        fn drive_to(&mut self, state: SecurityState) {
            match state {
                SecurityState::Armed => {}
                SecurityState::EntryDelay => {
                    self.motion.trigger();
                    self.advance(1);
                }
                SecurityState::Triggered => {
                    self.drive_to(SecurityState::EntryDelay);
                    self.advance(ENTRY_DELAY);
                }
                other => panic!("not a credential state: {other}"),
            }
            assert_eq!(self.state(), state);
        }
    }

    const ENTRY_DELAY: u32 = 5000;

    #[test]
    fn test_start_clears_and_relocks() {
        let rig = Rig::new();
        assert_eq!(rig.state(), SecurityState::Armed);
        assert_eq!(rig.door_handle.requests(), vec![DoorPosition::Closed]);
        assert_eq!(rig.pin.discards, 1);
        assert_eq!(rig.cards.discards, 1);
    }

    #[test]
    fn test_input_ignored_before_settle() {
        let mut rig = Rig::new();
        rig.motion.trigger();
        rig.pin.outcomes.push_back(PinOutcome::Valid);

        rig.advance(1999);
        assert_eq!(rig.state(), SecurityState::Armed);
        assert_eq!(rig.pin.polls, 0);
        assert!(!rig.machine.is_settled());

        rig.advance(1);
        assert!(rig.machine.is_settled());
        assert_eq!(rig.state(), SecurityState::Disarmed);
    }

    #[test]
    fn test_motion_then_entry_timeout_triggers_alarm() {
        let mut rig = Rig::armed();
        rig.motion.trigger();
        rig.advance(1);
        assert_eq!(rig.state(), SecurityState::EntryDelay);
        assert_eq!(rig.door_handle.requests(), vec![DoorPosition::Closed]);

        rig.advance(ENTRY_DELAY - 1);
        assert_eq!(rig.state(), SecurityState::EntryDelay);
        rig.advance(1);
        assert_eq!(rig.state(), SecurityState::Triggered);
        assert_eq!(rig.machine.session().alarm_level, AlarmIntensity::new(10));

        rig.advance(500);
        assert_eq!(rig.feedback_handle.tone(), Some((1000, AlarmIntensity::new(10))));
        assert!(rig.feedback_handle.indicator_on());

        rig.advance(500);
        assert_eq!(rig.feedback_handle.tone(), Some((500, AlarmIntensity::new(10))));
        assert!(!rig.feedback_handle.indicator_on());
    }

    #[test]
    fn test_sentinel_key_starts_entry_delay() {
        let mut rig = Rig::armed();
        rig.pin(PinOutcome::Cancelled);
        assert_eq!(rig.state(), SecurityState::EntryDelay);
        assert_eq!(rig.feedback_handle.chirps(), vec![KEY_CHIRP_MS]);
    }

    #[test]
    fn test_valid_pin_disarms_immediately() {
        let mut rig = Rig::armed();
        rig.pin(PinOutcome::Valid);
        assert_eq!(rig.state(), SecurityState::Disarmed);
        assert_eq!(rig.feedback_handle.chirps(), vec![KEY_CHIRP_MS, SUCCESS_CHIRP_MS]);

        rig.advance(100);
        assert_eq!(rig.door_handle.requests(), vec![DoorPosition::Open]);
        let unlocks = rig
            .events()
            .into_iter()
            .filter(|e| matches!(e, SecurityEvent::DoorUnlocked { .. }))
            .count();
        assert_eq!(unlocks, 1);
    }

    #[test]
    fn test_disarm_cycle_returns_to_armed() {
        let mut rig = Rig::armed();
        rig.card(GOOD_CARD);
        assert_eq!(rig.state(), SecurityState::Disarmed);

        rig.advance(4998);
        assert_eq!(rig.door_handle.requests(), vec![DoorPosition::Open]);
        rig.advance(2);
        assert_eq!(
            rig.door_handle.requests(),
            vec![DoorPosition::Open, DoorPosition::Closed]
        );
        assert_eq!(rig.state(), SecurityState::Disarmed);

        rig.advance(1000);
        assert_eq!(rig.state(), SecurityState::ExitDelay);

        rig.motion.trigger();
        rig.card(BAD_CARD);
        assert_eq!(rig.failed(), 0);

        rig.advance(1000);
        assert!(rig.feedback_handle.indicator_on());
        rig.advance(8999);
        assert_eq!(rig.state(), SecurityState::Armed);
        assert!(!rig.feedback_handle.indicator_on());
        assert!(!rig.motion.is_pending());

        rig.advance(10);
        assert_eq!(rig.state(), SecurityState::Armed);

        let path: Vec<_> = rig.machine.history().iter().map(|t| t.to).collect();
        assert_eq!(
            path,
            vec![
                SecurityState::Disarmed,
                SecurityState::ExitDelay,
                SecurityState::Armed
            ]
        );
    }

    #[test]
    fn test_three_bad_cards_lock_out() {
        let mut rig = Rig::armed();
        rig.card(BAD_CARD);
        rig.card(BAD_CARD);
        assert_eq!(rig.state(), SecurityState::Armed);
        assert_eq!(rig.failed(), 2);

        rig.card(BAD_CARD);
        assert_eq!(rig.state(), SecurityState::Locked);
        assert_eq!(rig.machine.session().alarm_level, AlarmIntensity::new(50));
        assert_eq!(
            rig.feedback_handle.tone(),
            Some((LOCKOUT_TONE, AlarmIntensity::new(50)))
        );
        assert!(rig.feedback_handle.indicator_on());

        let events = rig.events();
        assert!(events.contains(&SecurityEvent::LockoutEngaged {
            failed_attempts: 3,
            at: rig.now,
        }));
    }

    #[test]
    fn test_lockout_expiry_goes_to_triggered() {
        let mut rig = Rig::armed();
        for _ in 0..3 {
            rig.card(BAD_CARD);
        }
        assert_eq!(rig.state(), SecurityState::Locked);

        rig.pin.outcomes.push_back(PinOutcome::Valid);
        rig.advance(100);
        assert_eq!(rig.feedback_handle.tone().map(|t| t.0), Some(SIREN_TONE_HIGH));
        rig.advance(100);
        assert_eq!(rig.feedback_handle.tone().map(|t| t.0), Some(SIREN_TONE_LOW));
        assert_eq!(rig.state(), SecurityState::Locked);

        rig.advance(9799);
        rig.cards.present(GOOD_CARD);
        rig.advance(1);
        assert_eq!(rig.state(), SecurityState::Triggered);
        assert_eq!(rig.failed(), 0);
        assert!(rig.cards.pending.is_none());
        assert_eq!(rig.machine.session().alarm_level, AlarmIntensity::new(50));

        rig.advance(10);
        assert_eq!(rig.state(), SecurityState::Triggered);
    }

    #[rstest]
    #[case(SecurityState::Armed)]
    #[case(SecurityState::EntryDelay)]
    #[case(SecurityState::Triggered)]
    fn test_limit_locks_within_step(#[case] start: SecurityState) {
        let mut rig = Rig::armed();
        rig.drive_to(start);

        rig.pin(PinOutcome::Invalid);
        rig.card(BAD_CARD);
        assert_eq!(rig.failed(), 2);
        rig.pin(PinOutcome::Invalid);
        assert_eq!(rig.state(), SecurityState::Locked);
    }

    #[test]
    fn test_mixed_outcomes_in_one_step() {
        let mut rig = Rig::armed();
        rig.card(BAD_CARD);

        rig.pin.outcomes.push_back(PinOutcome::Invalid);
        rig.card(GOOD_CARD);
        assert_eq!(rig.state(), SecurityState::Disarmed);
        assert_eq!(rig.failed(), 0);
    }

    #[test]
    fn test_double_rejection_counts_once() {
        let mut rig = Rig::armed();
        rig.pin.outcomes.push_back(PinOutcome::Invalid);
        rig.card(BAD_CARD);
        assert_eq!(rig.failed(), 1);

        let rejected: Vec<_> = rig
            .events()
            .into_iter()
            .filter_map(|e| match e {
                SecurityEvent::CredentialRejected {
                    modality,
                    failed_attempts,
                    ..
                } => Some((modality, failed_attempts)),
                _ => None,
            })
            .collect();
        assert_eq!(rejected, vec![(Modality::Keypad, 1), (Modality::Card, 1)]);
    }

    #[test]
    fn test_entry_delay_rejection_buzzes() {
        let mut rig = Rig::armed();
        rig.drive_to(SecurityState::EntryDelay);
        rig.card(BAD_CARD);
        assert_eq!(rig.feedback_handle.chirps(), vec![ERROR_CHIRP_MS]);
        assert_eq!(rig.state(), SecurityState::EntryDelay);
    }

    #[test]
    fn test_entry_delay_valid_card_disarms() {
        let mut rig = Rig::armed();
        rig.drive_to(SecurityState::EntryDelay);
        rig.advance(4000);
        rig.card(GOOD_CARD);
        assert_eq!(rig.state(), SecurityState::Disarmed);
    }

    #[test]
    fn test_triggered_rejection_raises_alarm() {
        let mut rig = Rig::armed();
        rig.drive_to(SecurityState::Triggered);
        rig.card(BAD_CARD);
        assert_eq!(rig.machine.session().alarm_level, AlarmIntensity::new(20));
        rig.card(BAD_CARD);
        assert_eq!(rig.machine.session().alarm_level, AlarmIntensity::new(30));
        assert!(
            rig.events()
                .contains(&SecurityEvent::AlarmRaised {
                    intensity: AlarmIntensity::new(30),
                    at: rig.now,
                })
        );
    }

    #[test]
    fn test_triggered_valid_silences() {
        let mut rig = Rig::armed();
        rig.drive_to(SecurityState::Triggered);
        rig.advance(500);
        assert!(rig.feedback_handle.tone().is_some());

        rig.card(GOOD_CARD);
        assert_eq!(rig.state(), SecurityState::Disarmed);
        assert_eq!(rig.feedback_handle.tone(), None);
        assert!(!rig.feedback_handle.indicator_on());
        assert_eq!(rig.feedback_handle.chirps(), vec![SUCCESS_CHIRP_MS]);
    }

    #[test]
    fn test_missing_config_rejects_everything() {
        let mut rig = Rig::with_config(None);
        rig.advance(2000);
        rig.card(GOOD_CARD);
        assert_eq!(rig.state(), SecurityState::Armed);
        assert_eq!(rig.failed(), 1);
    }

    #[test]
    fn test_jammed_door_does_not_block() {
        let mut rig = Rig::armed();
        rig.door_handle.set_jammed(true);
        rig.card(GOOD_CARD);
        rig.advance(6001);
        assert_eq!(rig.state(), SecurityState::ExitDelay);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut rig = Rig::armed();
        // Three transitions per cycle.
        for _ in 0..40 {
            rig.card(GOOD_CARD);
            rig.advance(16_001);
            assert_eq!(rig.state(), SecurityState::Armed);
        }
        assert_eq!(rig.machine.history().len(), MAX_HISTORY_SIZE);
        let last = rig.machine.last_transitions(2);
        assert_eq!(last.len(), 2);
        assert_eq!(last[1].to, SecurityState::Armed);
    }

    #[test]
    fn test_timeouts_across_wraparound() {
        let mut rig = Rig::armed();
        rig.now = Tick::from_millis(u32::MAX - 1000);
        rig.motion.trigger();
        rig.advance(1);
        assert_eq!(rig.state(), SecurityState::EntryDelay);

        rig.advance(ENTRY_DELAY - 1);
        assert_eq!(rig.state(), SecurityState::EntryDelay);
        rig.advance(1);
        assert_eq!(rig.state(), SecurityState::Triggered);
        assert!(rig.now.as_millis() < 5000);
    }

    proptest! {
        #[test]
        fn prop_failed_attempts_track_outcomes(
            outcomes in prop::collection::vec(prop::option::of(any::<bool>()), 1..20)
        ) {
            let mut rig = Rig::armed();
            let mut expected: u8 = 0;

            for outcome in outcomes {
                let state = rig.state();
                if !state.accepts_credentials() {
                    break;
                }
                match outcome {
                    Some(true) => rig.card(GOOD_CARD),
                    Some(false) => rig.card(BAD_CARD),
                    None => rig.advance(1),
                }
                match outcome {
                    Some(true) => {
                        expected = 0;
                        prop_assert_eq!(rig.state(), SecurityState::Disarmed);
                    }
                    Some(false) => {
                        expected += 1;
                        if expected >= 3 {
                            prop_assert_eq!(rig.state(), SecurityState::Locked);
                        } else {
                            prop_assert_eq!(rig.state(), state);
                        }
                    }
                    None => prop_assert_eq!(rig.state(), state),
                }
                prop_assert_eq!(rig.failed(), expected);
            }
        }
    }
}
