//! Tokio hosting of the two execution contexts.
//!
//! The device has a 1 ms interrupt and a cooperative main loop. Here the
//! interrupt is a task driven by a tokio interval: it advances the shared
//! [`TickCounter`], runs one keypad scan and wakes the main loop. The main
//! loop polls the card reader, steps the [`SecurityStateMachine`] against the
//! live credentials and hands queued events to the [`AuditTrail`] task.
//!
//! Neither context ever awaits inside a step, so a slow audit write can
//! never stall the alarm.

use crate::audit::AuditTrail;
use crate::error::EngineResult;
use crate::event::SecurityEvent;
use crate::machine::{SecurityStateMachine, StepContext};
use crate::session::SecuritySession;
use crate::timing::SecurityTiming;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, mpsc, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};
use warden_core::{CredentialConfig, Tick};
use warden_hardware::{
    Clock, DoorActuator, FeedbackSink, KeyMatrix, MotionLatch, RegisterBus, TickCounter,
};
use warden_keypad::{DebounceConfig, KeyEventSlot, KeypadScanner, PinEntry, PinEntryConfig};
use warden_rfid::{CardReaderConfig, CardReaderFsm};
use warden_storage::{CredentialRepository, CredentialStore};

/// Everything tunable about a running device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub timing: SecurityTiming,
    pub debounce: DebounceConfig,
    pub pin_entry: PinEntryConfig,
    pub card_reader: CardReaderConfig,

    /// Events buffered between the main loop and the audit task.
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            timing: SecurityTiming::default(),
            debounce: DebounceConfig::default(),
            pin_entry: PinEntryConfig::default(),
            card_reader: CardReaderConfig::default(),
            event_capacity: 64,
        }
    }
}

/// The devices a runtime takes ownership of.
///
/// Keep a clone of `motion` to raise motion from outside.
pub struct Peripherals<M, B, D, F> {
    pub matrix: M,
    pub reader_bus: B,
    pub door: D,
    pub feedback: F,
    pub motion: MotionLatch,
}

/// Entry point for starting a device.
pub struct DeviceRuntime;

impl DeviceRuntime {
    /// Initialize the reader and spawn the interrupt, main-loop and audit
    /// tasks.
    ///
    /// # Errors
    ///
    /// Fails on an invalid configuration or when the card reader does not
    /// come up. Nothing is spawned in either case.
    pub fn start<M, B, D, F, R>(
        config: RuntimeConfig,
        peripherals: Peripherals<M, B, D, F>,
        store: Arc<CredentialStore<R>>,
        audit: AuditTrail,
    ) -> EngineResult<RuntimeHandle>
    where
        M: KeyMatrix + 'static,
        B: RegisterBus + 'static,
        D: DoorActuator + 'static,
        F: FeedbackSink + 'static,
        R: CredentialRepository + 'static,
    {
        config.timing.validate()?;

        let slot = Arc::new(KeyEventSlot::new());
        let scanner = KeypadScanner::new(config.debounce, Arc::clone(&slot))?;
        let mut reader = CardReaderFsm::new(peripherals.reader_bus, config.card_reader);
        reader.initialize()?;

        let ticks = TickCounter::new();
        let wake = Arc::new(Notify::new());
        let machine = SecurityStateMachine::new(config.timing);
        let (session_tx, session_rx) = watch::channel(*machine.session());
        let (event_tx, event_rx) = mpsc::channel(config.event_capacity.max(1));

        let interrupt = Interrupt {
            ticks: ticks.clone(),
            scanner,
            matrix: peripherals.matrix,
            wake: Arc::clone(&wake),
            tick_ms: config.debounce.tick_ms,
        };
        let main_loop = MainLoop {
            ticks: ticks.clone(),
            machine,
            pin: PinEntry::new(config.pin_entry, slot),
            reader,
            door: peripherals.door,
            feedback: peripherals.feedback,
            motion: peripherals.motion,
            events: event_tx,
            session: session_tx,
        };

        let mut tasks = JoinSet::new();
        tasks.spawn(interrupt.run());
        tasks.spawn(main_loop.run(store, wake));
        let audit = tokio::spawn(drain_events(audit, event_rx));

        info!(
            tick_ms = config.debounce.tick_ms,
            settle_ms = config.timing.boot_settle_ms,
            "device runtime started"
        );

        Ok(RuntimeHandle {
            tasks,
            audit,
            ticks,
            session: session_rx,
        })
    }
}

struct Interrupt<M> {
    ticks: TickCounter,
    scanner: KeypadScanner,
    matrix: M,
    wake: Arc<Notify>,
    tick_ms: u32,
}

impl<M: KeyMatrix> Interrupt<M> {
    async fn run(mut self) -> EngineResult<()> {
        let mut period = interval(Duration::from_millis(u64::from(self.tick_ms)));
        period.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            period.tick().await;
            for _ in 0..self.tick_ms {
                self.ticks.advance();
            }
            self.scanner.tick(&mut self.matrix);
            self.wake.notify_one();
        }
    }
}

struct MainLoop<B, D, F> {
    ticks: TickCounter,
    machine: SecurityStateMachine,
    pin: PinEntry,
    reader: CardReaderFsm<B>,
    door: D,
    feedback: F,
    motion: MotionLatch,
    events: mpsc::Sender<SecurityEvent>,
    session: watch::Sender<SecuritySession>,
}

impl<B, D, F> MainLoop<B, D, F>
where
    B: RegisterBus,
    D: DoorActuator,
    F: FeedbackSink,
{
    async fn run<R: CredentialRepository>(
        mut self,
        store: Arc<CredentialStore<R>>,
        wake: Arc<Notify>,
    ) -> EngineResult<()> {
        {
            let credentials = store.read();
            self.start(&credentials);
        }
        self.publish();

        loop {
            wake.notified().await;
            {
                let credentials = store.read();
                self.step(&credentials);
            }
            self.publish();
        }
    }

    fn start(&mut self, credentials: &CredentialConfig) {
        let now = self.ticks.now();
        let mut ctx = StepContext {
            now,
            pin: &mut self.pin,
            cards: &mut self.reader,
            motion: &self.motion,
            door: &mut self.door,
            feedback: &mut self.feedback,
            credentials: Some(credentials),
        };
        self.machine.start(&mut ctx);
    }

    fn step(&mut self, credentials: &CredentialConfig) {
        let now = self.ticks.now();
        self.reader.poll(now);

        let mut ctx = StepContext {
            now,
            pin: &mut self.pin,
            cards: &mut self.reader,
            motion: &self.motion,
            door: &mut self.door,
            feedback: &mut self.feedback,
            credentials: Some(credentials),
        };
        self.machine.update(&mut ctx);
    }

    fn publish(&mut self) {
        for event in self.machine.drain_events() {
            if let Err(mpsc::error::TrySendError::Full(event)) = self.events.try_send(event) {
                warn!(at = %event.at(), "audit channel full, event dropped");
            }
        }
        let current = *self.machine.session();
        self.session.send_if_modified(|session| {
            let changed = *session != current;
            *session = current;
            changed
        });
    }
}

async fn drain_events(audit: AuditTrail, mut events: mpsc::Receiver<SecurityEvent>) -> EngineResult<()> {
    while let Some(event) = events.recv().await {
        audit.record(&event).await;
    }
    debug!("audit channel closed");
    Ok(())
}

/// Handle to a running device.
pub struct RuntimeHandle {
    tasks: JoinSet<EngineResult<()>>,
    audit: JoinHandle<EngineResult<()>>,
    ticks: TickCounter,
    session: watch::Receiver<SecuritySession>,
}

impl RuntimeHandle {
    /// Current tick.
    pub fn now(&self) -> Tick {
        self.ticks.now()
    }

    /// Session as of the last main-loop step.
    pub fn session(&self) -> SecuritySession {
        *self.session.borrow()
    }

    /// Receiver that is notified whenever the session changes.
    pub fn subscribe(&self) -> watch::Receiver<SecuritySession> {
        self.session.clone()
    }

    /// Stop both contexts, then let the audit task flush what was queued.
    ///
    /// Task failures are counted and logged but never fail the shutdown.
    pub async fn shutdown(mut self) {
        self.tasks.abort_all();

        let mut error_count = 0;
        let mut panic_count = 0;

        while let Some(result) = self.tasks.join_next().await {
            match classify_task_result(result) {
                TaskTermination::Success | TaskTermination::Cancelled => {}
                TaskTermination::Error => error_count += 1,
                TaskTermination::Panic => panic_count += 1,
            }
        }

        // Both senders are gone now, so the audit task finishes on its own.
        match classify_task_result(self.audit.await) {
            TaskTermination::Success | TaskTermination::Cancelled => {}
            TaskTermination::Error => error_count += 1,
            TaskTermination::Panic => panic_count += 1,
        }

        if error_count + panic_count > 0 {
            error!(error_count, panic_count, "device runtime stopped with failures");
        } else {
            info!("device runtime stopped");
        }
    }
}

fn classify_task_result(result: Result<EngineResult<()>, JoinError>) -> TaskTermination {
    match result {
        Ok(Ok(())) => TaskTermination::Success,
        Ok(Err(error)) => {
            warn!(%error, "runtime task failed");
            TaskTermination::Error
        }
        Err(e) if e.is_cancelled() => TaskTermination::Cancelled,
        Err(_) => TaskTermination::Panic,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskTermination {
    Success,
    Error,
    /// Expected during shutdown.
    Cancelled,
    Panic,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_fill_missing_sections() {
        let config: RuntimeConfig =
            serde_json::from_str(r#"{"timing": {"entry_delay_ms": 9000}}"#).unwrap();
        assert_eq!(config.timing.entry_delay_ms, 9000);
        assert_eq!(config.debounce, DebounceConfig::default());
        assert_eq!(config.event_capacity, 64);
    }

    #[test]
    fn test_classify_task_result() {
        assert_eq!(classify_task_result(Ok(Ok(()))), TaskTermination::Success);
        assert_eq!(
            classify_task_result(Ok(Err(warden_core::Error::NotAuthenticated.into()))),
            TaskTermination::Error
        );
    }
}
