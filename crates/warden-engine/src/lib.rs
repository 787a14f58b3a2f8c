//! Security core of the Warden access-control device.
//!
//! This crate contains the security state machine, the admin console over
//! the credential store and the tokio runtime that hosts the interrupt and
//! main-loop contexts.
//!
//! # Overview
//!
//! ```text
//!  interrupt (1 ms)          main loop                      audit task
//!  ───────────────           ─────────                      ──────────
//!  TickCounter::advance      CardReaderFsm::poll
//!  KeypadScanner::tick ──▶   SecurityStateMachine::update ──▶ AuditTrail::record
//!  Notify::notify_one        (PinEntry, cards, motion)
//! ```
//!
//! The machine itself is synchronous and driven entirely by the [`Tick`]
//! values it is handed, so every timing rule can be tested without a
//! runtime.
//!
//! [`Tick`]: warden_core::Tick

pub mod admin;
pub mod audit;
pub mod error;
pub mod event;
pub mod machine;
pub mod runtime;
pub mod session;
pub mod state;
pub mod timing;

pub use admin::AdminConsole;
pub use audit::AuditTrail;
pub use error::{EngineError, EngineResult};
pub use event::SecurityEvent;
pub use machine::{MAX_HISTORY_SIZE, SecurityStateMachine, StepContext};
pub use runtime::{DeviceRuntime, Peripherals, RuntimeConfig, RuntimeHandle};
pub use session::SecuritySession;
pub use state::{SecurityState, StateTransition};
pub use timing::SecurityTiming;
