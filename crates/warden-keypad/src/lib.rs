//! Keypad input for the Warden access-control engine.
//!
//! Two halves joined by a single atomic byte:
//!
//! - [`KeypadScanner`] runs in the 1 ms interrupt context. It samples one
//!   matrix row per tick, debounces at sweep granularity and publishes each
//!   genuine press once into a [`KeyEventSlot`].
//! - [`PinEntry`] runs in the main loop. It takes at most one key per poll,
//!   assembles a four-key PIN and reports a [`PinOutcome`].

pub mod config;
pub mod pin;
pub mod scanner;

pub use config::{DebounceConfig, PinEntryConfig};
pub use pin::{PinEntry, PinOutcome, PinSource};
pub use scanner::{KeyEventSlot, KeypadScanner};
