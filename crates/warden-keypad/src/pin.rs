//! Cooperative-side PIN assembly.

use crate::config::PinEntryConfig;
use crate::scanner::KeyEventSlot;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace};
use warden_core::constants::PIN_LENGTH;
use warden_core::{Key, Pin, Tick};

/// Result of one PIN entry poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinOutcome {
    /// No key and nothing expired.
    Idle,

    /// A key was appended; the PIN is not complete yet.
    KeyAccepted,

    /// A full PIN matched the configured one.
    Valid,

    /// A full PIN did not match, or no PIN is configured.
    Invalid,

    /// The sentinel key cleared the buffer.
    Cancelled,

    /// A partial entry was discarded after the inter-key timeout.
    TimedOut,
}

impl PinOutcome {
    /// Whether this poll consumed a key from the scanner.
    pub fn consumed_key(self) -> bool {
        matches!(
            self,
            PinOutcome::KeyAccepted | PinOutcome::Valid | PinOutcome::Invalid | PinOutcome::Cancelled
        )
    }
}

/// Source of PIN outcomes for the security state machine.
pub trait PinSource {
    /// Consume at most one key and report what it did.
    fn poll(&mut self, now: Tick, pin: Option<&Pin>) -> PinOutcome;

    /// Drop a pending key without touching the partial entry.
    fn discard_pending(&mut self);
}

/// Assembles debounced keys into a fixed-length PIN.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use warden_core::{Key, Pin, Tick};
/// use warden_keypad::{KeyEventSlot, PinEntry, PinEntryConfig, PinOutcome};
///
/// let slot = Arc::new(KeyEventSlot::new());
/// let mut entry = PinEntry::new(PinEntryConfig::default(), Arc::clone(&slot));
/// let pin = Pin::new("1234").unwrap();
///
/// let mut outcome = PinOutcome::Idle;
/// for (i, c) in "1234".chars().enumerate() {
///     slot.publish(Key::new(c).unwrap());
///     outcome = entry.poll(Tick::from_millis(i as u32 * 100), Some(&pin));
/// }
/// assert_eq!(outcome, PinOutcome::Valid);
/// ```
#[derive(Debug)]
pub struct PinEntry {
    slot: Arc<KeyEventSlot>,
    config: PinEntryConfig,
    buffer: Vec<Key>,
    last_key_at: Tick,
}

impl PinEntry {
    pub fn new(config: PinEntryConfig, slot: Arc<KeyEventSlot>) -> Self {
        Self {
            slot,
            config,
            buffer: Vec::with_capacity(PIN_LENGTH),
            last_key_at: Tick::ZERO,
        }
    }

    /// Expire a stale partial entry, then consume at most one key.
    ///
    /// A key consumed in the same call as an expiry is still processed and
    /// its outcome takes precedence over `TimedOut`. Without a configured PIN
    /// a completed entry is always `Invalid`.
    pub fn poll(&mut self, now: Tick, pin: Option<&Pin>) -> PinOutcome {
        let timed_out = !self.buffer.is_empty()
            && now.has_elapsed(self.last_key_at, self.config.inter_key_timeout_ms);
        if timed_out {
            debug!(discarded = self.buffer.len(), "partial PIN entry timed out");
            self.buffer.clear();
        }

        let Some(key) = self.slot.take() else {
            return if timed_out {
                PinOutcome::TimedOut
            } else {
                PinOutcome::Idle
            };
        };
        self.last_key_at = now;

        if key.is_sentinel() {
            trace!("PIN entry cleared");
            self.buffer.clear();
            return PinOutcome::Cancelled;
        }

        self.buffer.push(key);
        trace!(length = self.buffer.len(), "PIN key accepted");
        if self.buffer.len() < PIN_LENGTH {
            return PinOutcome::KeyAccepted;
        }

        let valid = pin.is_some_and(|pin| pin.matches(&self.buffer));
        self.buffer.clear();
        if valid {
            PinOutcome::Valid
        } else {
            PinOutcome::Invalid
        }
    }

    /// Drop a pending key event; the partial entry is kept.
    pub fn discard_pending(&mut self) {
        let _ = self.slot.take();
    }

    /// Number of keys in the partial entry.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

impl PinSource for PinEntry {
    fn poll(&mut self, now: Tick, pin: Option<&Pin>) -> PinOutcome {
        PinEntry::poll(self, now, pin)
    }

    fn discard_pending(&mut self) {
        PinEntry::discard_pending(self);
    }
}
