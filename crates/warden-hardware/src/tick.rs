//! The millisecond tick service.
//!
//! `TickCounter` is written only by the interrupt context (`advance`) and read
//! by everyone else. Clones share the same counter.

use crate::traits::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use warden_core::Tick;

/// Shared wrapping millisecond counter.
///
/// # Examples
///
/// ```
/// use warden_hardware::{Clock, TickCounter};
///
/// let counter = TickCounter::new();
/// let reader = counter.clone();
///
/// let start = reader.now();
/// for _ in 0..25 {
///     counter.advance();
/// }
/// assert!(reader.is_timeout(start, 25));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TickCounter {
    ticks: Arc<AtomicU32>,
}

impl TickCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the counter at an arbitrary value, used to exercise wraparound.
    pub fn starting_at(start: Tick) -> Self {
        Self {
            ticks: Arc::new(AtomicU32::new(start.as_millis())),
        }
    }

    /// Advance by one tick and return the new value. Interrupt context only.
    pub fn advance(&self) -> Tick {
        let previous = self.ticks.fetch_add(1, Ordering::AcqRel);
        Tick::from_millis(previous.wrapping_add(1))
    }
}

impl Clock for TickCounter {
    fn now(&self) -> Tick {
        Tick::from_millis(self.ticks.load(Ordering::Acquire))
    }
}
