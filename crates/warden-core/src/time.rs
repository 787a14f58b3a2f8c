//! Millisecond tick arithmetic.
//!
//! The tick counter is a 32-bit value that wraps roughly every 49.7 days.
//! Every timeout in the engine is computed as "elapsed since a reference"
//! with wrapping subtraction, so comparisons remain correct across the
//! overflow as long as no single interval exceeds `u32::MAX` milliseconds.
//!
//! # Examples
//!
//! ```
//! use warden_core::Tick;
//!
//! let start = Tick::from_millis(u32::MAX - 10);
//! let now = start.wrapping_add(25);
//!
//! assert_eq!(now.as_millis(), 14);
//! assert_eq!(now.elapsed_since(start), 25);
//! assert!(now.has_elapsed(start, 20));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// A reading of the monotonic millisecond counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tick(u32);

impl Tick {
    /// The counter origin (power-up).
    pub const ZERO: Tick = Tick(0);

    /// Create a tick from a raw millisecond count.
    #[must_use]
    pub const fn from_millis(ms: u32) -> Self {
        Tick(ms)
    }

    /// Raw millisecond count.
    #[must_use]
    pub const fn as_millis(self) -> u32 {
        self.0
    }

    /// Milliseconds elapsed from `earlier` to `self`, tolerant of wraparound.
    #[must_use]
    pub const fn elapsed_since(self, earlier: Tick) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Whether at least `duration_ms` has elapsed since `start`.
    #[must_use]
    pub const fn has_elapsed(self, start: Tick, duration_ms: u32) -> bool {
        self.elapsed_since(start) >= duration_ms
    }

    /// Advance by `ms`, wrapping at `u32::MAX`.
    #[must_use]
    pub const fn wrapping_add(self, ms: u32) -> Tick {
        Tick(self.0.wrapping_add(ms))
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

impl From<u32> for Tick {
    fn from(ms: u32) -> Self {
        Tick(ms)
    }
}
