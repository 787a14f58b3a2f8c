//! Keypad timing configuration.

use serde::{Deserialize, Serialize};
use warden_core::constants::{
    DEBOUNCE_STABLE_MS, KEYPAD_ROWS, PIN_ENTRY_TIMEOUT_MS, TICK_PERIOD_MS,
};
use warden_core::{Error, Result};

/// Debounce parameters for the matrix scanner.
///
/// The scanner samples one row per tick, so a sweep takes `tick_ms * rows`
/// milliseconds. The stability threshold is expressed in sweeps and derived
/// from `stable_time_ms`, which keeps the debounce time fixed when the tick
/// period or the row count changes.
///
/// # Examples
///
/// ```
/// use warden_keypad::DebounceConfig;
///
/// let config = DebounceConfig::default();
/// assert_eq!(config.sweep_period_ms(), 4);
/// assert_eq!(config.threshold_sweeps(), 20);
///
/// let slow = DebounceConfig { tick_ms: 2, ..DebounceConfig::default() };
/// assert_eq!(slow.threshold_sweeps(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Tick period in milliseconds.
    pub tick_ms: u32,

    /// Rows scanned per sweep.
    pub rows: usize,

    /// Time a sample must remain unchanged before it latches.
    pub stable_time_ms: u32,
}

impl DebounceConfig {
    /// Duration of one full sweep.
    pub fn sweep_period_ms(&self) -> u32 {
        let rows = u32::try_from(self.rows).unwrap_or(u32::MAX);
        self.tick_ms.saturating_mul(rows).max(1)
    }

    /// Number of consecutive matching sweeps a key must exceed to latch.
    pub fn threshold_sweeps(&self) -> u32 {
        self.stable_time_ms / self.sweep_period_ms()
    }

    /// Check the configuration against the physical matrix.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the tick period is zero or the row count is
    /// zero or larger than the keypad.
    pub fn validate(&self) -> Result<()> {
        if self.tick_ms == 0 {
            return Err(Error::Config("debounce tick_ms must be positive".into()));
        }
        if self.rows == 0 || self.rows > KEYPAD_ROWS {
            return Err(Error::Config(format!(
                "debounce rows must be 1-{KEYPAD_ROWS}, got {}",
                self.rows
            )));
        }
        Ok(())
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            tick_ms: TICK_PERIOD_MS,
            rows: KEYPAD_ROWS,
            stable_time_ms: DEBOUNCE_STABLE_MS,
        }
    }
}

/// PIN assembly parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinEntryConfig {
    /// A partial PIN is discarded after this much time without a key.
    pub inter_key_timeout_ms: u32,
}

impl Default for PinEntryConfig {
    fn default() -> Self {
        Self {
            inter_key_timeout_ms: PIN_ENTRY_TIMEOUT_MS,
        }
    }
}
