//! Interrupt-side keypad scanning and debouncing.

use crate::config::DebounceConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::trace;
use warden_core::Key;
use warden_core::constants::KEY_MAP;
use warden_core::Result;
use warden_hardware::KeyMatrix;

/// Single-byte hand-off from the scanner to PIN entry.
///
/// Written once per detected key by the interrupt context and cleared once by
/// the main loop. Zero means empty. A key published before the previous one
/// was taken replaces it.
#[derive(Debug, Default)]
pub struct KeyEventSlot(AtomicU8);

impl KeyEventSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, key: Key) {
        self.0.store(key.as_byte(), Ordering::Release);
    }

    /// Take the pending key, leaving the slot empty.
    pub fn take(&self) -> Option<Key> {
        Key::from_byte(self.0.swap(0, Ordering::AcqRel))
    }

    pub fn is_empty(&self) -> bool {
        self.0.load(Ordering::Acquire) == 0
    }
}

/// Row-at-a-time matrix scanner with sweep-level debouncing.
///
/// Call [`tick`](Self::tick) once per tick from the interrupt context. At the
/// end of every sweep the sampled key is compared with the previous sweep's
/// candidate; a key that stays unchanged for more than the configured number
/// of sweeps latches and is published once. Holding the key publishes
/// nothing further, and the same key can only fire again after a sweep in
/// which nothing was pressed.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use warden_core::Key;
/// use warden_hardware::mock::MockKeyMatrix;
/// use warden_keypad::{DebounceConfig, KeyEventSlot, KeypadScanner};
///
/// let slot = Arc::new(KeyEventSlot::new());
/// let mut scanner = KeypadScanner::new(DebounceConfig::default(), Arc::clone(&slot)).unwrap();
/// let (mut matrix, keys) = MockKeyMatrix::new();
///
/// keys.press(Key::new('7').unwrap());
/// for _ in 0..100 {
///     scanner.tick(&mut matrix);
/// }
/// assert_eq!(slot.take(), Key::new('7').ok());
/// assert_eq!(slot.take(), None);
/// ```
#[derive(Debug)]
pub struct KeypadScanner {
    slot: Arc<KeyEventSlot>,
    rows: usize,
    threshold: u32,
    row: usize,
    raw: Option<Key>,
    candidate: Option<Key>,
    stable_sweeps: u32,
    latched: Option<Key>,
}

impl KeypadScanner {
    /// Create a scanner publishing into `slot`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the debounce configuration does not fit the
    /// keypad.
    pub fn new(config: DebounceConfig, slot: Arc<KeyEventSlot>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            slot,
            rows: config.rows,
            threshold: config.threshold_sweeps(),
            row: 0,
            raw: None,
            candidate: None,
            stable_sweeps: 0,
            latched: None,
        })
    }

    /// Sample one row; evaluate the debounce at the end of each sweep.
    pub fn tick<M: KeyMatrix + ?Sized>(&mut self, matrix: &mut M) {
        let row = self.row;
        matrix.select_row(row);
        let columns = matrix.read_columns();
        matrix.release_row(row);

        // Last closed switch in scan order wins.
        for (col, &c) in KEY_MAP[row].iter().enumerate() {
            if columns & (1 << col) != 0 {
                self.raw = Key::new(c).ok();
            }
        }

        self.row += 1;
        if self.row >= self.rows {
            self.row = 0;
            self.end_sweep();
        }
    }

    fn end_sweep(&mut self) {
        match self.raw {
            Some(key) if self.candidate == Some(key) => {
                self.stable_sweeps = self.stable_sweeps.saturating_add(1);
            }
            _ => {
                self.candidate = self.raw;
                self.stable_sweeps = 0;
            }
        }

        if self.stable_sweeps > self.threshold && self.candidate != self.latched {
            if let Some(key) = self.candidate {
                trace!(%key, "key latched");
                self.slot.publish(key);
            }
            self.latched = self.candidate;
        } else if self.raw.is_none() {
            self.latched = None;
        }

        self.raw = None;
    }

    /// Sweeps a key must stay stable beyond before it latches.
    pub fn threshold_sweeps(&self) -> u32 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_hardware::mock::{MockKeyMatrix, MockKeyMatrixHandle};

    fn setup() -> (KeypadScanner, MockKeyMatrix, MockKeyMatrixHandle, Arc<KeyEventSlot>) {
        let slot = Arc::new(KeyEventSlot::new());
        let scanner = KeypadScanner::new(DebounceConfig::default(), Arc::clone(&slot)).unwrap();
        let (matrix, handle) = MockKeyMatrix::new();
        (scanner, matrix, handle, slot)
    }

    fn run_sweeps(scanner: &mut KeypadScanner, matrix: &mut MockKeyMatrix, sweeps: usize) {
        for _ in 0..sweeps * 4 {
            scanner.tick(matrix);
        }
    }

    fn key(c: char) -> Key {
        Key::new(c).unwrap()
    }

    #[test]
    fn test_slot_take_clears() {
        let slot = KeyEventSlot::new();
        assert!(slot.is_empty());
        slot.publish(key('3'));
        assert!(!slot.is_empty());
        assert_eq!(slot.take(), Some(key('3')));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_latches_after_threshold_exceeded() {
        let (mut scanner, mut matrix, keys, slot) = setup();
        keys.press(key('5'));

        // First sweep sets the candidate, the next 20 bring the counter to 20.
        run_sweeps(&mut scanner, &mut matrix, 21);
        assert!(slot.is_empty());

        run_sweeps(&mut scanner, &mut matrix, 1);
        assert_eq!(slot.take(), Some(key('5')));
    }

    #[test]
    fn test_held_key_fires_once() {
        let (mut scanner, mut matrix, keys, slot) = setup();
        keys.press(key('A'));

        run_sweeps(&mut scanner, &mut matrix, 30);
        assert_eq!(slot.take(), Some(key('A')));

        run_sweeps(&mut scanner, &mut matrix, 500);
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_bounce_shorter_than_debounce_is_ignored() {
        let (mut scanner, mut matrix, keys, slot) = setup();
        for _ in 0..50 {
            keys.press(key('1'));
            run_sweeps(&mut scanner, &mut matrix, 5);
            keys.release_all();
            run_sweeps(&mut scanner, &mut matrix, 1);
        }
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_release_then_repress_fires_twice() {
        let (mut scanner, mut matrix, keys, slot) = setup();

        keys.press(key('9'));
        run_sweeps(&mut scanner, &mut matrix, 25);
        assert_eq!(slot.take(), Some(key('9')));

        keys.release_all();
        run_sweeps(&mut scanner, &mut matrix, 1);

        keys.press(key('9'));
        run_sweeps(&mut scanner, &mut matrix, 25);
        assert_eq!(slot.take(), Some(key('9')));
    }

    #[test]
    fn test_switching_keys_without_release_fires_new_key() {
        let (mut scanner, mut matrix, keys, slot) = setup();

        keys.press(key('2'));
        run_sweeps(&mut scanner, &mut matrix, 25);
        assert_eq!(slot.take(), Some(key('2')));

        keys.release_all();
        keys.press(key('3'));
        run_sweeps(&mut scanner, &mut matrix, 25);
        assert_eq!(slot.take(), Some(key('3')));
    }

    #[test]
    fn test_partial_sweep_does_not_evaluate() {
        let (mut scanner, mut matrix, keys, slot) = setup();
        keys.press(key('*'));
        run_sweeps(&mut scanner, &mut matrix, 21);
        // Three more rows: the 22nd sweep is incomplete.
        for _ in 0..3 {
            scanner.tick(&mut matrix);
        }
        assert!(slot.is_empty());
        scanner.tick(&mut matrix);
        assert_eq!(slot.take(), Some(key('*')));
    }

    #[test]
    fn test_fewer_rows_shortens_sweep() {
        let slot = Arc::new(KeyEventSlot::new());
        let config = DebounceConfig {
            rows: 2,
            ..DebounceConfig::default()
        };
        let mut scanner = KeypadScanner::new(config, Arc::clone(&slot)).unwrap();
        assert_eq!(scanner.threshold_sweeps(), 40);

        let (mut matrix, keys) = MockKeyMatrix::new();
        keys.press(key('4'));
        // 42 sweeps of 2 rows is still 84 ticks.
        for _ in 0..83 {
            scanner.tick(&mut matrix);
        }
        assert!(slot.is_empty());
        scanner.tick(&mut matrix);
        assert_eq!(slot.take(), Some(key('4')));
    }
}
