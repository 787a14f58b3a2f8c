//! Mock key matrix for testing and simulation.
//!
//! The matrix state is a 16-bit mask of closed switches (bit `row * 4 + col`)
//! shared between the matrix, owned by the scanner, and a handle that tests or
//! the simulator use to press and release keys.

use crate::traits::KeyMatrix;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use warden_core::Key;
use warden_core::constants::{KEY_MAP, KEYPAD_COLUMNS};

/// Simulated 4x4 membrane keypad.
///
/// # Examples
///
/// ```
/// use warden_core::Key;
/// use warden_hardware::KeyMatrix;
/// use warden_hardware::mock::MockKeyMatrix;
///
/// let (mut matrix, handle) = MockKeyMatrix::new();
/// handle.press(Key::new('5').unwrap());
///
/// matrix.select_row(1);
/// assert_eq!(matrix.read_columns(), 0b0010);
/// matrix.release_row(1);
/// ```
#[derive(Debug)]
pub struct MockKeyMatrix {
    switches: Arc<AtomicU16>,
    selected_row: Option<usize>,
}

impl MockKeyMatrix {
    /// Create a matrix with every key released, plus its control handle.
    pub fn new() -> (Self, MockKeyMatrixHandle) {
        let switches = Arc::new(AtomicU16::new(0));
        let matrix = Self {
            switches: Arc::clone(&switches),
            selected_row: None,
        };
        (matrix, MockKeyMatrixHandle { switches })
    }
}

impl KeyMatrix for MockKeyMatrix {
    fn select_row(&mut self, row: usize) {
        self.selected_row = Some(row);
    }

    fn read_columns(&mut self) -> u8 {
        let Some(row) = self.selected_row else {
            return 0;
        };
        let mask = self.switches.load(Ordering::Acquire);
        ((mask >> (row * KEYPAD_COLUMNS)) & 0x0F) as u8
    }

    fn release_row(&mut self, row: usize) {
        if self.selected_row == Some(row) {
            self.selected_row = None;
        }
    }
}

/// Handle for pressing and releasing keys on a [`MockKeyMatrix`].
#[derive(Debug, Clone)]
pub struct MockKeyMatrixHandle {
    switches: Arc<AtomicU16>,
}

impl MockKeyMatrixHandle {
    /// Close the switch under `key`.
    pub fn press(&self, key: Key) {
        if let Some(bit) = switch_bit(key) {
            self.switches.fetch_or(bit, Ordering::AcqRel);
        }
    }

    /// Open the switch under `key`.
    pub fn release(&self, key: Key) {
        if let Some(bit) = switch_bit(key) {
            self.switches.fetch_and(!bit, Ordering::AcqRel);
        }
    }

    /// Open every switch.
    pub fn release_all(&self) {
        self.switches.store(0, Ordering::Release);
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        switch_bit(key).is_some_and(|bit| self.switches.load(Ordering::Acquire) & bit != 0)
    }
}

fn switch_bit(key: Key) -> Option<u16> {
    KEY_MAP.iter().enumerate().find_map(|(row, keys)| {
        keys.iter()
            .position(|&c| c == key.as_char())
            .map(|col| 1u16 << (row * KEYPAD_COLUMNS + col))
    })
}
