//! Hardware collaborator trait definitions.
//!
//! These traits establish the contract between the access-control engine and
//! the peripherals it drives. Unlike request/response device drivers, every
//! method here is non-blocking: the engine runs from a 1 ms interrupt context
//! and a cooperative main loop, and neither may wait on hardware. Operations
//! either complete immediately or report their outcome on a later poll.
//!
//! All traits require `Send` so implementations can move into the runtime's
//! tasks. Implementations backed by shared state (the tick counter, the motion
//! latch) are additionally `Sync`.

use crate::error::Result;
use crate::types::{DoorPosition, FeedbackRequest};
use warden_core::Tick;

/// A row-scanned key matrix.
///
/// The scanner energizes one row per tick, reads the column lines back as a
/// bitmask (bit `n` set means column `n` is closed), then releases the row.
///
/// # Examples
///
/// ```
/// use warden_hardware::KeyMatrix;
///
/// fn pressed_columns<M: KeyMatrix>(matrix: &mut M, row: usize) -> u8 {
///     matrix.select_row(row);
///     let columns = matrix.read_columns();
///     matrix.release_row(row);
///     columns
/// }
/// ```
pub trait KeyMatrix: Send {
    /// Energize a single row.
    fn select_row(&mut self, row: usize);

    /// Sample the column lines of the currently selected row.
    fn read_columns(&mut self) -> u8;

    /// De-energize a row after sampling.
    fn release_row(&mut self, row: usize);
}

/// Byte-wide register access to a contactless reader.
///
/// A read or write either completes or fails; a failure is treated by the
/// card FSM like a transient timeout.
pub trait RegisterBus: Send {
    /// Read one register.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer fails.
    fn read(&mut self, register: u8) -> Result<u8>;

    /// Write one register.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer fails.
    fn write(&mut self, register: u8, value: u8) -> Result<()>;

    /// Read-modify-write setting `mask` bits.
    ///
    /// # Errors
    ///
    /// Returns an error if either transfer fails.
    fn set_bits(&mut self, register: u8, mask: u8) -> Result<()> {
        let value = self.read(register)?;
        self.write(register, value | mask)
    }

    /// Read-modify-write clearing `mask` bits.
    ///
    /// # Errors
    ///
    /// Returns an error if either transfer fails.
    fn clear_bits(&mut self, register: u8, mask: u8) -> Result<()> {
        let value = self.read(register)?;
        self.write(register, value & !mask)
    }
}

/// Edge-triggered passive motion sensor.
pub trait MotionSensor: Send + Sync {
    /// Return `true` once per detected motion edge, clearing it.
    fn take_motion(&self) -> bool;

    /// Drop any pending motion edge.
    fn discard_pending(&self) {
        let _ = self.take_motion();
    }
}

/// Door lock actuator. Requests are fire-and-forget.
pub trait DoorActuator: Send {
    /// Ask the door to move to `position`.
    ///
    /// # Errors
    ///
    /// Returns an error if the actuator refuses the request. The engine logs
    /// the failure and proceeds with its transition.
    fn request(&mut self, position: DoorPosition) -> Result<()>;
}

/// Audio/visual feedback generator.
pub trait FeedbackSink: Send {
    /// Submit a best-effort feedback request.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot accept the request.
    fn submit(&mut self, request: FeedbackRequest) -> Result<()>;
}

/// Monotonic millisecond tick source.
pub trait Clock: Send + Sync {
    /// Current tick.
    fn now(&self) -> Tick;

    /// Whether `duration_ms` has elapsed since `start`.
    fn is_timeout(&self, start: Tick, duration_ms: u32) -> bool {
        self.now().has_elapsed(start, duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapBus(HashMap<u8, u8>);

    impl RegisterBus for MapBus {
        fn read(&mut self, register: u8) -> Result<u8> {
            Ok(self.0.get(&register).copied().unwrap_or(0))
        }

        fn write(&mut self, register: u8, value: u8) -> Result<()> {
            self.0.insert(register, value);
            Ok(())
        }
    }

    #[test]
    fn test_set_and_clear_bits() {
        let mut bus = MapBus::default();
        bus.write(0x14, 0x80).unwrap();

        bus.set_bits(0x14, 0x03).unwrap();
        assert_eq!(bus.read(0x14).unwrap(), 0x83);

        bus.clear_bits(0x14, 0x80).unwrap();
        assert_eq!(bus.read(0x14).unwrap(), 0x03);
    }
}
