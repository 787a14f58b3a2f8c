//! Motion sensor latch shared between the sensor edge and the main loop.

use crate::traits::MotionSensor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Latches a motion edge until the security state machine reads it.
///
/// The sensor side calls [`MotionLatch::trigger`]; the engine clears the latch
/// with [`MotionSensor::take_motion`]. Clones share the latch.
#[derive(Debug, Clone, Default)]
pub struct MotionLatch {
    detected: Arc<AtomicBool>,
}

impl MotionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rising edge from the sensor.
    pub fn trigger(&self) {
        self.detected.store(true, Ordering::Release);
    }

    /// Whether an edge is waiting, without clearing it.
    pub fn is_pending(&self) -> bool {
        self.detected.load(Ordering::Acquire)
    }
}

impl MotionSensor for MotionLatch {
    fn take_motion(&self) -> bool {
        self.detected.swap(false, Ordering::AcqRel)
    }
}
