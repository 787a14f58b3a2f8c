//! Recording door actuator.

use crate::{HardwareError, Result, traits::DoorActuator, types::DoorPosition};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
struct DoorLog {
    requests: Mutex<Vec<DoorPosition>>,
    jammed: AtomicBool,
}

/// Door actuator that records every request.
///
/// # Examples
///
/// ```
/// use warden_hardware::mock::MockDoor;
/// use warden_hardware::{DoorActuator, DoorPosition};
///
/// let (mut door, handle) = MockDoor::new();
/// door.request(DoorPosition::Open).unwrap();
/// assert_eq!(handle.requests(), vec![DoorPosition::Open]);
/// assert_eq!(handle.position(), Some(DoorPosition::Open));
/// ```
#[derive(Debug)]
pub struct MockDoor {
    log: Arc<DoorLog>,
}

impl MockDoor {
    pub fn new() -> (Self, MockDoorHandle) {
        let log = Arc::new(DoorLog::default());
        (
            Self {
                log: Arc::clone(&log),
            },
            MockDoorHandle { log },
        )
    }
}

impl DoorActuator for MockDoor {
    fn request(&mut self, position: DoorPosition) -> Result<()> {
        if self.log.jammed.load(Ordering::Acquire) {
            return Err(HardwareError::rejected("door", "actuator jammed"));
        }
        self.log
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(position);
        Ok(())
    }
}

/// Inspection handle for a [`MockDoor`].
#[derive(Debug, Clone)]
pub struct MockDoorHandle {
    log: Arc<DoorLog>,
}

impl MockDoorHandle {
    /// Every accepted request, oldest first.
    pub fn requests(&self) -> Vec<DoorPosition> {
        self.log
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Last accepted position.
    pub fn position(&self) -> Option<DoorPosition> {
        self.requests().last().copied()
    }

    /// Make subsequent requests fail.
    pub fn set_jammed(&self, jammed: bool) {
        self.log.jammed.store(jammed, Ordering::Release);
    }

    pub fn clear(&self) {
        self.log
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
