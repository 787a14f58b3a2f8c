//! Simulated peripherals for running the engine off-device.

use std::time::Duration;
use tokio::time::sleep;
use tracing::info;
use warden_core::Key;
use warden_core::constants::BOOT_SETTLE_MS;
use warden_engine::Peripherals;
use warden_hardware::MotionLatch;
use warden_hardware::mock::{
    MockDoor, MockDoorHandle, MockFeedback, MockFeedbackHandle, MockKeyMatrix, MockKeyMatrixHandle,
};
use warden_rfid::mock::{MockReader, MockReaderHandle};

pub type SimulatedPeripherals = Peripherals<MockKeyMatrix, MockReader, MockDoor, MockFeedback>;

/// Controls for the simulated devices after they move into the runtime.
pub struct Simulator {
    keys: MockKeyMatrixHandle,
    field: MockReaderHandle,
    door: MockDoorHandle,
    feedback: MockFeedbackHandle,
    motion: MotionLatch,
}

impl Simulator {
    pub fn new() -> (Self, SimulatedPeripherals) {
        let (matrix, keys) = MockKeyMatrix::new();
        let (reader_bus, field) = MockReader::new();
        let (door, door_log) = MockDoor::new();
        let (feedback, feedback_log) = MockFeedback::new();
        let motion = MotionLatch::new();

        let simulator = Self {
            keys,
            field,
            door: door_log,
            feedback: feedback_log,
            motion: motion.clone(),
        };
        let peripherals = Peripherals {
            matrix,
            reader_bus,
            door,
            feedback,
            motion,
        };
        (simulator, peripherals)
    }

    /// Press and release each key with a human cadence.
    pub async fn type_keys(&self, keys: &[Key]) {
        for &key in keys {
            self.keys.press(key);
            sleep(Duration::from_millis(150)).await;
            self.keys.release(key);
            sleep(Duration::from_millis(100)).await;
        }
    }

    pub async fn swipe(&self, uid: [u8; 4]) {
        self.field.present_card(uid);
        sleep(Duration::from_millis(300)).await;
        self.field.remove_card();
        sleep(Duration::from_millis(700)).await;
    }

    /// Someone walks in, fumbles a card and then types the door PIN.
    pub async fn walk_through(&self, door_pin: &[Key]) {
        sleep(Duration::from_millis(u64::from(BOOT_SETTLE_MS) + 200)).await;

        info!("simulation: motion detected");
        self.motion.trigger();
        sleep(Duration::from_millis(500)).await;

        info!("simulation: unknown card presented");
        self.swipe([0x13, 0x37, 0xC0, 0xDE]).await;

        info!("simulation: door PIN typed");
        self.type_keys(door_pin).await;
        sleep(Duration::from_millis(200)).await;

        info!(
            door = ?self.door.position(),
            indicator = self.feedback.indicator_on(),
            "simulation finished"
        );
    }
}
