//! The tokio runtime under paused time.
//!
//! A paused clock auto-advances only when every task is idle, so each
//! interval tick is followed by exactly one main-loop step, like the device.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use warden_core::{AdminPassword, CardUid, CredentialConfig, Key, Pin};
use warden_engine::{
    AdminConsole, AuditTrail, DeviceRuntime, EngineError, Peripherals, RuntimeConfig,
    RuntimeHandle, SecurityState,
};
use warden_hardware::mock::{
    MockDoor, MockDoorHandle, MockFeedback, MockKeyMatrix, MockKeyMatrixHandle,
};
use warden_hardware::{DoorPosition, MotionLatch};
use warden_rfid::mock::{MockReader, MockReaderHandle};
use warden_storage::{CredentialRepository, CredentialStore, StorageResult};

/// Keeps sqlx and its blocking pool out of the paused clock.
#[derive(Default)]
struct MemoryRepository {
    stored: Mutex<Option<CredentialConfig>>,
}

impl MemoryRepository {
    fn update(&self, apply: impl FnOnce(&mut CredentialConfig)) {
        let mut stored = self.stored.lock().unwrap();
        apply(stored.get_or_insert_with(CredentialConfig::default));
    }
}

impl CredentialRepository for MemoryRepository {
    async fn load(&self) -> StorageResult<Option<CredentialConfig>> {
        Ok(self.stored.lock().unwrap().clone())
    }

    async fn replace_all(&self, config: &CredentialConfig) -> StorageResult<()> {
        *self.stored.lock().unwrap() = Some(config.clone());
        Ok(())
    }

    async fn save_door_pin(&self, pin: &Pin) -> StorageResult<()> {
        self.update(|config| config.set_door_pin(pin.clone()));
        Ok(())
    }

    async fn save_admin_password(&self, password: &AdminPassword) -> StorageResult<()> {
        self.update(|config| config.set_admin_password(password.clone()));
        Ok(())
    }

    async fn insert_card(&self, slot: usize, uid: CardUid) -> StorageResult<()> {
        self.update(|config| {
            config.set_slot(slot, Some(uid)).unwrap();
        });
        Ok(())
    }

    async fn delete_card(&self, uid: CardUid) -> StorageResult<u64> {
        let mut removed = 0;
        self.update(|config| {
            if config.remove_card(uid).is_ok() {
                removed = 1;
            }
        });
        Ok(removed)
    }
}

struct Rig {
    runtime: RuntimeHandle,
    store: Arc<CredentialStore<MemoryRepository>>,
    keys: MockKeyMatrixHandle,
    field: MockReaderHandle,
    door: MockDoorHandle,
    motion: MotionLatch,
}

impl Rig {
    async fn start() -> Self {
        let store = Arc::new(
            CredentialStore::open(MemoryRepository::default())
                .await
                .unwrap(),
        );
        let (matrix, keys) = MockKeyMatrix::new();
        let (reader_bus, field) = MockReader::new();
        let (door_mock, door) = MockDoor::new();
        let (feedback, _) = MockFeedback::new();
        let motion = MotionLatch::new();

        let runtime = DeviceRuntime::start(
            RuntimeConfig::default(),
            Peripherals {
                matrix,
                reader_bus,
                door: door_mock,
                feedback,
                motion: motion.clone(),
            },
            Arc::clone(&store),
            AuditTrail::log_only(),
        )
        .unwrap();

        Self {
            runtime,
            store,
            keys,
            field,
            door,
            motion,
        }
    }

    async fn settle(&self) {
        sleep(Duration::from_millis(2100)).await;
    }

    async fn type_keys(&self, keys: &str) {
        for c in keys.chars() {
            let key = Key::new(c).unwrap();
            self.keys.press(key);
            sleep(Duration::from_millis(150)).await;
            self.keys.release(key);
            sleep(Duration::from_millis(50)).await;
        }
    }

    fn state(&self) -> SecurityState {
        self.runtime.session().state
    }
}

#[tokio::test(start_paused = true)]
async fn test_typed_pin_opens_door() {
    let rig = Rig::start().await;
    rig.settle().await;
    assert_eq!(rig.door.requests(), vec![DoorPosition::Closed]);

    rig.type_keys("1234").await;
    assert_eq!(rig.state(), SecurityState::Disarmed);
    assert_eq!(rig.door.position(), Some(DoorPosition::Open));

    rig.runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_clock_tracks_runtime_time() {
    let rig = Rig::start().await;
    sleep(Duration::from_millis(500)).await;
    let now = rig.runtime.now().as_millis();
    assert!((499..=501).contains(&now), "tick was {now}");
    rig.runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_motion_and_card_through_runtime() {
    let rig = Rig::start().await;
    rig.store
        .add_card(CardUid::from_bytes([0x0A, 0x0B, 0x0C, 0x0D]).unwrap())
        .await
        .unwrap();
    rig.settle().await;

    let mut session = rig.runtime.subscribe();
    rig.motion.trigger();
    timeout(
        Duration::from_secs(1),
        session.wait_for(|session| session.state == SecurityState::EntryDelay),
    )
    .await
    .unwrap()
    .unwrap();

    rig.field.present_card([0x0A, 0x0B, 0x0C, 0x0D]);
    sleep(Duration::from_millis(300)).await;
    assert_eq!(rig.state(), SecurityState::Disarmed);

    rig.runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_admin_changes_apply_to_running_device() {
    let rig = Rig::start().await;
    let mut console = AdminConsole::new(Arc::clone(&rig.store));
    assert!(console.login("123456"));
    console.set_door_pin("4321").await.unwrap();
    rig.settle().await;

    rig.type_keys("1234").await;
    assert_eq!(rig.state(), SecurityState::Armed);
    assert_eq!(rig.runtime.session().failed_attempts, 1);

    rig.type_keys("4321").await;
    assert_eq!(rig.state(), SecurityState::Disarmed);

    rig.runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_faulty_reader_prevents_start() {
    let store = Arc::new(
        CredentialStore::open(MemoryRepository::default())
            .await
            .unwrap(),
    );
    let (matrix, _keys) = MockKeyMatrix::new();
    let (reader_bus, field) = MockReader::new();
    field.set_faulty(true);
    let (door, _) = MockDoor::new();
    let (feedback, _) = MockFeedback::new();

    let result = DeviceRuntime::start(
        RuntimeConfig::default(),
        Peripherals {
            matrix,
            reader_bus,
            door,
            feedback,
            motion: MotionLatch::new(),
        },
        store,
        AuditTrail::log_only(),
    );
    assert!(matches!(result, Err(EngineError::Hardware(_))));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_timing_prevents_start() {
    let store = Arc::new(
        CredentialStore::open(MemoryRepository::default())
            .await
            .unwrap(),
    );
    let (matrix, _keys) = MockKeyMatrix::new();
    let (reader_bus, _field) = MockReader::new();
    let (door, _) = MockDoor::new();
    let (feedback, _) = MockFeedback::new();

    let mut config = RuntimeConfig::default();
    config.timing.brute_force_limit = 0;

    let result = DeviceRuntime::start(
        config,
        Peripherals {
            matrix,
            reader_bus,
            door,
            feedback,
            motion: MotionLatch::new(),
        },
        store,
        AuditTrail::log_only(),
    );
    let error = result.err().unwrap();
    assert!(matches!(
        error.credential_error(),
        Some(warden_core::Error::Config(_))
    ));
}
