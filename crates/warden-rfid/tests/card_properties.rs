//! Property tests for the card-read cycle against the emulated reader.

use proptest::prelude::*;
use warden_core::Tick;
use warden_rfid::mock::{MockReader, MockReaderHandle};
use warden_rfid::{CardReaderConfig, CardReaderFsm, CardScanResult};

fn setup() -> (CardReaderFsm<MockReader>, MockReaderHandle) {
    let (bus, handle) = MockReader::new();
    (CardReaderFsm::new(bus, CardReaderConfig::default()), handle)
}

fn run(fsm: &mut CardReaderFsm<MockReader>, from: u32, to: u32) -> Vec<CardScanResult> {
    (from..to)
        .filter_map(|ms| {
            fsm.poll(Tick::from_millis(ms));
            fsm.take_scan()
        })
        .collect()
}

fn nonzero_uid() -> impl Strategy<Value = [u8; 4]> {
    any::<[u8; 4]>().prop_filter("identifier must be non-zero", |uid| *uid != [0; 4])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A card held for any length of time is reported exactly once.
    #[test]
    fn prop_held_card_reports_once(
        uid in nonzero_uid(),
        hold_ms in 150u32..4000,
        ignores_halt in any::<bool>(),
    ) {
        let (mut fsm, field) = setup();
        field.set_ignores_halt(ignores_halt);
        field.present_card(uid);
        let results = run(&mut fsm, 0, hold_ms);
        prop_assert_eq!(results.len(), 1);
        prop_assert_eq!(results[0].uid, uid);
    }

    /// Corrupted frames never yield a result or touch the last-seen card.
    #[test]
    fn prop_corrupt_frames_never_report(uid in nonzero_uid(), duration in 100u32..2000) {
        let (mut fsm, field) = setup();
        field.set_corrupt_all(true);
        field.present_card(uid);
        prop_assert!(run(&mut fsm, 0, duration).is_empty());
        prop_assert_eq!(fsm.last_uid(), None);
    }

    /// Re-presenting after the inactivity window counts as a new card.
    #[test]
    fn prop_represent_after_gap_is_new(uid in nonzero_uid(), gap in 700u32..3000) {
        let (mut fsm, field) = setup();
        field.present_card(uid);
        prop_assert_eq!(run(&mut fsm, 0, 200).len(), 1);
        field.remove_card();
        run(&mut fsm, 200, 200 + gap);
        field.present_card(uid);
        prop_assert_eq!(run(&mut fsm, 200 + gap, 400 + gap).len(), 1);
    }
}

#[test]
fn test_result_is_readable_once() {
    let (mut fsm, field) = setup();
    field.present_card([0xCA, 0xFE, 0x00, 0x01]);
    for ms in 0..200 {
        fsm.poll(Tick::from_millis(ms));
    }
    assert!(fsm.take_scan().is_some());
    assert!(fsm.take_scan().is_none());
    assert_eq!(fsm.last_uid(), Some([0xCA, 0xFE, 0x00, 0x01]));
}
