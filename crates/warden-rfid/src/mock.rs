//! Register-level MFRC522 emulator for tests and simulation.
//!
//! The emulator answers REQA, anti-collision and HALT the moment a transceive
//! is started, which is enough to exercise every path of the card FSM. Tests
//! and the simulator drive the card field through [`MockReaderHandle`].

use crate::registers::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use warden_core::constants::CARD_UID_LENGTH;
use warden_hardware::{HardwareError, RegisterBus};

const REGISTER_COUNT: usize = 0x40;
const TX_CONTROL_RESET: u8 = 0x80;
const ATQA: [u8; 2] = [0x04, 0x00];

#[derive(Debug)]
struct Emulator {
    registers: [u8; REGISTER_COUNT],
    fifo: VecDeque<u8>,
    card: Option<[u8; CARD_UID_LENGTH]>,
    halted: bool,
    ignores_halt: bool,
    faulty: bool,
    corrupt_next: bool,
    corrupt_all: bool,
    short_next: bool,
    pending_error: Option<u8>,
    requests_seen: usize,
    halt_count: usize,
}

impl Emulator {
    fn new() -> Self {
        let mut emulator = Self {
            registers: [0; REGISTER_COUNT],
            fifo: VecDeque::new(),
            card: None,
            halted: false,
            ignores_halt: false,
            faulty: false,
            corrupt_next: false,
            corrupt_all: false,
            short_next: false,
            pending_error: None,
            requests_seen: 0,
            halt_count: 0,
        };
        emulator.reset();
        emulator
    }

    fn reset(&mut self) {
        self.registers = [0; REGISTER_COUNT];
        self.registers[usize::from(TX_CONTROL)] = TX_CONTROL_RESET;
        self.fifo.clear();
    }

    fn read(&mut self, register: u8) -> u8 {
        match register {
            FIFO_LEVEL => u8::try_from(self.fifo.len()).unwrap_or(u8::MAX),
            FIFO_DATA => self.fifo.pop_front().unwrap_or(0),
            _ => self.registers[usize::from(register) % REGISTER_COUNT],
        }
    }

    fn write(&mut self, register: u8, value: u8) {
        match register {
            COMMAND if value == PCD_SOFT_RESET => self.reset(),
            // Bit 7 selects whether the marked bits are set or cleared.
            COM_IRQ => {
                let flags = &mut self.registers[usize::from(COM_IRQ)];
                if value & 0x80 != 0 {
                    *flags |= value & 0x7F;
                } else {
                    *flags &= !value;
                }
            }
            FIFO_LEVEL if value & FIFO_FLUSH != 0 => self.fifo.clear(),
            FIFO_DATA => self.fifo.push_back(value),
            BIT_FRAMING => {
                let command = self.registers[usize::from(COMMAND)];
                if value & START_SEND != 0 && command == PCD_TRANSCEIVE {
                    self.registers[usize::from(BIT_FRAMING)] = value & !START_SEND;
                    self.transceive();
                } else {
                    self.registers[usize::from(BIT_FRAMING)] = value;
                }
            }
            _ => self.registers[usize::from(register) % REGISTER_COUNT] = value,
        }
    }

    fn transceive(&mut self) {
        let frame: Vec<u8> = self.fifo.drain(..).collect();
        match frame.as_slice() {
            [PICC_REQIDL] => {
                self.requests_seen += 1;
                if self.card.is_some() && !self.halted {
                    self.respond(&ATQA);
                }
            }
            [PICC_ANTICOLL, ANTICOLL_NVB] => {
                if let Some(uid) = self.card.filter(|_| !self.halted) {
                    let check = uid.iter().fold(0u8, |acc, b| acc ^ b);
                    let mut answer = uid.to_vec();
                    answer.push(check);
                    if self.corrupt_all || std::mem::take(&mut self.corrupt_next) {
                        answer[CARD_UID_LENGTH] ^= 0xFF;
                    }
                    if std::mem::take(&mut self.short_next) {
                        answer.truncate(3);
                    }
                    self.respond(&answer);
                }
            }
            [PICC_HALT, ..] => {
                self.halt_count += 1;
                if !self.ignores_halt {
                    self.halted = true;
                }
            }
            _ => {}
        }
    }

    fn respond(&mut self, answer: &[u8]) {
        self.fifo.extend(answer);
        self.registers[usize::from(ERROR)] = self.pending_error.take().unwrap_or(0);
        self.registers[usize::from(COM_IRQ)] |= IRQ_RX_IDLE;
    }
}

/// Emulated reader on the register bus.
///
/// # Examples
///
/// ```
/// use warden_core::Tick;
/// use warden_rfid::mock::MockReader;
/// use warden_rfid::{CardReaderConfig, CardReaderFsm};
///
/// let (bus, field) = MockReader::new();
/// let mut reader = CardReaderFsm::new(bus, CardReaderConfig::default());
/// field.present_card([0x11, 0x22, 0x33, 0x44]);
///
/// for ms in 0..200 {
///     reader.poll(Tick::from_millis(ms));
/// }
/// let scan = reader.take_scan().unwrap();
/// assert_eq!(scan.uid, [0x11, 0x22, 0x33, 0x44]);
/// ```
#[derive(Debug)]
pub struct MockReader {
    emulator: Arc<Mutex<Emulator>>,
}

impl MockReader {
    pub fn new() -> (Self, MockReaderHandle) {
        let emulator = Arc::new(Mutex::new(Emulator::new()));
        (
            Self {
                emulator: Arc::clone(&emulator),
            },
            MockReaderHandle { emulator },
        )
    }

    fn lock(&self) -> MutexGuard<'_, Emulator> {
        self.emulator.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RegisterBus for MockReader {
    fn read(&mut self, register: u8) -> warden_hardware::Result<u8> {
        let mut emulator = self.lock();
        if emulator.faulty {
            return Err(HardwareError::bus(register, "no response"));
        }
        Ok(emulator.read(register))
    }

    fn write(&mut self, register: u8, value: u8) -> warden_hardware::Result<()> {
        let mut emulator = self.lock();
        if emulator.faulty {
            return Err(HardwareError::bus(register, "no response"));
        }
        emulator.write(register, value);
        Ok(())
    }
}

/// Controls the card field of a [`MockReader`].
#[derive(Debug, Clone)]
pub struct MockReaderHandle {
    emulator: Arc<Mutex<Emulator>>,
}

impl MockReaderHandle {
    /// Place a card in the field. A new card starts un-halted.
    pub fn present_card(&self, uid: [u8; CARD_UID_LENGTH]) {
        let mut emulator = self.lock();
        emulator.card = Some(uid);
        emulator.halted = false;
    }

    pub fn remove_card(&self) {
        let mut emulator = self.lock();
        emulator.card = None;
        emulator.halted = false;
    }

    /// Keep answering requests after HALT, like a card that missed it.
    pub fn set_ignores_halt(&self, ignores: bool) {
        self.lock().ignores_halt = ignores;
    }

    /// Fail every register transfer.
    pub fn set_faulty(&self, faulty: bool) {
        self.lock().faulty = faulty;
    }

    /// Flip the check byte of the next anti-collision answer.
    pub fn corrupt_next_frame(&self) {
        self.lock().corrupt_next = true;
    }

    pub fn set_corrupt_all(&self, corrupt: bool) {
        self.lock().corrupt_all = corrupt;
    }

    /// Truncate the next anti-collision answer to three bytes.
    pub fn short_next_frame(&self) {
        self.lock().short_next = true;
    }

    /// Report `flags` in the error register with the next answer.
    pub fn inject_error(&self, flags: u8) {
        self.lock().pending_error = Some(flags);
    }

    pub fn requests_seen(&self) -> usize {
        self.lock().requests_seen
    }

    pub fn halt_count(&self) -> usize {
        self.lock().halt_count
    }

    /// Raw register contents.
    pub fn register(&self, register: u8) -> u8 {
        self.lock().registers[usize::from(register) % REGISTER_COUNT]
    }

    fn lock(&self) -> MutexGuard<'_, Emulator> {
        self.emulator.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
