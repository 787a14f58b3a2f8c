//! Non-blocking card-read protocol FSM.
//!
//! One request/anti-collision cycle is attempted per poll interval. Every
//! call to [`CardReaderFsm::poll`] performs a bounded number of register
//! transfers and returns; waiting for the reader happens across polls.

use crate::registers::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, trace};
use warden_core::constants::{
    CARD_INACTIVITY_MS, CARD_POLL_INTERVAL_MS, CARD_RESPONSE_TIMEOUT_MS, CARD_UID_LENGTH,
};
use warden_core::{CardUid, Tick};
use warden_hardware::{HardwareError, RegisterBus};

/// Timing of the card-read cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardReaderConfig {
    /// Interval between request attempts while idle.
    pub poll_interval_ms: u32,

    /// Time allowed for each reader response.
    pub response_timeout_ms: u32,

    /// The last-seen card is forgotten after this long without a read.
    pub inactivity_ms: u32,
}

impl Default for CardReaderConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: CARD_POLL_INTERVAL_MS,
            response_timeout_ms: CARD_RESPONSE_TIMEOUT_MS,
            inactivity_ms: CARD_INACTIVITY_MS,
        }
    }
}

/// Protocol phase of the reader FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReaderState {
    Idle,
    RequestSent,
    AnticollisionSent,
}

impl fmt::Display for ReaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaderState::Idle => write!(f, "IDLE"),
            ReaderState::RequestSent => write!(f, "REQUEST_SENT"),
            ReaderState::AnticollisionSent => write!(f, "ANTICOLLISION_SENT"),
        }
    }
}

/// A card read by the FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardScanResult {
    pub uid: [u8; CARD_UID_LENGTH],
    pub is_new: bool,
}

impl CardScanResult {
    /// The identifier packed big-endian.
    pub fn card_uid(&self) -> Option<CardUid> {
        CardUid::from_bytes(self.uid)
    }
}

/// Source of card scan results for the security state machine.
pub trait CardSource {
    /// Return the pending result once, then `None`.
    fn take_scan(&mut self) -> Option<CardScanResult>;

    /// Drop any pending result.
    fn discard_pending(&mut self);
}

/// Drives REQA, anti-collision and HALT against an MFRC522-style reader.
///
/// A card held on the reader produces one result. The last-seen identifier
/// is refreshed on every successful read and forgotten after the inactivity
/// window, so the same card presented again later counts as new.
///
/// Bus failures are treated like a missing response: the cycle aborts to
/// [`ReaderState::Idle`] and the next poll interval retries.
#[derive(Debug)]
pub struct CardReaderFsm<B> {
    bus: B,
    config: CardReaderConfig,
    state: ReaderState,
    state_since: Tick,
    last_request_at: Tick,
    last_seen: Option<([u8; CARD_UID_LENGTH], Tick)>,
    last_uid: Option<[u8; CARD_UID_LENGTH]>,
    pending: Option<CardScanResult>,
}

impl<B: RegisterBus> CardReaderFsm<B> {
    pub fn new(bus: B, config: CardReaderConfig) -> Self {
        Self {
            bus,
            config,
            state: ReaderState::Idle,
            state_since: Tick::ZERO,
            last_request_at: Tick::ZERO,
            last_seen: None,
            last_uid: None,
            pending: None,
        }
    }

    /// Bring the reader up: soft reset, timer, modulation, CRC preset and
    /// antenna.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::InitializationFailed` if any register transfer
    /// fails.
    pub fn initialize(&mut self) -> Result<(), HardwareError> {
        self.configure()
            .map_err(|e| HardwareError::initialization_failed(format!("card reader: {e}")))?;
        info!("card reader initialized");
        Ok(())
    }

    fn configure(&mut self) -> Result<(), HardwareError> {
        self.bus.write(COMMAND, PCD_SOFT_RESET)?;
        // Timer: auto start, ~25ms reload.
        self.bus.write(T_MODE, 0x8D)?;
        self.bus.write(T_PRESCALER, 0x3E)?;
        self.bus.write(T_RELOAD_H, 0)?;
        self.bus.write(T_RELOAD_L, 30)?;
        // 100% ASK modulation.
        self.bus.write(TX_ASK, 0x40)?;
        // CRC preset 0x6363.
        self.bus.write(MODE, 0x3D)?;
        // Maximum receiver gain.
        self.bus.write(RF_CFG, 0x70)?;
        let tx = self.bus.read(TX_CONTROL)?;
        if tx & ANTENNA_ON != ANTENNA_ON {
            self.bus.write(TX_CONTROL, tx | ANTENNA_ON)?;
        }
        Ok(())
    }

    /// Advance the protocol by at most one step.
    pub fn poll(&mut self, now: Tick) {
        let result = match self.state {
            ReaderState::Idle => self.poll_idle(now),
            ReaderState::RequestSent => self.poll_request(now),
            ReaderState::AnticollisionSent => self.poll_anticollision(now),
        };
        if let Err(error) = result {
            debug!(%error, state = %self.state, "card cycle aborted");
            self.state = ReaderState::Idle;
        }
    }

    fn poll_idle(&mut self, now: Tick) -> Result<(), HardwareError> {
        if let Some((_, seen_at)) = self.last_seen
            && now.has_elapsed(seen_at, self.config.inactivity_ms)
        {
            trace!("last-seen card expired");
            self.last_seen = None;
        }

        if !now.has_elapsed(self.last_request_at, self.config.poll_interval_ms) {
            return Ok(());
        }
        self.last_request_at = now;

        self.bus.write(BIT_FRAMING, SHORT_FRAME_BITS)?;
        self.transceive(&[PICC_REQIDL])?;
        self.enter(ReaderState::RequestSent, now);
        Ok(())
    }

    fn poll_request(&mut self, now: Tick) -> Result<(), HardwareError> {
        if now.has_elapsed(self.state_since, self.config.response_timeout_ms) {
            trace!("no card answered the request");
            self.state = ReaderState::Idle;
            return Ok(());
        }
        let Some(clean) = self.response_status()? else {
            return Ok(());
        };
        if !clean {
            debug!("request answer carried a reader error");
            self.state = ReaderState::Idle;
            return Ok(());
        }

        self.bus.write(BIT_FRAMING, 0x00)?;
        self.transceive(&[PICC_ANTICOLL, ANTICOLL_NVB])?;
        self.enter(ReaderState::AnticollisionSent, now);
        Ok(())
    }

    fn poll_anticollision(&mut self, now: Tick) -> Result<(), HardwareError> {
        if now.has_elapsed(self.state_since, self.config.response_timeout_ms) {
            trace!("anti-collision timed out");
            self.state = ReaderState::Idle;
            return Ok(());
        }
        let Some(clean) = self.response_status()? else {
            return Ok(());
        };
        self.state = ReaderState::Idle;
        if !clean {
            debug!("anti-collision answer carried a reader error");
            return Ok(());
        }

        let level = usize::from(self.bus.read(FIFO_LEVEL)?).min(UID_FRAME_LENGTH);
        let mut frame = [0u8; UID_FRAME_LENGTH];
        for byte in frame.iter_mut().take(level) {
            *byte = self.bus.read(FIFO_DATA)?;
        }
        if level < UID_FRAME_LENGTH {
            trace!(level, "short anti-collision frame");
            return Ok(());
        }

        let mut uid = [0u8; CARD_UID_LENGTH];
        uid.copy_from_slice(&frame[..CARD_UID_LENGTH]);
        let check = uid.iter().fold(0u8, |acc, b| acc ^ b);
        if check != frame[CARD_UID_LENGTH] {
            trace!("identifier checksum mismatch");
            return Ok(());
        }
        if uid == [0; CARD_UID_LENGTH] {
            trace!("empty identifier");
            return Ok(());
        }

        self.accept(uid, now);
        Ok(())
    }

    fn accept(&mut self, uid: [u8; CARD_UID_LENGTH], now: Tick) {
        if matches!(self.last_seen, Some((cached, _)) if cached == uid) {
            trace!("card still present");
            self.last_seen = Some((uid, now));
            return;
        }

        self.last_seen = Some((uid, now));
        self.last_uid = Some(uid);
        self.pending = Some(CardScanResult { uid, is_new: true });
        info!(
            uid = %format_uid(uid),
            "card scanned"
        );

        if let Err(error) = self.transceive(&[PICC_HALT, 0x00]) {
            debug!(%error, "halt not sent");
        }
    }

    /// `None` while the reader is busy, otherwise whether the answer was
    /// error-free.
    fn response_status(&mut self) -> Result<Option<bool>, HardwareError> {
        let irq = self.bus.read(COM_IRQ)?;
        if irq & IRQ_RX_IDLE == 0 {
            return Ok(None);
        }
        let error = self.bus.read(ERROR)?;
        Ok(Some(error & ERROR_MASK == 0))
    }

    fn transceive(&mut self, data: &[u8]) -> Result<(), HardwareError> {
        self.bus.write(COMMAND, PCD_IDLE)?;
        self.bus.write(COM_IRQ, IRQ_CLEAR_ALL)?;
        self.bus.write(FIFO_LEVEL, FIFO_FLUSH)?;
        for &byte in data {
            self.bus.write(FIFO_DATA, byte)?;
        }
        self.bus.write(COMMAND, PCD_TRANSCEIVE)?;
        self.bus.set_bits(BIT_FRAMING, START_SEND)
    }

    fn enter(&mut self, state: ReaderState, now: Tick) {
        trace!(from = %self.state, to = %state, "card reader transition");
        self.state = state;
        self.state_since = now;
    }

    /// Take the pending new-card result.
    pub fn take_scan(&mut self) -> Option<CardScanResult> {
        self.pending.take()
    }

    /// Drop any pending result.
    pub fn discard_pending(&mut self) {
        self.pending = None;
    }

    /// Identifier of the most recent new card, for diagnostics.
    pub fn last_uid(&self) -> Option<[u8; CARD_UID_LENGTH]> {
        self.last_uid
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<B: RegisterBus> CardSource for CardReaderFsm<B> {
    fn take_scan(&mut self) -> Option<CardScanResult> {
        CardReaderFsm::take_scan(self)
    }

    fn discard_pending(&mut self) {
        CardReaderFsm::discard_pending(self);
    }
}

fn format_uid(uid: [u8; CARD_UID_LENGTH]) -> String {
    uid.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
