//! MFRC522 register map and the command bytes the card FSM uses.
//!
//! Only the subset needed for REQA, single-size anti-collision and HALT is
//! listed here.

// ============================================================================
// Registers
// ============================================================================

pub const COMMAND: u8 = 0x01;
pub const COM_IRQ: u8 = 0x04;
pub const ERROR: u8 = 0x06;
pub const FIFO_DATA: u8 = 0x09;
pub const FIFO_LEVEL: u8 = 0x0A;
pub const BIT_FRAMING: u8 = 0x0D;
pub const MODE: u8 = 0x11;
pub const TX_CONTROL: u8 = 0x14;
pub const TX_ASK: u8 = 0x15;
pub const RF_CFG: u8 = 0x26;
pub const T_MODE: u8 = 0x2A;
pub const T_PRESCALER: u8 = 0x2B;
pub const T_RELOAD_H: u8 = 0x2C;
pub const T_RELOAD_L: u8 = 0x2D;

// ============================================================================
// Reader commands (CommandReg)
// ============================================================================

pub const PCD_IDLE: u8 = 0x00;
pub const PCD_TRANSCEIVE: u8 = 0x0C;
pub const PCD_SOFT_RESET: u8 = 0x0F;

// ============================================================================
// Card commands (sent through the FIFO)
// ============================================================================

/// Request idle cards, 7-bit short frame.
pub const PICC_REQIDL: u8 = 0x26;

/// Anti-collision, cascade level 1.
pub const PICC_ANTICOLL: u8 = 0x93;

/// NVB for anti-collision: two valid bytes, no UID bits known yet.
pub const ANTICOLL_NVB: u8 = 0x20;

pub const PICC_HALT: u8 = 0x50;

// ============================================================================
// Bits and masks
// ============================================================================

/// ComIrqReg: RxIRq | IdleIRq.
pub const IRQ_RX_IDLE: u8 = 0x30;

/// Value written to ComIrqReg to clear every interrupt flag.
pub const IRQ_CLEAR_ALL: u8 = 0x7F;

/// ErrorReg: BufferOvfl | CollErr | ParityErr | ProtocolErr.
pub const ERROR_MASK: u8 = 0x1B;

/// FIFOLevelReg: flush the FIFO.
pub const FIFO_FLUSH: u8 = 0x80;

/// BitFramingReg: start transmission.
pub const START_SEND: u8 = 0x80;

/// BitFramingReg: transmit only 7 bits of the last byte (short frame).
pub const SHORT_FRAME_BITS: u8 = 0x07;

/// TxControlReg: drive both antenna pins.
pub const ANTENNA_ON: u8 = 0x03;

/// Anti-collision answer: four identifier bytes plus the XOR check byte.
pub const UID_FRAME_LENGTH: usize = 5;
