//! Contactless card reading for the Warden access-control engine.
//!
//! [`CardReaderFsm`] drives a half-duplex request / anti-collision / halt
//! exchange against an MFRC522-style reader over a [`RegisterBus`], one
//! non-blocking step per main-loop iteration. Each newly presented card
//! yields exactly one [`CardScanResult`].
//!
//! ```text
//!   Idle ──poll interval──▶ RequestSent ──answer──▶ AnticollisionSent
//!    ▲                          │ timeout/error            │
//!    └──────────────────────────┴──────────────────────────┘
//! ```
//!
//! [`RegisterBus`]: warden_hardware::RegisterBus

pub mod mock;
pub mod reader;
pub mod registers;

pub use reader::{CardReaderConfig, CardReaderFsm, CardScanResult, CardSource, ReaderState};
