//! Hardware collaborator contracts for the Warden access-control engine.
//!
//! The engine never touches pins or buses directly. It reaches every
//! peripheral through the traits in [`traits`]:
//!
//! - [`KeyMatrix`]: the row-scanned 4x4 keypad.
//! - [`RegisterBus`]: byte-wide register access to the contactless reader.
//! - [`MotionSensor`]: an edge-triggered motion flag, cleared on read.
//! - [`DoorActuator`] and [`FeedbackSink`]: fire-and-forget outputs.
//! - [`Clock`]: the wrapping millisecond tick.
//!
//! # Design
//!
//! - **Non-blocking**: every call completes immediately. The interrupt context
//!   and the cooperative main loop must never wait on a device.
//! - **Single writer**: state shared across contexts ([`TickCounter`],
//!   [`MotionLatch`]) is a single atomic with one producer and one consumer.
//! - **Error-aware**: fallible operations return [`Result<T>`][error::Result]
//!   with a [`HardwareError`]; the engine logs these and keeps running.
//!
//! # Mock Implementations
//!
//! The [`mock`] module provides simulated devices, each paired with a handle
//! for driving it from tests or the simulator.
//!
//! ```
//! use warden_core::Key;
//! use warden_hardware::mock::MockKeyMatrix;
//! use warden_hardware::{Clock, KeyMatrix, TickCounter};
//!
//! let ticks = TickCounter::new();
//! let (mut matrix, keys) = MockKeyMatrix::new();
//!
//! keys.press(Key::new('1').unwrap());
//! ticks.advance();
//!
//! matrix.select_row(0);
//! assert_eq!(matrix.read_columns(), 0b0001);
//! assert_eq!(ticks.now().as_millis(), 1);
//! ```

pub mod error;
pub mod mock;
pub mod motion;
pub mod tick;
pub mod traits;
pub mod types;

pub use error::{HardwareError, Result};
pub use motion::MotionLatch;
pub use tick::TickCounter;
pub use traits::{Clock, DoorActuator, FeedbackSink, KeyMatrix, MotionSensor, RegisterBus};
pub use types::{DoorPosition, FeedbackRequest, IndicatorCommand};
