//! Mock device implementations for testing and simulation.
//!
//! Each mock comes paired with a handle that drives or inspects it from
//! another task, so the engine can own the device while a test or the
//! simulator controls it.

pub mod door;
pub mod feedback;
pub mod keypad;

pub use door::{MockDoor, MockDoorHandle};
pub use feedback::{MockFeedback, MockFeedbackHandle};
pub use keypad::{MockKeyMatrix, MockKeyMatrixHandle};
