//! Error types for hardware operations.
//!
//! This module defines error types for the collaborators the engine drives:
//! the reader register bus, the door actuator and the feedback sink. None of
//! these errors halt the engine; the state machines log them and carry on.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HardwareError {
    /// Register bus transfer failed.
    #[error("Bus error at register {register:#04x}: {message}")]
    Bus { register: u8, message: String },

    /// Device initialization failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Actuator or feedback request refused.
    #[error("Request rejected by {device}: {message}")]
    Rejected { device: String, message: String },
}

impl HardwareError {
    /// Create a new bus error for a specific register.
    pub fn bus(register: u8, message: impl Into<String>) -> Self {
        Self::Bus {
            register,
            message: message.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a new rejected request error.
    pub fn rejected(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            device: device.into(),
            message: message.into(),
        }
    }
}
