use thiserror::Error;
use warden_hardware::HardwareError;
use warden_storage::StorageError;

/// Errors surfaced by the engine's outer layers (admin console, runtime
/// bring-up). The step functions themselves never fail.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] warden_core::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// The credential rule that rejected the request, if that is the cause.
    pub fn credential_error(&self) -> Option<&warden_core::Error> {
        match self {
            EngineError::Core(error) | EngineError::Storage(StorageError::Credential(error)) => {
                Some(error)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::Error;

    #[test]
    fn test_credential_error_unwraps_storage() {
        let error = EngineError::from(StorageError::from(Error::NotAuthenticated));
        assert_eq!(error.credential_error(), Some(&Error::NotAuthenticated));

        let error = EngineError::from(HardwareError::bus(0x04, "no response"));
        assert_eq!(error.credential_error(), None);
    }
}
