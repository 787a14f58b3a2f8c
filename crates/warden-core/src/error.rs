use thiserror::Error;

use crate::types::CardUid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Credential format errors
    #[error("Invalid key: {0:?}")]
    InvalidKey(char),

    #[error("Invalid PIN: {0}")]
    InvalidPin(String),

    #[error("Invalid admin password: {0}")]
    InvalidAdminPassword(String),

    #[error("Invalid card identifier: {0}")]
    InvalidCardUid(String),

    // Authorized card set errors
    #[error("Card {0} is already authorized")]
    DuplicateCard(CardUid),

    #[error("Authorized card storage full ({capacity} slots)")]
    CardStoreFull { capacity: usize },

    #[error("Card {0} is not authorized")]
    CardNotFound(CardUid),

    // Console errors
    #[error("Admin session required")]
    NotAuthenticated,

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
