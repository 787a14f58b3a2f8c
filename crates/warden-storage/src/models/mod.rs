pub mod access_log;
pub mod credentials;

pub use access_log::{AccessLog, MASKED_PIN};
pub use credentials::{StoredCard, StoredCredentials};
