pub mod access_log;
pub mod credentials;

pub use access_log::{AccessLogRepository, SqliteAccessLogRepository};
pub use credentials::{CredentialRepository, SqliteCredentialRepository};
