pub mod constants;
pub mod error;
pub mod time;
pub mod types;

pub use error::{Error, Result};
pub use time::Tick;
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
