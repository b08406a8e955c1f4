pub mod defaults;
pub mod error;
pub mod paths;
pub mod pipeline;

pub use error::{Error, ErrorCode, Result};
