//! docrag core library
//!
//! Foundational pieces shared by every docrag crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration loading and validation

pub mod config;
pub mod error;
pub mod logging;

pub use config::{LlmProvider, LogFormat, RagConfig};
pub use error::{AppError, AppResult};
