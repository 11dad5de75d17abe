//! Error types for smcfan
//!
//! Re-exports the unified error type from sf-error.

pub use sf_error::{Result, SmcfanError};
