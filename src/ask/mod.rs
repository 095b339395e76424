//! Fluent one-shot ask: bind a target, message, and deadline, then await a
//! typed reply or a named timeout error.
//!
//! # Module Organization (§4.3)
//!
//! - `builder.rs` - `AskBuilder<M, B>`
//! - `error.rs` - `AskError`

pub mod builder;
pub mod error;

pub use builder::{AskBuilder, DEFAULT_ASK_TIMEOUT};
pub use error::AskError;
