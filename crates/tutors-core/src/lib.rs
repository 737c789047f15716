//! Domain layer for the Tutors client.
//!
//! Languages, messages, the dual-transcript store, the renderer, the
//! backend contracts and client configuration.

pub mod backend;
pub mod config;
pub mod error;
pub mod render;
pub mod session;

// Re-export common error type
pub use error::{Result, TutorsError};
