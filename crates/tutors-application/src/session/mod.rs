//! Session application services.
//!
//! A [`ChatSession`] owns the active conversation and drives turns,
//! translation syncs and conversation resets against the backends.

mod manager;

pub use manager::{ChatSession, SessionBackends, ToggleStep};
