//! Application layer for the Tutors client.
//!
//! Turn handling, translation synchronization and the chat session that
//! ties them to a conversation.

pub mod session;
pub mod sync;
pub mod turn;

pub use session::{ChatSession, SessionBackends, ToggleStep};
pub use sync::{Generation, SyncDecision, SyncOutcome, SyncPlan, TranslationSynchronizer};
pub use turn::{TurnController, TurnOutcome, TurnTicket};
