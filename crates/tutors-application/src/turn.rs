//! Chat turn controller.
//!
//! A turn appends the user's message to the transcript of the current display
//! language, posts that whole transcript as context and appends the reply to
//! the same transcript. The other transcript is left alone; it catches up on
//! the next toggle.

use crate::sync::Generation;
use tutors_core::backend::{ChatReply, ChatRequest, ChatTurn};
use tutors_core::error::{Result, TutorsError};
use tutors_core::render::chat_failure_text;
use tutors_core::session::{DualTranscript, LanguageCode, Message, Side};

/// An outstanding chat exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnTicket {
    generation: Generation,
    side: Side,
    request: ChatRequest,
}

impl TurnTicket {
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn language(&self) -> &LanguageCode {
        &self.request.language
    }
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The assistant reply was appended.
    Replied { conversation_id: String },
    /// The exchange failed; a notice was shown in place of the reply.
    Failed(TutorsError),
    /// The conversation was replaced while the exchange was in flight.
    Stale,
}

#[derive(Debug, Default)]
pub struct TurnController {
    in_flight: Option<Generation>,
}

impl TurnController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn reset(&mut self) {
        self.in_flight = None;
    }

    /// Records the user's message and builds the chat request.
    ///
    /// # Returns
    ///
    /// - `Ok(None)`: Input was empty after trimming; nothing changed
    /// - `Ok(Some(ticket))`: The request to send
    ///
    /// # Errors
    ///
    /// - `Busy` while another turn is in flight
    /// - `Unsynced` if the display transcript is missing turns of the other
    ///   one
    pub fn begin(
        &mut self,
        store: &mut DualTranscript,
        generation: Generation,
        text: &str,
    ) -> Result<Option<TurnTicket>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if self.in_flight.is_some() {
            return Err(TutorsError::busy("a chat turn is already in flight"));
        }

        let side = store.display_side();
        let missing = store.len(side.other()).saturating_sub(store.len(side));
        if missing > 0 {
            tracing::warn!(
                "[Turn] Refusing turn: {} transcript is {} message(s) behind",
                store.lang_of(side),
                missing
            );
            return Err(TutorsError::unsynced(store.lang_of(side).as_str(), missing));
        }

        store.append(side, Message::user(text));

        let request = ChatRequest {
            conversation_id: store.conversation_id().map(str::to_string),
            messages: store.sequence(side).iter().map(ChatTurn::from).collect(),
            language: store.lang_of(side).clone(),
            mode: store.mode(),
        };

        tracing::info!(
            "[Turn] Sending {} message(s) in {}",
            request.messages.len(),
            request.language
        );

        self.in_flight = Some(generation);
        Ok(Some(TurnTicket {
            generation,
            side,
            request,
        }))
    }

    /// Applies the chat result to the transcript the turn was started in.
    pub fn finish(
        &mut self,
        store: &mut DualTranscript,
        generation: Generation,
        ticket: TurnTicket,
        result: Result<ChatReply>,
    ) -> TurnOutcome {
        if self.in_flight == Some(ticket.generation) {
            self.in_flight = None;
        }

        if ticket.generation != generation {
            tracing::info!(
                "[Turn] Dropping reply for a replaced conversation (generation {} vs {})",
                ticket.generation,
                generation
            );
            return TurnOutcome::Stale;
        }

        match result {
            Ok(reply) => {
                store.assign_conversation_id(&reply.conversation_id);
                store.append(ticket.side, Message::assistant(reply.assistant_text));
                tracing::info!("[Turn] Reply appended to {}", ticket.request.language);
                TurnOutcome::Replied {
                    conversation_id: reply.conversation_id,
                }
            }
            Err(e) => {
                tracing::warn!("[Turn] Chat failed: {}", e);
                store.push_notice(ticket.side, chat_failure_text(&ticket.request.language));
                TurnOutcome::Failed(e)
            }
        }
    }
}
