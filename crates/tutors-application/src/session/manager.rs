use std::sync::Arc;

use tutors_core::backend::{ChatBackend, ChatReply, ConversationSource, TranslationBackend};
use tutors_core::error::{Result, TutorsError};
use tutors_core::render::{RenderSink, Renderer, TranscriptView};
use tutors_core::session::{ChatMode, DualTranscript, LanguageCode, LanguagePair, Side};

use crate::sync::{Generation, SyncDecision, SyncOutcome, SyncPlan, TranslationSynchronizer};
use crate::turn::{TurnController, TurnOutcome, TurnTicket};

/// The remote services a session talks to.
#[derive(Clone)]
pub struct SessionBackends {
    pub chat: Arc<dyn ChatBackend>,
    pub translator: Arc<dyn TranslationBackend>,
    pub conversations: Arc<dyn ConversationSource>,
}

impl SessionBackends {
    /// Uses one client for every service.
    pub fn shared<B>(backend: Arc<B>) -> Self
    where
        B: ChatBackend + TranslationBackend + ConversationSource + 'static,
    {
        Self {
            chat: backend.clone(),
            translator: backend.clone(),
            conversations: backend,
        }
    }
}

/// First half of a display-language switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleStep {
    /// Nothing to fetch; the switch is complete.
    Finished(SyncOutcome),
    /// The delta must be translated and handed to
    /// [`ChatSession::finish_toggle`].
    Translate(SyncPlan),
}

/// One learner's chat session.
///
/// `ChatSession` is responsible for:
/// - Owning the active conversation and its generation
/// - Running chat turns and translation syncs against it
/// - Replacing the conversation on new conversation, mode or language change
/// - Pushing a fresh view to the render sink after every change
///
/// Every async operation also exists as a synchronous `begin_*`/`finish_*`
/// pair for front ends that issue the network call themselves. A started
/// half keeps the session busy until it is finished or
/// [`cancel_pending`](Self::cancel_pending) is called. The same applies when
/// an async operation's future is dropped mid-flight.
pub struct ChatSession {
    store: DualTranscript,
    generation: Generation,
    sync: TranslationSynchronizer,
    turns: TurnController,
    renderer: Renderer,
    sink: Option<Arc<dyn RenderSink>>,
    backends: SessionBackends,
}

impl ChatSession {
    /// Creates a session with an empty conversation.
    ///
    /// # Arguments
    ///
    /// * `languages` - The primary and secondary language
    /// * `mode` - Chat or tutor mode
    /// * `backends` - Remote services used by turns, syncs and rehydration
    pub fn new(languages: LanguagePair, mode: ChatMode, backends: SessionBackends) -> Self {
        Self {
            store: DualTranscript::new(languages, mode),
            generation: 0,
            sync: TranslationSynchronizer::new(),
            turns: TurnController::new(),
            renderer: Renderer::new(),
            sink: None,
            backends,
        }
    }

    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn RenderSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn store(&self) -> &DualTranscript {
        &self.store
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// True while a chat turn or a translation sync is in flight.
    pub fn is_busy(&self) -> bool {
        self.sync.is_in_flight() || self.turns.is_in_flight()
    }

    pub fn render(&self) -> TranscriptView {
        self.renderer.render(&self.store, self.is_busy())
    }

    fn present(&self) {
        if let Some(sink) = &self.sink {
            sink.present(&self.render());
        }
    }

    // ============================================================================
    // Turns
    // ============================================================================

    /// Sends one user message and waits for the reply.
    ///
    /// # Returns
    ///
    /// - `Ok(None)`: Blank input, nothing sent
    /// - `Ok(Some(outcome))`: How the exchange ended; a failed exchange is
    ///   reported as `TurnOutcome::Failed`, not as `Err`
    ///
    /// # Errors
    ///
    /// - `Busy` if a turn or sync is already in flight
    /// - The translation error if the display transcript was behind and could
    ///   not be caught up; the message is not sent
    pub async fn send(&mut self, text: &str) -> Result<Option<TurnOutcome>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        self.catch_up().await?;

        let Some(ticket) = self.begin_turn(text)? else {
            return Ok(None);
        };
        let result = self.backends.chat.send_chat(ticket.request()).await;
        Ok(Some(self.finish_turn(ticket, result)))
    }

    /// Translates the turns the display transcript is missing.
    async fn catch_up(&mut self) -> Result<()> {
        let display = self.store.display_side();
        if self.is_busy() || self.store.len(display) >= self.store.len(display.other()) {
            return Ok(());
        }

        let SyncDecision::Fetch(plan) = self.sync.plan(&self.store, self.generation)? else {
            return Ok(());
        };
        tracing::info!(
            "[Session] Catching up {} message(s) in {} before sending",
            plan.delta_len(),
            plan.target_lang()
        );
        self.present();
        let result = self.backends.translator.translate(plan.request()).await;
        self.finish_toggle(plan, result)?;
        Ok(())
    }

    /// Appends the user message, renders it and returns the request to send.
    ///
    /// # Errors
    ///
    /// - `Busy` if a turn or sync is already in flight
    /// - `Unsynced` if the display transcript is behind the other one; run a
    ///   display switch first
    pub fn begin_turn(&mut self, text: &str) -> Result<Option<TurnTicket>> {
        if self.sync.is_in_flight() {
            return Err(TutorsError::busy("a translation sync is in flight"));
        }
        let ticket = self.turns.begin(&mut self.store, self.generation, text)?;
        if ticket.is_some() {
            self.present();
        }
        Ok(ticket)
    }

    pub fn finish_turn(&mut self, ticket: TurnTicket, result: Result<ChatReply>) -> TurnOutcome {
        let outcome = self
            .turns
            .finish(&mut self.store, self.generation, ticket, result);
        self.present();
        outcome
    }

    // ============================================================================
    // Display language
    // ============================================================================

    /// Switches to the other language and brings its transcript up to date.
    ///
    /// # Errors
    ///
    /// The translation error, if the sync failed. The transcripts are left
    /// untouched and the view falls back to whatever is available.
    pub async fn toggle_display_language(&mut self) -> Result<SyncOutcome> {
        let step = self.begin_toggle()?;
        self.run_toggle(step).await
    }

    /// Switches to `lang`, which must be one of the session's two languages.
    pub async fn switch_display_language(&mut self, lang: &LanguageCode) -> Result<SyncOutcome> {
        let step = self.begin_display_switch(lang)?;
        self.run_toggle(step).await
    }

    async fn run_toggle(&mut self, step: ToggleStep) -> Result<SyncOutcome> {
        match step {
            ToggleStep::Finished(outcome) => Ok(outcome),
            ToggleStep::Translate(plan) => {
                let result = self.backends.translator.translate(plan.request()).await;
                self.finish_toggle(plan, result)
            }
        }
    }

    pub fn begin_toggle(&mut self) -> Result<ToggleStep> {
        let other = self.store.display_side().other();
        let lang = self.store.lang_of(other).clone();
        self.begin_display_switch(&lang)
    }

    /// Changes the display language and plans the sync.
    ///
    /// Ignored while a turn or sync is in flight.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLanguage` if `lang` is not one of the two languages.
    pub fn begin_display_switch(&mut self, lang: &LanguageCode) -> Result<ToggleStep> {
        if self.is_busy() {
            tracing::debug!("[Session] Ignoring display switch to {} while busy", lang);
            return Ok(ToggleStep::Finished(SyncOutcome::Ignored));
        }

        self.store.set_display_lang(lang).inspect_err(|e| {
            tracing::error!("[Session] Cannot display {}: {}", lang, e);
        })?;
        tracing::info!("[Session] Display language is now {}", lang);

        let step = match self.sync.plan(&self.store, self.generation)? {
            SyncDecision::UpToDate => ToggleStep::Finished(SyncOutcome::AlreadySynced),
            SyncDecision::Fetch(plan) => ToggleStep::Translate(plan),
        };
        self.present();
        Ok(step)
    }

    /// Merges the translation result and re-renders.
    pub fn finish_toggle(
        &mut self,
        plan: SyncPlan,
        result: Result<Vec<String>>,
    ) -> Result<SyncOutcome> {
        let outcome = self
            .sync
            .apply(&mut self.store, self.generation, plan, result);
        self.present();
        outcome
    }

    // ============================================================================
    // Conversation lifecycle
    // ============================================================================

    /// Drops the conversation and starts an empty one with the same
    /// languages and mode.
    pub fn start_new_conversation(&mut self) {
        let fresh = DualTranscript::new(self.store.languages().clone(), self.store.mode());
        self.replace_store(fresh);
    }

    /// Switches chat mode. A change starts a new conversation.
    ///
    /// # Returns
    ///
    /// `true` if the mode changed.
    pub fn switch_mode(&mut self, mode: ChatMode) -> bool {
        if self.store.mode() == mode {
            return false;
        }
        let fresh = DualTranscript::new(self.store.languages().clone(), mode);
        self.replace_store(fresh);
        true
    }

    /// Changes the language pair. A change starts a new conversation.
    pub fn change_languages(&mut self, languages: LanguagePair) -> bool {
        if self.store.languages() == &languages {
            return false;
        }
        let fresh = DualTranscript::new(languages, self.store.mode());
        self.replace_store(fresh);
        true
    }

    /// Replaces the conversation with one stored by the backend.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the backend has no such conversation
    /// - Any transport or decoding error
    ///
    /// On error the current conversation is kept.
    pub async fn open_conversation(&mut self, conversation_id: &str) -> Result<()> {
        let snapshot = self
            .backends
            .conversations
            .fetch_conversation(conversation_id)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    "[Session] Conversation {} unavailable: {}",
                    conversation_id,
                    e
                );
            })?;

        let store = DualTranscript::from_snapshot(snapshot)?;
        tracing::info!(
            "[Session] Opened conversation {} ({} + {} messages)",
            conversation_id,
            store.len(Side::Primary),
            store.len(Side::Secondary)
        );
        self.replace_store(store);
        Ok(())
    }

    /// Abandons any outstanding turn or sync.
    ///
    /// The generation is bumped, so a ticket or plan issued before the call
    /// is discarded as stale if it is finished later. The transcripts are
    /// kept as they are.
    pub fn cancel_pending(&mut self) {
        if !self.is_busy() {
            return;
        }
        self.generation += 1;
        self.sync.reset();
        self.turns.reset();
        tracing::info!(
            "[Session] Abandoned pending requests (generation {})",
            self.generation
        );
        self.present();
    }

    fn replace_store(&mut self, store: DualTranscript) {
        self.generation += 1;
        self.sync.reset();
        self.turns.reset();
        self.store = store;
        tracing::debug!("[Session] Conversation reset (generation {})", self.generation);
        self.present();
    }
}
