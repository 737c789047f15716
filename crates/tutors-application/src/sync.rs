//! Translation synchronizer.
//!
//! Keeps the transcript of the display language complete by translating only
//! the trailing messages it has no counterpart for. A sync runs in two
//! synchronous phases around one asynchronous translation call:
//!
//! 1. [`TranslationSynchronizer::plan`] computes the delta and marks the sync
//!    as in flight.
//! 2. [`TranslationSynchronizer::apply`] validates the response and appends
//!    every translated message, or nothing at all.
//!
//! Only one sync may be outstanding. A result that arrives after the
//! conversation was reset or the display language changed is discarded.

use tutors_core::backend::{TranslationBackend, TranslationRequest};
use tutors_core::error::{Result, TutorsError};
use tutors_core::session::{DualTranscript, LanguageCode, Message, Side};

/// Monotonic conversation generation, bumped on every reset or cancellation.
pub type Generation = u64;

/// A pending translation of one delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    generation: Generation,
    target: Side,
    from_index: usize,
    delta: Vec<Message>,
    request: TranslationRequest,
}

impl SyncPlan {
    pub fn request(&self) -> &TranslationRequest {
        &self.request
    }

    pub fn target(&self) -> Side {
        self.target
    }

    pub fn target_lang(&self) -> &LanguageCode {
        &self.request.target_lang
    }

    pub fn delta_len(&self) -> usize {
        self.delta.len()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}

/// Result of [`TranslationSynchronizer::plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncDecision {
    /// The target already has a counterpart for every turn.
    UpToDate,
    /// The delta must be fetched.
    Fetch(SyncPlan),
}

/// How a toggle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No translation was needed.
    AlreadySynced,
    /// Translations were appended to the target transcript.
    Merged { appended: usize },
    /// The response no longer applied to the current state and was dropped.
    Stale,
    /// A sync or turn was already in flight; nothing happened.
    Ignored,
}

/// Tracks the single outstanding sync.
#[derive(Debug, Default)]
pub struct TranslationSynchronizer {
    in_flight: Option<Generation>,
}

impl TranslationSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Forgets any outstanding sync. Called when the conversation is replaced.
    pub fn reset(&mut self) {
        self.in_flight = None;
    }

    /// Decides whether the display transcript needs translations.
    ///
    /// `target` is the display-language transcript and `source` the other
    /// one. Nothing is fetched when `len(source) <= len(target)`.
    ///
    /// # Errors
    ///
    /// Returns `Busy` if a sync is already in flight.
    pub fn plan(&mut self, store: &DualTranscript, generation: Generation) -> Result<SyncDecision> {
        if self.in_flight.is_some() {
            return Err(TutorsError::busy("a translation sync is already in flight"));
        }

        let target = store.display_side();
        let source = target.other();
        let target_len = store.len(target);

        if store.len(source) <= target_len {
            tracing::debug!(
                "[Sync] {} is up to date ({} >= {})",
                store.lang_of(target),
                target_len,
                store.len(source)
            );
            return Ok(SyncDecision::UpToDate);
        }

        let delta = store.slice(source, target_len).to_vec();
        if delta.is_empty() {
            return Ok(SyncDecision::UpToDate);
        }

        let request = TranslationRequest {
            text: delta.iter().map(|m| m.text().to_string()).collect(),
            source_lang: store.lang_of(source).clone(),
            target_lang: store.lang_of(target).clone(),
        };

        tracing::info!(
            "[Sync] Planning translation of {} message(s) {} -> {}",
            delta.len(),
            request.source_lang,
            request.target_lang
        );

        self.in_flight = Some(generation);
        Ok(SyncDecision::Fetch(SyncPlan {
            generation,
            target,
            from_index: target_len,
            delta,
            request,
        }))
    }

    /// Merges a translation result into the store.
    ///
    /// All translated messages are appended, or none. The plan is discarded
    /// as `Stale` when the conversation generation or display language
    /// changed, or the target transcript grew, since it was made.
    ///
    /// # Errors
    ///
    /// - The translation call's own error, unchanged
    /// - `TranslationMismatch` if the response is not aligned with the delta
    ///
    /// In both cases the store is left untouched.
    pub fn apply(
        &mut self,
        store: &mut DualTranscript,
        generation: Generation,
        plan: SyncPlan,
        result: Result<Vec<String>>,
    ) -> Result<SyncOutcome> {
        if self.in_flight == Some(plan.generation) {
            self.in_flight = None;
        }

        if plan.generation != generation
            || store.display_side() != plan.target
            || store.len(plan.target) != plan.from_index
        {
            tracing::info!(
                "[Sync] Discarding stale translation for {} (generation {} vs {})",
                plan.request.target_lang,
                plan.generation,
                generation
            );
            return Ok(SyncOutcome::Stale);
        }

        let translated = result.inspect_err(|e| {
            tracing::warn!("[Sync] Translation failed: {}", e);
        })?;

        if translated.len() != plan.delta.len() {
            tracing::warn!(
                "[Sync] Translation response misaligned: expected {}, got {}",
                plan.delta.len(),
                translated.len()
            );
            return Err(TutorsError::translation_mismatch(
                plan.delta.len(),
                translated.len(),
            ));
        }

        let appended = translated.len();
        for (original, text) in plan.delta.iter().zip(translated) {
            store.append(plan.target, original.translated(text));
        }

        tracing::info!(
            "[Sync] Appended {} translated message(s) to {}",
            appended,
            plan.request.target_lang
        );
        Ok(SyncOutcome::Merged { appended })
    }

    /// Plans, translates and applies in one call.
    pub async fn synchronize(
        &mut self,
        store: &mut DualTranscript,
        generation: Generation,
        backend: &dyn TranslationBackend,
    ) -> Result<SyncOutcome> {
        match self.plan(store, generation)? {
            SyncDecision::UpToDate => Ok(SyncOutcome::AlreadySynced),
            SyncDecision::Fetch(plan) => {
                let result = backend.translate(plan.request()).await;
                self.apply(store, generation, plan, result)
            }
        }
    }
}
