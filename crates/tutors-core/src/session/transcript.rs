//! Dual-transcript store.
//!
//! Holds the two language-keyed message sequences of the active
//! conversation together with its metadata. Sequences are append-only; a
//! conversation is only ever reset by replacing the whole store.

use super::language::{LanguageCode, LanguagePair, Side};
use super::message::Message;
use super::mode::ChatMode;
use super::model::ConversationSnapshot;
use crate::error::Result;
use chrono::{DateTime, Utc};

/// A locally synthesized notice shown inline in one transcript.
///
/// Notices are not turns. They are never sent as chat context nor
/// translated, and they are dropped with the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Transcript the notice belongs to.
    pub side: Side,
    /// Number of messages in that transcript when the notice was raised.
    pub after: usize,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// The two transcripts of one conversation, plus metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DualTranscript {
    conversation_id: Option<String>,
    languages: LanguagePair,
    display: Side,
    mode: ChatMode,
    primary: Vec<Message>,
    secondary: Vec<Message>,
    notices: Vec<Notice>,
}

impl DualTranscript {
    /// Creates an empty conversation displayed in the primary language.
    pub fn new(languages: LanguagePair, mode: ChatMode) -> Self {
        Self {
            conversation_id: None,
            languages,
            display: Side::Primary,
            mode,
            primary: Vec::new(),
            secondary: Vec::new(),
            notices: Vec::new(),
        }
    }

    /// Rebuilds a conversation from the backend's canonical transcript.
    ///
    /// Each stored message goes to the sequence of its language, keeping
    /// backend order. Messages in a language outside the pair are skipped.
    /// The display language becomes the language of the most recent message.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLanguage` if the snapshot's language pair is invalid.
    pub fn from_snapshot(snapshot: ConversationSnapshot) -> Result<Self> {
        let languages = LanguagePair::new(snapshot.primary_lang, snapshot.secondary_lang)?;
        let mut transcript = Self::new(languages, snapshot.mode);
        transcript.conversation_id = Some(snapshot.conversation_id);

        for stored in snapshot.messages {
            let side = match transcript.languages.side_of(&stored.language) {
                Ok(side) => side,
                Err(_) => {
                    tracing::warn!(
                        "[Transcript] Skipping stored message in unexpected language '{}'",
                        stored.language
                    );
                    continue;
                }
            };
            transcript.display = side;
            transcript.append(side, Message::new(stored.role, stored.text, stored.timestamp));
        }

        // Turns written in both languages cannot be paired up again, so
        // later syncs only see the length difference
        if transcript.has_both_transcripts() {
            tracing::warn!(
                "[Transcript] Conversation {:?} holds messages in both {} ({}) and {} ({}); \
                 turns written in one language are not translated to the other",
                transcript.conversation_id,
                transcript.languages.primary(),
                transcript.primary.len(),
                transcript.languages.secondary(),
                transcript.secondary.len()
            );
        }

        Ok(transcript)
    }

    // ============================================================================
    // Metadata
    // ============================================================================

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// Records the backend-assigned conversation id.
    ///
    /// The id is set once. Returns `true` if this call assigned it; a later,
    /// different id is ignored.
    pub fn assign_conversation_id(&mut self, id: &str) -> bool {
        match &self.conversation_id {
            None => {
                self.conversation_id = Some(id.to_string());
                true
            }
            Some(existing) => {
                if existing != id {
                    tracing::warn!(
                        "[Transcript] Ignoring conversation id '{}', already assigned '{}'",
                        id,
                        existing
                    );
                }
                false
            }
        }
    }

    pub fn languages(&self) -> &LanguagePair {
        &self.languages
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn display_side(&self) -> Side {
        self.display
    }

    pub fn display_lang(&self) -> &LanguageCode {
        self.languages.lang(self.display)
    }

    pub fn lang_of(&self, side: Side) -> &LanguageCode {
        self.languages.lang(side)
    }

    /// # Errors
    ///
    /// Returns `InvalidLanguage` for a language outside the pair.
    pub fn side_of(&self, lang: &LanguageCode) -> Result<Side> {
        self.languages.side_of(lang)
    }

    /// Switches the display language.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLanguage` if `lang` is not one of the two configured
    /// languages; the display language is left unchanged.
    pub fn set_display_lang(&mut self, lang: &LanguageCode) -> Result<()> {
        self.display = self.languages.side_of(lang)?;
        Ok(())
    }

    // ============================================================================
    // Sequences
    // ============================================================================

    /// Appends a message to one transcript. The only sequence mutator.
    pub fn append(&mut self, side: Side, message: Message) {
        self.sequence_mut(side).push(message);
    }

    pub fn len(&self, side: Side) -> usize {
        self.sequence(side).len()
    }

    /// True when neither transcript holds a message.
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }

    /// True when neither transcript is empty.
    pub fn has_both_transcripts(&self) -> bool {
        !self.primary.is_empty() && !self.secondary.is_empty()
    }

    /// Messages of one transcript from `from_index` to the end.
    ///
    /// An index past the end yields an empty slice.
    pub fn slice(&self, side: Side, from_index: usize) -> &[Message] {
        let sequence = self.sequence(side);
        &sequence[from_index.min(sequence.len())..]
    }

    pub fn sequence(&self, side: Side) -> &[Message] {
        match side {
            Side::Primary => &self.primary,
            Side::Secondary => &self.secondary,
        }
    }

    fn sequence_mut(&mut self, side: Side) -> &mut Vec<Message> {
        match side {
            Side::Primary => &mut self.primary,
            Side::Secondary => &mut self.secondary,
        }
    }

    // ============================================================================
    // Notices
    // ============================================================================

    /// Adds a notice after the current end of the given transcript.
    pub fn push_notice(&mut self, side: Side, text: impl Into<String>) {
        let notice = Notice {
            side,
            after: self.len(side),
            text: text.into(),
            timestamp: Utc::now(),
        };
        self.notices.push(notice);
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::message::MessageRole;
    use crate::session::model::StoredMessage;

    fn es_en() -> DualTranscript {
        DualTranscript::new(LanguagePair::parse("es", "en").unwrap(), ChatMode::Chat)
    }

    fn lang(code: &str) -> LanguageCode {
        LanguageCode::new(code).unwrap()
    }

    #[test]
    fn test_new_transcript_is_empty() {
        let transcript = es_en();
        assert!(transcript.is_empty());
        assert_eq!(transcript.display_lang(), "es");
        assert_eq!(transcript.conversation_id(), None);
        assert_eq!(transcript.len(Side::Primary), 0);
        assert_eq!(transcript.len(Side::Secondary), 0);
    }

    #[test]
    fn test_append_preserves_order() {
        let mut transcript = es_en();
        transcript.append(Side::Primary, Message::user("Hola"));
        transcript.append(Side::Primary, Message::assistant("¡Hola! ¿Qué tal?"));

        let texts: Vec<&str> = transcript
            .sequence(Side::Primary)
            .iter()
            .map(Message::text)
            .collect();
        assert_eq!(texts, vec!["Hola", "¡Hola! ¿Qué tal?"]);
        assert_eq!(transcript.len(Side::Secondary), 0);
    }

    #[test]
    fn test_slice_from_index() {
        let mut transcript = es_en();
        transcript.append(Side::Primary, Message::user("uno"));
        transcript.append(Side::Primary, Message::assistant("dos"));
        transcript.append(Side::Primary, Message::user("tres"));

        let delta = transcript.slice(Side::Primary, 1);
        assert_eq!(delta.len(), 2);
        assert_eq!(delta[0].text(), "dos");

        assert!(transcript.slice(Side::Primary, 3).is_empty());
        assert!(transcript.slice(Side::Primary, 10).is_empty());
    }

    #[test]
    fn test_set_display_lang_rejects_third_language() {
        let mut transcript = es_en();
        transcript.set_display_lang(&lang("en")).unwrap();
        assert_eq!(transcript.display_side(), Side::Secondary);

        let err = transcript.set_display_lang(&lang("fr")).unwrap_err();
        assert!(matches!(err, crate::error::TutorsError::InvalidLanguage { .. }));
        assert_eq!(transcript.display_lang(), "en");
    }

    #[test]
    fn test_conversation_id_is_set_once() {
        let mut transcript = es_en();
        assert!(transcript.assign_conversation_id("c-1"));
        assert!(!transcript.assign_conversation_id("c-2"));
        assert!(!transcript.assign_conversation_id("c-1"));
        assert_eq!(transcript.conversation_id(), Some("c-1"));
    }

    #[test]
    fn test_notice_records_position() {
        let mut transcript = es_en();
        transcript.append(Side::Primary, Message::user("Hola"));
        transcript.push_notice(Side::Primary, "No se pudo contactar al tutor");

        let notice = &transcript.notices()[0];
        assert_eq!(notice.side, Side::Primary);
        assert_eq!(notice.after, 1);
        assert_eq!(transcript.len(Side::Primary), 1);
    }

    #[test]
    fn test_from_snapshot_splits_by_language() {
        let at = chrono::Utc::now();
        let stored = |role, text: &str, code: &str| StoredMessage {
            role,
            text: text.to_string(),
            language: lang(code),
            timestamp: at,
        };
        let snapshot = ConversationSnapshot {
            conversation_id: "c-9".to_string(),
            primary_lang: lang("es"),
            secondary_lang: lang("en"),
            mode: ChatMode::Chat,
            messages: vec![
                stored(MessageRole::User, "Hola", "es"),
                stored(MessageRole::Assistant, "¡Hola!", "es"),
                stored(MessageRole::User, "Bonjour", "fr"),
                stored(MessageRole::User, "How are you?", "en"),
            ],
        };

        let transcript = DualTranscript::from_snapshot(snapshot).unwrap();
        assert_eq!(transcript.conversation_id(), Some("c-9"));
        assert_eq!(transcript.len(Side::Primary), 2);
        assert_eq!(transcript.len(Side::Secondary), 1);
        assert_eq!(transcript.display_lang(), "en");
        assert!(transcript.has_both_transcripts());
    }

    #[test]
    fn test_from_snapshot_in_one_language_has_single_transcript() {
        let snapshot = ConversationSnapshot {
            conversation_id: "c-3".to_string(),
            primary_lang: lang("es"),
            secondary_lang: lang("en"),
            mode: ChatMode::Tutor,
            messages: vec![StoredMessage {
                role: MessageRole::User,
                text: "¿Qué significa 'madrugar'?".to_string(),
                language: lang("es"),
                timestamp: chrono::Utc::now(),
            }],
        };

        let transcript = DualTranscript::from_snapshot(snapshot).unwrap();
        assert!(!transcript.has_both_transcripts());
        assert_eq!(transcript.display_lang(), "es");
    }

    #[test]
    fn test_from_snapshot_rejects_same_languages() {
        let snapshot = ConversationSnapshot {
            conversation_id: "c-bad".to_string(),
            primary_lang: lang("es"),
            secondary_lang: lang("es"),
            mode: ChatMode::Chat,
            messages: Vec::new(),
        };
        assert!(DualTranscript::from_snapshot(snapshot).is_err());
    }
}
