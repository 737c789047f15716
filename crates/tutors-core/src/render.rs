//! Transcript projection.
//!
//! Turns the store into the list of bubbles a front end draws. Rendering is
//! a pure function of the store and never mutates it.

use crate::session::{DualTranscript, LanguageCode, MessageRole};
use chrono::{DateTime, FixedOffset, Local, Offset, Utc};
use serde::Serialize;

/// What a bubble represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BubbleKind {
    User,
    Assistant,
    /// Locally raised error notice, drawn as an assistant bubble.
    Notice,
    /// Placeholder for an empty conversation.
    Welcome,
}

impl From<MessageRole> for BubbleKind {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::User => BubbleKind::User,
            MessageRole::Assistant => BubbleKind::Assistant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bubble {
    pub kind: BubbleKind,
    pub text: String,
    /// Formatted creation time; `None` for the welcome placeholder.
    pub time: Option<String>,
}

/// A rendered transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptView {
    /// The display language the user selected.
    pub display_lang: LanguageCode,
    /// The language of the bubbles actually shown.
    pub shown_lang: LanguageCode,
    /// Input is disabled while a sync or turn is in flight.
    pub busy: bool,
    pub bubbles: Vec<Bubble>,
}

impl TranscriptView {
    /// True when the other transcript is shown because the selected one is
    /// still empty.
    pub fn is_fallback(&self) -> bool {
        self.display_lang != self.shown_lang
    }

    pub fn is_welcome(&self) -> bool {
        matches!(self.bubbles.as_slice(), [bubble] if bubble.kind == BubbleKind::Welcome)
    }
}

/// Receives every freshly rendered view.
pub trait RenderSink: Send + Sync {
    fn present(&self, view: &TranscriptView);
}

/// Projects a `DualTranscript` into bubbles.
#[derive(Debug, Clone)]
pub struct Renderer {
    offset: FixedOffset,
    time_format: String,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    /// Renders timestamps in the machine's current local offset.
    pub fn new() -> Self {
        Self {
            offset: Local::now().offset().fix(),
            time_format: "%H:%M".to_string(),
        }
    }

    /// Renders timestamps in UTC.
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
            time_format: "%H:%M".to_string(),
        }
    }

    pub fn with_time_format(mut self, format: impl Into<String>) -> Self {
        self.time_format = format.into();
        self
    }

    pub fn format_time(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset)
            .format(&self.time_format)
            .to_string()
    }

    /// Renders the transcript of the current display language.
    ///
    /// When that transcript is empty but the other is not, the other one is
    /// shown instead. When both are empty a single welcome bubble in the
    /// display language is produced.
    pub fn render(&self, store: &DualTranscript, busy: bool) -> TranscriptView {
        let display = store.display_side();
        let shown = if store.len(display) == 0 && store.len(display.other()) > 0 {
            display.other()
        } else {
            display
        };

        let display_lang = store.display_lang().clone();
        let shown_lang = store.lang_of(shown).clone();

        let notices: Vec<_> = store.notices().iter().filter(|n| n.side == shown).collect();
        let messages = store.sequence(shown);

        if messages.is_empty() && notices.is_empty() {
            return TranscriptView {
                bubbles: vec![Bubble {
                    kind: BubbleKind::Welcome,
                    text: welcome_text(&display_lang).to_string(),
                    time: None,
                }],
                display_lang,
                shown_lang,
                busy,
            };
        }

        let mut bubbles = Vec::with_capacity(messages.len() + notices.len());
        let mut pending = notices.into_iter().peekable();

        for (index, message) in messages.iter().enumerate() {
            while let Some(notice) = pending.next_if(|n| n.after <= index) {
                bubbles.push(self.notice_bubble(&notice.text, notice.timestamp));
            }
            bubbles.push(Bubble {
                kind: message.role().into(),
                text: message.text().to_string(),
                time: Some(self.format_time(message.timestamp())),
            });
        }
        for notice in pending {
            bubbles.push(self.notice_bubble(&notice.text, notice.timestamp));
        }

        TranscriptView {
            display_lang,
            shown_lang,
            busy,
            bubbles,
        }
    }

    fn notice_bubble(&self, text: &str, at: DateTime<Utc>) -> Bubble {
        Bubble {
            kind: BubbleKind::Notice,
            text: text.to_string(),
            time: Some(self.format_time(at)),
        }
    }
}

/// Greeting shown for an empty conversation.
pub fn welcome_text(lang: &LanguageCode) -> &'static str {
    match lang.base() {
        "es" => "¡Hola! Escribe un mensaje para empezar la conversación.",
        "fr" => "Bonjour ! Écris un message pour commencer la conversation.",
        "de" => "Hallo! Schreib eine Nachricht, um das Gespräch zu beginnen.",
        "it" => "Ciao! Scrivi un messaggio per iniziare la conversazione.",
        "pt" => "Olá! Escreva uma mensagem para começar a conversa.",
        _ => "Hi! Send a message to start the conversation.",
    }
}

/// Notice text for a failed chat exchange, in the transcript's language.
pub fn chat_failure_text(lang: &LanguageCode) -> &'static str {
    match lang.base() {
        "es" => "Lo siento, no pude responder. Inténtalo de nuevo.",
        "fr" => "Désolé, je n'ai pas pu répondre. Réessaie.",
        "de" => "Entschuldigung, ich konnte nicht antworten. Versuch es noch einmal.",
        "it" => "Mi dispiace, non sono riuscito a rispondere. Riprova.",
        "pt" => "Desculpe, não consegui responder. Tente novamente.",
        _ => "Sorry, I couldn't reply. Please try again.",
    }
}
