//! Terminal rendering of transcript views.

use colored::Colorize;
use std::sync::Mutex;
use tutors_core::TutorsError;
use tutors_core::render::{Bubble, BubbleKind, RenderSink, TranscriptView};
use tutors_core::session::LanguageCode;

/// What has already been printed, so that only new bubbles are appended.
#[derive(Debug, Default)]
struct Printed {
    shown_lang: Option<LanguageCode>,
    display_lang: Option<LanguageCode>,
    bubbles: Vec<Bubble>,
    busy: bool,
}

/// Prints views to stdout as colored chat bubbles.
#[derive(Debug, Default)]
pub struct TerminalSink {
    printed: Mutex<Printed>,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines to print for `view`, given what was printed before.
    ///
    /// The whole transcript is reprinted when the shown language changed or
    /// the printed bubbles are no longer a prefix of the view.
    fn lines_for(&self, view: &TranscriptView) -> Vec<String> {
        let mut printed = match self.printed.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let continues = printed.shown_lang.as_ref() == Some(&view.shown_lang)
            && printed.display_lang.as_ref() == Some(&view.display_lang)
            && view.bubbles.starts_with(&printed.bubbles);

        let mut lines = Vec::new();
        let fresh = if continues {
            &view.bubbles[printed.bubbles.len()..]
        } else {
            lines.push(header(view));
            &view.bubbles[..]
        };
        lines.extend(fresh.iter().map(bubble_line));

        if view.busy && !printed.busy {
            lines.push("  …".bright_black().to_string());
        }

        printed.shown_lang = Some(view.shown_lang.clone());
        printed.display_lang = Some(view.display_lang.clone());
        printed.bubbles = view.bubbles.clone();
        printed.busy = view.busy;
        lines
    }
}

impl RenderSink for TerminalSink {
    fn present(&self, view: &TranscriptView) {
        for line in self.lines_for(view) {
            println!("{line}");
        }
    }
}

fn header(view: &TranscriptView) -> String {
    let title = format!("── {} ──", view.display_lang.as_str().to_uppercase());
    if view.is_fallback() {
        format!(
            "{} {}",
            title.bright_magenta().bold(),
            format!("(showing {} until the translation is available)", view.shown_lang)
                .bright_black()
        )
    } else {
        title.bright_magenta().bold().to_string()
    }
}

fn bubble_line(bubble: &Bubble) -> String {
    let time = bubble
        .time
        .as_deref()
        .map(|t| format!("{t} ").bright_black().to_string())
        .unwrap_or_default();
    match bubble.kind {
        BubbleKind::User => format!("{time}{} {}", "you:".green().bold(), bubble.text.green()),
        BubbleKind::Assistant => format!(
            "{time}{} {}",
            "tutor:".bright_blue().bold(),
            bubble.text.bright_blue()
        ),
        BubbleKind::Notice => format!("{time}{} {}", "tutor:".red().bold(), bubble.text.red()),
        BubbleKind::Welcome => bubble.text.bright_black().italic().to_string(),
    }
}

/// User-facing description of a recoverable error.
pub fn describe_error(err: &TutorsError) -> String {
    match err {
        TutorsError::NotFound { id, .. } => format!("Conversation '{id}' is unavailable."),
        TutorsError::TranslationMismatch { .. } => {
            "The translation came back incomplete; showing the available transcript.".to_string()
        }
        TutorsError::Network { service, .. } | TutorsError::Http { service, .. } => {
            format!("The {service} service is unavailable right now: {err}")
        }
        TutorsError::Busy(_) => "Still waiting for the previous request.".to_string(),
        other => other.to_string(),
    }
}
