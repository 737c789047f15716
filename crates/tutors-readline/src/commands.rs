use tutors_core::session::{ChatMode, LanguageCode, LanguagePair};

/// A slash command as offered by completion, hints and `/help`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    /// Argument usage, empty for commands without arguments.
    pub usage: &'static str,
    /// Fixed argument values, offered by completion.
    pub values: &'static [&'static str],
    pub summary: &'static str,
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "/toggle",
        usage: "",
        values: &[],
        summary: "switch to the other language",
    },
    CommandSpec {
        name: "/lang",
        usage: "<code>",
        values: &[],
        summary: "show the transcript in <code>",
    },
    CommandSpec {
        name: "/mode",
        usage: "chat|tutor",
        values: &["chat", "tutor"],
        summary: "change mode (starts a new conversation)",
    },
    CommandSpec {
        name: "/pair",
        usage: "<primary> <secondary>",
        values: &[],
        summary: "change the language pair (starts a new conversation)",
    },
    CommandSpec {
        name: "/new",
        usage: "",
        values: &[],
        summary: "start a new conversation",
    },
    CommandSpec {
        name: "/open",
        usage: "<conversation-id>",
        values: &[],
        summary: "open a stored conversation",
    },
    CommandSpec {
        name: "/help",
        usage: "",
        values: &[],
        summary: "show this help",
    },
    CommandSpec {
        name: "/quit",
        usage: "",
        values: &[],
        summary: "exit",
    },
];

/// Looks up a command by its exact name.
pub fn find(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text, sent as a chat turn.
    Say(String),
    Toggle,
    Lang(LanguageCode),
    Mode(ChatMode),
    Pair(LanguagePair),
    New,
    Open(String),
    Help,
    Quit,
    /// Malformed command; carries the message to show.
    Invalid(String),
}

impl Command {
    /// Parses one line of input. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if !line.starts_with('/') {
            return Some(Command::Say(line.to_string()));
        }

        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        let command = match (name, args.as_slice()) {
            ("/toggle" | "/t", []) => Command::Toggle,
            ("/lang", [code]) => match LanguageCode::new(code) {
                Ok(code) => Command::Lang(code),
                Err(e) => Command::Invalid(e.to_string()),
            },
            ("/mode", [mode]) => match mode.parse() {
                Ok(mode) => Command::Mode(mode),
                Err(_) => Command::Invalid(format!("Unknown mode '{mode}', use chat or tutor")),
            },
            ("/pair", [primary, secondary]) => match LanguagePair::parse(primary, secondary) {
                Ok(pair) => Command::Pair(pair),
                Err(e) => Command::Invalid(e.to_string()),
            },
            ("/new", []) => Command::New,
            ("/open", [id]) => Command::Open(id.to_string()),
            ("/help" | "/?", []) => Command::Help,
            ("/quit" | "/exit", []) => Command::Quit,
            ("/lang", _) => Command::Invalid("Usage: /lang <code>".to_string()),
            ("/mode", _) => Command::Invalid("Usage: /mode chat|tutor".to_string()),
            ("/pair", _) => Command::Invalid("Usage: /pair <primary> <secondary>".to_string()),
            ("/open", _) => Command::Invalid("Usage: /open <conversation-id>".to_string()),
            (other, _) => Command::Invalid(format!("Unknown command '{other}', try /help")),
        };
        Some(command)
    }
}

pub fn help_text() -> String {
    let mut text = String::from("Type a message to chat with your tutor.");
    for spec in COMMANDS {
        let call = format!("{} {}", spec.name, spec.usage);
        text.push_str(&format!("\n  {:<30}{}", call.trim_end(), spec.summary));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_turn() {
        assert_eq!(
            Command::parse("  Hola, ¿qué tal?  "),
            Some(Command::Say("Hola, ¿qué tal?".to_string()))
        );
        assert_eq!(Command::parse("   "), None);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/toggle"), Some(Command::Toggle));
        assert_eq!(
            Command::parse("/lang EN"),
            Some(Command::Lang(LanguageCode::new("en").unwrap()))
        );
        assert_eq!(Command::parse("/mode tutor"), Some(Command::Mode(ChatMode::Tutor)));
        assert_eq!(
            Command::parse("/open c-42"),
            Some(Command::Open("c-42".to_string()))
        );
        assert_eq!(
            Command::parse("/pair fr en"),
            Some(Command::Pair(LanguagePair::parse("fr", "en").unwrap()))
        );
        assert_eq!(Command::parse("/quit"), Some(Command::Quit));
    }

    #[test]
    fn test_help_lists_every_command_with_usage() {
        let help = help_text();
        for spec in COMMANDS {
            assert!(help.contains(spec.name), "{} missing from help", spec.name);
            assert!(help.contains(spec.usage));
        }
        assert_eq!(find("/pair").map(|s| s.usage), Some("<primary> <secondary>"));
        assert_eq!(find("/pa"), None);
    }

    #[test]
    fn test_malformed_commands_are_invalid() {
        for line in ["/lang", "/mode debate", "/pair es es", "/open", "/frobnicate", "/new now"] {
            assert!(
                matches!(Command::parse(line), Some(Command::Invalid(_))),
                "{line} should be invalid"
            );
        }
    }
}
