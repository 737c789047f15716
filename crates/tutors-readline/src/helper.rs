use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use crate::commands::{self, COMMANDS, CommandSpec};

/// rustyline helper for slash commands.
///
/// Completes command names and fixed argument values, and hints the
/// argument usage once a command name is complete.
#[derive(Clone, Default)]
pub struct CliHelper;

impl CliHelper {
    pub fn new() -> Self {
        Self
    }

    fn candidates<'a>(prefix: &'a str) -> impl Iterator<Item = &'static CommandSpec> + 'a {
        COMMANDS.iter().filter(move |spec| spec.name.starts_with(prefix))
    }
}

/// Splits `"/mode tu"` into the command spec and the partial argument.
/// Only the first argument is considered.
fn split_argument(line: &str) -> Option<(&'static CommandSpec, &str)> {
    let (name, arg) = line.split_once(' ')?;
    let spec = commands::find(name)?;
    (!arg.contains(' ')).then_some((spec, arg))
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }

        if !line.contains(' ') {
            let candidates = Self::candidates(line)
                .map(|spec| Pair {
                    display: spec.name.to_string(),
                    replacement: spec.name.to_string(),
                })
                .collect();
            return Ok((0, candidates));
        }

        match split_argument(line) {
            Some((spec, arg)) => {
                let candidates = spec
                    .values
                    .iter()
                    .filter(|value| value.starts_with(arg))
                    .map(|value| Pair {
                        display: value.to_string(),
                        replacement: value.to_string(),
                    })
                    .collect();
                Ok((line.len() - arg.len(), candidates))
            }
            None => Ok((pos, vec![])),
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if !line.starts_with('/') {
            return None;
        }

        if !line.contains(' ') {
            if let Some(spec) = commands::find(line) {
                return (!spec.usage.is_empty()).then(|| format!(" {}", spec.usage));
            }
            return Self::candidates(line)
                .next()
                .map(|spec| spec.name[line.len()..].to_string());
        }

        let (spec, arg) = split_argument(line)?;
        if arg.is_empty() {
            return (!spec.usage.is_empty()).then(|| spec.usage.to_string());
        }
        spec.values
            .iter()
            .find(|value| value.starts_with(arg) && value.len() > arg.len())
            .map(|value| value[arg.len()..].to_string())
    }
}

impl Validator for CliHelper {}
