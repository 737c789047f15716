use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use tutors_application::{ChatSession, SessionBackends, SyncOutcome, TurnOutcome};
use tutors_core::backend::HealthCheck;
use tutors_core::config::{self, ClientConfig};
use tutors_core::render::RenderSink;
use tutors_core::session::{ChatMode, LanguagePair};
use tutors_interaction::HttpBackend;

mod commands;
mod helper;
mod view;

use commands::Command;
use helper::CliHelper;
use view::{TerminalSink, describe_error};

#[derive(Parser)]
#[command(name = "tutors")]
#[command(about = "Bilingual chat with a language tutor", long_about = None)]
struct Cli {
    /// Config file (default: ~/.config/tutors/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Language you are learning
    #[arg(long)]
    primary: Option<String>,
    /// Language you already speak
    #[arg(long)]
    secondary: Option<String>,
    /// chat or tutor
    #[arg(long)]
    mode: Option<ChatMode>,
    /// Open a stored conversation by id
    #[arg(long)]
    open: Option<String>,
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = ClientConfig::load_from(path)?;
            config.apply_overrides(|key| std::env::var(key).ok())?;
            config
        }
        None => ClientConfig::load()?,
    };
    if let Some(primary) = &cli.primary {
        config.primary_lang = primary.clone();
    }
    if let Some(secondary) = &cli.secondary {
        config.secondary_lang = secondary.clone();
    }
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    Ok(config)
}

/// Logs go to a daily file so they do not interleave with the prompt.
fn init_logging() -> Result<WorkerGuard> {
    let log_dir = config::config_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::daily(&log_dir, "tutors.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

fn print_error(err: &tutors_core::TutorsError) {
    println!("{}", describe_error(err).yellow());
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging()?;

    // ===== Backend Initialization =====
    let config = load_config(&cli)?;
    let languages: LanguagePair = config.language_pair()?;
    let backend = Arc::new(HttpBackend::from_config(&config)?);
    tracing::info!(
        "[Main] Starting with {} / {} in {} mode against {}",
        languages.primary(),
        languages.secondary(),
        config.mode,
        backend.base_url()
    );

    println!("{}", "=== Tutors ===".bright_magenta().bold());
    match backend.health().await {
        Ok(true) => println!("{}", format!("Connected to {}", backend.base_url()).bright_black()),
        Ok(false) => println!(
            "{}",
            format!("{} reports it is not healthy", backend.base_url()).yellow()
        ),
        Err(e) => {
            tracing::warn!("[Main] Health check failed: {}", e);
            println!(
                "{}",
                format!("Backend at {} is unreachable; messages may fail", backend.base_url())
                    .yellow()
            );
        }
    }
    println!("{}", "Type /help for commands.".bright_black());
    println!();

    let sink = Arc::new(TerminalSink::new());
    let mut session = ChatSession::new(
        languages,
        config.mode,
        SessionBackends::shared(backend.clone()),
    )
    .with_sink(sink.clone());

    match &cli.open {
        Some(id) => {
            if let Err(e) = session.open_conversation(id).await {
                print_error(&e);
                sink.present(&session.render());
            }
        }
        None => sink.present(&session.render()),
    }

    // ===== REPL Setup =====
    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    // ===== Main REPL Loop =====
    loop {
        let prompt = format!("[{}] >> ", session.store().display_lang());
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        };

        let Some(command) = Command::parse(&line) else {
            continue;
        };
        let _ = rl.add_history_entry(line.as_str());

        match command {
            Command::Say(text) => match session.send(&text).await {
                Ok(Some(TurnOutcome::Failed(e))) => print_error(&e),
                Ok(_) => {}
                Err(e) => print_error(&e),
            },
            Command::Toggle => report_sync(session.toggle_display_language().await),
            Command::Lang(lang) => report_sync(session.switch_display_language(&lang).await),
            Command::Mode(mode) => {
                if !session.switch_mode(mode) {
                    println!("{}", format!("Already in {mode} mode").bright_black());
                }
            }
            Command::Pair(pair) => {
                if !session.change_languages(pair) {
                    println!("{}", "Language pair unchanged".bright_black());
                }
            }
            Command::New => session.start_new_conversation(),
            Command::Open(id) => {
                if let Err(e) = session.open_conversation(&id).await {
                    print_error(&e);
                }
            }
            Command::Help => println!("{}", commands::help_text().bright_black()),
            Command::Quit => {
                println!("{}", "Goodbye!".bright_green());
                break;
            }
            Command::Invalid(message) => println!("{}", message.yellow()),
        }
    }

    Ok(())
}

fn report_sync(result: tutors_core::Result<SyncOutcome>) {
    match result {
        Ok(SyncOutcome::Ignored) => {
            println!("{}", "Still waiting for the previous request.".bright_black())
        }
        Ok(_) => {}
        Err(e) => print_error(&e),
    }
}
