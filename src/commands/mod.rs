//! Built-in REPL commands prefixed with `/`.
//!
//! Commands implement the [`Command`] trait and are registered in a
//! [`CommandRegistry`]. The registry handles dispatch, alias resolution,
//! and dynamic help generation. Everything after the command word is
//! passed to the command as its argument string.

mod disconnect;
mod draftall;
mod edit;
mod generate;
mod help;
mod language;
mod publish;
mod quit;
mod reload;
mod reviews;
mod tone;
mod whoami;

use async_trait::async_trait;
use std::sync::Arc;

use crate::engine::ReplyEngine;
use crate::review::{Language, ReviewId, Tone};

/// Session info available to commands during execution.
pub struct SessionInfo<'a> {
    /// Display name of the connected business, if any.
    pub business: Option<&'a str>,
    pub model: &'a str,
    pub platform_auth: &'a str,
    pub generator_auth: &'a str,
    pub tone: Tone,
    pub language: Language,
    pub db_path: &'a str,
    /// `None` when the REPL runs without an engine (tests, help-only).
    pub engine: Option<&'a ReplyEngine>,
}

impl<'a> SessionInfo<'a> {
    /// The engine, or an explanation printed to stderr.
    fn engine(&self) -> Option<&'a ReplyEngine> {
        if self.engine.is_none() {
            eprintln!("  ✗ no review engine in this session");
        }
        self.engine
    }
}

/// A state change the REPL needs to apply after a command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    /// Default tone for new drafts.
    Tone(Tone),
    /// Default language for new drafts.
    Language(Language),
}

/// What the REPL should do after a command runs.
pub enum CommandResult {
    /// Not a command.
    NotACommand,
    /// Command handled, continue the REPL loop.
    Handled,
    /// Command produced a state change the REPL must apply.
    StateChanged(StateChange),
    /// Exit the REPL.
    Quit,
}

/// A REPL command. Implement this trait to add new commands.
#[async_trait]
pub trait Command: Send + Sync {
    /// Primary name, e.g. `"/reviews"`.
    fn name(&self) -> &str;

    /// Alternative names, e.g. `&["/h", "/?"]`.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// Argument synopsis shown in `/help`, e.g. `"<n|id>"`.
    fn usage(&self) -> &str {
        ""
    }

    /// One-line description for `/help`.
    fn description(&self) -> &str;

    /// Run the command. `args` is the trimmed text after the command word.
    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult;
}

/// Holds registered commands.
pub struct CommandRegistry {
    commands: Vec<Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create a registry with all built-in commands.
    pub fn new() -> Self {
        let commands: Vec<Arc<dyn Command>> = vec![
            Arc::new(help::HelpCommand),
            Arc::new(reviews::ReviewsCommand),
            Arc::new(reload::ReloadCommand),
            Arc::new(generate::GenerateCommand),
            Arc::new(edit::EditCommand),
            Arc::new(publish::PublishCommand),
            Arc::new(draftall::DraftAllCommand),
            Arc::new(tone::ToneCommand),
            Arc::new(language::LanguageCommand),
            Arc::new(disconnect::DisconnectCommand),
            Arc::new(whoami::WhoamiCommand),
            Arc::new(quit::QuitCommand),
        ];
        Self { commands }
    }

    /// Register an additional command.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        self.commands.push(command);
    }

    /// Dispatch input to a matching command, or return `NotACommand`.
    pub async fn dispatch(&self, input: &str, info: &SessionInfo<'_>) -> CommandResult {
        let input = input.trim();
        let (word, args) = match input.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (input, ""),
        };

        for command in &self.commands {
            if word == command.name() || command.aliases().contains(&word) {
                // /help needs the registry to list all commands
                if command.name() == "/help" {
                    print!("{}", self.help_text());
                    return CommandResult::Handled;
                }
                return command.execute(args, info).await;
            }
        }

        if word.starts_with('/') {
            println!("unknown command: {word}");
            println!("type /help for available commands");
            return CommandResult::Handled;
        }

        CommandResult::NotACommand
    }

    /// Generate help text from all registered commands.
    pub fn help_text(&self) -> String {
        let entries: Vec<(String, &str)> = self
            .commands
            .iter()
            .map(|c| (format_label(c.name(), c.usage(), c.aliases()), c.description()))
            .collect();

        let max_width = entries
            .iter()
            .map(|(label, _)| label.chars().count())
            .max()
            .unwrap_or(10);

        let mut out = String::new();
        for (label, desc) in &entries {
            out.push_str(&format!("  {label:<max_width$}  {desc}\n"));
        }
        out
    }

    /// All registered command names.
    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.name()).collect()
    }

    /// All registered names and aliases (for duplicate detection).
    pub fn all_triggers(&self) -> Vec<&str> {
        let mut triggers = Vec::new();
        for cmd in &self.commands {
            triggers.push(cmd.name());
            triggers.extend_from_slice(cmd.aliases());
        }
        triggers
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn format_label(name: &str, usage: &str, aliases: &[&str]) -> String {
    let mut label = name.to_string();
    if !usage.is_empty() {
        label.push(' ');
        label.push_str(usage);
    }
    if !aliases.is_empty() {
        label.push_str(&format!(" ({})", aliases.join(", ")));
    }
    label
}

/// Resolve a `/reviews` position (1-based) or a raw review id.
async fn resolve_target(engine: &ReplyEngine, target: &str) -> Option<ReviewId> {
    if target.is_empty() {
        eprintln!("  ✗ which review? give its number from /reviews or its id");
        return None;
    }
    if let Ok(position) = target.parse::<usize>() {
        let id = engine.store().id_at(position).await;
        if id.is_none() {
            eprintln!("  ✗ no review #{position}");
        }
        return id;
    }
    let id = ReviewId::from(target);
    match engine.store().get(&id).await {
        Ok(_) => Some(id),
        Err(e) => {
            eprintln!("  ✗ {e}");
            None
        }
    }
}

/// Split `"<target> <rest>"` into the target word and the trimmed rest.
fn split_target(args: &str) -> (&str, &str) {
    match args.split_once(char::is_whitespace) {
        Some((target, rest)) => (target, rest.trim()),
        None => (args, ""),
    }
}
