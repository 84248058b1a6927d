use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange};
use crate::review::Language;

pub struct LanguageCommand;

#[async_trait]
impl Command for LanguageCommand {
    fn name(&self) -> &str {
        "/language"
    }

    fn aliases(&self) -> &[&str] {
        &["/lang"]
    }

    fn usage(&self) -> &str {
        "[language]"
    }

    fn description(&self) -> &str {
        "show or set the language of new drafts"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        if args.is_empty() {
            for language in Language::ALL {
                let marker = if language == info.language {
                    " ← current"
                } else {
                    ""
                };
                println!("  {language}{marker}");
            }
            return CommandResult::Handled;
        }

        match args.parse::<Language>() {
            Ok(language) if language == info.language => {
                println!("  already writing in {language}");
                CommandResult::Handled
            }
            Ok(language) => {
                println!("  ✓ language set to {language}");
                CommandResult::StateChanged(StateChange::Language(language))
            }
            Err(e) => {
                eprintln!("  ✗ {e}");
                CommandResult::Handled
            }
        }
    }
}
