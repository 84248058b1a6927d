use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, resolve_target};
use crate::spinner::Spinner;

pub struct GenerateCommand;

#[async_trait]
impl Command for GenerateCommand {
    fn name(&self) -> &str {
        "/generate"
    }

    fn aliases(&self) -> &[&str] {
        &["/g"]
    }

    fn usage(&self) -> &str {
        "<n|id>"
    }

    fn description(&self) -> &str {
        "draft a reply (again) in the current tone and language"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let Some(engine) = info.engine() else {
            return CommandResult::Handled;
        };
        let Some(id) = resolve_target(engine, args).await else {
            return CommandResult::Handled;
        };

        let drafting = engine.generate(&id, info.tone, info.language);
        match Spinner::while_running("drafting reply", drafting).await {
            Ok(text) => {
                println!("  ✓ draft ({}, {}):\n", info.tone, info.language);
                println!("{text}\n");
                println!("  /edit {args} <text> to change it, /publish {args} to send it");
            }
            Err(e) => eprintln!("  ✗ {e}"),
        }
        CommandResult::Handled
    }
}
