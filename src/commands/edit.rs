use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, resolve_target, split_target};

pub struct EditCommand;

#[async_trait]
impl Command for EditCommand {
    fn name(&self) -> &str {
        "/edit"
    }

    fn usage(&self) -> &str {
        "<n|id> <text>"
    }

    fn description(&self) -> &str {
        "replace a draft with your own text"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let Some(engine) = info.engine() else {
            return CommandResult::Handled;
        };
        let (target, text) = split_target(args);
        let Some(id) = resolve_target(engine, target).await else {
            return CommandResult::Handled;
        };
        if text.is_empty() {
            eprintln!("  ✗ usage: /edit {target} <new reply text>");
            return CommandResult::Handled;
        }

        match engine.edit(&id, text).await {
            Ok(_) => println!("  ✓ draft updated"),
            Err(e) => eprintln!("  ✗ {e}"),
        }
        CommandResult::Handled
    }
}
