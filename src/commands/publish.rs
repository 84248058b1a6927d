use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, resolve_target, split_target};
use crate::spinner::Spinner;

pub struct PublishCommand;

#[async_trait]
impl Command for PublishCommand {
    fn name(&self) -> &str {
        "/publish"
    }

    fn aliases(&self) -> &[&str] {
        &["/p"]
    }

    fn usage(&self) -> &str {
        "<n|id> [text]"
    }

    fn description(&self) -> &str {
        "send the draft (or the given text) to Google"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let Some(engine) = info.engine() else {
            return CommandResult::Handled;
        };
        let (target, text) = split_target(args);
        let Some(id) = resolve_target(engine, target).await else {
            return CommandResult::Handled;
        };

        // Without explicit text, send the current draft as-is.
        let text = if text.is_empty() {
            match engine.store().get(&id).await {
                Ok(item) => item.reply_content().unwrap_or_default().to_string(),
                Err(e) => {
                    eprintln!("  ✗ {e}");
                    return CommandResult::Handled;
                }
            }
        } else {
            text.to_string()
        };

        match Spinner::while_running("publishing", engine.publish(&id, &text)).await {
            Ok(()) => println!("  ✓ reply published"),
            Err(e) => eprintln!("  ✗ {e}"),
        }
        CommandResult::Handled
    }
}
