use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::banner::StatusCounts;
use crate::spinner::Spinner;

pub struct ReloadCommand;

#[async_trait]
impl Command for ReloadCommand {
    fn name(&self) -> &str {
        "/reload"
    }

    fn description(&self) -> &str {
        "fetch reviews again (discards unpublished drafts)"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let Some(engine) = info.engine() else {
            return CommandResult::Handled;
        };

        match Spinner::while_running("loading reviews", engine.reload()).await {
            Ok(items) => {
                let counts = StatusCounts::tally(&items);
                println!(
                    "  ✓ {} reviews ({} pending, {} replied)",
                    counts.total(),
                    counts.pending,
                    counts.replied
                );
                let flagged = engine.store().flagged().await.len();
                if flagged > 0 {
                    println!("  ⚠ {flagged} with an unrecognised rating, marked in /reviews");
                }
            }
            Err(e) => eprintln!("  ✗ {e} (keeping the previous list)"),
        }
        CommandResult::Handled
    }
}
