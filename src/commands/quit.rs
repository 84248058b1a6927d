use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};

pub struct QuitCommand;

#[async_trait]
impl Command for QuitCommand {
    fn name(&self) -> &str {
        "/quit"
    }

    fn aliases(&self) -> &[&str] {
        &["quit", "exit", "/exit", "/q"]
    }

    fn description(&self) -> &str {
        "exit (unpublished drafts are lost)"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        if let Some(engine) = info.engine
            && let Some(id) = engine.in_flight()
        {
            println!("  abandoning in-flight work on {id}");
        }
        CommandResult::Quit
    }
}
