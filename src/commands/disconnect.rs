use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::session::storage::ProfileStorage;

pub struct DisconnectCommand;

#[async_trait]
impl Command for DisconnectCommand {
    fn name(&self) -> &str {
        "/disconnect"
    }

    fn description(&self) -> &str {
        "forget the connected business and drop its reviews"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let Some(engine) = info.engine() else {
            return CommandResult::Handled;
        };
        if !engine.session().is_connected() {
            println!("  not connected");
            return CommandResult::Handled;
        }

        engine.disconnect().await;
        match ProfileStorage::open(info.db_path).and_then(|storage| storage.clear()) {
            Ok(()) => println!("  ✓ disconnected. Run `quill connect` to pick a business again."),
            Err(e) => eprintln!("  ✗ disconnected for now, but could not forget it: {e:#}"),
        }
        CommandResult::Handled
    }
}
