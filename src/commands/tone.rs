use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange};
use crate::review::Tone;

pub struct ToneCommand;

#[async_trait]
impl Command for ToneCommand {
    fn name(&self) -> &str {
        "/tone"
    }

    fn usage(&self) -> &str {
        "[tone]"
    }

    fn description(&self) -> &str {
        "show or set the tone of new drafts"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        if args.is_empty() {
            for tone in Tone::ALL {
                let marker = if tone == info.tone { " ← current" } else { "" };
                println!("  {tone}{marker}");
            }
            return CommandResult::Handled;
        }

        match args.parse::<Tone>() {
            Ok(tone) if tone == info.tone => {
                println!("  already writing in a {tone} tone");
                CommandResult::Handled
            }
            Ok(tone) => {
                println!("  ✓ tone set to {tone}");
                CommandResult::StateChanged(StateChange::Tone(tone))
            }
            Err(e) => {
                eprintln!("  ✗ {e}");
                CommandResult::Handled
            }
        }
    }
}
