use std::collections::HashMap;

use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::engine::batch::ItemOutcome;

pub struct DraftAllCommand;

#[async_trait]
impl Command for DraftAllCommand {
    fn name(&self) -> &str {
        "/draftall"
    }

    fn description(&self) -> &str {
        "draft a reply for every pending review, one by one"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let Some(engine) = info.engine() else {
            return CommandResult::Handled;
        };

        let names: HashMap<_, _> = engine
            .store()
            .snapshot()
            .await
            .into_iter()
            .map(|item| (item.id, item.reviewer_name))
            .collect();

        let notify = |outcome: &ItemOutcome| {
            let who = names
                .get(&outcome.id)
                .map(String::as_str)
                .unwrap_or("unknown reviewer");
            match &outcome.outcome {
                Ok(_) => println!("  ✓ drafted reply to {who}"),
                Err(e) => eprintln!("  ✗ {who}: {e}"),
            }
        };

        match engine
            .draft_all_with(info.tone, info.language, notify)
            .await
        {
            Ok(report) if report.attempted() == 0 => println!("  nothing pending"),
            Ok(report) => println!(
                "\n  {} of {} drafted. Review them with /reviews, then /publish",
                report.succeeded(),
                report.attempted()
            ),
            Err(e) => eprintln!("  ✗ {e}"),
        }
        CommandResult::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::commands::tests::{loaded_engine, remote, test_info};
    use crate::generator::mock::MockGenerator;
    use crate::review::{ReviewId, ReviewStatus};
    use crate::source::mock::MockSource;

    #[tokio::test]
    async fn drafts_every_pending_review() {
        let source = Arc::new(MockSource::new(vec![
            remote("r1", 5, "Great food!"),
            remote("r2", 1, "Cold soup"),
        ]));
        let generator = MockGenerator::new(vec![
            Ok("Thank you!".to_string()),
            Err("overloaded".to_string()),
        ]);
        let engine = loaded_engine(generator, source).await;
        let info = SessionInfo {
            engine: Some(&engine),
            ..test_info()
        };

        DraftAllCommand.execute("", &info).await;

        let r1 = engine.store().get(&ReviewId::from("r1")).await.unwrap();
        let r2 = engine.store().get(&ReviewId::from("r2")).await.unwrap();
        assert_eq!(r1.status(), ReviewStatus::Drafted);
        assert_eq!(r2.status(), ReviewStatus::Pending);
    }

    #[tokio::test]
    async fn without_engine_is_handled() {
        assert!(matches!(
            DraftAllCommand.execute("", &test_info()).await,
            CommandResult::Handled
        ));
    }
}
