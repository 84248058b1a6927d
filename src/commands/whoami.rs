use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};

pub struct WhoamiCommand;

#[async_trait]
impl Command for WhoamiCommand {
    fn name(&self) -> &str {
        "/whoami"
    }

    fn description(&self) -> &str {
        "show the connected business, writer, and auth status"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let business = info.business.unwrap_or("not connected");
        println!("  business  {business}");
        println!("  google    {}", info.platform_auth);
        println!("  writer    {} ({})", info.model, info.generator_auth);
        println!("  voice     {}, in {}", info.tone, info.language);
        println!("  db        {}", info.db_path);
        CommandResult::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::test_info;

    #[tokio::test]
    async fn returns_handled() {
        assert!(matches!(
            WhoamiCommand.execute("", &test_info()).await,
            CommandResult::Handled
        ));
    }

    #[tokio::test]
    async fn handles_missing_business() {
        let info = SessionInfo {
            business: None,
            ..test_info()
        };
        assert!(matches!(
            WhoamiCommand.execute("", &info).await,
            CommandResult::Handled
        ));
    }

    #[test]
    fn metadata() {
        assert_eq!(WhoamiCommand.name(), "/whoami");
        assert!(WhoamiCommand.aliases().is_empty());
    }
}
