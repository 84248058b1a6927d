use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, resolve_target};
use crate::consts::{stars, truncate};
use crate::review::{ReviewItem, ReviewStatus};

const PREVIEW_CHARS: usize = 60;

pub struct ReviewsCommand;

#[async_trait]
impl Command for ReviewsCommand {
    fn name(&self) -> &str {
        "/reviews"
    }

    fn aliases(&self) -> &[&str] {
        &["/ls"]
    }

    fn usage(&self) -> &str {
        "[n|id]"
    }

    fn description(&self) -> &str {
        "list reviews, or show one in full"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let Some(engine) = info.engine() else {
            return CommandResult::Handled;
        };

        if !args.is_empty() {
            if let Some(id) = resolve_target(engine, args).await
                && let Ok(item) = engine.store().get(&id).await
            {
                print!("{}", render_detail(&item));
            }
            return CommandResult::Handled;
        }

        let items = engine.store().snapshot().await;
        if items.is_empty() {
            println!("  no reviews loaded. Try /reload");
            return CommandResult::Handled;
        }

        let in_flight = engine.in_flight();
        for (i, item) in items.iter().enumerate() {
            let busy = in_flight.as_ref() == Some(&item.id);
            println!("{}", render_row(i + 1, item, busy));
        }
        CommandResult::Handled
    }
}

fn status_badge(status: ReviewStatus) -> &'static str {
    match status {
        ReviewStatus::Pending => "[pending]",
        ReviewStatus::Drafted => "[drafted]",
        ReviewStatus::Replied => "[replied]",
    }
}

fn render_row(position: usize, item: &ReviewItem, busy: bool) -> String {
    let mut row = format!(
        "  {position:>3}. {} {} · {} {}",
        stars(item.rating()),
        item.reviewer_name,
        item.date,
        status_badge(item.status()),
    );
    if item.has_suspect_rating() {
        row.push_str(" ⚠ rating?");
    }
    if busy {
        row.push_str(" …");
    }
    let content = if item.content.is_empty() {
        "(rating only)"
    } else {
        item.content.as_str()
    };
    row.push_str(&format!("\n       {}", truncate(content, PREVIEW_CHARS)));
    row
}

fn render_detail(item: &ReviewItem) -> String {
    let mut out = format!(
        "  {} {} · {}\n  id      {}\n  status  {}\n",
        stars(item.rating()),
        item.reviewer_name,
        item.date,
        item.id,
        item.status(),
    );
    if item.has_suspect_rating() {
        out.push_str("  ⚠ the platform sent a rating outside 1-5\n");
    }
    out.push_str(&format!("\n  {}\n", item.content));
    if let Some(reply) = item.reply_content() {
        out.push_str(&format!("\n  reply:\n  {reply}\n"));
    }
    out
}
