//! Project-wide constants.

use std::path::PathBuf;

use anyhow::{Context, Result};

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");
pub const REPO: &str = env!("CARGO_PKG_REPOSITORY");

/// Default Anthropic model when none is specified.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default database path: `~/.quill/quill.db`.
/// Single DB for credentials, config, and the connected business.
pub fn default_db_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("cannot determine home directory")?;
    Ok(home.join(".quill").join("quill.db"))
}

/// Render a 0..=5 rating as filled and empty stars. Unknown ratings render
/// as `?????`.
pub fn stars(rating: i32) -> String {
    match usize::try_from(rating) {
        Ok(n) if n <= 5 => format!("{}{}", "★".repeat(n), "☆".repeat(5 - n)),
        _ => "?????".to_string(),
    }
}

/// Shorten `text` to at most `max` characters, marking the cut with `…`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}
