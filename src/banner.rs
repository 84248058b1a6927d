//! Startup banner and session summary display.

use crate::consts::{AUTHOR, HOMEPAGE, REPO};
use crate::review::{ReviewItem, ReviewStatus};

/// Session configuration for display in the startup banner.
pub struct BannerInfo<'a> {
    pub business: &'a str,
    pub model: &'a str,
    pub platform_auth: &'a str,
    pub generator_auth: &'a str,
    pub tone: &'a str,
    pub language: &'a str,
    pub db: &'a str,
}

/// Print the startup banner with session info.
pub fn print_banner(info: &BannerInfo) {
    println!(
        r#"
   ╔═══════════════════════════════════════╗
   ║              Q U I L L                ║
   ║    every review deserves an answer    ║
   ╚═══════════════════════════════════════╝

   version   {}
   by        {}
   home      {}
   repo      {}
   business  {}
   google    {}
   writer    {} ({})
   voice     {}, in {}
   db        {}
"#,
        env!("CARGO_PKG_VERSION"),
        AUTHOR,
        HOMEPAGE,
        REPO,
        info.business,
        info.platform_auth,
        info.model,
        info.generator_auth,
        info.tone,
        info.language,
        info.db,
    );
}

/// Counts per status, for the farewell line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub drafted: usize,
    pub replied: usize,
}

impl StatusCounts {
    pub fn tally(items: &[ReviewItem]) -> Self {
        let mut counts = Self::default();
        for item in items {
            match item.status() {
                ReviewStatus::Pending => counts.pending += 1,
                ReviewStatus::Drafted => counts.drafted += 1,
                ReviewStatus::Replied => counts.replied += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.pending + self.drafted + self.replied
    }
}

/// Print the session summary (review counts + farewell).
pub fn print_session_summary(counts: StatusCounts) {
    if counts.total() > 0 {
        println!(
            "session: {} replied, {} drafted, {} pending",
            counts.replied, counts.drafted, counts.pending
        );
        if counts.drafted > 0 {
            println!("note: drafts are not saved. Publish them before leaving.");
        }
    }
    println!("goodbye.");
}
