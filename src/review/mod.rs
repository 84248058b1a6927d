//! Review items and their reply lifecycle.

pub mod rating;
pub mod store;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Remote review identifier. Stable key of the [`store::ReviewStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewId(pub String);

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ReviewId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ReviewId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Plain status tag, for display and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
    Pending,
    Drafted,
    Replied,
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Drafted => "drafted",
            Self::Replied => "replied",
        };
        f.write_str(label)
    }
}

/// Where an item is in its reply lifecycle. The reply text lives inside the
/// variant, so a pending item cannot carry one and a drafted or replied item
/// cannot lack one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyState {
    Pending,
    /// Generated or user-edited, not yet on the platform.
    Drafted(String),
    /// Published. Terminal.
    Replied(String),
}

impl ReplyState {
    pub fn status(&self) -> ReviewStatus {
        match self {
            Self::Pending => ReviewStatus::Pending,
            Self::Drafted(_) => ReviewStatus::Drafted,
            Self::Replied(_) => ReviewStatus::Replied,
        }
    }

    pub fn reply_content(&self) -> Option<&str> {
        match self {
            Self::Pending => None,
            Self::Drafted(text) | Self::Replied(text) => Some(text),
        }
    }
}

/// One customer review plus its reply lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem {
    pub id: ReviewId,
    pub reviewer_name: String,
    /// 0..=5 from the platform, or -1 when the platform value was unrecognized.
    rating: i32,
    pub content: String,
    /// Display-formatted creation time.
    pub date: String,
    pub avatar: Option<String>,
    pub state: ReplyState,
}

impl ReviewItem {
    pub fn new(
        id: ReviewId,
        reviewer_name: String,
        rating: i32,
        content: String,
        date: String,
        avatar: Option<String>,
        state: ReplyState,
    ) -> Self {
        Self {
            id,
            reviewer_name,
            rating,
            content,
            date,
            avatar,
            state,
        }
    }

    pub fn rating(&self) -> i32 {
        self.rating
    }

    /// Ratings outside 1..=5 are loaded but worth a second look.
    pub fn has_suspect_rating(&self) -> bool {
        !(1..=5).contains(&self.rating)
    }

    pub fn status(&self) -> ReviewStatus {
        self.state.status()
    }

    pub fn reply_content(&self) -> Option<&str> {
        self.state.reply_content()
    }
}

/// Voice of the generated reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Professional,
    Friendly,
    Empathetic,
    Grateful,
    Witty,
}

impl Tone {
    pub const ALL: [Tone; 5] = [
        Tone::Professional,
        Tone::Friendly,
        Tone::Empathetic,
        Tone::Grateful,
        Tone::Witty,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Professional => "Professional",
            Self::Friendly => "Friendly",
            Self::Empathetic => "Empathetic",
            Self::Grateful => "Grateful",
            Self::Witty => "Witty",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|tone| tone.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown tone: {s}"))
    }
}

/// Language the reply is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    Vietnamese,
    #[default]
    English,
    French,
    Japanese,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::Vietnamese,
        Language::English,
        Language::French,
        Language::Japanese,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Vietnamese => "Vietnamese",
            Self::English => "English",
            Self::French => "French",
            Self::Japanese => "Japanese",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|language| language.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown language: {s}"))
    }
}

/// Format an RFC 3339 timestamp for display (e.g. `Mar 3, 2026`).
/// Anything unparseable is shown as-is.
pub fn format_date(raw: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.format("%b %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(rating: i32, state: ReplyState) -> ReviewItem {
        ReviewItem::new(
            ReviewId::from("r1"),
            "Alice".to_string(),
            rating,
            "Great food!".to_string(),
            "Mar 3, 2026".to_string(),
            None,
            state,
        )
    }

    #[test]
    fn pending_has_no_reply() {
        let item = item(5, ReplyState::Pending);
        assert_eq!(item.status(), ReviewStatus::Pending);
        assert!(item.reply_content().is_none());
    }

    #[test]
    fn drafted_and_replied_carry_text() {
        let drafted = item(5, ReplyState::Drafted(String::new()));
        assert_eq!(drafted.reply_content(), Some(""));

        let replied = item(5, ReplyState::Replied("thanks".to_string()));
        assert_eq!(replied.status(), ReviewStatus::Replied);
        assert_eq!(replied.reply_content(), Some("thanks"));
    }

    #[test]
    fn suspect_ratings() {
        assert!(item(-1, ReplyState::Pending).has_suspect_rating());
        assert!(item(0, ReplyState::Pending).has_suspect_rating());
        assert!(!item(1, ReplyState::Pending).has_suspect_rating());
        assert!(!item(5, ReplyState::Pending).has_suspect_rating());
    }

    #[test]
    fn tone_parses_case_insensitively() {
        assert_eq!("grateful".parse::<Tone>().unwrap(), Tone::Grateful);
        assert_eq!(" WITTY ".parse::<Tone>().unwrap(), Tone::Witty);
        assert!("sarcastic".parse::<Tone>().is_err());
    }

    #[test]
    fn language_parses_case_insensitively() {
        assert_eq!("english".parse::<Language>().unwrap(), Language::English);
        assert_eq!("Japanese".parse::<Language>().unwrap(), Language::Japanese);
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn labels_round_trip_through_display() {
        for tone in Tone::ALL {
            assert_eq!(tone.to_string().parse::<Tone>().unwrap(), tone);
        }
        for language in Language::ALL {
            assert_eq!(language.to_string().parse::<Language>().unwrap(), language);
        }
    }

    #[test]
    fn format_date_rfc3339() {
        assert_eq!(format_date("2026-03-03T10:15:00Z"), "Mar 3, 2026");
        assert_eq!(format_date("2025-12-24T23:59:59.123456Z"), "Dec 24, 2025");
    }

    #[test]
    fn format_date_passes_through_garbage() {
        assert_eq!(format_date("yesterday"), "yesterday");
    }
}
