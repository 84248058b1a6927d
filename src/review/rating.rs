//! The platform's star-rating enumeration.

/// Platform labels in scale order. A label's index is its star count.
const STAR_RATINGS: [&str; 6] = ["ZERO", "ONE", "TWO", "THREE", "FOUR", "FIVE"];

/// Returned for labels outside the enumeration.
pub const UNKNOWN_RATING: i32 = -1;

/// Map a platform star label (`"FOUR"`) to its integer (4).
/// Unrecognized labels map to [`UNKNOWN_RATING`] instead of failing.
pub fn parse_star_rating(label: &str) -> i32 {
    STAR_RATINGS
        .iter()
        .position(|s| *s == label)
        .map_or(UNKNOWN_RATING, |i| i as i32)
}
