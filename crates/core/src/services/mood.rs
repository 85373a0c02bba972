//! Mood classifier.
//!
//! Maps review text and the time it was written to one of six atmosphere moods.
//! The classifier is a fixed keyword heuristic over English text and never fails.

use chrono::{DateTime, FixedOffset, Local, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

/// Atmosphere of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    /// Date-night atmosphere.
    Romantic,
    /// Music and fun.
    Energetic,
    /// Comfortable and relaxed.
    Cozy,
    /// Good for groups.
    Social,
    /// Calm, good for working.
    Quiet,
    /// Busy evening buzz.
    Lively,
}

impl Mood {
    /// Every mood, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Romantic,
        Self::Energetic,
        Self::Cozy,
        Self::Social,
        Self::Quiet,
        Self::Lively,
    ];

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Romantic => "Romantic Vibes",
            Self::Energetic => "Energetic & Fun",
            Self::Cozy => "Cozy & Relaxed",
            Self::Social => "Social Hotspot",
            Self::Quiet => "Quiet & Peaceful",
            Self::Lively => "Lively Atmosphere",
        }
    }
}

/// A mood paired with its label, as sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoodView {
    pub mood: Mood,
    pub label: &'static str,
}

impl From<Mood> for MoodView {
    fn from(mood: Mood) -> Self {
        Self {
            mood,
            label: mood.label(),
        }
    }
}

const ROMANTIC_WORDS: &[&str] = &["date", "romantic", "intimate"];

// Scanned in this order; the first group with a hit wins.
const KEYWORD_MOODS: &[(&[&str], Mood)] = &[
    (&["quiet", "peaceful", "work"], Mood::Quiet),
    (&["friends", "group", "party"], Mood::Social),
    (&["cozy", "comfortable", "relax"], Mood::Cozy),
    (&["music", "fun", "energetic"], Mood::Energetic),
];

/// Classify a review by the local hour it was written at.
///
/// The timestamp is converted to the local time zone before reading the hour, whatever
/// offset it was stored with. Without a timestamp the current local hour is used.
#[must_use]
pub fn classify_mood(text: &str, timestamp: Option<DateTime<FixedOffset>>) -> Mood {
    classify_mood_in(text, timestamp, &Local)
}

/// Classify a review by its hour in `zone`.
#[must_use]
pub fn classify_mood_in<Tz: TimeZone>(
    text: &str,
    timestamp: Option<DateTime<FixedOffset>>,
    zone: &Tz,
) -> Mood {
    let hour = timestamp
        .unwrap_or_else(|| chrono::Utc::now().into())
        .with_timezone(zone)
        .hour();
    classify_mood_at_hour(text, hour)
}

/// Classify a review written at `hour` (0-23).
#[must_use]
pub fn classify_mood_at_hour(text: &str, hour: u32) -> Mood {
    let text = text.to_lowercase();
    let contains_any = |words: &[&str]| words.iter().any(|w| text.contains(w));

    if hour >= 20 || hour <= 5 {
        return if contains_any(ROMANTIC_WORDS) {
            Mood::Romantic
        } else {
            Mood::Lively
        };
    }

    if let Some((_, mood)) = KEYWORD_MOODS.iter().find(|(words, _)| contains_any(words)) {
        return *mood;
    }

    match hour {
        6..=11 => Mood::Cozy,
        12..=16 => Mood::Social,
        17..=19 => Mood::Lively,
        _ => Mood::Energetic,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_romantic_wins_over_quiet_at_night() {
        assert_eq!(
            classify_mood_at_hour("A romantic and quiet dinner", 22),
            Mood::Romantic
        );
    }

    #[test]
    fn test_night_without_romance_is_lively() {
        assert_eq!(classify_mood_at_hour("Nice food", 20), Mood::Lively);
        assert_eq!(classify_mood_at_hour("Quiet place to work", 2), Mood::Lively);
    }

    #[test]
    fn test_evening_without_keyword_is_lively() {
        assert_eq!(classify_mood_at_hour("Nice food", 19), Mood::Lively);
    }

    #[test]
    fn test_keyword_order() {
        // "work" (quiet) is checked before "friends" (social)
        assert_eq!(
            classify_mood_at_hour("Came with friends after work", 13),
            Mood::Quiet
        );
        assert_eq!(classify_mood_at_hour("Party with the group", 9), Mood::Social);
        assert_eq!(classify_mood_at_hour("So COMFORTABLE", 15), Mood::Cozy);
        assert_eq!(classify_mood_at_hour("Live music", 8), Mood::Energetic);
    }

    #[test]
    fn test_hour_fallback() {
        assert_eq!(classify_mood_at_hour("Good", 6), Mood::Cozy);
        assert_eq!(classify_mood_at_hour("Good", 11), Mood::Cozy);
        assert_eq!(classify_mood_at_hour("Good", 12), Mood::Social);
        assert_eq!(classify_mood_at_hour("Good", 16), Mood::Social);
        assert_eq!(classify_mood_at_hour("Good", 17), Mood::Lively);
    }

    #[test]
    fn test_hour_is_read_in_the_viewer_zone() {
        // Stored the way reviews are created: a UTC instant widened to FixedOffset.
        let stored: DateTime<FixedOffset> = chrono::Utc
            .with_ymd_and_hms(2024, 5, 2, 14, 0, 0)
            .unwrap()
            .into();
        let vietnam = FixedOffset::east_opt(7 * 3600).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();

        assert_eq!(classify_mood_in("Nice food", Some(stored), &vietnam), Mood::Lively);
        assert_eq!(classify_mood_in("Nice food", Some(stored), &utc), Mood::Social);
    }

    #[test]
    fn test_stored_offset_does_not_change_the_hour() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        let ts = tokyo.with_ymd_and_hms(2024, 5, 2, 6, 0, 0).unwrap();
        let same_instant = ts.with_timezone(&utc);

        assert_eq!(
            classify_mood_in("Good", Some(ts), &tokyo),
            classify_mood_in("Good", Some(same_instant), &tokyo)
        );
        assert_eq!(classify_mood_in("Good", Some(ts), &tokyo), Mood::Cozy);
    }

    #[test]
    fn test_default_zone_is_local() {
        let ts = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 2, 14, 0, 0)
            .unwrap();
        assert_eq!(
            classify_mood("Nice food", Some(ts)),
            classify_mood_in("Nice food", Some(ts), &Local)
        );
    }

    #[test]
    fn test_classification_is_total_and_idempotent() {
        let texts = ["", "date night", "quiet work", "party", "cozy", "music", "meh"];
        for text in texts {
            for hour in 0..24 {
                let first = classify_mood_at_hour(text, hour);
                assert!(Mood::ALL.contains(&first));
                assert_eq!(first, classify_mood_at_hour(text, hour));
            }
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(Mood::Romantic.label(), "Romantic Vibes");
        assert_eq!(Mood::Energetic.label(), "Energetic & Fun");
        assert_eq!(Mood::Cozy.label(), "Cozy & Relaxed");
        assert_eq!(Mood::Social.label(), "Social Hotspot");
        assert_eq!(Mood::Quiet.label(), "Quiet & Peaceful");
        assert_eq!(Mood::Lively.label(), "Lively Atmosphere");
    }
}
