//! Breath pattern parsing.
//!
//! Turns a human-readable duration string into an ordered list of phases.
//! Two shapes are accepted:
//!
//! - dash form: `4-4-4-4`, `6-6` (labelled Inhale, Hold, Exhale, Hold)
//! - phrase form: `Inhale 4s, hold 7s, exhale 8s.`
//!
//! Zero-second phases are dropped here so the engine never sees them.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PatternError;

static DASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:-\d+)+$").expect("valid dash regex"));

static PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(inhale|exhale|hold)[^0-9]*?(\d+)\s*s?").expect("valid phrase regex")
});

/// Positional labels for the dash form.
const DASH_LABELS: [PhaseLabel; 4] = [
    PhaseLabel::Inhale,
    PhaseLabel::Hold,
    PhaseLabel::Exhale,
    PhaseLabel::Hold,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseLabel {
    Inhale,
    Hold,
    Exhale,
}

impl PhaseLabel {
    /// Match a label word case-insensitively by prefix ("Inhale", "hold", "EXHALE").
    pub fn from_word(word: &str) -> Option<Self> {
        let lower = word.trim().to_ascii_lowercase();
        if lower.starts_with("inhale") {
            Some(PhaseLabel::Inhale)
        } else if lower.starts_with("hold") {
            Some(PhaseLabel::Hold)
        } else if lower.starts_with("exhale") {
            Some(PhaseLabel::Exhale)
        } else {
            None
        }
    }

    pub fn is_hold(self) -> bool {
        self == PhaseLabel::Hold
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PhaseLabel::Inhale => "Inhale",
            PhaseLabel::Hold => "Hold",
            PhaseLabel::Exhale => "Exhale",
        }
    }
}

impl fmt::Display for PhaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timed segment of a breath cycle. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub label: PhaseLabel,
    pub seconds: u32,
}

impl Phase {
    pub fn new(label: PhaseLabel, seconds: u32) -> Self {
        Self { label, seconds }
    }

    pub fn duration_ms(&self) -> i64 {
        i64::from(self.seconds) * 1000
    }
}

/// Parse a pattern into phases. Blank input yields an empty list.
pub fn parse_pattern(raw: &str) -> Result<Vec<Phase>, PatternError> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(Vec::new());
    }

    let phases = if DASH_RE.is_match(s) {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() > DASH_LABELS.len() {
            return Err(PatternError::TooManyPhases {
                pattern: s.to_string(),
                count: parts.len(),
            });
        }
        parts
            .iter()
            .zip(DASH_LABELS)
            .map(|(n, label)| Ok(Phase::new(label, parse_seconds(n)?)))
            .collect::<Result<Vec<_>, PatternError>>()?
    } else {
        let mut out = Vec::new();
        for caps in PHRASE_RE.captures_iter(s) {
            // Both groups are mandatory in the regex.
            let Some(label) = PhaseLabel::from_word(&caps[1]) else {
                continue;
            };
            out.push(Phase::new(label, parse_seconds(&caps[2])?));
        }
        out
    };

    Ok(phases.into_iter().filter(|p| p.seconds > 0).collect())
}

/// Total seconds in one traversal of `phases`.
pub fn cycle_seconds(phases: &[Phase]) -> u64 {
    phases.iter().map(|p| u64::from(p.seconds)).sum()
}

fn parse_seconds(text: &str) -> Result<u32, PatternError> {
    text.parse::<u32>()
        .map_err(|_| PatternError::InvalidSeconds(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use PhaseLabel::{Exhale, Hold, Inhale};

    #[test]
    fn dash_box_pattern() {
        let phases = parse_pattern("4-4-4-4").unwrap();
        assert_eq!(
            phases,
            vec![
                Phase::new(Inhale, 4),
                Phase::new(Hold, 4),
                Phase::new(Exhale, 4),
                Phase::new(Hold, 4),
            ]
        );
        assert_eq!(cycle_seconds(&phases), 16);
    }

    #[test]
    fn dash_two_part_is_inhale_hold() {
        // Positional labelling, not semantic.
        let phases = parse_pattern("6-6").unwrap();
        assert_eq!(phases, vec![Phase::new(Inhale, 6), Phase::new(Hold, 6)]);
    }

    #[test]
    fn dash_drops_zero_phases() {
        let phases = parse_pattern("4-0-8-0").unwrap();
        assert_eq!(phases, vec![Phase::new(Inhale, 4), Phase::new(Exhale, 8)]);
    }

    #[test]
    fn dash_rejects_more_than_four() {
        let err = parse_pattern("4-4-4-4-4").unwrap_err();
        assert_eq!(
            err,
            PatternError::TooManyPhases {
                pattern: "4-4-4-4-4".into(),
                count: 5
            }
        );
    }

    #[test]
    fn phrase_pattern() {
        let phases = parse_pattern("Inhale 4s, hold 7s, exhale 8s.").unwrap();
        assert_eq!(
            phases,
            vec![
                Phase::new(Inhale, 4),
                Phase::new(Hold, 7),
                Phase::new(Exhale, 8)
            ]
        );
    }

    #[test]
    fn phrase_tolerates_filler_words() {
        let phases =
            parse_pattern("Inhale through the nose for 5 seconds, then EXHALE for 5").unwrap();
        assert_eq!(phases, vec![Phase::new(Inhale, 5), Phase::new(Exhale, 5)]);
    }

    #[test]
    fn blank_and_unrelated_text_is_empty() {
        assert!(parse_pattern("").unwrap().is_empty());
        assert!(parse_pattern("   ").unwrap().is_empty());
        assert!(parse_pattern("just relax").unwrap().is_empty());
    }

    #[test]
    fn oversized_number_is_rejected() {
        let err = parse_pattern("inhale 99999999999").unwrap_err();
        assert_eq!(err, PatternError::InvalidSeconds("99999999999".into()));
    }

    #[test]
    fn label_from_word() {
        assert_eq!(PhaseLabel::from_word("INHALE"), Some(Inhale));
        assert_eq!(PhaseLabel::from_word("holding"), Some(Hold));
        assert_eq!(PhaseLabel::from_word("Exhale"), Some(Exhale));
        assert_eq!(PhaseLabel::from_word("pause"), None);
    }

    #[test]
    fn label_serde_is_lowercase() {
        let json = serde_json::to_string(&Phase::new(Exhale, 8)).unwrap();
        assert_eq!(json, r#"{"label":"exhale","seconds":8}"#);
    }
}
