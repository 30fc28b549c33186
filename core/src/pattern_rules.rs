//! Content screening rules.
//!
//! Rules are evaluated in table order. The recorded label is the
//! rule's own pattern text (or the keyword that fired), so the
//! `regex_pattern_match` column reads like a screening log.

use crate::rng::StreamRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatternRule {
    /// Case-sensitive substring.
    Keyword { keyword: String },
    /// Any of several case-sensitive substrings; labels with the one found.
    AnyKeyword { keywords: Vec<String> },
    /// A run of at least `len` consecutive ASCII digits.
    DigitRun { len: usize },
    /// http://, https:// or www. tokens.
    Url,
    /// A token of at least `min_len` letters, all uppercase.
    AllCapsToken { min_len: usize },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    #[default]
    First,
    Random,
}

impl PatternRule {
    pub fn builtin() -> Vec<Self> {
        vec![
            Self::Keyword { keyword: "OTP".into() },
            Self::DigitRun { len: 6 },
            Self::AnyKeyword {
                keywords: ["FREE", "URGENT", "GIFT", "WIN", "PRIZE"]
                    .iter()
                    .map(|k| k.to_string())
                    .collect(),
            },
            Self::Url,
            Self::AllCapsToken { min_len: 4 },
        ]
    }

    /// Label of this rule if it fires on `text`.
    pub fn matches(&self, text: &str) -> Option<String> {
        match self {
            Self::Keyword { keyword } => text.contains(keyword.as_str()).then(|| keyword.clone()),
            Self::AnyKeyword { keywords } => keywords
                .iter()
                .find(|k| text.contains(k.as_str()))
                .cloned(),
            Self::DigitRun { len } => {
                (*len > 0 && longest_digit_run(text) >= *len).then(|| format!("\\d{{{len}}}"))
            }
            Self::Url => text
                .split_whitespace()
                .any(is_url_token)
                .then(|| "url".to_string()),
            Self::AllCapsToken { min_len } => text
                .split_whitespace()
                .any(|t| is_all_caps(t, *min_len))
                .then(|| "all_caps".to_string()),
        }
    }
}

/// Label of the first rule that fires, in table order.
pub fn first_match(rules: &[PatternRule], text: &str) -> Option<String> {
    rules.iter().find_map(|r| r.matches(text))
}

/// Label of a uniformly chosen rule among all that fire.
pub fn random_match(rules: &[PatternRule], text: &str, rng: &mut StreamRng) -> Option<String> {
    let hits: Vec<String> = rules.iter().filter_map(|r| r.matches(text)).collect();
    if hits.is_empty() {
        return None;
    }
    let idx = rng.next_u64_below(hits.len() as u64) as usize;
    hits.into_iter().nth(idx)
}

/// Apply the configured policy.
pub fn screen(
    rules: &[PatternRule],
    text: &str,
    policy: MatchPolicy,
    rng: &mut StreamRng,
) -> Option<String> {
    match policy {
        MatchPolicy::First => first_match(rules, text),
        MatchPolicy::Random => random_match(rules, text, rng),
    }
}

pub fn contains_url(text: &str) -> bool {
    text.split_whitespace().any(is_url_token)
}

fn is_url_token(token: &str) -> bool {
    let t = token.to_ascii_lowercase();
    t.starts_with("http://") || t.starts_with("https://") || t.starts_with("www.")
}

fn is_all_caps(token: &str, min_len: usize) -> bool {
    let letters: Vec<char> = token.chars().filter(|c| c.is_alphabetic()).collect();
    // Tokens with digits mixed in (codes, ids) are not shouting.
    if token.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    letters.len() >= min_len.max(1) && letters.iter().all(|c| c.is_uppercase())
}

fn longest_digit_run(text: &str) -> usize {
    let mut best = 0;
    let mut run = 0;
    for c in text.chars() {
        if c.is_ascii_digit() {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_keyword_fires_before_digit_run() {
        let rules = PatternRule::builtin();
        assert_eq!(first_match(&rules, "Your OTP is 123456").as_deref(), Some("OTP"));
    }

    #[test]
    fn digit_run_needs_six_digits() {
        let rules = PatternRule::builtin();
        assert_eq!(
            first_match(&rules, "Use code 654321 to sign in").as_deref(),
            Some("\\d{6}")
        );
        assert_eq!(first_match(&rules, "Table for 12345 people"), None);
    }

    #[test]
    fn spam_keyword_label_is_the_keyword() {
        let rules = PatternRule::builtin();
        assert_eq!(first_match(&rules, "WIN A FREE GIFT NOW!").as_deref(), Some("FREE"));
    }

    #[test]
    fn url_and_caps_rules() {
        assert!(PatternRule::Url.matches("go to https://x.io now").is_some());
        assert!(PatternRule::Url.matches("nothing here").is_none());
        let caps = PatternRule::AllCapsToken { min_len: 4 };
        assert!(caps.matches("act NOW please HURRY").is_some());
        assert!(caps.matches("ref AB12CD").is_none());
    }

    #[test]
    fn plain_sentence_has_no_match() {
        let rules = PatternRule::builtin();
        assert_eq!(first_match(&rules, "Meeting moved to the blue room."), None);
    }

    #[test]
    fn random_match_only_returns_firing_labels() {
        let rules = PatternRule::builtin();
        let mut rng = StreamRng::new(5, 4);
        for _ in 0..50 {
            let hit = random_match(&rules, "URGENT claim at www.prize.biz", &mut rng).unwrap();
            assert!(["URGENT", "url", "all_caps"].contains(&hit.as_str()), "{hit}");
        }
    }
}
