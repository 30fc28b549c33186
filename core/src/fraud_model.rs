//! Fraud labelling.
//!
//! The probability table is monotonic in (content risk, pattern hit,
//! regex-flagged error) and is scaled up near peak dates. The label
//! itself is a Bernoulli draw, so normal unmatched traffic still
//! carries a small residual fraud rate and risky traffic is not
//! always fraud.

use crate::{
    calendar::Proximity,
    config::FraudModelConfig,
    pattern_rules::contains_url,
    record::{ContentKind, FraudType},
    rng::StreamRng,
};

/// Inputs the fraud decision depends on.
#[derive(Debug, Clone, Copy)]
pub struct FraudSignals<'a> {
    pub content: ContentKind,
    pub text: &'a str,
    pub pattern_matched: bool,
    pub regex_flagged_error: bool,
    pub proximity: Proximity,
}

pub fn fraud_probability(cfg: &FraudModelConfig, s: &FraudSignals<'_>) -> f64 {
    let base = match (s.content, s.pattern_matched) {
        (ContentKind::Normal, false) => cfg.normal_clean,
        (ContentKind::Normal, true) => {
            cfg.normal_matched
                + if s.regex_flagged_error {
                    cfg.normal_flagged_bonus
                } else {
                    0.0
                }
        }
        (_, false) => cfg.risky_clean,
        (_, true) if s.regex_flagged_error => cfg.risky_matched_flagged,
        (_, true) => cfg.risky_matched,
    };
    let scaled = match s.proximity {
        Proximity::Normal => base,
        Proximity::LeadIn => base * cfg.lead_in_multiplier,
        Proximity::PeakDay => base * cfg.peak_day_multiplier,
    };
    scaled.clamp(0.0, cfg.max_probability)
}

pub fn decide_fraud(cfg: &FraudModelConfig, s: &FraudSignals<'_>, rng: &mut StreamRng) -> bool {
    rng.chance(fraud_probability(cfg, s))
}

/// Classify a fraudulent message. Returns `FraudType::None` when not fraud.
pub fn fraud_type(cfg: &FraudModelConfig, is_fraud: bool, content: ContentKind, text: &str) -> FraudType {
    if !is_fraud {
        return FraudType::None;
    }
    match content {
        ContentKind::Otp if text.contains("OTP") => FraudType::OtpAbuse,
        ContentKind::Otp => FraudType::CodeMisuse,
        ContentKind::Spam if cfg.brand_keywords.iter().any(|b| text.contains(b.as_str())) => {
            FraudType::BrandImpersonation
        }
        ContentKind::Spam if contains_url(text) => FraudType::LinkFraud,
        ContentKind::Spam | ContentKind::Normal => FraudType::SpoofedId,
    }
}

/// Whether the aggregator reported this message as fraud.
/// Only fraud can be reported; trusted aggregators report more often.
pub fn reported_by_aggregator(
    cfg: &FraudModelConfig,
    is_fraud: bool,
    trust_score: f64,
    rng: &mut StreamRng,
) -> bool {
    is_fraud && rng.chance((cfg.report_base + cfg.report_trust_slope * trust_score).clamp(0.0, 1.0))
}
