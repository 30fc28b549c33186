use crate::{
    calendar::{JitterModel, PeakCalendar},
    error::{GenError, GenResult},
    pattern_rules::{MatchPolicy, PatternRule},
    record::{Channel, ContentKind},
    reference::{Aggregator, Customer, ErrorCode, ReferenceTables, Tier},
    types::{RefId, Seed},
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A destination country with the integer weight range it is drawn from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountryWeight {
    pub country: String,
    pub min_weight: u64,
    pub max_weight: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentMix {
    pub normal: f64,
    pub otp: f64,
    pub spam: f64,
    /// Customer whose otp/spam share is boosted inside peak windows.
    pub surge_customer: Option<RefId>,
    pub surge_multiplier: f64,
}

impl ContentMix {
    pub fn weight(&self, kind: ContentKind) -> f64 {
        match kind {
            ContentKind::Normal => self.normal,
            ContentKind::Otp => self.otp,
            ContentKind::Spam => self.spam,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorWeights {
    /// Code that means "delivered".
    pub no_error_code: RefId,
    /// Weights when no pattern rule fired.
    pub clean: BTreeMap<RefId, f64>,
    /// Weights when a pattern rule fired.
    pub matched: BTreeMap<RefId, f64>,
}

/// Base fraud probabilities. See DESIGN.md for the chosen thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FraudModelConfig {
    pub normal_clean: f64,
    pub normal_matched: f64,
    pub normal_flagged_bonus: f64,
    pub risky_clean: f64,
    pub risky_matched: f64,
    pub risky_matched_flagged: f64,
    pub lead_in_multiplier: f64,
    pub peak_day_multiplier: f64,
    pub max_probability: f64,
    /// Aggregator reports fraud with probability base + slope * trust.
    pub report_base: f64,
    pub report_trust_slope: f64,
    pub brand_keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostModelConfig {
    /// Keyed by tier label (`tier-1`, ...).
    pub tier_base_rates: BTreeMap<String, f64>,
    pub rate_jitter: f64,
    pub hop_multipliers: [f64; 3],
    pub country_risk_multipliers: BTreeMap<String, f64>,
    pub decimals: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopularityConfig {
    /// Pareto shape for per-run customer/aggregator weights.
    pub pareto_alpha: f64,
    pub max_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratorConfig {
    pub seed: Seed,
    pub message_count: u64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub calendar: PeakCalendar,
    pub jitter: JitterModel,
    pub popularity: PopularityConfig,
    pub countries: Vec<CountryWeight>,
    pub channels: Vec<(Channel, f64)>,
    pub content: ContentMix,
    pub match_policy: MatchPolicy,
    pub errors: ErrorWeights,
    pub fraud: FraudModelConfig,
    pub cost: CostModelConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct AggregatorsFile {
    aggregators: Vec<Aggregator>,
}

#[derive(Debug, Clone, Deserialize)]
struct CustomersFile {
    customers: Vec<Customer>,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorCodesFile {
    error_codes: Vec<ErrorCode>,
}

#[derive(Debug, Clone, Deserialize)]
struct PatternRulesFile {
    rules: Vec<PatternRule>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            message_count: 200_000,
            start: midnight(2024, 11, 15),
            end: midnight(2025, 1, 15),
            calendar: PeakCalendar::default(),
            jitter: JitterModel::default(),
            popularity: PopularityConfig {
                pareto_alpha: 1.3,
                max_weight: 25.0,
            },
            countries: vec![
                country("United Kingdom", 18, 25),
                country("USA", 12, 18),
                country("Japan", 10, 15),
                country("Germany", 8, 12),
                country("India", 8, 12),
                country("Brazil", 6, 10),
                country("Palestine", 5, 8),
                country("Nigeria", 3, 6),
            ],
            channels: vec![
                (Channel::Sms, 0.70),
                (Channel::WhatsApp, 0.22),
                (Channel::Rcs, 0.08),
            ],
            content: ContentMix {
                normal: 0.85,
                otp: 0.10,
                spam: 0.05,
                surge_customer: Some("C2".into()),
                surge_multiplier: 2.0,
            },
            match_policy: MatchPolicy::First,
            errors: ErrorWeights {
                no_error_code: "E0".into(),
                clean: weights(&[("E100", 0.03), ("E403", 0.01), ("E500", 0.02), ("E0", 0.94)]),
                matched: weights(&[("E100", 0.05), ("E403", 0.12), ("E500", 0.03), ("E0", 0.80)]),
            },
            fraud: FraudModelConfig {
                normal_clean: 0.001,
                normal_matched: 0.01,
                normal_flagged_bonus: 0.30,
                risky_clean: 0.04,
                risky_matched: 0.20,
                risky_matched_flagged: 0.90,
                lead_in_multiplier: 1.5,
                peak_day_multiplier: 2.5,
                max_probability: 0.98,
                report_base: 0.3,
                report_trust_slope: 0.4,
                brand_keywords: ["BANK", "PayPal", "Amazon", "HMRC", "DHL"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
            cost: CostModelConfig {
                tier_base_rates: [(Tier::Tier1, 0.0030), (Tier::Tier2, 0.0022), (Tier::Tier3, 0.0016)]
                    .into_iter()
                    .map(|(t, r)| (t.as_str().to_string(), r))
                    .collect(),
                rate_jitter: 0.15,
                hop_multipliers: [1.0, 1.15, 1.30],
                country_risk_multipliers: [("Nigeria", 1.6), ("Palestine", 1.4), ("Brazil", 1.25)]
                    .into_iter()
                    .map(|(c, m)| (c.to_string(), m))
                    .collect(),
                decimals: 5,
            },
        }
    }
}

impl GeneratorConfig {
    /// Load `generator.json` and the reference tables from `data_dir`.
    /// Missing files fall back to the built-in defaults.
    pub fn load(data_dir: &str) -> anyhow::Result<(Self, ReferenceTables)> {
        let config_path = format!("{data_dir}/generator.json");
        let config = match read_optional(&config_path)? {
            Some(content) => serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Cannot parse {config_path}: {e}"))?,
            None => {
                log::info!("{config_path} not found, using built-in generator config");
                Self::default()
            }
        };

        let builtin = ReferenceTables::builtin();

        let agg_path = format!("{data_dir}/reference/aggregators.json");
        let aggregators = match read_optional(&agg_path)? {
            Some(content) => serde_json::from_str::<AggregatorsFile>(&content)?.aggregators,
            None => builtin.aggregators,
        };

        let cust_path = format!("{data_dir}/reference/customers.json");
        let customers = match read_optional(&cust_path)? {
            Some(content) => serde_json::from_str::<CustomersFile>(&content)?.customers,
            None => builtin.customers,
        };

        let err_path = format!("{data_dir}/reference/error_codes.json");
        let error_codes = match read_optional(&err_path)? {
            Some(content) => serde_json::from_str::<ErrorCodesFile>(&content)?.error_codes,
            None => builtin.error_codes,
        };

        let rules_path = format!("{data_dir}/reference/pattern_rules.json");
        let pattern_rules = match read_optional(&rules_path)? {
            Some(content) => serde_json::from_str::<PatternRulesFile>(&content)?.rules,
            None => builtin.pattern_rules,
        };

        Ok((
            config,
            ReferenceTables {
                aggregators,
                customers,
                error_codes,
                pattern_rules,
            },
        ))
    }

    /// Small, fast configuration for tests.
    pub fn default_test() -> Self {
        Self {
            seed: 42,
            message_count: 1_000,
            start: midnight(2024, 12, 10),
            end: midnight(2025, 1, 9),
            ..Self::default()
        }
    }

    /// Fail fast on anything the generator cannot honor.
    pub fn validate(&self, tables: &ReferenceTables) -> GenResult<()> {
        if self.start >= self.end {
            return Err(GenError::config(format!(
                "start {} must be before end {}",
                self.start, self.end
            )));
        }
        self.calendar.validate()?;
        self.jitter.validate()?;
        tables.validate()?;

        if !(self.popularity.pareto_alpha > 0.0 && self.popularity.max_weight >= 1.0) {
            return Err(GenError::config("popularity parameters out of range"));
        }
        if self.countries.is_empty() {
            return Err(GenError::config("destination country pool is empty"));
        }
        for c in &self.countries {
            if c.min_weight > c.max_weight {
                return Err(GenError::config(format!(
                    "country {} weight range {}..={} is inverted",
                    c.country, c.min_weight, c.max_weight
                )));
            }
        }
        if self.countries.iter().all(|c| c.max_weight == 0) {
            return Err(GenError::config("destination country weights are all zero"));
        }
        if self.content.surge_multiplier < 0.0 {
            return Err(GenError::config("surge multiplier must be non-negative"));
        }
        if let Some(id) = &self.content.surge_customer {
            tables.customer(id)?;
        }

        let no_error = tables.error_code(&self.errors.no_error_code)?;
        if no_error.is_regex_flag {
            return Err(GenError::config("the no-error code cannot carry the regex flag"));
        }
        for code in self.errors.clean.keys().chain(self.errors.matched.keys()) {
            tables.error_code(code)?;
        }

        for agg in &tables.aggregators {
            if !self.cost.tier_base_rates.contains_key(agg.tier.as_str()) {
                return Err(GenError::config(format!(
                    "no base rate for tier {} (aggregator {})",
                    agg.tier, agg.aggregator_id
                )));
            }
        }
        if self.cost.hop_multipliers.iter().any(|m| *m <= 0.0)
            || self.cost.tier_base_rates.values().any(|r| *r <= 0.0)
            || !(0.0..1.0).contains(&self.cost.rate_jitter)
        {
            return Err(GenError::config("cost model rates must be positive"));
        }
        if !(0.0..=1.0).contains(&self.fraud.max_probability) {
            return Err(GenError::config("fraud max probability outside [0, 1]"));
        }
        Ok(())
    }
}

fn read_optional(path: &str) -> anyhow::Result<Option<String>> {
    if !Path::new(path).exists() {
        return Ok(None);
    }
    let content =
        std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    Ok(Some(content))
}

pub fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

fn country(name: &str, min_weight: u64, max_weight: u64) -> CountryWeight {
    CountryWeight {
        country: name.into(),
        min_weight,
        max_weight,
    }
}

fn weights(pairs: &[(&str, f64)]) -> BTreeMap<RefId, f64> {
    pairs.iter().map(|(k, w)| (k.to_string(), *w)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates_against_builtin_tables() {
        let tables = ReferenceTables::builtin();
        GeneratorConfig::default().validate(&tables).unwrap();
        GeneratorConfig::default_test().validate(&tables).unwrap();
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = GeneratorConfig::default_test();
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        let back: GeneratorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.seed, cfg.seed);
        assert_eq!((back.start, back.end), (cfg.start, cfg.end));
        assert_eq!(back.countries, cfg.countries);
        assert_eq!(back.match_policy, cfg.match_policy);
        assert_eq!(back.errors.no_error_code, cfg.errors.no_error_code);
        back.validate(&ReferenceTables::builtin()).unwrap();
    }

    #[test]
    fn load_falls_back_to_builtins_for_missing_dir() {
        let (cfg, tables) = GeneratorConfig::load("/nonexistent/msgfraud-data").unwrap();
        assert_eq!(cfg, GeneratorConfig::default());
        assert_eq!(tables, ReferenceTables::builtin());
    }
}
