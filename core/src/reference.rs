//! Static reference tables: aggregators, customers, error codes and
//! content pattern rules. Loaded once per run and never mutated.

use crate::{
    error::{GenError, GenResult},
    pattern_rules::PatternRule,
    types::RefId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Tier {
    #[serde(rename = "tier-1")]
    Tier1,
    #[serde(rename = "tier-2")]
    Tier2,
    #[serde(rename = "tier-3")]
    Tier3,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tier1 => "tier-1",
            Self::Tier2 => "tier-2",
            Self::Tier3 => "tier-3",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Aggregator {
    pub aggregator_id: RefId,
    pub aggregator_name: String,
    pub country: String,
    pub tier: Tier,
    pub trust_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub customer_id: RefId,
    pub customer_name: String,
    pub vertical: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorCode {
    pub error_code: RefId,
    pub description: String,
    pub is_regex_flag: bool,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceTables {
    pub aggregators: Vec<Aggregator>,
    pub customers: Vec<Customer>,
    pub error_codes: Vec<ErrorCode>,
    pub pattern_rules: Vec<PatternRule>,
}

impl ReferenceTables {
    /// Built-in tables used when no reference files are supplied.
    pub fn builtin() -> Self {
        Self {
            aggregators: vec![
                aggregator("AGG1", "JPN_Agg1", "Japan", Tier::Tier1, 0.95),
                aggregator("AGG2", "UK_Agg1", "United Kingdom", Tier::Tier1, 0.90),
                aggregator("AGG3", "IMImobile", "United Kingdom", Tier::Tier2, 0.98),
                aggregator("AGG4", "LatAm_Route", "Brazil", Tier::Tier3, 0.72),
            ],
            customers: vec![
                customer("C1", "Webex Connect", "SaaS", "United Kingdom"),
                customer("C2", "RetailX", "Retail", "France"),
                customer("C3", "HealthPro", "Healthcare", "Germany"),
                customer("C4", "QuickBank", "Finance", "United Kingdom"),
                customer("C5", "ParcelGo", "Logistics", "India"),
            ],
            error_codes: vec![
                error_code("E100", "Temporary failure", false, Severity::Low),
                error_code("E403", "Regex content spam", true, Severity::High),
                error_code("E500", "Blocked by aggregator", false, Severity::Medium),
                error_code("E0", "No error", false, Severity::Low),
            ],
            pattern_rules: PatternRule::builtin(),
        }
    }

    /// Fail fast on tables the generator cannot sample from.
    pub fn validate(&self) -> GenResult<()> {
        if self.aggregators.is_empty() {
            return Err(GenError::config("aggregator table is empty"));
        }
        if self.customers.is_empty() {
            return Err(GenError::config("customer table is empty"));
        }
        if self.error_codes.is_empty() {
            return Err(GenError::config("error code table is empty"));
        }
        if self.pattern_rules.is_empty() {
            return Err(GenError::config("pattern rule table is empty"));
        }
        ensure_unique("aggregator", self.aggregators.iter().map(|a| &a.aggregator_id))?;
        ensure_unique("customer", self.customers.iter().map(|c| &c.customer_id))?;
        ensure_unique("error code", self.error_codes.iter().map(|e| &e.error_code))?;
        for agg in &self.aggregators {
            if !(0.0..=1.0).contains(&agg.trust_score) {
                return Err(GenError::config(format!(
                    "aggregator {} trust score {} outside [0, 1]",
                    agg.aggregator_id, agg.trust_score
                )));
            }
        }
        Ok(())
    }

    pub fn error_code(&self, code: &str) -> GenResult<&ErrorCode> {
        self.error_codes
            .iter()
            .find(|e| e.error_code == code)
            .ok_or_else(|| GenError::UnknownReference {
                table: "error code",
                id: code.to_string(),
            })
    }

    pub fn customer(&self, id: &str) -> GenResult<&Customer> {
        self.customers
            .iter()
            .find(|c| c.customer_id == id)
            .ok_or_else(|| GenError::UnknownReference {
                table: "customer",
                id: id.to_string(),
            })
    }

    pub fn aggregator(&self, id: &str) -> GenResult<&Aggregator> {
        self.aggregators
            .iter()
            .find(|a| a.aggregator_id == id)
            .ok_or_else(|| GenError::UnknownReference {
                table: "aggregator",
                id: id.to_string(),
            })
    }
}

fn ensure_unique<'a>(table: &str, ids: impl Iterator<Item = &'a RefId>) -> GenResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(GenError::config(format!("duplicate {table} id '{id}'")));
        }
    }
    Ok(())
}

fn aggregator(id: &str, name: &str, country: &str, tier: Tier, trust: f64) -> Aggregator {
    Aggregator {
        aggregator_id: id.into(),
        aggregator_name: name.into(),
        country: country.into(),
        tier,
        trust_score: trust,
    }
}

fn customer(id: &str, name: &str, vertical: &str, country: &str) -> Customer {
    Customer {
        customer_id: id.into(),
        customer_name: name.into(),
        vertical: vertical.into(),
        country: country.into(),
    }
}

fn error_code(code: &str, description: &str, regex_flag: bool, severity: Severity) -> ErrorCode {
    ErrorCode {
        error_code: code.into(),
        description: description.into(),
        is_regex_flag: regex_flag,
        severity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_validate() {
        ReferenceTables::builtin().validate().unwrap();
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut tables = ReferenceTables::builtin();
        let dup = tables.customers[0].clone();
        tables.customers.push(dup);
        assert!(matches!(tables.validate(), Err(GenError::Config(_))));
    }

    #[test]
    fn tier_serializes_with_dash() {
        let json = serde_json::to_string(&Tier::Tier2).unwrap();
        assert_eq!(json, "\"tier-2\"");
    }
}
