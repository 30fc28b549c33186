//! Routing and cost for one message.
//!
//! cost = tier base rate (jittered) × country risk × hop multiplier,
//! rounded to the configured number of decimals.

use crate::{
    config::CostModelConfig,
    error::{GenError, GenResult},
    reference::Aggregator,
    rng::StreamRng,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub hops: u8,
    pub description: String,
    pub direct: bool,
}

pub fn route(aggregator: &Aggregator, country: &str, rng: &mut StreamRng) -> Route {
    let hops = rng.range_inclusive(1, 3) as u8;
    let mut description = aggregator.aggregator_name.clone();
    for k in 1..hops {
        description.push_str(&format!(" -> Transit {k}"));
    }
    description.push_str(&format!(" -> {country} Gateway"));
    Route {
        hops,
        description,
        direct: hops == 1,
    }
}

pub fn country_multiplier(cfg: &CostModelConfig, country: &str) -> f64 {
    cfg.country_risk_multipliers.get(country).copied().unwrap_or(1.0)
}

pub fn hop_multiplier(cfg: &CostModelConfig, hops: u8) -> f64 {
    let idx = (hops.clamp(1, 3) - 1) as usize;
    cfg.hop_multipliers[idx]
}

pub fn message_cost(
    cfg: &CostModelConfig,
    aggregator: &Aggregator,
    country: &str,
    hops: u8,
    rng: &mut StreamRng,
) -> GenResult<f64> {
    let base = cfg
        .tier_base_rates
        .get(aggregator.tier.as_str())
        .copied()
        .ok_or_else(|| GenError::config(format!("no base rate for tier {}", aggregator.tier)))?;
    let jitter = rng.uniform(1.0 - cfg.rate_jitter, 1.0 + cfg.rate_jitter);
    let raw = base * jitter * country_multiplier(cfg, country) * hop_multiplier(cfg, hops);
    Ok(round_to(raw, cfg.decimals))
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::GeneratorConfig, reference::ReferenceTables};

    #[test]
    fn route_text_lists_transit_hops() {
        let agg = ReferenceTables::builtin().aggregators[0].clone();
        let mut rng = StreamRng::new(4, 6);
        for _ in 0..30 {
            let r = route(&agg, "Japan", &mut rng);
            assert!((1..=3).contains(&r.hops));
            assert_eq!(r.direct, r.hops == 1);
            assert!(r.description.starts_with("JPN_Agg1 -> "));
            assert!(r.description.ends_with("Japan Gateway"));
            assert_eq!(r.description.matches("Transit").count(), (r.hops - 1) as usize);
        }
    }

    #[test]
    fn high_risk_countries_cost_more() {
        let cfg = GeneratorConfig::default().cost;
        let agg = ReferenceTables::builtin().aggregators[0].clone();
        let mut rng = StreamRng::new(4, 6);
        let avg = |country: &str, rng: &mut StreamRng| -> f64 {
            (0..500)
                .map(|_| message_cost(&cfg, &agg, country, 1, rng).unwrap())
                .sum::<f64>()
                / 500.0
        };
        let uk = avg("United Kingdom", &mut rng);
        let ng = avg("Nigeria", &mut rng);
        assert!(ng > uk * 1.3, "uk {uk} ng {ng}");
    }

    #[test]
    fn costs_are_positive_and_rounded() {
        let cfg = GeneratorConfig::default().cost;
        let agg = ReferenceTables::builtin().aggregators[2].clone();
        let mut rng = StreamRng::new(8, 6);
        for hops in 1..=3 {
            let c = message_cost(&cfg, &agg, "USA", hops, &mut rng).unwrap();
            assert!(c > 0.0);
            assert_eq!(c, round_to(c, 5));
        }
    }
}
