//! The event simulator: produces message and billing records.
//!
//! PER-RECORD ORDER (fixed; reordering changes output):
//!   1. Advance the time cursor (timing stream)
//!   2. Customer and aggregator (traffic stream)
//!   3. Destination country (traffic stream)
//!   4. Channel (traffic stream)
//!   5. Content classification and text (content stream)
//!   6. Pattern screening (screening stream)
//!   7. Error code, delivery status, fraud label (outcome stream)
//!   8. Route and cost (billing stream)
//!   9. Identifiers, sender and mobile number (identity stream)
//!
//! RULES:
//!   - All randomness flows through the RngBank.
//!   - The cursor is carried between records, never stored globally.
//!   - Configuration is validated before the first record is drawn.

use crate::{
    billing_model,
    calendar::{Proximity, TimeCursor},
    config::GeneratorConfig,
    content_generator::ContentGenerator,
    error::GenResult,
    fraud_model::{self, FraudSignals},
    pattern_rules,
    record::{BillingRecord, Channel, ContentKind, DeliveryStatus, MessageRecord},
    reference::ReferenceTables,
    rng::{RngBank, StreamRng, StreamSlot},
    weighted::{pick_index, Categorical},
};
use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Builder;

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub messages: Vec<MessageRecord>,
    pub billing: Vec<BillingRecord>,
    pub tables: ReferenceTables,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenerationSummary {
    pub messages: usize,
    pub fraud: usize,
    pub reported_by_aggregator: usize,
    pub failed: usize,
    pub pattern_hits: usize,
    pub total_cost_gbp: f64,
    pub first_timestamp: Option<NaiveDateTime>,
    pub last_timestamp: Option<NaiveDateTime>,
}

impl Dataset {
    pub fn summary(&self) -> GenerationSummary {
        GenerationSummary {
            messages: self.messages.len(),
            fraud: self.messages.iter().filter(|m| m.is_fraud).count(),
            reported_by_aggregator: self.billing.iter().filter(|b| b.fraud_reported_by_agg).count(),
            failed: self
                .messages
                .iter()
                .filter(|m| m.delivery_status == DeliveryStatus::Failed)
                .count(),
            pattern_hits: self
                .messages
                .iter()
                .filter(|m| m.regex_pattern_match.is_some())
                .count(),
            total_cost_gbp: billing_model::round_to(
                self.billing.iter().map(|b| b.total_cost_gbp).sum(),
                5,
            ),
            first_timestamp: self.messages.first().map(|m| m.timestamp),
            last_timestamp: self.messages.last().map(|m| m.timestamp),
        }
    }
}

/// Per-run categorical pools, drawn once before the loop.
struct Pools {
    customers: Categorical<usize>,
    aggregators: Categorical<usize>,
    channels: Categorical<Channel>,
    content: Categorical<ContentKind>,
    surge_content: Categorical<ContentKind>,
    errors_clean: Categorical<usize>,
    errors_matched: Categorical<usize>,
}

struct Streams {
    timing: StreamRng,
    traffic: StreamRng,
    content: StreamRng,
    screening: StreamRng,
    outcome: StreamRng,
    billing: StreamRng,
    identity: StreamRng,
}

pub struct EventSimulator {
    config: GeneratorConfig,
    tables: ReferenceTables,
    rng_bank: RngBank,
}

impl EventSimulator {
    /// Validate and wire a simulator. Fails fast on bad configuration.
    pub fn new(config: GeneratorConfig, tables: ReferenceTables) -> GenResult<Self> {
        config.validate(&tables)?;
        let rng_bank = RngBank::new(config.seed);
        Ok(Self {
            config,
            tables,
            rng_bank,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Run the whole generation loop.
    pub fn generate(&self) -> GenResult<Dataset> {
        let count = self.config.message_count;
        log::info!(
            "Generating {count} messages from {} to {} (seed {})",
            self.config.start,
            self.config.end,
            self.rng_bank.master_seed()
        );

        let pools = self.build_pools()?;
        let mut streams = Streams {
            timing: self.rng_bank.for_stream(StreamSlot::Timing),
            traffic: self.rng_bank.for_stream(StreamSlot::Traffic),
            content: self.rng_bank.for_stream(StreamSlot::Content),
            screening: self.rng_bank.for_stream(StreamSlot::Screening),
            outcome: self.rng_bank.for_stream(StreamSlot::Outcome),
            billing: self.rng_bank.for_stream(StreamSlot::Billing),
            identity: self.rng_bank.for_stream(StreamSlot::Identity),
        };

        let capacity = usize::try_from(count).unwrap_or(0);
        let mut messages = Vec::with_capacity(capacity);
        let mut billing = Vec::with_capacity(capacity);
        let mut country_weights = Vec::with_capacity(self.config.countries.len());

        let start = TimeCursor::new(self.config.start, self.config.end, count);
        (0..count).try_fold(start, |cursor, _| -> GenResult<TimeCursor> {
            let (timestamp, proximity, next) =
                cursor.step(&self.config.calendar, &self.config.jitter, &mut streams.timing);
            let (message, bill) =
                self.draw_record(timestamp, proximity, &pools, &mut streams, &mut country_weights)?;
            messages.push(message);
            billing.push(bill);
            Ok(next)
        })?;

        let dataset = Dataset {
            messages,
            billing,
            tables: self.tables.clone(),
        };
        let summary = dataset.summary();
        log::info!(
            "Generated {} messages: {} fraud, {} failed, {:.2} GBP",
            summary.messages,
            summary.fraud,
            summary.failed,
            summary.total_cost_gbp
        );
        Ok(dataset)
    }

    fn build_pools(&self) -> GenResult<Pools> {
        let mut rng = self.rng_bank.for_stream(StreamSlot::Weights);
        let pop = &self.config.popularity;

        let mut long_tail = |n: usize| -> Vec<(usize, f64)> {
            (0..n)
                .map(|i| (i, rng.pareto(1.0, pop.pareto_alpha).min(pop.max_weight)))
                .collect()
        };
        let customers = Categorical::new(long_tail(self.tables.customers.len()))?;
        let aggregators = Categorical::new(long_tail(self.tables.aggregators.len()))?;
        for ((idx, w), c) in customers.entries().iter().zip(&self.tables.customers) {
            log::debug!("customer weight {idx} {} = {w:.3}", c.customer_id);
        }

        let channels = Categorical::new(self.config.channels.clone())?;

        let mix = &self.config.content;
        let content = Categorical::new(
            [ContentKind::Normal, ContentKind::Otp, ContentKind::Spam]
                .into_iter()
                .map(|k| (k, mix.weight(k)))
                .collect(),
        )?;
        let surge_content = content.reweighted(|k, w| match k {
            ContentKind::Normal => w,
            _ => w * mix.surge_multiplier,
        })?;

        let error_pool = |weights: &std::collections::BTreeMap<String, f64>| {
            Categorical::new(
                self.tables
                    .error_codes
                    .iter()
                    .enumerate()
                    .map(|(i, e)| (i, weights.get(&e.error_code).copied().unwrap_or(0.0)))
                    .collect(),
            )
        };
        let errors_clean = error_pool(&self.config.errors.clean)?;
        let errors_matched = error_pool(&self.config.errors.matched)?;

        Ok(Pools {
            customers,
            aggregators,
            channels,
            content,
            surge_content,
            errors_clean,
            errors_matched,
        })
    }

    fn draw_record(
        &self,
        timestamp: NaiveDateTime,
        proximity: Proximity,
        pools: &Pools,
        streams: &mut Streams,
        country_weights: &mut Vec<f64>,
    ) -> GenResult<(MessageRecord, BillingRecord)> {
        let cfg = &self.config;

        // Traffic shape.
        let customer = &self.tables.customers[*pools.customers.choose(&mut streams.traffic)];
        let aggregator = &self.tables.aggregators[*pools.aggregators.choose(&mut streams.traffic)];
        let destination = self.draw_country(&mut streams.traffic, country_weights);
        let channel = *pools.channels.choose(&mut streams.traffic);

        // Content.
        let surging = proximity.is_elevated()
            && cfg.content.surge_customer.as_deref() == Some(customer.customer_id.as_str());
        let content_pool = if surging {
            &pools.surge_content
        } else {
            &pools.content
        };
        let content_kind = *content_pool.choose(&mut streams.content);
        let text = ContentGenerator::message_text(content_kind, &mut streams.content);

        let pattern_hit = pattern_rules::screen(
            &self.tables.pattern_rules,
            &text,
            cfg.match_policy,
            &mut streams.screening,
        );

        // Outcome.
        let error_pool = if pattern_hit.is_some() {
            &pools.errors_matched
        } else {
            &pools.errors_clean
        };
        let error = &self.tables.error_codes[*error_pool.choose(&mut streams.outcome)];
        let delivery_status = if error.error_code == cfg.errors.no_error_code {
            DeliveryStatus::Delivered
        } else {
            DeliveryStatus::Failed
        };
        let signals = FraudSignals {
            content: content_kind,
            text: &text,
            pattern_matched: pattern_hit.is_some(),
            regex_flagged_error: error.is_regex_flag,
            proximity,
        };
        let is_fraud = fraud_model::decide_fraud(&cfg.fraud, &signals, &mut streams.outcome);
        let fraud_type = fraud_model::fraud_type(&cfg.fraud, is_fraud, content_kind, &text);
        let reported = fraud_model::reported_by_aggregator(
            &cfg.fraud,
            is_fraud,
            aggregator.trust_score,
            &mut streams.outcome,
        );

        // Billing.
        let route = billing_model::route(aggregator, destination, &mut streams.billing);
        let cost = billing_model::message_cost(
            &cfg.cost,
            aggregator,
            destination,
            route.hops,
            &mut streams.billing,
        )?;

        // Identity.
        let message_id = Builder::from_random_bytes(streams.identity.next_bytes16())
            .into_uuid()
            .to_string();
        let sender_id = ContentGenerator::sender_id(&mut streams.identity);
        let mobile_number = ContentGenerator::mobile_number(destination, &mut streams.identity);

        let aggregator_error_code = match delivery_status {
            DeliveryStatus::Failed => Some(error.error_code.clone()),
            DeliveryStatus::Delivered => None,
        };

        let message = MessageRecord {
            message_id: message_id.clone(),
            customer_id: customer.customer_id.clone(),
            timestamp,
            mobile_number,
            destination_country: destination.to_string(),
            sender_id,
            message_content: text,
            regex_pattern_match: pattern_hit,
            error_code: error.error_code.clone(),
            delivery_status,
            is_fraud,
            fraud_type,
            channel_type: channel,
            content_type: content_kind,
        };
        let bill = BillingRecord {
            message_id,
            aggregator_id: aggregator.aggregator_id.clone(),
            route_hops: route.hops,
            hop_details: route.description,
            total_cost_gbp: cost,
            direct_route: route.direct,
            fraud_reported_by_agg: reported,
            aggregator_error_code,
        };
        Ok((message, bill))
    }

    /// Country weights are redrawn per record from their ranges, so
    /// neighbouring countries trade places from message to message.
    fn draw_country(&self, rng: &mut StreamRng, weights: &mut Vec<f64>) -> &str {
        let countries = &self.config.countries;
        weights.clear();
        weights.extend(
            countries
                .iter()
                .map(|c| rng.range_inclusive(c.min_weight, c.max_weight) as f64),
        );
        let total: f64 = weights.iter().sum();
        let idx = if total > 0.0 {
            pick_index(weights.iter().copied(), total, rng)
        } else {
            rng.next_u64_below(countries.len() as u64) as usize
        };
        &countries[idx].country
    }
}

/// Validate, then generate. Convenience wrapper over `EventSimulator`.
pub fn generate(config: GeneratorConfig, tables: ReferenceTables) -> GenResult<Dataset> {
    EventSimulator::new(config, tables)?.generate()
}
