//! Joined-table aggregation for the daily report.

use crate::{
    record::{BillingRecord, Channel, MessageRecord},
    types::{Country, RefId},
};
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap};

/// One message joined with its billing row, reduced to what the
/// report aggregates over.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub date: NaiveDate,
    pub is_fraud: bool,
    pub destination_country: Country,
    pub aggregator_id: RefId,
    pub channel: Channel,
    pub cost_gbp: f64,
}

/// Inner equi-join on message id, in message order.
pub fn join(messages: &[MessageRecord], billing: &[BillingRecord]) -> Vec<JoinedRow> {
    let by_id: HashMap<&str, &BillingRecord> =
        billing.iter().map(|b| (b.message_id.as_str(), b)).collect();
    let rows: Vec<JoinedRow> = messages
        .iter()
        .filter_map(|m| {
            by_id.get(m.message_id.as_str()).map(|b| JoinedRow {
                date: m.timestamp.date(),
                is_fraud: m.is_fraud,
                destination_country: m.destination_country.clone(),
                aggregator_id: b.aggregator_id.clone(),
                channel: m.channel_type,
                cost_gbp: b.total_cost_gbp,
            })
        })
        .collect();
    if rows.len() != messages.len() {
        log::warn!(
            "{} of {} messages had no billing row",
            messages.len() - rows.len(),
            messages.len()
        );
    }
    rows
}

/// Rows grouped by calendar day.
#[derive(Debug, Clone, Default)]
pub struct DayIndex {
    by_day: BTreeMap<NaiveDate, Vec<JoinedRow>>,
}

impl DayIndex {
    pub fn new(rows: Vec<JoinedRow>) -> Self {
        let mut by_day: BTreeMap<NaiveDate, Vec<JoinedRow>> = BTreeMap::new();
        for row in rows {
            by_day.entry(row.date).or_default().push(row);
        }
        Self { by_day }
    }

    pub fn day(&self, date: NaiveDate) -> &[JoinedRow] {
        self.by_day.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rows with `from <= date <= to`.
    pub fn range(&self, from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = &JoinedRow> + '_ {
        (from <= to)
            .then_some(from..=to)
            .into_iter()
            .flat_map(move |bounds| self.by_day.range(bounds))
            .flat_map(|(_, rows)| rows.iter())
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.by_day.keys().next().copied()
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.by_day.keys().next_back().copied()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodTotals {
    pub fraud: u64,
    pub volume: u64,
    pub cost_gbp: f64,
}

impl PeriodTotals {
    pub fn from_rows<'a>(rows: impl Iterator<Item = &'a JoinedRow>) -> Self {
        rows.fold(Self::default(), |mut acc, r| {
            acc.volume += 1;
            acc.fraud += u64::from(r.is_fraud);
            acc.cost_gbp += r.cost_gbp;
            acc
        })
    }
}

/// Percentage change with the denominator capped at 1, so an empty
/// previous period yields a finite number.
pub fn pct_change(current: f64, previous: f64) -> f64 {
    (current - previous) / previous.max(1.0) * 100.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deltas {
    pub fraud: f64,
    pub volume: f64,
    pub cost: f64,
}

impl Deltas {
    fn between(current: &PeriodTotals, previous: &PeriodTotals) -> Self {
        Self {
            fraud: pct_change(current.fraud as f64, previous.fraud as f64),
            volume: pct_change(current.volume as f64, previous.volume as f64),
            cost: pct_change(current.cost_gbp, previous.cost_gbp),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyMetrics {
    pub day: NaiveDate,
    pub today: PeriodTotals,
    pub yesterday: PeriodTotals,
    pub this_week: PeriodTotals,
    pub prev_week: PeriodTotals,
    pub day_over_day: Deltas,
    pub week_over_week: Deltas,
    /// Fraud counts, descending.
    pub fraud_by_country: Vec<(String, u64)>,
    pub fraud_by_aggregator: Vec<(String, u64)>,
    pub fraud_by_channel: Vec<(String, u64)>,
    /// Total cost, descending.
    pub cost_by_country: Vec<(String, f64)>,
    pub cost_by_aggregator: Vec<(String, f64)>,
}

impl DailyMetrics {
    pub fn compute(index: &DayIndex, day: NaiveDate) -> Self {
        let today_rows = index.day(day);
        let yesterday = day - Duration::days(1);

        let today = PeriodTotals::from_rows(today_rows.iter());
        let yesterday = PeriodTotals::from_rows(index.day(yesterday).iter());
        let this_week = PeriodTotals::from_rows(index.range(day - Duration::days(6), day));
        let prev_week = PeriodTotals::from_rows(
            index.range(day - Duration::days(13), day - Duration::days(7)),
        );

        let fraud_rows = || today_rows.iter().filter(|r| r.is_fraud);

        Self {
            day,
            day_over_day: Deltas::between(&today, &yesterday),
            week_over_week: Deltas::between(&this_week, &prev_week),
            today,
            yesterday,
            this_week,
            prev_week,
            fraud_by_country: count_by(fraud_rows(), |r| r.destination_country.clone()),
            fraud_by_aggregator: count_by(fraud_rows(), |r| r.aggregator_id.clone()),
            fraud_by_channel: count_by(fraud_rows(), |r| r.channel.to_string()),
            cost_by_country: sum_by(today_rows.iter(), |r| r.destination_country.clone()),
            cost_by_aggregator: sum_by(today_rows.iter(), |r| r.aggregator_id.clone()),
        }
    }

    /// Two countries with the most fraud today.
    pub fn top_fraud_countries(&self) -> Vec<&str> {
        self.fraud_by_country.iter().take(2).map(|(c, _)| c.as_str()).collect()
    }

    pub fn most_flagged_aggregator(&self) -> Option<(&str, u64)> {
        self.fraud_by_aggregator.first().map(|(a, n)| (a.as_str(), *n))
    }

    pub fn top_channel(&self) -> Option<&str> {
        self.fraud_by_channel.first().map(|(c, _)| c.as_str())
    }

    pub fn country_trend(&self) -> String {
        format!("Top countries: {:?}", self.top_fraud_countries())
    }

    pub fn aggregator_trend(&self) -> String {
        match self.most_flagged_aggregator() {
            Some((agg, n)) => format!("Most flagged aggregator: {agg} with {n} cases."),
            None => "No fraud cases.".to_string(),
        }
    }

    pub fn channel_summary(&self) -> String {
        self.fraud_by_channel
            .iter()
            .map(|(c, n)| format!("{c}: {n}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn count_by<'a>(
    rows: impl Iterator<Item = &'a JoinedRow>,
    key: impl Fn(&JoinedRow) -> String,
) -> Vec<(String, u64)> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for r in rows {
        *counts.entry(key(r)).or_default() += 1;
    }
    let mut ranked: Vec<(String, u64)> = counts.into_iter().collect();
    // Stable sort keeps key order for ties.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

fn sum_by<'a>(
    rows: impl Iterator<Item = &'a JoinedRow>,
    key: impl Fn(&JoinedRow) -> String,
) -> Vec<(String, f64)> {
    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    for r in rows {
        *sums.entry(key(r)).or_default() += r.cost_gbp;
    }
    let mut ranked: Vec<(String, f64)> = sums.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}
