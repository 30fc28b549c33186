//! Daily fraud report over the generated tables.
//!
//! For each day in the window:
//!   1. Aggregate the joined table (metrics)
//!   2. Render the analyst request (prompt)
//!   3. Ask the SummaryWriter for markup, then normalize it (markup)
//!   4. Assemble the HTML e-mail (email)
//!   5. Hand it to the MailTransport and append the archive (delivery)

pub mod delivery;
pub mod email;
pub mod markup;
pub mod metrics;
pub mod prompt;

use crate::{
    error::{GenError, GenResult},
    record::{BillingRecord, MessageRecord},
};
use chrono::{Duration, NaiveDate};
use delivery::{append_archive, MailTransport, SummaryWriter};
use email::{EmailOptions, Envelope, ReportEmail};
use metrics::{join, DailyMetrics, DayIndex};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub envelope: Envelope,
    pub email: EmailOptions,
    pub archive_path: Option<PathBuf>,
}

impl ReportSettings {
    pub fn validate(&self) -> GenResult<()> {
        if self.from > self.to {
            return Err(GenError::config(format!(
                "report window {} .. {} is inverted",
                self.from, self.to
            )));
        }
        if self.envelope.to.is_empty() {
            return Err(GenError::config("report has no recipients"));
        }
        Ok(())
    }
}

/// Build the day index straight from the two generated tables.
pub fn index_tables(messages: &[MessageRecord], billing: &[BillingRecord]) -> DayIndex {
    DayIndex::new(join(messages, billing))
}

/// Produce, deliver and archive one report per day in the window.
pub fn run_daily_reports(
    index: &DayIndex,
    settings: &ReportSettings,
    writer: &mut dyn SummaryWriter,
    transport: &mut dyn MailTransport,
) -> GenResult<Vec<ReportEmail>> {
    settings.validate()?;
    log::info!(
        "Daily reports {} .. {} using {} writer",
        settings.from,
        settings.to,
        writer.name()
    );

    let mut reports = Vec::new();
    let mut day = settings.from;
    while day <= settings.to {
        let metrics = DailyMetrics::compute(index, day);
        let request = prompt::build_prompt(&metrics);
        let raw = writer.write_summary(&request, &metrics)?;
        let summary = markup::normalize_markup(&raw);
        let email = ReportEmail::build(&metrics, &summary, &settings.email);

        transport.send(&settings.envelope, &email)?;
        if let Some(path) = &settings.archive_path {
            append_archive(path, &email)?;
        }
        log::debug!(
            "{}: fraud {} volume {} cost {:.4}",
            day,
            metrics.today.fraud,
            metrics.today.volume,
            metrics.today.cost_gbp
        );
        reports.push(email);
        day += Duration::days(1);
    }
    Ok(reports)
}
