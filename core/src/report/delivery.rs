//! Collaborator seams: who writes the summary, who carries the mail.
//!
//! Network-backed implementations live outside this crate. The ones
//! here run offline: a template writer and a file outbox.

use super::{
    email::{Envelope, ReportEmail},
    metrics::{round2, DailyMetrics},
    prompt::SECTIONS,
};
use crate::error::GenResult;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Turns a prompt (and the metrics behind it) into summary markup.
pub trait SummaryWriter {
    fn name(&self) -> &'static str;

    fn write_summary(&mut self, prompt: &str, metrics: &DailyMetrics) -> GenResult<String>;
}

/// Delivers a finished report.
pub trait MailTransport {
    fn send(&mut self, envelope: &Envelope, email: &ReportEmail) -> GenResult<()>;
}

/// Deterministic summary built straight from the metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateSummaryWriter;

impl SummaryWriter for TemplateSummaryWriter {
    fn name(&self) -> &'static str {
        "template"
    }

    fn write_summary(&mut self, _prompt: &str, m: &DailyMetrics) -> GenResult<String> {
        let [countries, aggregators, channels] = SECTIONS;

        let country_lines = match m.fraud_by_country.as_slice() {
            [] => vec!["- No fraudulent traffic was recorded for any destination.".to_string()],
            [(top, n), rest @ ..] => {
                let mut lines = vec![format!("- {top} led fraud with {n} flagged messages.")];
                if let Some((second, k)) = rest.first() {
                    lines.push(format!("- {second} followed with {k} cases."));
                }
                lines
            }
        };
        let cost_line = m
            .cost_by_country
            .first()
            .map(|(c, cost)| format!("- {c} carried the highest routing cost at {cost:.4} GBP."));

        let agg_lines = vec![
            match m.most_flagged_aggregator() {
                Some((agg, n)) => format!("- {agg} was the most flagged aggregator with {n} cases."),
                None => "- No aggregator carried flagged traffic.".to_string(),
            },
            format!(
                "- Fraud moved {}% day on day and {}% week on week.",
                round2(m.day_over_day.fraud),
                round2(m.week_over_week.fraud)
            ),
        ];

        let channel_lines = vec![
            match m.top_channel() {
                Some(ch) => format!("- {ch} was the main fraud channel ({}).", m.channel_summary()),
                None => "- No channel carried fraud today.".to_string(),
            },
            format!(
                "- Message volume changed {}% versus yesterday.",
                round2(m.day_over_day.volume)
            ),
        ];

        let mut country_block = country_lines;
        country_block.extend(cost_line);
        country_block.truncate(2);

        let section = |title: &str, lines: &[String]| format!("<b>{title}</b><br>{}", lines.join("<br>"));
        Ok([
            section(countries, country_block.as_slice()),
            section(aggregators, agg_lines.as_slice()),
            section(channels, channel_lines.as_slice()),
        ]
        .join("<br><br>"))
    }
}

/// Writes each report as an `.html` file under `dir`.
#[derive(Debug, Clone)]
pub struct OutboxTransport {
    dir: PathBuf,
    sent: Vec<PathBuf>,
}

impl OutboxTransport {
    pub fn new(dir: impl Into<PathBuf>) -> GenResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            sent: Vec::new(),
        })
    }

    pub fn sent(&self) -> &[PathBuf] {
        &self.sent
    }
}

impl MailTransport for OutboxTransport {
    fn send(&mut self, envelope: &Envelope, email: &ReportEmail) -> GenResult<()> {
        let path = self.dir.join(format!("report-{}.html", email.day.format("%Y-%m-%d")));
        let mut file = fs::File::create(&path)?;
        writeln!(file, "<!-- From: {} -->", envelope.from)?;
        writeln!(file, "<!-- To: {} -->", envelope.to.join(", "))?;
        writeln!(file, "<!-- Subject: {} -->", email.subject)?;
        file.write_all(email.html.as_bytes())?;
        log::info!("Report for {} written to {}", email.day, path.display());
        self.sent.push(path);
        Ok(())
    }
}

/// Append a summary to the running archive file.
pub fn append_archive(path: &Path, email: &ReportEmail) -> GenResult<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(
        file,
        "--- {} Fraud Summary ---\n{}\n",
        super::prompt::display_date(email.day),
        email.summary
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{markup::normalize_markup, metrics::DayIndex};
    use chrono::NaiveDate;

    #[test]
    fn template_summary_is_already_normalized() {
        let day = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        let m = DailyMetrics::compute(&DayIndex::default(), day);
        let summary = TemplateSummaryWriter.write_summary("", &m).unwrap();
        assert_eq!(normalize_markup(&summary), summary);
        for title in SECTIONS {
            assert!(summary.contains(&format!("<b>{title}</b><br>- ")));
        }
    }
}
