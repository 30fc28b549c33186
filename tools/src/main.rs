//! msgsim: headless generator and daily report runner.
//!
//! Usage:
//!   msgsim generate --seed 42 --count 200000 --start 2024-11-15 --end 2025-01-15 --out synthetic_data
//!   msgsim report --input synthetic_data --from 2024-12-15 --to 2025-01-15 --outbox outbox

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use msgfraud_core::{
    config::GeneratorConfig,
    report::{
        self,
        delivery::{OutboxTransport, TemplateSummaryWriter},
        email::{EmailOptions, Envelope},
        ReportSettings,
    },
    simulator::EventSimulator,
    snapshot,
};
use std::env;
use std::path::{Path, PathBuf};

#[derive(serde::Serialize)]
struct ReportRunSummary {
    reports: usize,
    first_day: Option<NaiveDate>,
    last_day: Option<NaiveDate>,
    outbox: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("generate") => run_generate(&args),
        Some("report") => run_report(&args),
        _ => {
            eprintln!("usage: msgsim <generate|report> [options]");
            bail!("missing or unknown command")
        }
    }
}

fn run_generate(args: &[String]) -> Result<()> {
    let data_dir = string_arg(args, "--data-dir").unwrap_or_else(|| "./data".to_string());
    let out = PathBuf::from(string_arg(args, "--out").unwrap_or_else(|| "synthetic_data".into()));

    let (mut config, tables) = GeneratorConfig::load(&data_dir)?;
    log::info!(
        "Loaded {} aggregators, {} customers, {} error codes from {data_dir}",
        tables.aggregators.len(),
        tables.customers.len(),
        tables.error_codes.len()
    );
    if let Some(seed) = parse_arg(args, "--seed")? {
        config.seed = seed;
    }
    if let Some(count) = parse_arg(args, "--count")? {
        config.message_count = count;
    }
    if let Some(start) = date_arg(args, "--start")? {
        config.start = start.and_hms_opt(0, 0, 0).unwrap_or(config.start);
    }
    if let Some(end) = date_arg(args, "--end")? {
        config.end = end.and_hms_opt(0, 0, 0).unwrap_or(config.end);
    }

    println!("msgsim generate");
    println!("  seed:      {}", config.seed);
    println!("  count:     {}", config.message_count);
    println!("  window:    {} .. {}", config.start, config.end);
    println!("  data_dir:  {data_dir}");
    println!("  out:       {}", out.display());
    println!();

    let simulator = EventSimulator::new(config, tables).context("invalid generator configuration")?;
    let dataset = simulator.generate()?;
    let written = snapshot::export_dataset(&dataset, &out)?;
    for path in &written {
        log::debug!("wrote {}", path.display());
    }

    println!("=== RUN SUMMARY ===");
    println!("{}", serde_json::to_string_pretty(&dataset.summary())?);
    Ok(())
}

fn run_report(args: &[String]) -> Result<()> {
    let input = PathBuf::from(string_arg(args, "--input").unwrap_or_else(|| "synthetic_data".into()));
    let outbox = PathBuf::from(string_arg(args, "--outbox").unwrap_or_else(|| "outbox".into()));

    let (messages, billing) = snapshot::import_tables(&input)
        .with_context(|| format!("cannot read tables from {}", input.display()))?;
    log::info!(
        "Read {} messages and {} billing rows from {}",
        messages.len(),
        billing.len(),
        input.display()
    );
    let index = report::index_tables(&messages, &billing);

    let (Some(first), Some(last)) = (index.first_day(), index.last_day()) else {
        bail!("no messages found in {}", input.display());
    };
    let from = date_arg(args, "--from")?.unwrap_or(first);
    let to = date_arg(args, "--to")?.unwrap_or(last);

    let settings = ReportSettings {
        from,
        to,
        envelope: Envelope {
            from: string_arg(args, "--sender").unwrap_or_else(|| "fraud-reports@localhost".into()),
            to: vec![string_arg(args, "--recipient").unwrap_or_else(|| "analyst@localhost".into())],
        },
        email: EmailOptions {
            dashboard_url: string_arg(args, "--dashboard"),
            feedback_url: string_arg(args, "--feedback"),
        },
        archive_path: Some(archive_path(&outbox)),
    };

    let mut writer = TemplateSummaryWriter;
    let mut transport = OutboxTransport::new(&outbox)?;
    let reports = report::run_daily_reports(&index, &settings, &mut writer, &mut transport)?;

    let summary = ReportRunSummary {
        reports: reports.len(),
        first_day: reports.first().map(|r| r.day),
        last_day: reports.last().map(|r| r.day),
        outbox,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn archive_path(outbox: &Path) -> PathBuf {
    outbox.join("email_summaries.txt")
}

fn string_arg(args: &[String], flag: &str) -> Option<String> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].clone())
}

fn parse_arg<T>(args: &[String], flag: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    string_arg(args, flag)
        .map(|s| {
            s.parse::<T>()
                .map_err(|e| anyhow::anyhow!("{flag} got invalid value {s}: {e}"))
        })
        .transpose()
}

fn date_arg(args: &[String], flag: &str) -> Result<Option<NaiveDate>> {
    string_arg(args, flag)
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .with_context(|| format!("{flag} expects YYYY-MM-DD, got {s}"))
        })
        .transpose()
}
