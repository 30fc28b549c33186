//! Daily report pipeline over generated and hand-built tables.

use chrono::{Duration, NaiveDate};
use msgfraud_core::{
    config::GeneratorConfig,
    generate,
    record::Channel,
    reference::ReferenceTables,
    report::{
        self,
        delivery::{MailTransport, OutboxTransport, TemplateSummaryWriter},
        email::{EmailOptions, Envelope, ReportEmail},
        metrics::{DailyMetrics, DayIndex, JoinedRow},
        ReportSettings,
    },
    snapshot, GenError, GenResult,
};
use std::path::PathBuf;

/// Keeps every e-mail in memory.
#[derive(Default)]
struct RecordingTransport {
    sent: Vec<(Envelope, ReportEmail)>,
}

impl MailTransport for RecordingTransport {
    fn send(&mut self, envelope: &Envelope, email: &ReportEmail) -> GenResult<()> {
        self.sent.push((envelope.clone(), email.clone()));
        Ok(())
    }
}

fn settings(from: NaiveDate, to: NaiveDate) -> ReportSettings {
    ReportSettings {
        from,
        to,
        envelope: Envelope {
            from: "reports@test".into(),
            to: vec!["analyst@test".into()],
        },
        email: EmailOptions::default(),
        archive_path: None,
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("msgfraud-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn row(date: NaiveDate, fraud: bool) -> JoinedRow {
    JoinedRow {
        date,
        is_fraud: fraud,
        destination_country: "Nigeria".into(),
        aggregator_id: "AGG4".into(),
        channel: Channel::Sms,
        cost_gbp: 0.004,
    }
}

#[test]
fn one_email_per_day_in_window() {
    let _ = env_logger::builder().is_test(true).try_init();
    let ds = generate(GeneratorConfig::default_test(), ReferenceTables::builtin()).expect("generation");
    let index = report::index_tables(&ds.messages, &ds.billing);
    let first = index.first_day().expect("has days");
    let to = first + Duration::days(6);

    let mut transport = RecordingTransport::default();
    let reports = report::run_daily_reports(
        &index,
        &settings(first, to),
        &mut TemplateSummaryWriter,
        &mut transport,
    )
    .expect("reports");

    assert_eq!(reports.len(), 7);
    assert_eq!(transport.sent.len(), 7);
    for (i, (envelope, email)) in transport.sent.iter().enumerate() {
        assert_eq!(email.day, first + Duration::days(i as i64));
        assert_eq!(envelope.to, vec!["analyst@test".to_string()]);
        assert!(email.subject.starts_with("Fraud Analyst Daily Report"));
        assert!(email.html.contains("Fraud Summary:"));
        assert!(!email.summary.ends_with("<br>"));
    }
}

#[test]
fn zero_prior_fraud_gives_finite_change() {
    let d1 = NaiveDate::from_ymd_opt(2024, 12, 20).unwrap();
    let d2 = d1 + Duration::days(1);
    let index = DayIndex::new(vec![row(d1, false), row(d2, true), row(d2, true)]);

    let m = DailyMetrics::compute(&index, d2);
    assert_eq!(m.yesterday.fraud, 0);
    assert!(m.day_over_day.fraud.is_finite());
    assert_eq!(m.day_over_day.fraud, 200.0);
    assert!(m.week_over_week.fraud.is_finite());
}

#[test]
fn inverted_report_window_sends_nothing() {
    let d = NaiveDate::from_ymd_opt(2024, 12, 20).unwrap();
    let index = DayIndex::new(vec![row(d, true)]);
    let mut transport = RecordingTransport::default();

    let err = report::run_daily_reports(
        &index,
        &settings(d, d - Duration::days(1)),
        &mut TemplateSummaryWriter,
        &mut transport,
    )
    .unwrap_err();
    assert!(matches!(err, GenError::Config(_)), "{err}");
    assert!(transport.sent.is_empty());
}

#[test]
fn days_without_traffic_still_get_a_report() {
    let d = NaiveDate::from_ymd_opt(2024, 12, 20).unwrap();
    let index = DayIndex::new(vec![row(d, true)]);
    let mut transport = RecordingTransport::default();

    let reports = report::run_daily_reports(
        &index,
        &settings(d, d + Duration::days(2)),
        &mut TemplateSummaryWriter,
        &mut transport,
    )
    .expect("reports");
    assert_eq!(reports.len(), 3);
    assert!(reports[2].summary.contains("No fraudulent traffic"));
}

#[test]
fn exported_tables_feed_the_report() {
    let config = GeneratorConfig {
        message_count: 300,
        ..GeneratorConfig::default_test()
    };
    let ds = generate(config, ReferenceTables::builtin()).expect("generation");
    let dir = scratch_dir("export");

    let paths = snapshot::export_dataset(&ds, &dir).expect("export");
    assert_eq!(paths.len(), 5);
    assert!(paths.iter().all(|p| p.exists()));

    let (messages, billing) = snapshot::import_tables(&dir).expect("import");
    assert_eq!(messages, ds.messages);
    assert_eq!(billing, ds.billing);

    let index = report::index_tables(&messages, &billing);
    let day = index.first_day().expect("has days");
    let outbox = dir.join("outbox");
    let archive = dir.join("email_summaries.txt");
    let mut transport = OutboxTransport::new(&outbox).expect("outbox");
    let run_settings = ReportSettings {
        archive_path: Some(archive.clone()),
        ..settings(day, day + Duration::days(1))
    };

    report::run_daily_reports(&index, &run_settings, &mut TemplateSummaryWriter, &mut transport)
        .expect("reports");
    assert_eq!(transport.sent().len(), 2);

    let archived = std::fs::read_to_string(&archive).expect("archive");
    assert_eq!(archived.matches("Fraud Summary ---").count(), 2);

    let _ = std::fs::remove_dir_all(&dir);
}
