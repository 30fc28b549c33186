//! Flat-file snapshots: generated tables to and from delimited text.
//!
//! RULE: only this module knows the on-disk column layout.
//! One header row, comma separated, RFC 4180 quoting. Absent optional
//! values are written as empty cells and read back as `None`.

use crate::{
    error::{GenError, GenResult},
    record::{BillingRecord, MessageRecord},
    reference::{Aggregator, Customer, ErrorCode, Severity, Tier},
    simulator::Dataset,
};
use chrono::NaiveDateTime;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const MESSAGES_FILE: &str = "messages.csv";
pub const BILLING_FILE: &str = "billing_metadata.csv";
pub const AGGREGATORS_FILE: &str = "aggregators.csv";
pub const CUSTOMERS_FILE: &str = "customers.csv";
pub const ERROR_CODES_FILE: &str = "error_codes.csv";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// A type with a fixed column layout.
pub trait CsvRow: Sized {
    const HEADER: &'static [&'static str];

    fn fields(&self) -> Vec<String>;

    fn from_fields(fields: &[String]) -> Result<Self, String>;
}

// ── Writing ────────────────────────────────────────────────────

pub fn write_table<W: Write, T: CsvRow>(out: &mut W, rows: &[T]) -> GenResult<()> {
    write_line(out, T::HEADER.iter().map(|h| h.to_string()))?;
    for row in rows {
        write_line(out, row.fields().into_iter())?;
    }
    Ok(())
}

fn write_line<W: Write>(out: &mut W, fields: impl Iterator<Item = String>) -> GenResult<()> {
    let line: Vec<String> = fields.map(|f| escape(&f)).collect();
    out.write_all(line.join(",").as_bytes())?;
    out.write_all(b"\n")?;
    Ok(())
}

pub fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn write_table_file<T: CsvRow>(path: &Path, rows: &[T]) -> GenResult<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_table(&mut out, rows)?;
    out.flush()?;
    Ok(())
}

/// Write all five tables into `dir`, creating it if needed.
pub fn export_dataset(dataset: &Dataset, dir: &Path) -> GenResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let paths = vec![
        dir.join(MESSAGES_FILE),
        dir.join(BILLING_FILE),
        dir.join(AGGREGATORS_FILE),
        dir.join(CUSTOMERS_FILE),
        dir.join(ERROR_CODES_FILE),
    ];
    write_table_file(&paths[0], &dataset.messages)?;
    write_table_file(&paths[1], &dataset.billing)?;
    write_table_file(&paths[2], &dataset.tables.aggregators)?;
    write_table_file(&paths[3], &dataset.tables.customers)?;
    write_table_file(&paths[4], &dataset.tables.error_codes)?;
    log::info!("Wrote {} tables to {}", paths.len(), dir.display());
    Ok(paths)
}

// ── Reading ────────────────────────────────────────────────────

/// Split delimited text into records of fields. Quoted fields may
/// contain commas, doubled quotes and line breaks.
pub fn parse_records(text: &str, file: &str) -> GenResult<Vec<(usize, Vec<String>)>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                records.push((record_line, std::mem::take(&mut fields)));
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err(GenError::Parse {
            file: file.to_string(),
            line: record_line,
            reason: "unterminated quoted field".into(),
        });
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push((record_line, fields));
    }
    Ok(records)
}

pub fn read_table<R: Read, T: CsvRow>(mut input: R, file: &str) -> GenResult<Vec<T>> {
    let mut text = String::new();
    input.read_to_string(&mut text)?;
    let mut records = parse_records(&text, file)?.into_iter();

    let parse_err = |line: usize, reason: String| GenError::Parse {
        file: file.to_string(),
        line,
        reason,
    };

    let (_, header) = records
        .next()
        .ok_or_else(|| parse_err(1, "missing header row".into()))?;
    if header.iter().map(String::as_str).ne(T::HEADER.iter().copied()) {
        return Err(parse_err(1, format!("unexpected header {header:?}")));
    }

    records
        .map(|(line, fields)| {
            if fields.len() != T::HEADER.len() {
                return Err(parse_err(
                    line,
                    format!("expected {} fields, found {}", T::HEADER.len(), fields.len()),
                ));
            }
            T::from_fields(&fields).map_err(|reason| parse_err(line, reason))
        })
        .collect()
}

pub fn read_table_file<T: CsvRow>(path: &Path) -> GenResult<Vec<T>> {
    let file = File::open(path)?;
    read_table(file, &path.display().to_string())
}

/// Read the message and billing tables written by `export_dataset`.
pub fn import_tables(dir: &Path) -> GenResult<(Vec<MessageRecord>, Vec<BillingRecord>)> {
    let messages = read_table_file(&dir.join(MESSAGES_FILE))?;
    let billing = read_table_file(&dir.join(BILLING_FILE))?;
    Ok((messages, billing))
}

// ── Column layouts ─────────────────────────────────────────────

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn opt_from(field: &str) -> Option<String> {
    (!field.is_empty()).then(|| field.to_string())
}

fn parse<T: FromStr>(field: &str, column: &str) -> Result<T, String> {
    field
        .parse()
        .map_err(|_| format!("bad value '{field}' in column {column}"))
}

fn parse_with<T, E: std::fmt::Display>(
    field: &str,
    column: &str,
    f: impl FnOnce(&str) -> Result<T, E>,
) -> Result<T, String> {
    f(field).map_err(|e| format!("bad value '{field}' in column {column}: {e}"))
}

impl CsvRow for MessageRecord {
    const HEADER: &'static [&'static str] = &[
        "message_id",
        "customer_id",
        "timestamp",
        "mobile_number",
        "destination_country",
        "sender_id",
        "message_content",
        "regex_pattern_match",
        "error_code",
        "delivery_status",
        "is_fraud",
        "fraud_type",
        "channel_type",
        "content_type",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.message_id.clone(),
            self.customer_id.clone(),
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.mobile_number.clone(),
            self.destination_country.clone(),
            self.sender_id.clone(),
            self.message_content.clone(),
            opt(&self.regex_pattern_match),
            self.error_code.clone(),
            self.delivery_status.to_string(),
            self.is_fraud.to_string(),
            self.fraud_type.to_string(),
            self.channel_type.to_string(),
            self.content_type.to_string(),
        ]
    }

    fn from_fields(f: &[String]) -> Result<Self, String> {
        Ok(Self {
            message_id: f[0].clone(),
            customer_id: f[1].clone(),
            timestamp: parse_with(&f[2], "timestamp", |s| {
                NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
            })?,
            mobile_number: f[3].clone(),
            destination_country: f[4].clone(),
            sender_id: f[5].clone(),
            message_content: f[6].clone(),
            regex_pattern_match: opt_from(&f[7]),
            error_code: f[8].clone(),
            delivery_status: parse_with(&f[9], "delivery_status", str::parse)?,
            is_fraud: parse(&f[10], "is_fraud")?,
            fraud_type: parse_with(&f[11], "fraud_type", str::parse)?,
            channel_type: parse_with(&f[12], "channel_type", str::parse)?,
            content_type: parse_with(&f[13], "content_type", str::parse)?,
        })
    }
}

impl CsvRow for BillingRecord {
    const HEADER: &'static [&'static str] = &[
        "message_id",
        "aggregator_id",
        "route_hops",
        "hop_details",
        "total_cost_gbp",
        "direct_route",
        "fraud_reported_by_agg",
        "aggregator_error_code",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.message_id.clone(),
            self.aggregator_id.clone(),
            self.route_hops.to_string(),
            self.hop_details.clone(),
            self.total_cost_gbp.to_string(),
            self.direct_route.to_string(),
            self.fraud_reported_by_agg.to_string(),
            opt(&self.aggregator_error_code),
        ]
    }

    fn from_fields(f: &[String]) -> Result<Self, String> {
        Ok(Self {
            message_id: f[0].clone(),
            aggregator_id: f[1].clone(),
            route_hops: parse(&f[2], "route_hops")?,
            hop_details: f[3].clone(),
            total_cost_gbp: parse(&f[4], "total_cost_gbp")?,
            direct_route: parse(&f[5], "direct_route")?,
            fraud_reported_by_agg: parse(&f[6], "fraud_reported_by_agg")?,
            aggregator_error_code: opt_from(&f[7]),
        })
    }
}

impl CsvRow for Aggregator {
    const HEADER: &'static [&'static str] =
        &["aggregator_id", "aggregator_name", "country", "tier", "trust_score"];

    fn fields(&self) -> Vec<String> {
        vec![
            self.aggregator_id.clone(),
            self.aggregator_name.clone(),
            self.country.clone(),
            self.tier.to_string(),
            self.trust_score.to_string(),
        ]
    }

    fn from_fields(f: &[String]) -> Result<Self, String> {
        let tier = match f[3].as_str() {
            "tier-1" => Tier::Tier1,
            "tier-2" => Tier::Tier2,
            "tier-3" => Tier::Tier3,
            other => return Err(format!("bad value '{other}' in column tier")),
        };
        Ok(Self {
            aggregator_id: f[0].clone(),
            aggregator_name: f[1].clone(),
            country: f[2].clone(),
            tier,
            trust_score: parse(&f[4], "trust_score")?,
        })
    }
}

impl CsvRow for Customer {
    const HEADER: &'static [&'static str] = &["customer_id", "customer_name", "vertical", "country"];

    fn fields(&self) -> Vec<String> {
        vec![
            self.customer_id.clone(),
            self.customer_name.clone(),
            self.vertical.clone(),
            self.country.clone(),
        ]
    }

    fn from_fields(f: &[String]) -> Result<Self, String> {
        Ok(Self {
            customer_id: f[0].clone(),
            customer_name: f[1].clone(),
            vertical: f[2].clone(),
            country: f[3].clone(),
        })
    }
}

impl CsvRow for ErrorCode {
    const HEADER: &'static [&'static str] = &["error_code", "description", "is_regex_flag", "severity"];

    fn fields(&self) -> Vec<String> {
        vec![
            self.error_code.clone(),
            self.description.clone(),
            self.is_regex_flag.to_string(),
            self.severity.as_str().to_string(),
        ]
    }

    fn from_fields(f: &[String]) -> Result<Self, String> {
        let severity = match f[3].as_str() {
            "low" => Severity::Low,
            "medium" => Severity::Medium,
            "high" => Severity::High,
            other => return Err(format!("bad value '{other}' in column severity")),
        };
        Ok(Self {
            error_code: f[0].clone(),
            description: f[1].clone(),
            is_regex_flag: parse(&f[2], "is_regex_flag")?,
            severity,
        })
    }
}
