//! CSV input and output for the command-line tools.
//!
//! Transactions: `timestamp,volume_usd,fee_usd` with RFC 3339 timestamps.
//! Intended schedule: `start_date,end_date,intended_fee_bps` with ISO dates,
//! `end_date` inclusive.

use std::fs::File;
use std::io::{Read, Write};

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, Trim, Writer};
use fee_analysis_core::{IntendedScheduleEntry, Transaction, ValidatedPeriod};

const PERIOD_HEADER: [&str; 13] = [
    "period_id",
    "start_date",
    "end_date",
    "day_count",
    "detected_fee_bps",
    "intended_fee_bps",
    "delta_bps",
    "alignment_status",
    "change_direction",
    "volume_usd",
    "fee_revenue_usd",
    "transaction_count",
    "confidence_score",
];

/// Parses transactions from CSV.
///
/// # Errors
/// Returns an error naming the first malformed row.
pub fn read_transactions<R: Read>(source: R) -> Result<Vec<Transaction>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(source);
    reader
        .deserialize::<Transaction>()
        .enumerate()
        // Row 1 is the header.
        .map(|(i, row)| row.with_context(|| format!("Invalid transaction on row {}", i + 2)))
        .collect()
}

/// Parses the intended fee schedule from CSV.
///
/// # Errors
/// Returns an error for malformed rows or entries ending before they start.
pub fn read_schedule<R: Read>(source: R) -> Result<Vec<IntendedScheduleEntry>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(source);
    let mut entries = Vec::new();
    for (i, row) in reader.deserialize::<IntendedScheduleEntry>().enumerate() {
        let entry = row.with_context(|| format!("Invalid schedule entry on row {}", i + 2))?;
        if entry.end_date < entry.start_date {
            bail!(
                "Schedule entry on row {} ends ({}) before it starts ({})",
                i + 2,
                entry.end_date,
                entry.start_date
            );
        }
        entries.push(entry);
    }
    Ok(entries)
}

/// Loads transactions from a CSV file.
///
/// # Errors
/// Returns an error if the file cannot be opened or parsed.
pub fn load_transactions(path: &str) -> Result<Vec<Transaction>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open transactions file: {path}"))?;
    read_transactions(file).with_context(|| format!("Failed to read transactions from {path}"))
}

/// Loads the intended schedule from a CSV file.
///
/// # Errors
/// Returns an error if the file cannot be opened or parsed.
pub fn load_schedule(path: &str) -> Result<Vec<IntendedScheduleEntry>> {
    let file = File::open(path).with_context(|| format!("Failed to open schedule file: {path}"))?;
    read_schedule(file).with_context(|| format!("Failed to read schedule from {path}"))
}

/// Writes the period table as CSV.
///
/// # Errors
/// Returns an error if writing fails.
pub fn write_periods<W: Write>(sink: W, periods: &[ValidatedPeriod]) -> Result<()> {
    let mut writer = Writer::from_writer(sink);
    writer.write_record(PERIOD_HEADER)?;

    for v in periods {
        let p = &v.period;
        writer.write_record(&[
            p.period_id.to_string(),
            p.start_date.to_string(),
            p.end_date.to_string(),
            p.day_count.to_string(),
            optional(p.detected_fee_bps),
            optional(v.intended_fee_bps),
            optional(v.delta_bps),
            v.alignment_status.to_string(),
            p.change_direction.to_string(),
            p.volume_usd.to_string(),
            p.fee_revenue_usd.to_string(),
            p.transaction_count.to_string(),
            format!("{:.2}", p.confidence_score),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.4}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fee_analysis_core::{AlignmentStatus, ChangeDirection, DetectedPeriod};
    use rust_decimal_macros::dec;

    #[test]
    fn reads_transactions() {
        let csv = "timestamp,volume_usd,fee_usd\n\
                   2025-06-01T12:00:00Z,100000,100\n\
                   2025-06-02T08:30:00Z, 250000.50 , 500.001\n";

        let txs = read_transactions(csv.as_bytes()).unwrap();

        assert_eq!(txs.len(), 2);
        assert_eq!(txs[1].volume_usd, dec!(250000.50));
        assert_eq!(txs[1].fee_usd, dec!(500.001));
        assert_eq!(txs[1].date(), NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
    }

    #[test]
    fn malformed_transaction_names_row() {
        let csv = "timestamp,volume_usd,fee_usd\n\
                   2025-06-01T12:00:00Z,100000,100\n\
                   yesterday,100000,100\n";

        let err = read_transactions(csv.as_bytes()).unwrap_err();

        assert!(err.to_string().contains("row 3"));
    }

    #[test]
    fn reads_schedule() {
        let csv = "start_date,end_date,intended_fee_bps\n\
                   2025-06-01,2025-06-07,10\n\
                   2025-06-08,2025-06-14,25.5\n";

        let schedule = read_schedule(csv.as_bytes()).unwrap();

        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[1].intended_fee_bps, 25.5);
    }

    #[test]
    fn inverted_schedule_entry_is_rejected() {
        let csv = "start_date,end_date,intended_fee_bps\n2025-06-07,2025-06-01,10\n";

        assert!(read_schedule(csv.as_bytes()).is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,volume_usd,fee_usd").unwrap();
        writeln!(file, "2025-06-01T00:00:00Z,1000,1").unwrap();

        let txs = load_transactions(file.path().to_str().unwrap()).unwrap();

        assert_eq!(txs.len(), 1);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_schedule("does/not/exist.csv").unwrap_err();

        assert!(err.to_string().contains("does/not/exist.csv"));
    }

    #[test]
    fn writes_period_table() {
        let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let period = ValidatedPeriod {
            period: DetectedPeriod {
                period_id: 1,
                start_date: start,
                end_date: start + chrono::Duration::days(4),
                day_count: 5,
                detected_fee_bps: Some(10.0),
                previous_fee_bps: None,
                next_fee_bps: None,
                delta_from_previous: None,
                change_direction: ChangeDirection::Initial,
                volume_usd: dec!(500000),
                fee_revenue_usd: dec!(500),
                transaction_count: 5,
                confidence_score: 0.7,
            },
            intended_fee_bps: None,
            delta_bps: None,
            alignment_status: AlignmentStatus::NoIntendedMatch,
            overlap_days: 0,
            is_partial_overlap: true,
            is_missing_match: true,
        };
        let mut out = Vec::new();

        write_periods(&mut out, &[period]).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("period_id,start_date"));
        assert_eq!(
            lines[1],
            "1,2025-06-01,2025-06-05,5,10.0000,,,no_intended_match,initial,500000,500,5,0.70"
        );
    }
}
