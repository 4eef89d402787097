//! Appointment data sources
//!
//! A source hands out two views of the appointment table: rows that already
//! happened (training material) and rows that are still ahead (to be scored).

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveTime};
use csv::{Position, ReaderBuilder, StringRecord, Trim};
use noshow_core::{AppointmentRecord, NoShowError, Result};
use serde::Deserialize;

/// Read-only tabular source of appointment rows
pub trait AppointmentSource {
    /// Appointments scheduled strictly before `today`
    fn historical(&self, today: NaiveDate) -> Result<Vec<AppointmentRecord>>;

    /// Appointments scheduled on or after `today`
    fn pending(&self, today: NaiveDate) -> Result<Vec<AppointmentRecord>>;
}

/// Source over records already held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Vec<AppointmentRecord>,
}

impl InMemorySource {
    pub fn new(records: Vec<AppointmentRecord>) -> Self {
        Self { records }
    }
}

impl AppointmentSource for InMemorySource {
    fn historical(&self, today: NaiveDate) -> Result<Vec<AppointmentRecord>> {
        Ok(self.records.iter().filter(|r| r.is_historical(today)).cloned().collect())
    }

    fn pending(&self, today: NaiveDate) -> Result<Vec<AppointmentRecord>> {
        Ok(self.records.iter().filter(|r| r.is_pending(today)).cloned().collect())
    }
}

/// CSV file with columns `id,specialty,scheduled_date,scheduled_time,absent`.
///
/// The header row is optional and `#` lines are comments. Dates are
/// `YYYY-MM-DD`, times `HH:MM` or `HH:MM:SS`, and `absent` is one of
/// `1/0/true/false/yes/no` or empty when the outcome isn't known.
/// The file is opened for each query and closed before it returns.
#[derive(Debug, Clone)]
pub struct CsvAppointmentSource {
    path: PathBuf,
}

impl CsvAppointmentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every row in file order
    pub fn read_all(&self) -> Result<Vec<AppointmentRecord>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .trim(Trim::All)
            .from_path(&self.path)
            .map_err(|e| NoShowError::DataSource(format!("{}: {e}", self.path.display())))?;

        let mut records = Vec::new();
        for (idx, row) in reader.records().enumerate() {
            let row = row.map_err(|e| self.row_error(e.position(), e.to_string()))?;
            if idx == 0 && row.get(0).is_some_and(|f| f.eq_ignore_ascii_case("id")) {
                continue;
            }

            let record = parse_row(&row).map_err(|reason| self.row_error(row.position(), reason))?;
            records.push(record);
        }

        tracing::debug!(path = %self.path.display(), rows = records.len(), "appointments read");
        Ok(records)
    }

    fn row_error(&self, position: Option<&Position>, reason: String) -> NoShowError {
        match position {
            Some(pos) => NoShowError::DataSource(format!("{}:{}: {reason}", self.path.display(), pos.line())),
            None => NoShowError::DataSource(format!("{}: {reason}", self.path.display())),
        }
    }
}

impl AppointmentSource for CsvAppointmentSource {
    fn historical(&self, today: NaiveDate) -> Result<Vec<AppointmentRecord>> {
        let mut records = self.read_all()?;
        records.retain(|r| r.is_historical(today));
        Ok(records)
    }

    fn pending(&self, today: NaiveDate) -> Result<Vec<AppointmentRecord>> {
        let mut records = self.read_all()?;
        records.retain(|r| r.is_pending(today));
        Ok(records)
    }
}

/// One CSV row before date, time and outcome parsing
#[derive(Debug, Deserialize)]
struct CsvRow {
    id: u64,
    specialty: String,
    scheduled_date: String,
    scheduled_time: String,
    #[serde(default)]
    absent: Option<String>,
}

fn parse_row(row: &StringRecord) -> std::result::Result<AppointmentRecord, String> {
    if row.len() != 4 && row.len() != 5 {
        return Err(format!("expected 5 columns, found {}", row.len()));
    }
    let raw: CsvRow = row.deserialize(None).map_err(|e| e.to_string())?;

    if raw.specialty.is_empty() {
        return Err("empty specialty".to_string());
    }
    let scheduled_date = NaiveDate::parse_from_str(&raw.scheduled_date, "%Y-%m-%d")
        .map_err(|e| format!("bad date {:?}: {e}", raw.scheduled_date))?;
    let scheduled_time = NaiveTime::parse_from_str(&raw.scheduled_time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(&raw.scheduled_time, "%H:%M"))
        .map_err(|e| format!("bad time {:?}: {e}", raw.scheduled_time))?;
    let absent = parse_outcome(raw.absent.as_deref().unwrap_or(""))?;

    Ok(AppointmentRecord {
        id: raw.id,
        specialty: raw.specialty,
        scheduled_date,
        scheduled_time,
        absent,
    })
}

fn parse_outcome(raw: &str) -> std::result::Result<Option<bool>, String> {
    match raw.to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "1" | "true" | "yes" => Ok(Some(true)),
        "0" | "false" | "no" => Ok(Some(false)),
        other => Err(format!("bad outcome {other:?}")),
    }
}
