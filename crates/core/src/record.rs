//! Appointment rows as read from the scheduling data store

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// One scheduled appointment. Read-only: the pipeline never mutates records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentRecord {
    /// Stable appointment identifier from the data store
    pub id: u64,
    /// Medical specialty the appointment is booked under
    pub specialty: String,
    /// Scheduled calendar date
    pub scheduled_date: NaiveDate,
    /// Scheduled wall-clock time
    pub scheduled_time: NaiveTime,
    /// Outcome flag, only present for appointments that already happened.
    /// `true` means the attendee did not show up.
    pub absent: Option<bool>,
}

impl AppointmentRecord {
    /// Build a record that has not happened yet (no outcome).
    pub fn pending(
        id: u64,
        specialty: impl Into<String>,
        scheduled_date: NaiveDate,
        scheduled_time: NaiveTime,
    ) -> Self {
        Self {
            id,
            specialty: specialty.into(),
            scheduled_date,
            scheduled_time,
            absent: None,
        }
    }

    /// Build a past record with a known outcome.
    pub fn historical(
        id: u64,
        specialty: impl Into<String>,
        scheduled_date: NaiveDate,
        scheduled_time: NaiveTime,
        absent: bool,
    ) -> Self {
        Self {
            absent: Some(absent),
            ..Self::pending(id, specialty, scheduled_date, scheduled_time)
        }
    }

    /// Day of week, 1 = Sunday .. 7 = Saturday
    pub fn day_of_week(&self) -> u32 {
        self.scheduled_date.weekday().number_from_sunday()
    }

    /// Hour of day, 0..=23
    pub fn hour(&self) -> u32 {
        self.scheduled_time.hour()
    }

    /// Occurred strictly before `today`.
    pub fn is_historical(&self, today: NaiveDate) -> bool {
        self.scheduled_date < today
    }

    /// Occurs today or later.
    pub fn is_pending(&self, today: NaiveDate) -> bool {
        !self.is_historical(today)
    }
}
