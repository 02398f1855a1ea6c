use chrono::{DateTime, SecondsFormat, Utc};

/// Time source for build timestamps and output file names.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T09:30:00.250Z`.
pub fn iso_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// [`iso_timestamp`] with `:` and `.` replaced so it can sit in a file name.
pub fn file_stamp(instant: DateTime<Utc>) -> String {
    iso_timestamp(instant).replace([':', '.'], "-")
}
