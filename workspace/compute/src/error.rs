use chrono::NaiveDate;
use thiserror::Error;

/// Failures of the reporting and budget counter functions.
#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// The month/year pair does not name a calendar month chrono can represent.
    #[error("{month}/{year} is not a valid budget period")]
    InvalidPeriod { month: i64, year: i32 },

    #[error("Year {0} is out of range")]
    InvalidYear(i32),

    /// A report range whose start lies after its end.
    #[error("Start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

pub type Result<T> = std::result::Result<T, ComputeError>;
