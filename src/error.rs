use chrono::NaiveDate;
use thiserror::Error;

/// Rejections raised while building [`crate::models::Criteria`] or parsing
/// a user-supplied label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CriteriaError {
    #[error("date range start {start} is after end {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("unknown metric `{0}`")]
    UnknownMetric(String),

    #[error("unknown {field} `{value}`")]
    UnknownCategory { field: &'static str, value: String },
}

/// Problems found while assembling a [`crate::source::Dataset`].
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("more than one record for {0}")]
    DuplicateDate(NaiveDate),

    #[error("{field} on {date} must be a non-negative finite number, got {value}")]
    InvalidValue {
        date: NaiveDate,
        field: &'static str,
        value: f64,
    },

    #[error("failed to read records: {0}")]
    Csv(#[from] csv::Error),
}
