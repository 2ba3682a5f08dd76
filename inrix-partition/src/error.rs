use thiserror::Error as ThisError;

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum PartitionError {
    #[error("year must be positive, got {0}")]
    InvalidYear(u32),

    #[error("month {month} of year {year} is outside 1..=12")]
    InvalidMonth { year: u32, month: u32 },

    #[error("month range {from}..={to} of year {year} is inverted")]
    InvertedRange { year: u32, from: u32, to: u32 },
}
