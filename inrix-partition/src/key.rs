use std::fmt;

use crate::PartitionError;

/// Render `year` and `month` as the `YYYYMM` partition suffix.
///
/// No range check happens here; `PartitionKey::new` is the validating entry
/// point. Months with more than two digits are rendered as-is.
pub fn suffix(year: u32, month: u32) -> String {
    format!("{year}{month:02}")
}

/// One monthly partition, identified by calendar year and month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey {
    year: u32,
    month: u32,
}

impl PartitionKey {
    pub fn new(year: u32, month: u32) -> Result<Self, PartitionError> {
        if year == 0 {
            return Err(PartitionError::InvalidYear(year));
        }
        if !(1..=12).contains(&month) {
            return Err(PartitionError::InvalidMonth { year, month });
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn suffix(&self) -> String {
        suffix(self.year, self.month)
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}", self.year, self.month)
    }
}
