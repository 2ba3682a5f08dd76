use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::{PartitionError, PartitionKey};

/// Months selected for one year: an explicit list or an inclusive range.
///
/// In TOML either `months = [7, 8, 9]` or `months = { from = 7, to = 12 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Months {
    List(Vec<u32>),
    Range { from: u32, to: u32 },
}

impl Months {
    /// Months in processing order. An inverted range expands to nothing.
    ///
    /// Bounds are not checked here; `PartitionSet::keys` rejects a range
    /// reaching outside 1..=12 before expanding it.
    pub fn expand(&self) -> Vec<u32> {
        match self {
            Months::List(months) => months.clone(),
            Months::Range { from, to } => (*from..=*to).collect(),
        }
    }

    fn count(&self) -> usize {
        match self {
            Months::List(months) => months.len(),
            Months::Range { from, to } if from <= to => {
                usize::try_from(u64::from(*to) - u64::from(*from) + 1).unwrap_or(usize::MAX)
            }
            Months::Range { .. } => 0,
        }
    }
}

impl From<Vec<u32>> for Months {
    fn from(months: Vec<u32>) -> Self {
        Months::List(months)
    }
}

impl From<RangeInclusive<u32>> for Months {
    fn from(range: RangeInclusive<u32>) -> Self {
        Months::Range {
            from: *range.start(),
            to: *range.end(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearPartitions {
    pub year: u32,
    pub months: Months,
}

impl YearPartitions {
    fn check_bounds(&self) -> Result<(), PartitionError> {
        if self.year == 0 {
            return Err(PartitionError::InvalidYear(self.year));
        }
        let Months::Range { from, to } = self.months else {
            return Ok(());
        };
        if from > to {
            return Err(PartitionError::InvertedRange {
                year: self.year,
                from,
                to,
            });
        }
        for month in [from, to] {
            if !(1..=12).contains(&month) {
                return Err(PartitionError::InvalidMonth {
                    year: self.year,
                    month,
                });
            }
        }
        Ok(())
    }
}

/// Ordered selection of partitions to process.
///
/// Iteration follows entry order, then month order inside each entry; years
/// are not sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionSet {
    entries: Vec<YearPartitions>,
}

impl PartitionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_year(mut self, year: u32, months: impl Into<Months>) -> Self {
        self.push(year, months);
        self
    }

    pub fn push(&mut self, year: u32, months: impl Into<Months>) {
        self.entries.push(YearPartitions {
            year,
            months: months.into(),
        });
    }

    pub fn entries(&self) -> &[YearPartitions] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| entry.months.count())
            .fold(0, usize::saturating_add)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expand into validated keys, failing on the first malformed entry.
    /// Nothing is expanded until every entry has passed its bounds check.
    pub fn keys(&self) -> Result<Vec<PartitionKey>, PartitionError> {
        for entry in &self.entries {
            entry.check_bounds()?;
        }
        let mut keys = Vec::with_capacity(self.len());
        for entry in &self.entries {
            for month in entry.months.expand() {
                keys.push(PartitionKey::new(entry.year, month)?);
            }
        }
        Ok(keys)
    }

    pub fn validate(&self) -> Result<(), PartitionError> {
        self.keys().map(|_| ())
    }
}
