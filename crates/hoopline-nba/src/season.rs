//! Season partitions

use std::fmt;

use hoopline_store::{InvalidPartition, Partition};

/// A season partition, named by its starting year (`"2019"` = 2019-20).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Season {
    partition: Partition,
    year: i32,
}

impl Season {
    pub fn new(year: i32) -> Result<Self, InvalidSeason> {
        let partition =
            Partition::new(year.to_string()).map_err(|InvalidPartition(s)| InvalidSeason(s))?;
        Self::from_partition(partition)
    }

    /// Interpret a partition name as a season start year.
    pub fn from_partition(partition: Partition) -> Result<Self, InvalidSeason> {
        let year = partition
            .as_str()
            .parse::<i32>()
            .ok()
            .filter(|y| (1946..=9998).contains(y))
            .ok_or_else(|| InvalidSeason(partition.as_str().to_string()))?;
        Ok(Self { partition, year })
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Season label used by the stats API, e.g. `"2019-20"`.
    pub fn season_str(&self) -> String {
        format!("{}-{:02}", self.year, (self.year + 1) % 100)
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.season_str())
    }
}

impl std::str::FromStr for Season {
    type Err = InvalidSeason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let partition = Partition::new(s).map_err(|InvalidPartition(s)| InvalidSeason(s))?;
        Self::from_partition(partition)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSeason(pub String);

impl fmt::Display for InvalidSeason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid season {:?}: expected a start year like 2019", self.0)
    }
}

impl std::error::Error for InvalidSeason {}
