//! Status filter for the workspace and user tables.

use std::fmt;
use std::str::FromStr;

use console_core::types::EntityStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Suspended,
}

impl StatusFilter {
    pub fn matches(&self, status: EntityStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !status.is_suspended(),
            StatusFilter::Suspended => status.is_suspended(),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Active => f.write_str("active"),
            StatusFilter::Suspended => f.write_str("suspended"),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "suspended" => Ok(StatusFilter::Suspended),
            other => Err(format!(
                "unknown filter '{other}', expected all, active or suspended"
            )),
        }
    }
}

/// Entity counts shown on the filter buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCounts {
    pub all: usize,
    pub active: usize,
    pub suspended: usize,
}

impl FilterCounts {
    pub fn tally(statuses: impl IntoIterator<Item = EntityStatus>) -> Self {
        let mut counts = FilterCounts::default();
        for status in statuses {
            counts.all += 1;
            match status {
                EntityStatus::Active => counts.active += 1,
                EntityStatus::Suspended => counts.suspended += 1,
            }
        }
        counts
    }

    pub fn get(&self, filter: StatusFilter) -> usize {
        match filter {
            StatusFilter::All => self.all,
            StatusFilter::Active => self.active,
            StatusFilter::Suspended => self.suspended,
        }
    }
}
