use crate::process::ProcessRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A named total order over process records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum RankCriterion {
    /// CPU usage over the last tick
    Cpu,
    /// Resident memory
    Memory,
    /// Cumulative CPU time
    Time,
    /// Share of I/O traffic over the last tick
    Io,
}

impl RankCriterion {
    pub const ALL: [RankCriterion; 4] = [
        RankCriterion::Cpu,
        RankCriterion::Memory,
        RankCriterion::Time,
        RankCriterion::Io,
    ];

    /// `Greater` when `a` ranks above `b`.
    pub fn compare(self, a: &ProcessRecord, b: &ProcessRecord) -> Ordering {
        match self {
            RankCriterion::Cpu => a.amount.total_cmp(&b.amount),
            RankCriterion::Memory => a.rss.cmp(&b.rss),
            RankCriterion::Time => a.total_cpu_time.cmp(&b.total_cpu_time),
            RankCriterion::Io => a.io_perc.total_cmp(&b.io_perc),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            RankCriterion::Cpu => "CPU Consumers",
            RankCriterion::Memory => "Memory Consumers",
            RankCriterion::Time => "Longest Running",
            RankCriterion::Io => "I/O Consumers",
        }
    }
}

impl fmt::Display for RankCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RankCriterion::Cpu => "cpu",
            RankCriterion::Memory => "memory",
            RankCriterion::Time => "time",
            RankCriterion::Io => "io",
        };
        f.write_str(name)
    }
}
