//! Immutable per-tick results handed to readers.

use crate::process::ProcessRecord;
use crate::ranking::RankCriterion;
use serde::Serialize;
use std::collections::BTreeMap;

/// Owned copy of the fields a display needs from one ranked process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub pid: u32,
    pub name: String,
    pub basename: String,
    pub uid: u32,
    pub user: String,
    pub cpu_percent: f32,
    pub rss: u64,
    pub mem_percent: f32,
    pub vsize: u64,
    /// Cumulative CPU ticks; see [`TopSnapshot::tick_rate`].
    pub total_cpu_time: u64,
    pub read_rate: f64,
    pub write_rate: f64,
    pub io_perc: f32,
}

impl From<&ProcessRecord> for RankedEntry {
    fn from(record: &ProcessRecord) -> Self {
        Self {
            pid: record.pid,
            name: record.name.clone(),
            basename: record.basename.clone(),
            uid: record.uid,
            user: record.user.clone(),
            cpu_percent: record.amount,
            rss: record.rss,
            mem_percent: record.mem_percent,
            vsize: record.vsize,
            total_cpu_time: record.total_cpu_time,
            read_rate: record.read_rate,
            write_rate: record.write_rate,
            io_perc: record.io_perc,
        }
    }
}

impl RankedEntry {
    pub fn format_memory(&self) -> String {
        format_bytes(self.rss)
    }

    pub fn format_cpu_time(&self, tick_rate: u64) -> String {
        format_cpu_time(self.total_cpu_time, tick_rate)
    }
}

/// Rankings published at the end of one tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TopSnapshot {
    pub tick: u64,
    pub tick_rate: u64,
    pub total_processes: usize,
    pub running_processes: usize,
    /// Exactly `top_n` slots per requested criterion; `None` pads short lists.
    pub rankings: BTreeMap<RankCriterion, Vec<Option<RankedEntry>>>,
}

impl TopSnapshot {
    pub fn ranking(&self, criterion: RankCriterion) -> Option<&[Option<RankedEntry>]> {
        self.rankings.get(&criterion).map(Vec::as_slice)
    }

    /// Filled slots only, best first.
    pub fn top(&self, criterion: RankCriterion) -> impl Iterator<Item = &RankedEntry> + '_ {
        self.ranking(criterion)
            .unwrap_or_default()
            .iter()
            .flatten()
    }

    pub fn pids(&self, criterion: RankCriterion) -> Vec<u32> {
        self.top(criterion).map(|e| e.pid).collect()
    }
}

pub fn format_bytes(bytes: u64) -> String {
    let kb = bytes / 1024;
    let mb = kb / 1024;
    let gb = mb / 1024;

    if gb > 0 {
        format!("{:.1}GB", mb as f64 / 1024.0)
    } else if mb > 0 {
        format!("{mb}MB")
    } else {
        format!("{kb}KB")
    }
}

/// `D:HH:MM:SS`, dropping the day field when it is zero.
pub fn format_cpu_time(ticks: u64, tick_rate: u64) -> String {
    let total_secs = ticks / tick_rate.max(1);
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = (total_secs / 3600) % 24;
    let days = total_secs / 86_400;

    if days > 0 {
        format!("{days}:{hours:02}:{mins:02}:{secs:02}")
    } else {
        format!("{hours:02}:{mins:02}:{secs:02}")
    }
}
