use super::{display_name, RawSample, SampleBatch, Sampler};
use crate::error::SampleError;
use procfs::process::{all_processes, Process};
use procfs::{Current, CurrentSI, KernelStats, Meminfo, ProcError};
use std::collections::HashMap;
use sysinfo::Users;
use tracing::trace;

/// Reads `/proc` directly. Times are clock ticks (`USER_HZ`).
pub struct ProcfsSampler {
    page_size: u64,
    tick_rate: u64,
    users: HashMap<u32, String>,
}

impl ProcfsSampler {
    pub fn new() -> Self {
        let users = Users::new_with_refreshed_list()
            .list()
            .iter()
            .map(|user| (**user.id(), user.name().to_string()))
            .collect();

        Self {
            page_size: procfs::page_size(),
            tick_rate: procfs::ticks_per_second(),
            users,
        }
    }

    fn user_name(&self, uid: u32) -> String {
        self.users
            .get(&uid)
            .cloned()
            .unwrap_or_else(|| uid.to_string())
    }

    fn read_process(&self, process: &Process) -> Result<RawSample, ProcError> {
        let stat = process.stat()?;
        let uid = process.uid()?;
        let cmdline = process.cmdline().unwrap_or_default();
        // /proc/<pid>/io needs ptrace access; other users' processes report no I/O.
        let (read_bytes, write_bytes) = process
            .io()
            .map(|io| (io.read_bytes, io.write_bytes))
            .unwrap_or((0, 0));

        Ok(RawSample {
            pid: stat.pid as u32,
            name: display_name(&stat.comm, &cmdline),
            basename: stat.comm.clone(),
            uid,
            user: self.user_name(uid),
            user_ticks: stat.utime,
            kernel_ticks: stat.stime,
            rss_bytes: stat.rss.saturating_mul(self.page_size),
            vsize_bytes: stat.vsize,
            read_bytes,
            write_bytes,
            running: stat.state == 'R',
        })
    }
}

impl Default for ProcfsSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for ProcfsSampler {
    fn name(&self) -> &'static str {
        "procfs"
    }

    fn sample(&mut self) -> Result<SampleBatch, SampleError> {
        let stats = KernelStats::current()?;
        let total_memory = Meminfo::current()?.mem_total;
        let t = &stats.total;
        let total_ticks = t.user
            + t.nice
            + t.system
            + t.idle
            + t.iowait.unwrap_or(0)
            + t.irq.unwrap_or(0)
            + t.softirq.unwrap_or(0)
            + t.steal.unwrap_or(0);

        let mut processes = Vec::new();
        for entry in all_processes()? {
            let process = match entry {
                Ok(p) => p,
                Err(e) => {
                    trace!("skipping unreadable /proc entry: {e}");
                    continue;
                }
            };
            match self.read_process(&process) {
                Ok(sample) => processes.push(sample),
                // Exited between listing and reading.
                Err(e) => trace!(pid = process.pid, "skipping process: {e}"),
            }
        }

        Ok(SampleBatch {
            total_ticks,
            cpu_count: stats.cpu_time.len().max(1),
            tick_rate: self.tick_rate,
            total_memory,
            processes,
        })
    }
}
