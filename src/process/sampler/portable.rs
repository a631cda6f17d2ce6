use super::{display_name, RawSample, SampleBatch, Sampler};
use crate::error::SampleError;
use std::time::Instant;
use sysinfo::{Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System, Users};

/// Portable backend on top of `sysinfo`.
///
/// sysinfo reports accumulated CPU time in milliseconds and does not split
/// user and kernel time, so ticks are milliseconds, everything lands in
/// `user_ticks`, and the system-wide counter is wall milliseconds since
/// construction times the logical CPU count.
pub struct SysinfoSampler {
    system: System,
    users: Users,
    started: Instant,
}

impl SysinfoSampler {
    pub fn new() -> Self {
        Self {
            system: System::new_all(),
            users: Users::new_with_refreshed_list(),
            started: Instant::now(),
        }
    }
}

impl Default for SysinfoSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for SysinfoSampler {
    fn name(&self) -> &'static str {
        "sysinfo"
    }

    fn sample(&mut self) -> Result<SampleBatch, SampleError> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::everything(),
        );
        self.system.refresh_memory();

        let cpu_count = self.system.cpus().len().max(1);
        let elapsed_ms = self.started.elapsed().as_millis() as u64;

        let processes = self
            .system
            .processes()
            .iter()
            .map(|(pid, process)| {
                let comm = process.name().to_string_lossy().into_owned();
                let cmdline: Vec<String> = process
                    .cmd()
                    .iter()
                    .map(|arg| arg.to_string_lossy().into_owned())
                    .collect();
                let disk = process.disk_usage();
                let uid = uid_of(process);
                let user = process
                    .user_id()
                    .and_then(|id| self.users.get_user_by_id(id))
                    .map(|u| u.name().to_string())
                    .unwrap_or_else(|| uid.to_string());

                RawSample {
                    pid: pid.as_u32(),
                    name: display_name(&comm, &cmdline),
                    basename: comm,
                    uid,
                    user,
                    user_ticks: process.accumulated_cpu_time(),
                    kernel_ticks: 0,
                    rss_bytes: process.memory(),
                    vsize_bytes: process.virtual_memory(),
                    read_bytes: disk.total_read_bytes,
                    write_bytes: disk.total_written_bytes,
                    running: process.status() == ProcessStatus::Run,
                }
            })
            .collect::<Vec<_>>();

        if processes.is_empty() {
            return Err(SampleError::Unavailable(
                "sysinfo returned no processes".to_string(),
            ));
        }

        Ok(SampleBatch {
            total_ticks: elapsed_ms.saturating_mul(cpu_count as u64),
            cpu_count,
            tick_rate: 1000,
            total_memory: self.system.total_memory(),
            processes,
        })
    }
}

#[cfg(unix)]
fn uid_of(process: &Process) -> u32 {
    process.user_id().map(|uid| **uid).unwrap_or(0)
}

// Windows owners are SIDs, not numbers.
#[cfg(not(unix))]
fn uid_of(_process: &Process) -> u32 {
    0
}
