use crate::process::sampler::{Pid, RawSample};
use std::time::Duration;

/// Per-tick inputs shared by every record refreshed during that tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub tick: u64,
    /// System-wide ticks elapsed since the previous successful tick.
    pub elapsed_ticks: u64,
    /// Wall-clock time since the previous successful tick.
    pub elapsed: Duration,
    /// 100 for a share of the whole machine, 100 * cpus for per-core percentages.
    pub cpu_scale: f64,
    /// Physical memory in bytes; 0 when the sampler could not tell.
    pub total_memory: u64,
}

impl TickContext {
    pub fn new(tick: u64, elapsed_ticks: u64, elapsed: Duration) -> Self {
        Self {
            tick,
            elapsed_ticks,
            elapsed,
            cpu_scale: 100.0,
            total_memory: 0,
        }
    }

    pub fn with_total_memory(mut self, total_memory: u64) -> Self {
        self.total_memory = total_memory;
        self
    }

    pub fn per_core(mut self, cpu_count: usize) -> Self {
        self.cpu_scale = 100.0 * cpu_count.max(1) as f64;
        self
    }
}

/// One tracked OS process. Owned by the registry and mutated in place on
/// every sighting.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRecord {
    pub pid: Pid,
    pub name: String,
    pub basename: String,
    pub uid: u32,
    /// Owner's login name, or the numeric uid when it has none.
    pub user: String,
    /// CPU usage percentage over the last tick.
    pub amount: f32,
    /// Ticks consumed since the previous tick.
    pub user_time: u64,
    pub kernel_time: u64,
    /// Cumulative ticks since process start.
    pub total_cpu_time: u64,
    pub vsize: u64,
    pub rss: u64,
    /// Resident memory as a percentage of physical memory.
    pub mem_percent: f32,
    /// Cumulative byte counters.
    pub read_bytes: u64,
    pub write_bytes: u64,
    /// Bytes per second over the last tick.
    pub read_rate: f64,
    pub write_rate: f64,
    /// Share of all I/O moved during the last tick, in percent.
    pub io_perc: f32,
    pub running: bool,
    /// Last tick this record was refreshed at.
    pub time_stamp: u64,
    // `None` until the first sample establishes a baseline.
    pub previous_user_time: Option<u64>,
    pub previous_kernel_time: Option<u64>,
    pub previous_read_bytes: Option<u64>,
    pub previous_write_bytes: Option<u64>,
    pub(crate) io_delta: u64,
}

impl ProcessRecord {
    pub fn new(pid: Pid) -> Self {
        Self {
            pid,
            name: String::new(),
            basename: String::new(),
            uid: 0,
            user: String::new(),
            amount: 0.0,
            user_time: 0,
            kernel_time: 0,
            total_cpu_time: 0,
            vsize: 0,
            rss: 0,
            mem_percent: 0.0,
            read_bytes: 0,
            write_bytes: 0,
            read_rate: 0.0,
            write_rate: 0.0,
            io_perc: 0.0,
            running: false,
            time_stamp: 0,
            previous_user_time: None,
            previous_kernel_time: None,
            previous_read_bytes: None,
            previous_write_bytes: None,
            io_delta: 0,
        }
    }

    /// Folds a fresh OS sample into this record and marks it live for
    /// `ctx.tick`. `io_perc` is left at zero until the registry distributes
    /// the tick's I/O shares.
    pub fn apply_sample(&mut self, sample: &RawSample, ctx: &TickContext) {
        self.time_stamp = ctx.tick;

        self.name.clone_from(&sample.name);
        self.basename.clone_from(&sample.basename);
        self.uid = sample.uid;
        self.user.clone_from(&sample.user);
        self.rss = sample.rss_bytes;
        self.mem_percent = if ctx.total_memory == 0 {
            0.0
        } else {
            (100.0 * sample.rss_bytes as f64 / ctx.total_memory as f64) as f32
        };
        self.vsize = sample.vsize_bytes;
        self.running = sample.running;

        let user = counter_delta(sample.user_ticks, &mut self.previous_user_time);
        let kernel = counter_delta(sample.kernel_ticks, &mut self.previous_kernel_time);
        self.user_time = user;
        self.kernel_time = kernel;
        self.total_cpu_time = sample.user_ticks.saturating_add(sample.kernel_ticks);

        self.amount = if ctx.elapsed_ticks == 0 {
            0.0
        } else {
            (ctx.cpu_scale * user.saturating_add(kernel) as f64 / ctx.elapsed_ticks as f64) as f32
        };

        let read = counter_delta(sample.read_bytes, &mut self.previous_read_bytes);
        let written = counter_delta(sample.write_bytes, &mut self.previous_write_bytes);
        self.read_bytes = sample.read_bytes;
        self.write_bytes = sample.write_bytes;

        let secs = ctx.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.read_rate = read as f64 / secs;
            self.write_rate = written as f64 / secs;
        } else {
            self.read_rate = 0.0;
            self.write_rate = 0.0;
        }
        self.io_delta = read.saturating_add(written);
        self.io_perc = 0.0;
    }

    /// Bytes read and written during the last tick.
    pub fn io_delta(&self) -> u64 {
        self.io_delta
    }
}

/// Difference against the stored baseline, then re-bases on `current`.
/// The first sighting and counter resets both yield zero.
fn counter_delta(current: u64, previous: &mut Option<u64>) -> u64 {
    let base = previous.unwrap_or(current);
    *previous = Some(current);
    current.saturating_sub(base)
}
