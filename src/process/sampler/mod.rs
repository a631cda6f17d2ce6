//! Per-OS process enumeration behind a single [`Sampler`] interface.
//!
//! The core never looks at `/proc` or `sysinfo` directly; it only consumes
//! [`SampleBatch`]es.

#[cfg(target_os = "linux")]
mod linux;
mod portable;

#[cfg(target_os = "linux")]
pub use linux::ProcfsSampler;
pub use portable::SysinfoSampler;

use crate::error::SampleError;
use serde::{Deserialize, Serialize};

pub type Pid = u32;

/// One process as reported by the OS at this instant. All counters are
/// cumulative since process start.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawSample {
    pub pid: Pid,
    pub name: String,
    pub basename: String,
    pub uid: u32,
    /// Login name of `uid`; the number itself when unresolvable.
    pub user: String,
    pub user_ticks: u64,
    pub kernel_ticks: u64,
    pub rss_bytes: u64,
    pub vsize_bytes: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub running: bool,
}

/// Everything a sampler hands over for one tick.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SampleBatch {
    /// Cumulative system-wide ticks over every CPU and every time bucket.
    pub total_ticks: u64,
    /// Logical CPUs.
    pub cpu_count: usize,
    /// Ticks per second, used to turn tick counts into wall time.
    pub tick_rate: u64,
    /// Physical memory in bytes.
    pub total_memory: u64,
    pub processes: Vec<RawSample>,
}

pub trait Sampler: Send {
    fn name(&self) -> &'static str;

    /// Enumerates every live process. Processes that vanish mid-scan are left
    /// out rather than failing the whole batch.
    fn sample(&mut self) -> Result<SampleBatch, SampleError>;
}

impl<S: Sampler + ?Sized> Sampler for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn sample(&mut self) -> Result<SampleBatch, SampleError> {
        (**self).sample()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// procfs on Linux, sysinfo elsewhere
    #[default]
    Auto,
    /// Linux /proc parsing
    Procfs,
    /// Portable sysinfo backend
    Sysinfo,
}

/// Builds the sampler for `backend`.
pub fn sampler_for(backend: Backend) -> Result<Box<dyn Sampler>, SampleError> {
    match backend {
        Backend::Auto => Ok(default_sampler()),
        Backend::Sysinfo => Ok(Box::new(SysinfoSampler::new())),
        #[cfg(target_os = "linux")]
        Backend::Procfs => Ok(Box::new(ProcfsSampler::new())),
        #[cfg(not(target_os = "linux"))]
        Backend::Procfs => Err(SampleError::Unavailable(
            "the procfs backend is only available on Linux".to_string(),
        )),
    }
}

#[cfg(target_os = "linux")]
pub fn default_sampler() -> Box<dyn Sampler> {
    Box::new(ProcfsSampler::new())
}

#[cfg(not(target_os = "linux"))]
pub fn default_sampler() -> Box<dyn Sampler> {
    Box::new(SysinfoSampler::new())
}

/// Display name from a command line: the first word's basename followed by
/// the remaining arguments, e.g. `/usr/bin/python app.py` -> `python app.py`.
pub fn display_name(comm: &str, cmdline: &[String]) -> String {
    let mut args = cmdline.iter().filter(|a| !a.is_empty());
    let Some(first) = args.next() else {
        return comm.to_string();
    };

    // Some programs rewrite argv[0] into a single space-separated string.
    let (exe, inline_rest) = match first.split_once(' ') {
        Some((exe, rest)) => (exe, Some(rest)),
        None => (first.as_str(), None),
    };
    let exe = exe.rsplit('/').next().unwrap_or(exe);

    let mut name = exe.to_string();
    for part in inline_rest.into_iter().chain(args.map(String::as_str)) {
        name.push(' ');
        name.push_str(part);
    }

    if comm.len() >= name.len() {
        comm.to_string()
    } else {
        name
    }
}
