use crate::process::{RawSample, SampleBatch};

/// Raw sample with only the fields most tests care about.
pub fn raw_sample(pid: u32, name: &str, user_ticks: u64, rss: u64) -> RawSample {
    RawSample {
        pid,
        name: name.to_string(),
        basename: name.split(' ').next().unwrap_or(name).to_string(),
        uid: 501,
        user: "dev".to_string(),
        user_ticks,
        kernel_ticks: 0,
        rss_bytes: rss,
        vsize_bytes: rss * 2,
        read_bytes: 0,
        write_bytes: 0,
        running: false,
    }
}

pub const TOTAL_MEMORY: u64 = 16 * 1024 * 1024 * 1024;

/// Batch from a single-CPU, 16 GiB machine ticking at 100 Hz.
pub fn batch(total_ticks: u64, processes: Vec<RawSample>) -> SampleBatch {
    SampleBatch {
        total_ticks,
        cpu_count: 1,
        tick_rate: 100,
        total_memory: TOTAL_MEMORY,
        processes,
    }
}

/// A process table resembling a developer workstation.
pub fn realistic_samples() -> Vec<RawSample> {
    vec![
        raw_sample(1, "systemd", 1_200, 12 * 1024 * 1024),
        raw_sample(100, "node server.js", 45_200, 512 * 1024 * 1024),
        raw_sample(101, "python manage.py runserver", 23_100, 256 * 1024 * 1024),
        raw_sample(102, "chrome", 15_800, 2 * 1024 * 1024 * 1024),
        raw_sample(103, "code", 8_400, 400 * 1024 * 1024),
        raw_sample(104, "dockerd", 12_100, 300 * 1024 * 1024),
        raw_sample(105, "rust-analyzer", 3_200, 150 * 1024 * 1024),
    ]
}

/// Advances every sample in `samples` by `ticks` of user time and `bytes` of reads.
pub fn advance(samples: &[RawSample], ticks: u64, bytes: u64) -> Vec<RawSample> {
    samples
        .iter()
        .map(|s| RawSample {
            user_ticks: s.user_ticks + ticks,
            read_bytes: s.read_bytes + bytes,
            ..s.clone()
        })
        .collect()
}
