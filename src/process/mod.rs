pub mod monitor;
pub mod record;
pub mod registry;
pub mod sampler;

pub use monitor::{MonitorOptions, ProcessMonitor, TickOutcome};
pub use record::{ProcessRecord, TickContext};
pub use registry::{ProcessRegistry, RecordHandle};
pub use sampler::{Backend, Pid, RawSample, SampleBatch, Sampler};
