#[cfg(test)]
use mockall::mock;

use crate::error::SampleError;
use crate::process::{SampleBatch, Sampler};
use std::collections::VecDeque;

/// Replays one scripted result per tick. Once the script runs out every
/// further tick fails, which the monitor treats like any sampling failure.
pub struct ScriptedSampler {
    script: VecDeque<Result<SampleBatch, SampleError>>,
}

impl ScriptedSampler {
    pub fn new(script: Vec<Result<SampleBatch, SampleError>>) -> Self {
        Self {
            script: script.into(),
        }
    }

    pub fn push(&mut self, step: Result<SampleBatch, SampleError>) {
        self.script.push_back(step);
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Sampler for ScriptedSampler {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn sample(&mut self) -> Result<SampleBatch, SampleError> {
        self.script
            .pop_front()
            .unwrap_or_else(|| Err(SampleError::Unavailable("script exhausted".to_string())))
    }
}

/// Transient failure as a sampler would report an unreadable `/proc`.
pub fn sampling_failure() -> SampleError {
    SampleError::Io(std::io::Error::new(
        std::io::ErrorKind::PermissionDenied,
        "/proc: permission denied",
    ))
}

#[cfg(test)]
mock! {
    pub ProcessSampler {}

    impl Sampler for ProcessSampler {
        fn name(&self) -> &'static str;
        fn sample(&mut self) -> Result<SampleBatch, SampleError>;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::{batch, raw_sample};

    #[test]
    fn test_scripted_sampler_replays_in_order() {
        let mut sampler = ScriptedSampler::new(vec![
            Ok(batch(100, vec![raw_sample(1, "a", 0, 0)])),
            Err(sampling_failure()),
        ]);
        assert_eq!(sampler.remaining(), 2);

        assert_eq!(sampler.sample().unwrap().total_ticks, 100);
        assert!(matches!(sampler.sample(), Err(SampleError::Io(_))));
        assert!(matches!(sampler.sample(), Err(SampleError::Unavailable(_))));
    }

    #[test]
    fn test_mock_sampler() {
        let mut mock = MockProcessSampler::new();
        mock.expect_sample()
            .times(1)
            .returning(|| Ok(batch(42, vec![])));

        assert_eq!(mock.sample().unwrap().total_ticks, 42);
    }
}
