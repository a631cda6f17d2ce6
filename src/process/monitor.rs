//! Drives one refresh cycle per tick: sample, upsert, sweep, rank, publish.
//!
//! The monitor is the only writer of its registry. Readers never see the
//! registry itself, only the `Arc<TopSnapshot>` published at the end of a
//! successful tick through a `watch` channel.

use crate::error::{MonitorError, SelectorError};
use crate::process::record::TickContext;
use crate::process::registry::ProcessRegistry;
use crate::process::sampler::Sampler;
use crate::ranking::{rank, RankCriterion, TopSnapshot};
use regex::RegexSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinError;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorOptions {
    pub top_n: usize,
    pub criteria: Vec<RankCriterion>,
    pub per_core_cpu: bool,
    /// Regex patterns; matching processes are tracked but never ranked.
    pub exclude: Vec<String>,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            criteria: vec![RankCriterion::Cpu, RankCriterion::Memory],
            per_core_cpu: false,
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Published { tick: u64, removed: usize },
    /// Nothing was published; the previous snapshot stays current.
    Skipped { tick: u64, reason: String },
}

impl TickOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, TickOutcome::Published { .. })
    }
}

pub struct ProcessMonitor<S = Box<dyn Sampler>> {
    sampler: S,
    registry: ProcessRegistry,
    tick: u64,
    previous_total_ticks: Option<u64>,
    last_sample_at: Option<Instant>,
    top_n: usize,
    criteria: Vec<RankCriterion>,
    per_core_cpu: bool,
    exclude: Option<RegexSet>,
    published: watch::Sender<Arc<TopSnapshot>>,
}

impl<S: Sampler> ProcessMonitor<S> {
    pub fn new(sampler: S, options: MonitorOptions) -> Result<Self, MonitorError> {
        if options.top_n == 0 {
            return Err(SelectorError::ZeroCapacity.into());
        }

        let mut criteria = options.criteria;
        criteria.sort();
        criteria.dedup();
        if criteria.is_empty() {
            return Err(MonitorError::NoCriteria);
        }

        let exclude = if options.exclude.is_empty() {
            None
        } else {
            Some(RegexSet::new(&options.exclude)?)
        };

        let (published, _) = watch::channel(Arc::new(TopSnapshot::default()));

        Ok(Self {
            sampler,
            registry: ProcessRegistry::new(),
            tick: 0,
            previous_total_ticks: None,
            last_sample_at: None,
            top_n: options.top_n,
            criteria,
            per_core_cpu: options.per_core_cpu,
            exclude,
            published,
        })
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn criteria(&self) -> &[RankCriterion] {
        &self.criteria
    }

    pub fn sampler_name(&self) -> &'static str {
        self.sampler.name()
    }

    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    /// Most recently published snapshot.
    pub fn latest(&self) -> Arc<TopSnapshot> {
        self.published.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<TopSnapshot>> {
        self.published.subscribe()
    }

    /// Runs one full tick. A sampling failure skips the tick and leaves the
    /// registry and the published snapshot untouched.
    pub fn refresh(&mut self) -> TickOutcome {
        self.tick += 1;
        let tick = self.tick;

        let batch = match self.sampler.sample() {
            Ok(batch) => batch,
            Err(e) => {
                warn!(
                    tick,
                    sampler = self.sampler.name(),
                    "sampling failed, keeping previous snapshot: {e}"
                );
                return TickOutcome::Skipped {
                    tick,
                    reason: e.to_string(),
                };
            }
        };

        let now = Instant::now();
        let elapsed = self
            .last_sample_at
            .map(|at| now.duration_since(at))
            .unwrap_or_default();
        // Once per tick, so every process is measured against the same interval.
        let elapsed_ticks = self
            .previous_total_ticks
            .map(|prev| batch.total_ticks.saturating_sub(prev))
            .unwrap_or(0);
        self.previous_total_ticks = Some(batch.total_ticks);
        self.last_sample_at = Some(now);

        let mut ctx =
            TickContext::new(tick, elapsed_ticks, elapsed).with_total_memory(batch.total_memory);
        if self.per_core_cpu {
            ctx = ctx.per_core(batch.cpu_count);
        }

        for sample in &batch.processes {
            self.registry.upsert(sample, &ctx);
        }
        let removed = self.registry.sweep(tick);
        self.registry.distribute_io_share();

        match self.build_snapshot(tick, batch.tick_rate) {
            Ok(snapshot) => {
                debug!(
                    tick,
                    processes = snapshot.total_processes,
                    removed,
                    elapsed_ticks,
                    "published snapshot"
                );
                self.published.send_replace(Arc::new(snapshot));
                TickOutcome::Published { tick, removed }
            }
            Err(e) => {
                warn!(tick, "ranking failed, keeping previous snapshot: {e}");
                TickOutcome::Skipped {
                    tick,
                    reason: e.to_string(),
                }
            }
        }
    }

    fn is_excluded(&self, name: &str, basename: &str) -> bool {
        self.exclude
            .as_ref()
            .is_some_and(|set| set.is_match(name) || set.is_match(basename))
    }

    fn build_snapshot(&self, tick: u64, tick_rate: u64) -> Result<TopSnapshot, SelectorError> {
        let mut snapshot = TopSnapshot {
            tick,
            tick_rate,
            total_processes: self.registry.len(),
            running_processes: self.registry.all_live().filter(|p| p.running).count(),
            ..Default::default()
        };

        for &criterion in &self.criteria {
            let candidates = self
                .registry
                .all_live()
                .filter(|p| !self.is_excluded(&p.name, &p.basename));
            let ranked = rank(candidates, criterion, self.top_n)?;
            snapshot.rankings.insert(criterion, ranked);
        }
        Ok(snapshot)
    }
}

impl<S: Sampler + 'static> ProcessMonitor<S> {
    /// Refreshes every `period` until `shutdown` resolves, then hands the
    /// monitor back. Each refresh runs on the blocking pool; ticks that fall
    /// behind are delayed rather than overlapped.
    pub async fn run<F>(self, period: Duration, shutdown: F) -> Result<Self, JoinError>
    where
        F: Future<Output = ()>,
    {
        let mut monitor = self;
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }
            monitor = tokio::task::spawn_blocking(move || {
                monitor.refresh();
                monitor
            })
            .await?;
        }
        Ok(monitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SampleError;
    use crate::testing::fixtures::{batch, raw_sample};
    use crate::testing::mocks::{MockProcessSampler, ScriptedSampler};

    fn options(top_n: usize, criteria: &[RankCriterion]) -> MonitorOptions {
        MonitorOptions {
            top_n,
            criteria: criteria.to_vec(),
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_zero_top_n() {
        let result = ProcessMonitor::new(ScriptedSampler::new(vec![]), options(0, &[RankCriterion::Cpu]));
        assert!(matches!(result, Err(MonitorError::InvalidTopN(_))));
    }

    #[test]
    fn test_rejects_empty_criteria() {
        let result = ProcessMonitor::new(ScriptedSampler::new(vec![]), options(5, &[]));
        assert!(matches!(result, Err(MonitorError::NoCriteria)));
    }

    #[test]
    fn test_rejects_bad_exclude_pattern() {
        let opts = MonitorOptions {
            exclude: vec!["(unclosed".to_string()],
            ..Default::default()
        };
        let result = ProcessMonitor::new(ScriptedSampler::new(vec![]), opts);
        assert!(matches!(result, Err(MonitorError::InvalidPattern(_))));
    }

    #[test]
    fn test_criteria_are_deduplicated() {
        let monitor = ProcessMonitor::new(
            ScriptedSampler::new(vec![]),
            options(3, &[RankCriterion::Io, RankCriterion::Cpu, RankCriterion::Io]),
        )
        .unwrap();
        assert_eq!(monitor.criteria(), &[RankCriterion::Cpu, RankCriterion::Io]);
    }

    #[test]
    fn test_first_tick_reports_zero_cpu() {
        let sampler = ScriptedSampler::new(vec![Ok(batch(
            1_000,
            vec![raw_sample(1, "a", 500, 10), raw_sample(2, "b", 900, 20)],
        ))]);
        let mut monitor = ProcessMonitor::new(sampler, options(5, &[RankCriterion::Cpu])).unwrap();

        assert!(monitor.refresh().is_published());
        let snapshot = monitor.latest();
        assert!(snapshot.top(RankCriterion::Cpu).all(|e| e.cpu_percent == 0.0));
        assert_eq!(snapshot.total_processes, 2);
    }

    #[test]
    fn test_only_requested_criteria_are_ranked() {
        let sampler = ScriptedSampler::new(vec![Ok(batch(100, vec![raw_sample(1, "a", 0, 10)]))]);
        let mut monitor = ProcessMonitor::new(sampler, options(2, &[RankCriterion::Memory])).unwrap();
        monitor.refresh();

        let snapshot = monitor.latest();
        assert!(snapshot.ranking(RankCriterion::Memory).is_some());
        assert!(snapshot.ranking(RankCriterion::Cpu).is_none());
        assert_eq!(snapshot.ranking(RankCriterion::Memory).unwrap().len(), 2);
    }

    #[test]
    fn test_excluded_processes_are_tracked_but_not_ranked() {
        let sampler = ScriptedSampler::new(vec![Ok(batch(
            100,
            vec![raw_sample(1, "kworker/0:1", 0, 999), raw_sample(2, "bash", 0, 10)],
        ))]);
        let opts = MonitorOptions {
            top_n: 5,
            criteria: vec![RankCriterion::Memory],
            exclude: vec!["^kworker".to_string()],
            ..Default::default()
        };
        let mut monitor = ProcessMonitor::new(sampler, opts).unwrap();
        monitor.refresh();

        assert!(monitor.registry().lookup(1).is_some());
        assert_eq!(monitor.latest().pids(RankCriterion::Memory), vec![2]);
    }

    #[test]
    fn test_running_count() {
        let mut busy = raw_sample(1, "busy", 0, 10);
        busy.running = true;
        let sampler = ScriptedSampler::new(vec![Ok(batch(100, vec![busy, raw_sample(2, "idle", 0, 10)]))]);
        let mut monitor = ProcessMonitor::new(sampler, options(5, &[RankCriterion::Cpu])).unwrap();
        monitor.refresh();
        assert_eq!(monitor.latest().running_processes, 1);
    }

    #[test]
    fn test_mock_sampler_failure_keeps_previous_snapshot() {
        let mut mock = MockProcessSampler::new();
        let mut calls = 0;
        mock.expect_name().return_const("mock");
        mock.expect_sample().times(2).returning(move || {
            calls += 1;
            if calls == 1 {
                Ok(batch(100, vec![raw_sample(1, "a", 0, 10)]))
            } else {
                Err(SampleError::Unavailable("permission denied".to_string()))
            }
        });

        let mut monitor = ProcessMonitor::new(mock, options(3, &[RankCriterion::Memory])).unwrap();
        assert!(monitor.refresh().is_published());
        let before = monitor.latest();

        let outcome = monitor.refresh();
        assert!(matches!(outcome, TickOutcome::Skipped { tick: 2, .. }));
        assert_eq!(*monitor.latest(), *before);
        assert_eq!(monitor.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_run_publishes_until_shutdown() {
        let batches = (1..=50)
            .map(|i| Ok(batch(i * 100, vec![raw_sample(1, "a", i * 10, 10)])))
            .collect();
        let monitor = ProcessMonitor::new(ScriptedSampler::new(batches), options(1, &[RankCriterion::Cpu])).unwrap();
        let mut rx = monitor.subscribe();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(monitor.run(Duration::from_millis(5), async move {
            let _ = stop_rx.await;
        }));

        rx.changed().await.unwrap();
        rx.changed().await.unwrap();
        let _ = stop_tx.send(());

        let monitor = handle.await.unwrap().unwrap();
        assert!(monitor.tick() >= 2);
        assert_eq!(monitor.latest().pids(RankCriterion::Cpu), vec![1]);
    }
}
