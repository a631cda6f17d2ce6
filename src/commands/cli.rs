use crate::config::{save_settings, Settings};
use crate::process::{MonitorOptions, ProcessMonitor, Sampler, TickOutcome};
use crate::ranking::{RankCriterion, TopSnapshot};
use anyhow::{bail, Context, Result};
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

pub struct CliHandler;

impl CliHandler {
    /// Two refreshes `delay` apart so CPU usage has a baseline, then one table
    /// per criterion.
    pub async fn show_top(
        sampler: Box<dyn Sampler>,
        options: MonitorOptions,
        delay: Duration,
        json: bool,
    ) -> Result<()> {
        let monitor = ProcessMonitor::new(sampler, options)?;
        info!(sampler = monitor.sampler_name(), top_n = monitor.top_n(), "sampling processes");

        let (monitor, baseline) = refresh_blocking(monitor).await?;
        if let TickOutcome::Skipped { reason, .. } = baseline {
            warn!("baseline sample failed, CPU usage will read as zero: {reason}");
        }
        tokio::time::sleep(delay).await;
        let (monitor, outcome) = refresh_blocking(monitor).await?;

        if let TickOutcome::Skipped { reason, .. } = outcome {
            bail!("Failed to sample processes: {reason}");
        }

        print!("{}", Self::render(&monitor.latest(), monitor.criteria(), json)?);
        Ok(())
    }

    /// Prints every published snapshot until `ticks` have been shown or
    /// Ctrl-C is pressed.
    pub async fn watch(
        sampler: Box<dyn Sampler>,
        options: MonitorOptions,
        interval: Duration,
        ticks: Option<u64>,
        json: bool,
    ) -> Result<()> {
        let monitor = ProcessMonitor::new(sampler, options)?;
        let criteria = monitor.criteria().to_vec();
        let mut updates = monitor.subscribe();
        info!(
            sampler = monitor.sampler_name(),
            interval_ms = interval.as_millis() as u64,
            "watching processes"
        );

        let (stop, stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(monitor.run(interval, async move {
            let _ = stopped.await;
        }));

        let mut shown = 0u64;
        loop {
            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = updates.borrow_and_update().clone();
                    print!("{}", Self::render(&snapshot, &criteria, json)?);
                    shown += 1;
                    if ticks.is_some_and(|limit| shown >= limit) {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    debug!("interrupted");
                    break;
                }
            }
        }

        let _ = stop.send(());
        let monitor = handle.await?.context("Monitor task failed")?;
        info!(ticks = monitor.tick(), shown, "stopped watching");
        Ok(())
    }

    pub fn show_config(settings: &Settings) -> Result<()> {
        print!("{}", settings.to_toml()?);
        Ok(())
    }

    pub fn init_config(path: Option<&Path>) -> Result<()> {
        let written = save_settings(&Settings::default(), path)?;
        println!("✅ Wrote default settings to {}", written.display());
        Ok(())
    }

    pub fn render(snapshot: &TopSnapshot, criteria: &[RankCriterion], json: bool) -> Result<String> {
        if json {
            let mut line = serde_json::to_string(snapshot).context("Failed to encode snapshot")?;
            line.push('\n');
            return Ok(line);
        }

        let mut out = String::new();
        writeln!(
            out,
            "Tick {}: {} processes, {} running",
            snapshot.tick, snapshot.total_processes, snapshot.running_processes
        )?;
        for &criterion in criteria {
            out.push_str(&Self::render_table(snapshot, criterion)?);
        }
        Ok(out)
    }

    pub fn render_table(snapshot: &TopSnapshot, criterion: RankCriterion) -> Result<String> {
        let mut out = String::new();
        let slots = snapshot.ranking(criterion).map_or(0, |r| r.len());

        writeln!(out, "Top {slots} {}:", criterion.title())?;
        writeln!(out, "┌──────────┬─────────────────────┬──────────┬─────────┬─────────────┬─────────┬─────────────┬─────────┐")?;
        writeln!(out, "│   PID    │       Process       │   User   │  CPU %  │   Memory    │  Mem %  │  CPU Time   │  I/O %  │")?;
        writeln!(out, "├──────────┼─────────────────────┼──────────┼─────────┼─────────────┼─────────┼─────────────┼─────────┤")?;

        for entry in snapshot.top(criterion) {
            writeln!(
                out,
                "│ {:>8} │ {:>19} │ {:>8} │ {:>7.1} │ {:>11} │ {:>7.1} │ {:>11} │ {:>7.1} │",
                entry.pid,
                truncate(&entry.name, 19),
                truncate(&entry.user, 8),
                entry.cpu_percent,
                entry.format_memory(),
                entry.mem_percent,
                entry.format_cpu_time(snapshot.tick_rate),
                entry.io_perc
            )?;
        }

        writeln!(out, "└──────────┴─────────────────────┴──────────┴─────────┴─────────────┴─────────┴─────────────┴─────────┘")?;
        Ok(out)
    }
}

async fn refresh_blocking<S>(mut monitor: ProcessMonitor<S>) -> Result<(ProcessMonitor<S>, TickOutcome)>
where
    S: Sampler + 'static,
{
    tokio::task::spawn_blocking(move || {
        let outcome = monitor.refresh();
        (monitor, outcome)
    })
    .await
    .context("Refresh task panicked")
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() > width {
        format!("{}…", name.chars().take(width - 1).collect::<String>())
    } else {
        name.to_string()
    }
}
