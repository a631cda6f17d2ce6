use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use proctop::commands::CliHandler;
use proctop::config::{load_settings, Settings};
use proctop::logging::init_tracing;
use proctop::process::sampler::sampler_for;
use proctop::process::Backend;
use proctop::ranking::RankCriterion;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "proctop")]
#[command(about = "Lightweight top-K process monitor ranking processes by CPU, memory, time and I/O")]
#[command(version)]
#[command(author = "Pedro Nieto")]
struct Cli {
    /// Settings file (defaults to $PROCTOP_CONFIG, then the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Where process samples come from
    #[arg(long, global = true, value_enum, default_value_t = Backend::Auto)]
    backend: Backend,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RankArgs {
    /// Ranking criteria (repeatable); defaults to the configured ones
    #[arg(long = "by", value_enum)]
    by: Vec<RankCriterion>,
    /// Number of processes per ranking
    #[arg(short = 'n', long)]
    limit: Option<usize>,
    /// Print snapshots as JSON lines
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample twice and print the top processes
    Top {
        #[command(flatten)]
        rank: RankArgs,
        /// Delay between the two samples
        #[arg(long, default_value = "500")]
        delay_ms: u64,
    },
    /// Keep refreshing and print every snapshot
    Watch {
        #[command(flatten)]
        rank: RankArgs,
        /// Refresh period (defaults to the configured interval)
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Stop after this many snapshots
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Print the effective settings
    Config {
        /// Write the default settings file instead
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { init: true } = cli.command {
        return CliHandler::init_config(cli.config.as_deref());
    }

    let mut settings = load_settings(cli.config.as_deref())?;
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        settings.log_filter.clone()
    };
    init_tracing(&filter, cli.log_json)?;

    match cli.command {
        Commands::Top { rank, delay_ms } => {
            apply_rank_args(&mut settings, &rank)?;
            let sampler = sampler_for(cli.backend)?;
            CliHandler::show_top(
                sampler,
                settings.monitor_options(),
                Duration::from_millis(delay_ms),
                rank.json,
            )
            .await?;
        }
        Commands::Watch {
            rank,
            interval_ms,
            ticks,
        } => {
            apply_rank_args(&mut settings, &rank)?;
            if let Some(interval_ms) = interval_ms {
                settings.interval_ms = interval_ms;
                settings.validate()?;
            }
            let sampler = sampler_for(cli.backend)?;
            CliHandler::watch(
                sampler,
                settings.monitor_options(),
                settings.interval(),
                ticks,
                rank.json,
            )
            .await?;
        }
        Commands::Config { .. } => {
            CliHandler::show_config(&settings)?;
        }
    }

    Ok(())
}

fn apply_rank_args(settings: &mut Settings, rank: &RankArgs) -> Result<()> {
    if !rank.by.is_empty() {
        settings.criteria = rank.by.clone();
    }
    if let Some(limit) = rank.limit {
        settings.top_n = limit;
    }
    settings.validate()
}
