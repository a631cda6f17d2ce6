use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber, writing to stderr so stdout stays free for
/// tables and JSON. `RUST_LOG` takes precedence over `filter`.
pub fn init_tracing(filter: &str, json: bool) -> Result<()> {
    let env_filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::try_new(filter)?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    if json {
        builder
            .json()
            .flatten_event(true)
            .try_init()
            .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
    } else {
        builder
            .with_target(false)
            .try_init()
            .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
    }
}
