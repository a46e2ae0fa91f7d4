//! Process-wide logging setup.

use tracing::subscriber;
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

/// Installs the global subscriber and routes `log` records through it.
///
/// `RUST_LOG` overrides `default_filter` when set.
pub fn init(default_filter: &str) -> anyhow::Result<()> {
    LogTracer::init()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true));
    subscriber::set_global_default(registry)?;

    Ok(())
}
