//! Logging and tracing setup

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` is used as the filter directive.
/// `format` is one of `json`, `pretty` or `compact` (the default).
pub fn initialize_logging(level: &str, format: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let fmt_layer = match format {
        "json" => fmt::layer().json().with_target(true).with_current_span(false).boxed(),
        "pretty" => fmt::layer().pretty().with_target(false).with_file(true).with_line_number(true).boxed(),
        _ => fmt::layer().compact().with_target(false).boxed(),
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init()?;

    Ok(())
}
