//! Tracing initialisation for the crewline binary.
//!
//! Log lines go to stdout alongside the printed result. HTTP client crates
//! are capped at `warn` unless `RUST_LOG` says otherwise.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const QUIET_DEPENDENCIES: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls", "h2"];

/// Filter directives used when `RUST_LOG` is not set.
pub fn default_directives(level: Level) -> String {
    let mut directives = vec![level.as_str().to_ascii_lowercase()];
    directives.extend(QUIET_DEPENDENCIES.iter().map(|krate| format!("{krate}=warn")));
    directives.join(",")
}

/// Install the global subscriber. `json` switches to newline-delimited JSON.
///
/// Only the first call in a process takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let base = fmt::layer().with_target(false).with_writer(std::io::stdout);
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(base.json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(base)
            .try_init()
            .ok();
    }
}
