//! Structured logging setup (SPEC_FULL.md A.2): `tracing` + `tracing-
//! subscriber`, configured once at CLI startup from `RUST_LOG`/`--verbose`.

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber. `verbose` raises the default
/// filter to `debug` when `RUST_LOG` is not set; `RUST_LOG` always wins.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("cobbler={default_level}")));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}
