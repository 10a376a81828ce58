// Log output for the CLI. Library crates log through the `log` facade;
// the subscriber's log bridge forwards those records here. Everything goes
// to stderr so `--json` output on stdout stays clean.

use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "warn";

/// Install the global subscriber.
///
/// `--quiet` silences everything, `--verbose` honours `RUST_LOG` and falls
/// back to `info`, otherwise the configured level (or `warn`) applies.
pub fn init(verbose: bool, quiet: bool, configured: Option<&str>) {
    let filter = build_filter(verbose, quiet, configured);
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
    {
        eprintln!("warning: logging disabled: {}", e);
    }
}

fn build_filter(verbose: bool, quiet: bool, configured: Option<&str>) -> EnvFilter {
    if quiet {
        return EnvFilter::new("off");
    }
    if verbose {
        return EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    }
    let level = configured.unwrap_or(DEFAULT_LEVEL);
    EnvFilter::try_new(level).unwrap_or_else(|_| {
        eprintln!("warning: invalid log.level '{}', using {}", level, DEFAULT_LEVEL);
        EnvFilter::new(DEFAULT_LEVEL)
    })
}
