//! Diagnostic logging.
//!
//! Log lines go to stderr so command output on stdout stays pipeable.
//! The filter comes from `INKPAD_LOG` (standard `EnvFilter` syntax, e.g.
//! `INKPAD_LOG=inkpad=debug`); without it only warnings are shown, or
//! debug output with `--verbose`.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "INKPAD_LOG";

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "inkpad=debug,inkpad_core=debug"
    } else {
        "warn"
    }
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    // already installed (tests, embedding hosts)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
