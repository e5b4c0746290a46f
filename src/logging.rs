use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber for the command-line binary.
///
/// `RUST_LOG` wins when set; otherwise `teller=info`, or `teller=debug`
/// with `verbose`. Output goes to stderr so table output on stdout stays clean.
pub fn init_cli_logger(verbose: bool) {
    let default_filter = if verbose { "teller=debug" } else { "teller=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Ignore a second init (e.g. when embedded in a host that already installed one)
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();
}
