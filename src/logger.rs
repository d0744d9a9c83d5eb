use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global tracing subscriber for the command line.
///
/// `RUST_LOG` takes precedence over the `verbose` flag. Output goes to stderr
/// so that stdout stays clean for CSV.
pub fn init_cli_logger(verbose: bool) {
    let default_filter = if verbose {
        "printdesk=debug,info"
    } else {
        "printdesk=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}
