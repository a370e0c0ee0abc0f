// Infrastructure: tracing subscriber setup for the binary

use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber; `RUST_LOG` wins over `default_filter`
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // A second initialisation (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
