/// Installs the global subscriber.
///
/// `RUST_LOG` picks the filter (default `info`); for example
/// `RUST_LOG=supermart::cache=debug` shows every hit, miss and stale fill.
pub fn setup_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .compact()
        .init();
}
