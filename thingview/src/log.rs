use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Installs a `tracing` subscriber filtered by `RUST_LOG`, defaulting to
/// `info`. Records emitted through the `log` facade are forwarded too.
///
/// Calling it more than once is harmless; later calls leave the first
/// subscriber in place.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let res = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    if let Err(e) = res {
        tracing::debug!("subscriber already installed: {e}");
    }
}
