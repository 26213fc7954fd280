use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `info` by default; with `debug` enabled the
/// level drops to `debug` and `RUST_LOG` is honoured.
///
/// Safe to call more than once, later calls are ignored.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_does_not_panic() {
        init(false);
        init(true);
        tracing::info!("logging initialised twice");
    }
}
