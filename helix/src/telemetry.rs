use crate::config::{LogConfig, LogFormat};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Install the global subscriber: `EnvFilter` plus a pretty or JSON fmt layer.
///
/// `RUST_LOG` wins over [`LogConfig::filter`]. Fails if a global subscriber
/// is already set.
pub fn init_tracing(config: &LogConfig) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    match config.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false);

            Registry::default()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false);

            Registry::default()
                .with(env_filter)
                .with(fmt_layer)
                .try_init()
        }
    }
}
