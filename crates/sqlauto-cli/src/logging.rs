//! Logging setup

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const CRATES: [&str; 4] = [
    "sqlauto",
    "sqlauto_core",
    "sqlauto_driver_mssql",
    "sqlauto_procedures",
];

/// Filter used when `RUST_LOG` is not set
pub fn default_filter(level: &str) -> String {
    let mut filter = String::from("warn");
    for krate in CRATES {
        filter.push_str(&format!(",{krate}={level}"));
    }
    filter
}

/// Install the stderr subscriber; `RUST_LOG` overrides `level`
pub fn init(level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .try_init()
    {
        eprintln!("logging already initialised: {err}");
    }
}
