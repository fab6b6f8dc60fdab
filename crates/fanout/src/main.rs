//! `fanout` binary: seed the store, run the event query, print what happened.
//!
//! stdout carries the transcript; tracing output goes to stderr and is
//! controlled by `RUST_LOG` (default `warn`).

use fanout::HarnessConfig;
use fanout_console::Console;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let config = match HarnessConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            Console::new().error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };
    let console = Console::with_mode(config.output);

    console.print(&format!(
        "fanout {} (SQLite {})",
        env!("CARGO_PKG_VERSION"),
        fanout_sqlite::sqlite_version()
    ));

    match fanout::run(&config, &console) {
        Ok(report) => {
            fanout::print_summary(&console, &report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            console.error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
