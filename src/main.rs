//! Nephrolens: eGFR calculation and CKD staging
//!
//! Main entry point for the terminal application.

use std::io::IsTerminal;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nephrolens::adapters::redact::RedactingMakeWriter;
use nephrolens::tui::App;
use nephrolens::AppConfig;

fn main() -> Result<()> {
    let config = AppConfig::from_env();

    // Logs written to the terminal would corrupt the TUI (alternate screen),
    // so `auto` sends them to a file when stdout is interactive.
    let use_file = config.log_mode.use_file(std::io::stdout().is_terminal());

    let (writer, _guard) = if use_file {
        if let Some(parent) = config.log_file.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(RedactingMakeWriter::new(writer)))
        .init();

    for warning in &config.warnings {
        tracing::warn!("{}", warning);
    }

    tracing::info!(
        "Starting Nephrolens (db={}, mdrd={})",
        config.db_path.display(),
        config.coefficients.name()
    );

    let mut app = App::new(&config)?;
    app.run()?;

    tracing::info!("Nephrolens shutdown complete.");
    Ok(())
}
