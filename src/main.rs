//! RenalGuard: renal tubular acidosis risk prediction
//!
//! Main entry point for the terminal application.

use anyhow::Result;
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use renalguard::adapters::sanitize::SanitizingMakeWriter;
use renalguard::config::AppConfig;
use renalguard::tui::App;

fn main() -> Result<()> {
    let config = AppConfig::from_env();

    // Logs written to the terminal would corrupt the TUI (alternate screen):
    // - interactive TTY: log to a file
    // - non-interactive: log to stdout
    let use_file = config.log_mode.use_file(std::io::stdout().is_terminal());

    let (writer, _guard) = if use_file {
        if let Some(parent) = config.log_file.parent() {
            // Best-effort: don't fail startup just because the directory is missing.
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
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(!use_file)
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    tracing::info!(model_dir = %config.model_dir.display(), "Starting RenalGuard...");

    App::new(&config).run()?;

    tracing::info!("RenalGuard shutdown complete.");
    Ok(())
}
