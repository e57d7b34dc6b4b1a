use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize a tracing subscriber.
///
/// Logs go to stderr in compact form. `RUST_LOG` takes precedence; otherwise
/// the level is "info", or "debug" when `verbose` is set. When `log_file` is
/// given, the same events are appended to it without ANSI colors.
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_level(true)
        .compact();

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{info, warn};

    #[test]
    fn test_logging_init_with_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let log = temp.path().join("logs").join("status-keeper.log");

        // Only the first init in a process succeeds
        if init(false, Some(&log)).is_ok() {
            info!("This is an info message");
            warn!("This is a warning message");
            assert!(log.exists());
        }
    }
}
