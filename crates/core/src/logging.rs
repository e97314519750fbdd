use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Directory holding the rolling log files, `~/.augur/logs`.
pub fn log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".augur/logs")
}

/// Daily appender writing `<component>.log.<date>` files under `log_dir`.
fn file_appender(log_dir: &Path, component: &str) -> io::Result<RollingFileAppender> {
    std::fs::create_dir_all(log_dir).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("cannot create log directory {}: {e}", log_dir.display()),
        )
    })?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(format!("{component}.log"))
        .build(log_dir)
        .map_err(|e| io::Error::other(format!("cannot log to {}: {e}", log_dir.display())))
}

pub fn init_logging(component: &str, to_stderr: bool) -> io::Result<WorkerGuard> {
    let file_appender = file_appender(&log_dir(), component)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    if to_stderr {
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);
        registry.with(stderr_layer).init();
    } else {
        registry.init();
    }

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_appender_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("nested/logs");
        file_appender(&logs, "server").unwrap();
        assert!(logs.is_dir());
    }

    #[test]
    fn test_file_appender_reports_unusable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("home");
        std::fs::write(&blocker, "").unwrap();

        let err = file_appender(&blocker.join(".augur/logs"), "server").unwrap_err();
        assert!(err.to_string().contains(".augur/logs"), "{err}");
    }
}
