use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};
use tokio::task;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

const MAX_LOG_AGE: Duration = Duration::from_secs(60 * 60 * 24 * 7);
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Keeps the file writer flushing; drop it on shutdown only
#[allow(dead_code)]
pub struct LoggerGuard(WorkerGuard);

/// Map a configured level name onto a filter, falling back to `info`
fn parse_level(level: &str) -> LevelFilter {
    match level.to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'info'", level);
            LevelFilter::INFO
        }
    }
}

/// Console plus daily-rotated file output. `RUST_LOG` overrides `level`.
///
/// Must be called from within a tokio runtime: old files are pruned by a
/// background task.
pub fn init_logging(
    log_dir: impl AsRef<Path>,
    prefix: &str,
    level: &str,
) -> anyhow::Result<LoggerGuard> {
    let log_dir = log_dir.as_ref().to_path_buf();
    fs::create_dir_all(&log_dir)?;

    let builder = EnvFilter::builder().with_default_directive(parse_level(level).into());
    let rust_log = std::env::var("RUST_LOG").unwrap_or_default();
    let console_filter = builder.clone().parse_lossy(&rust_log);
    let file_filter = builder.parse_lossy(&rust_log);

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(&log_dir)?;
    let (non_blocking, guard) = NonBlocking::new(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(file_filter);
    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .try_init()?;

    start_log_cleanup_task(log_dir, prefix.to_string());

    Ok(LoggerGuard(guard))
}

fn start_log_cleanup_task(log_dir: PathBuf, prefix: String) {
    task::spawn(async move {
        loop {
            match cleanup_old_logs(&log_dir, &prefix, MAX_LOG_AGE, SystemTime::now()) {
                Ok(removed) if removed > 0 => {
                    tracing::info!("Removed {} old log file(s)", removed)
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Failed to clean up old log files: {}", e),
            }
            tokio::time::sleep(CLEANUP_INTERVAL).await;
        }
    });
}

/// Delete `<prefix>*.log` files older than `max_age`; returns how many
fn cleanup_old_logs(
    log_dir: &Path,
    prefix: &str,
    max_age: Duration,
    now: SystemTime,
) -> std::io::Result<usize> {
    let mut removed = 0;

    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !file_name.starts_with(prefix) || !file_name.ends_with(".log") {
            continue;
        }

        let modified = fs::metadata(&path)?.modified()?;
        if now.duration_since(modified).unwrap_or_default() > max_age {
            fs::remove_file(&path)?;
            tracing::debug!("Old log file deleted: {}", file_name);
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), LevelFilter::DEBUG);
        assert_eq!(parse_level("WARN"), LevelFilter::WARN);
        assert_eq!(parse_level("verbose"), LevelFilter::INFO);
    }

    #[test]
    fn test_cleanup_only_touches_own_old_logs() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("satvis-backend.2026-01-01.log"), "old").unwrap();
        fs::write(dir.path().join("other.2026-01-01.log"), "foreign").unwrap();
        fs::write(dir.path().join("satvis-backend.txt"), "not a log").unwrap();

        // Pretend a month has passed
        let later = SystemTime::now() + Duration::from_secs(60 * 60 * 24 * 30);
        let removed = cleanup_old_logs(dir.path(), "satvis-backend", MAX_LOG_AGE, later).unwrap();

        assert_eq!(removed, 1);
        assert!(!dir.path().join("satvis-backend.2026-01-01.log").exists());
        assert!(dir.path().join("other.2026-01-01.log").exists());
        assert!(dir.path().join("satvis-backend.txt").exists());
    }

    #[test]
    fn test_cleanup_keeps_fresh_logs() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("satvis-backend.2026-10-17.log"), "fresh").unwrap();
        let removed =
            cleanup_old_logs(dir.path(), "satvis-backend", MAX_LOG_AGE, SystemTime::now()).unwrap();
        assert_eq!(removed, 0);
    }
}
