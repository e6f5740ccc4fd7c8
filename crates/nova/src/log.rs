//! Logging for nova.
use anyhow::Context;
use nova_core::get_data_dir;
use std::io::LineWriter;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::time::OffsetTime;

const MAX_LOG_SIZE: u64 = 100 * 1024;

/// Renames `nova.log` to `nova.log.old` once it grows past 100KB.
///
/// Returns the path of the log file to append to.
fn rotate_log(data_dir: &Path) -> std::io::Result<PathBuf> {
    let log_path = data_dir.join("nova.log");

    if log_path.exists() {
        let metadata = std::fs::metadata(&log_path)?;
        if metadata.len() > MAX_LOG_SIZE {
            let backup_path = data_dir.join("nova.log.old");
            if backup_path.exists() {
                std::fs::remove_file(&backup_path)?;
            }
            std::fs::rename(&log_path, backup_path)?;
        }
    }
    Ok(log_path)
}

/// Initializes file-based logging at `<data_dir>/nova.log`.
///
/// Logs from nova crates are written at DEBUG level, the HTTP stack at INFO.
pub fn setup_logging() -> anyhow::Result<()> {
    let data_dir = get_data_dir().context("Failed to get data directory")?;
    let log_path = rotate_log(&data_dir)?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    // Ensure the logs are flushed after every line
    let writer = Mutex::new(LineWriter::new(log_file));

    tracing_subscriber::fmt()
        .with_env_filter("nova=debug,nova_core=debug,axum=info,hf_hub=info")
        .with_writer(writer)
        .with_ansi(false)
        .with_timer(OffsetTime::local_rfc_3339()?)
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_log_keeps_small_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("nova.log"), "short").unwrap();

        let log_path = rotate_log(dir.path()).unwrap();
        assert_eq!(log_path, dir.path().join("nova.log"));
        assert!(log_path.exists());
        assert!(!dir.path().join("nova.log.old").exists());
    }

    #[test]
    fn test_rotate_log_moves_large_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("nova.log.old"), "older").unwrap();
        std::fs::write(dir.path().join("nova.log"), vec![b'x'; 200 * 1024]).unwrap();

        let log_path = rotate_log(dir.path()).unwrap();
        assert!(!log_path.exists());
        let backup = std::fs::metadata(dir.path().join("nova.log.old")).unwrap();
        assert_eq!(backup.len(), 200 * 1024);
    }
}
