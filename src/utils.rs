use crate::error::ExportResult;
use std::{
    fmt::Display,
    fs,
    path::{Path, PathBuf},
    process,
    sync::Mutex,
};
use time::{macros::format_description, OffsetDateTime};
use tracing::error;
use tracing_subscriber::EnvFilter;

pub fn ensure_dir(path: &Path) -> ExportResult<()> {
    if !path.is_dir() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// `TableExport_2024-9-3_01-05PM.log`
pub fn log_file_name(now: OffsetDateTime) -> String {
    let format = format_description!(
        "[year]-[month padding:none]-[day padding:none]_[hour repr:12]-[minute][period]"
    );
    let stamp = now
        .format(format)
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    format!("TableExport_{stamp}.log")
}

/// Routes tracing output to a fresh log file under `log_dir`, returns its path.
pub fn init_logging(log_dir: &Path) -> ExportResult<PathBuf> {
    ensure_dir(log_dir)?;
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let path = log_dir.join(log_file_name(now));
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(path)
}

pub fn exit_on_error<T, E: Display>(res: Result<T, E>) -> T {
    match res {
        Ok(v) => v,
        Err(e) => {
            let _ = crossterm::terminal::disable_raw_mode();
            error!("{e}");
            eprintln!("{e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use time::macros::datetime;

    #[test]
    fn log_name_uses_twelve_hour_clock() {
        let name = log_file_name(datetime!(2024-09-03 13:05 UTC));
        assert_eq!(name, "TableExport_2024-9-3_01-05PM.log");
        let name = log_file_name(datetime!(2024-12-25 09:30 UTC));
        assert_eq!(name, "TableExport_2024-12-25_09-30AM.log");
    }

    #[test]
    fn ensure_dir_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b");
        ensure_dir(&nested).unwrap();
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
