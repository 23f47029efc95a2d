use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

/// URLs that never touch the filesystem.
fn is_in_memory(db_url: &str) -> bool {
    db_url == "sqlite::memory:" || db_url.contains("mode=memory")
}

/// Turn a bare or relative path into an absolute `sqlite://` URL.
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if is_in_memory(trimmed) || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file and its parent directories if missing.
pub fn prepare_sqlite_file(db_url: &str) -> anyhow::Result<()> {
    if is_in_memory(db_url) {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid --db value: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid --db value: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("create database file {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_and_full_urls_pass_through() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite://tmp/x.sqlite3"),
            "sqlite://tmp/x.sqlite3"
        );
        let shared = "sqlite:file:memdb?mode=memory&cache=shared";
        assert_eq!(normalize_sqlite_url(shared), shared);
    }

    #[test]
    fn relative_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/tracker.sqlite3");
        let path = url.strip_prefix("sqlite://").unwrap();
        assert!(Path::new(path).is_absolute());
        assert!(path.ends_with("tracker.sqlite3"));
    }

    #[test]
    fn prepare_rejects_unknown_scheme() {
        assert!(prepare_sqlite_file("postgres://localhost/db").is_err());
        assert!(prepare_sqlite_file("sqlite://").is_err());
        assert!(prepare_sqlite_file("sqlite::memory:").is_ok());
    }
}
