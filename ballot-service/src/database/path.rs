use anyhow::{bail, Result};
use std::{
    fs,
    path::{Component, Path, PathBuf},
};

/// Where the ballot store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    Memory,
    File(PathBuf),
}

/// Validate a configured database path and classify it.
pub fn resolve_db_location(db_path: &str) -> Result<DbLocation> {
    if db_path == ":memory:" || db_path == "sqlite::memory:" {
        return Ok(DbLocation::Memory);
    }

    if db_path.trim().is_empty() {
        bail!("Empty database path");
    }

    if db_path.contains(['\0', '\n', '\r', '\t']) {
        bail!("Invalid control characters in database path");
    }

    let path = Path::new(db_path);

    if path
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        bail!("Parent directory traversal is not allowed in database path");
    }

    if path.file_name().is_none() {
        bail!("Database path must include a file name");
    }

    if let Ok(meta) = fs::symlink_metadata(path) {
        if meta.file_type().is_symlink() {
            bail!("Symlink path is not allowed for database path");
        }
        if meta.is_dir() {
            bail!("Database path points to a directory");
        }
    }

    Ok(DbLocation::File(path.to_path_buf()))
}
