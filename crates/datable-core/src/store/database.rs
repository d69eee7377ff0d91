//! SQLite access for archive-capable tables.
//!
//! Each public method opens its own connection so callers never manage
//! connection lifetime.

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::errors::{DatableError, DatableResult};
use crate::models::{ArchiveCollection, ArchiveOptions};
use crate::store::registry::{ArchiveRegistry, DatableModel};

// ---------------------------------------------------------------------------
// Helper: tilde expansion
// ---------------------------------------------------------------------------

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            let mut expanded = PathBuf::from(home);
            if path.len() > 2 {
                expanded.push(&path[2..]);
            }
            return expanded;
        }
    }
    PathBuf::from(path)
}

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

/// A SQLite file plus the registry of its archive-capable tables.
#[derive(Debug)]
pub struct Database {
    db_path: PathBuf,
    registry: ArchiveRegistry,
}

impl Database {
    /// Resolve `db_path` (tilde-expanded, made absolute) and create its
    /// parent directories.
    pub fn new(db_path: impl AsRef<Path>) -> DatableResult<Self> {
        let db_str = db_path.as_ref().to_string_lossy();
        let expanded = expand_tilde(&db_str);
        let resolved = if expanded.is_absolute() {
            expanded
        } else {
            std::env::current_dir()?.join(&expanded)
        };
        if let Some(parent) = resolved.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            db_path: resolved,
            registry: ArchiveRegistry::new(),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn registry(&self) -> &ArchiveRegistry {
        &self.registry
    }

    /// Open a new connection. The host owns the schema; nothing is set up.
    pub fn connect(&self) -> DatableResult<Connection> {
        Ok(Connection::open(&self.db_path)?)
    }

    // -----------------------------------------------------------------------
    // Archive surface
    // -----------------------------------------------------------------------

    pub fn configure(&self, table: &str, options: ArchiveOptions) -> DatableModel {
        self.registry.configure(table, options)
    }

    pub fn is_archive_capable(&self, table: &str) -> bool {
        self.registry.is_archive_capable(table)
    }

    fn model(&self, table: &str) -> DatableResult<DatableModel> {
        self.registry.model(table).ok_or_else(|| {
            DatableError::Config(format!("table {table:?} is not archive-capable"))
        })
    }

    pub fn years(&self, table: &str) -> DatableResult<Vec<i32>> {
        let model = self.model(table)?;
        model.years(&self.connect()?)
    }

    pub fn months_of_year(&self, table: &str, year: Option<i32>) -> DatableResult<Vec<u32>> {
        let model = self.model(table)?;
        model.months_of_year(&self.connect()?, year)
    }

    pub fn collection(&self, table: &str) -> DatableResult<ArchiveCollection> {
        let model = self.model(table)?;
        model.collection(&self.connect()?)
    }
}
