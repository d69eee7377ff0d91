//! Registry of archive-capable record types.
//!
//! Each table is configured at most once. The first configuration is frozen
//! into an `Arc<ArchiveConfig>` and handed out to every caller afterwards;
//! later `configure` calls for the same table are ignored.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::errors::DatableResult;
use crate::models::{ArchiveCollection, ArchiveConfig, ArchiveOptions, SharedConfig};
use crate::query::archive::{collection_impl, months_of_year_impl, years_impl};

/// A record type (table) together with its frozen archive configuration.
#[derive(Clone, Debug)]
pub struct DatableModel {
    table: String,
    config: SharedConfig,
}

impl DatableModel {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    pub fn years(&self, conn: &Connection) -> DatableResult<Vec<i32>> {
        years_impl(conn, &self.table, &self.config)
    }

    /// Months of `year`; the current year when `None`.
    pub fn months_of_year(&self, conn: &Connection, year: Option<i32>) -> DatableResult<Vec<u32>> {
        months_of_year_impl(conn, &self.table, &self.config, year)
    }

    pub fn collection(&self, conn: &Connection) -> DatableResult<ArchiveCollection> {
        collection_impl(conn, &self.table, &self.config)
    }
}

#[derive(Debug, Default)]
pub struct ArchiveRegistry {
    models: RwLock<HashMap<String, SharedConfig>>,
}

impl ArchiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `table` archive-capable. A no-op returning the existing model
    /// when the table was configured before.
    pub fn configure(&self, table: &str, options: ArchiveOptions) -> DatableModel {
        if let Some(existing) = self.model(table) {
            debug!(table, "archive already configured; ignoring new options");
            return existing;
        }

        let mut models = self.models.write();
        let config = models
            .entry(table.to_string())
            .or_insert_with(|| {
                let config = options.resolve();
                info!(
                    table,
                    attribute = %config.attribute,
                    order = %config.sort_order,
                    conditions = config.filter.conditions().len(),
                    "archive configured"
                );
                Arc::new(config)
            })
            .clone();
        DatableModel {
            table: table.to_string(),
            config,
        }
    }

    pub fn is_archive_capable(&self, table: &str) -> bool {
        self.models.read().contains_key(table)
    }

    pub fn model(&self, table: &str) -> Option<DatableModel> {
        self.models.read().get(table).map(|config| DatableModel {
            table: table.to_string(),
            config: Arc::clone(config),
        })
    }

    pub fn tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = self.models.read().keys().cloned().collect();
        tables.sort();
        tables
    }
}
