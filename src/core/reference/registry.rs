//! Read-only registry of reference-data descriptors

use super::schemas::ReferenceKind;
use crate::domain::{FormbridgeError, Result, TableSchema};
use std::collections::BTreeMap;

/// Descriptors for every reference kind, built once at startup
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: BTreeMap<ReferenceKind, TableSchema>,
}

impl SchemaRegistry {
    /// Build and validate all descriptors
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a descriptor is inconsistent.
    pub fn build(table_schema: Option<&str>) -> Result<Self> {
        let mut schemas = BTreeMap::new();
        for kind in ReferenceKind::ALL {
            let schema = kind.descriptor(table_schema);
            schema.validate().map_err(|e| {
                FormbridgeError::Configuration(format!("{kind} descriptor: {e}"))
            })?;
            schemas.insert(kind, schema);
        }
        tracing::debug!(kinds = schemas.len(), "Schema registry built");
        Ok(Self { schemas })
    }

    pub fn get(&self, kind: ReferenceKind) -> Option<&TableSchema> {
        self.schemas.get(&kind)
    }

    /// Target tables of every kind
    pub fn tables(&self) -> Vec<String> {
        self.schemas.values().map(|s| s.table.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ReferenceKind, &TableSchema)> {
        self.schemas.iter().map(|(k, s)| (*k, s))
    }
}
