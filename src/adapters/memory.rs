//! In-memory storage
//!
//! `MemoryStore` implements every storage trait over plain collections. It
//! backs the unit and integration tests and lets the pipeline run without a
//! database. Rejected values and failing merges can be injected to exercise
//! the error paths.

use crate::adapters::database::{
    DatabaseClient, ExportStore, QueueCounts, QueueStore, SourceProvider, TableStore,
};
use crate::core::intake::DiscoveryWindow;
use crate::core::load::MergePlan;
use crate::domain::{
    ColumnValue, DomainVariant, ExportLineItem, FormbridgeError, OrderBatch, QueueCandidate,
    QueueEntry, RequisitionId, Result, ReturnDetail, SampleDetail,
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Default)]
struct MemTable {
    columns: Vec<String>,
    key: Vec<String>,
    rows: Vec<Vec<ColumnValue>>,
}

impl MemTable {
    fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(column))
    }

    fn key_matches(&self, existing: &[ColumnValue], row: &[ColumnValue]) -> bool {
        !self.key.is_empty()
            && self.key.iter().all(|k| match self.index_of(k) {
                Some(i) => existing[i].same_as(&row[i]),
                None => false,
            })
    }
}

#[derive(Debug, Default)]
struct State {
    tables: BTreeMap<String, MemTable>,
    rejected: Vec<(String, String)>,
    fail_merges: bool,
    failing_sources: HashSet<DomainVariant>,
    approved: Vec<(QueueCandidate, NaiveDateTime, NaiveDateTime)>,
    queue: Vec<QueueEntry>,
    orders: OrderBatch,
    samples: Vec<SampleDetail>,
    returns: Vec<ReturnDetail>,
    exports: Vec<(ExportLineItem, Option<NaiveDateTime>)>,
}

impl State {
    fn table(&self, name: &str) -> Result<&MemTable> {
        self.tables.get(name).ok_or_else(|| missing(name))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut MemTable> {
        self.tables.get_mut(name).ok_or_else(|| missing(name))
    }

    /// Applies injected rejections and the table's key uniqueness
    fn check_row(&self, table: &str, columns: &[&str], row: &[ColumnValue]) -> Result<Vec<ColumnValue>> {
        let target = self.table(table)?;
        if columns.len() != row.len() {
            return Err(FormbridgeError::Database(format!(
                "INSERT has {} columns but {} values",
                columns.len(),
                row.len()
            )));
        }

        for (column, value) in &self.rejected {
            if let Some(i) = columns.iter().position(|c| c.eq_ignore_ascii_case(column)) {
                if row[i].render() == *value {
                    return Err(FormbridgeError::Database(format!(
                        "value '{value}' violates check constraint on column \"{column}\""
                    )));
                }
            }
        }

        let mut ordered = vec![ColumnValue::Text(None); target.columns.len()];
        for (column, value) in columns.iter().zip(row) {
            let i = target.index_of(column).ok_or_else(|| {
                FormbridgeError::Database(format!(
                    "column \"{column}\" of relation \"{table}\" does not exist"
                ))
            })?;
            ordered[i] = value.clone();
        }

        if target.rows.iter().any(|r| target.key_matches(r, &ordered)) {
            return Err(FormbridgeError::Database(format!(
                "duplicate key value violates unique constraint on \"{table}\""
            )));
        }
        Ok(ordered)
    }

    fn is_pending(&self, requisition_id: &RequisitionId) -> bool {
        self.queue
            .iter()
            .any(|e| &e.requisition_id == requisition_id && !e.is_processed())
    }

    fn check_source(&self, variant: DomainVariant) -> Result<()> {
        if self.failing_sources.contains(&variant) {
            return Err(FormbridgeError::Database(format!(
                "source query for {} failed",
                variant.diagram_id()
            )));
        }
        Ok(())
    }
}

fn missing(name: &str) -> FormbridgeError {
    FormbridgeError::Database(format!("relation \"{name}\" does not exist"))
}

/// Storage held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a table; `key` columns are enforced as unique
    pub fn create_table(&self, name: &str, columns: &[&str], key: &[&str]) {
        self.lock().tables.insert(
            name.to_string(),
            MemTable {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                key: key.iter().map(|k| k.to_string()).collect(),
                rows: Vec::new(),
            },
        );
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.lock().tables.get(table).map_or(0, |t| t.rows.len())
    }

    /// Rows of `table` as column/value maps
    pub fn rows(&self, table: &str) -> Vec<BTreeMap<String, ColumnValue>> {
        self.lock()
            .tables
            .get(table)
            .map(|t| {
                t.rows
                    .iter()
                    .map(|r| t.columns.iter().cloned().zip(r.iter().cloned()).collect())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn tables_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.lock()
            .tables
            .keys()
            .filter(|n| n.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Inserts whose `column` renders as `value` fail
    pub fn reject_value(&self, column: &str, value: &str) {
        self.lock()
            .rejected
            .push((column.to_string(), value.to_string()));
    }

    pub fn fail_merges(&self, fail: bool) {
        self.lock().fail_merges = fail;
    }

    /// Source fetches of `variant` fail
    pub fn fail_source(&self, variant: DomainVariant) {
        self.lock().failing_sources.insert(variant);
    }

    /// Register an approved requisition for discovery
    pub fn add_approved(
        &self,
        candidate: QueueCandidate,
        time_start: NaiveDateTime,
        time_last_action: NaiveDateTime,
    ) {
        self.lock()
            .approved
            .push((candidate, time_start, time_last_action));
    }

    pub fn queue_entries(&self) -> Vec<QueueEntry> {
        self.lock().queue.clone()
    }

    pub fn seed_orders(&self, batch: OrderBatch) {
        self.lock().orders = batch;
    }

    pub fn seed_samples(&self, rows: Vec<SampleDetail>) {
        self.lock().samples = rows;
    }

    pub fn seed_returns(&self, rows: Vec<ReturnDetail>) {
        self.lock().returns = rows;
    }

    pub fn seed_exports(&self, lines: Vec<ExportLineItem>) {
        self.lock()
            .exports
            .extend(lines.into_iter().map(|line| (line, None)));
    }

    /// Export lines already written to a file
    pub fn exported_count(&self) -> usize {
        self.lock()
            .exports
            .iter()
            .filter(|(_, at)| at.is_some())
            .count()
    }
}

#[async_trait]
impl DatabaseClient for MemoryStore {
    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn create_staging_table(&self, target: &str, staging: &str) -> Result<()> {
        let mut state = self.lock();
        if state.tables.contains_key(staging) {
            return Err(FormbridgeError::Database(format!(
                "relation \"{staging}\" already exists"
            )));
        }
        let columns = state.table(target)?.columns.clone();
        state.tables.insert(
            staging.to_string(),
            MemTable {
                columns,
                ..MemTable::default()
            },
        );
        Ok(())
    }

    async fn bulk_insert(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<ColumnValue>],
    ) -> Result<u64> {
        let mut state = self.lock();
        let mut checked = Vec::with_capacity(rows.len());
        for row in rows {
            checked.push(state.check_row(table, columns, row)?);
        }
        let target = state.table_mut(table)?;
        target.rows.extend(checked);
        Ok(rows.len() as u64)
    }

    async fn insert_row(&self, table: &str, columns: &[&str], row: &[ColumnValue]) -> Result<()> {
        let mut state = self.lock();
        let checked = state.check_row(table, columns, row)?;
        state.table_mut(table)?.rows.push(checked);
        Ok(())
    }

    async fn truncate_table(&self, table: &str) -> Result<()> {
        self.lock().table_mut(table)?.rows.clear();
        Ok(())
    }

    async fn drop_table(&self, table: &str) -> Result<()> {
        self.lock()
            .tables
            .remove(table)
            .map(|_| ())
            .ok_or_else(|| missing(table))
    }

    async fn merge(&self, plan: &MergePlan) -> Result<u64> {
        let mut state = self.lock();
        if state.fail_merges {
            return Err(FormbridgeError::Database(format!(
                "merge into \"{}\" failed",
                plan.target
            )));
        }

        let staging = state.table(&plan.staging)?.clone();
        let target = state.table_mut(&plan.target)?;
        let lookup = |row: &[ColumnValue], column: &str| -> ColumnValue {
            staging
                .index_of(column)
                .map_or(ColumnValue::Text(None), |i| row[i].clone())
        };

        let mut affected = 0;
        for source in &staging.rows {
            let matched = target.rows.iter().position(|existing| {
                plan.key_columns.iter().all(|k| match target.index_of(k) {
                    Some(i) => existing[i].same_as(&lookup(source, k)),
                    None => false,
                })
            });

            match matched {
                Some(pos) => {
                    if !plan.updates_matched() {
                        continue;
                    }
                    let changed = plan.compare_columns.iter().any(|c| {
                        target
                            .index_of(c)
                            .is_some_and(|i| !target.rows[pos][i].same_as(&lookup(source, c)))
                    });
                    if changed {
                        for c in &plan.update_columns {
                            if let Some(i) = target.index_of(c) {
                                target.rows[pos][i] = lookup(source, c);
                            }
                        }
                        affected += 1;
                    }
                }
                None => {
                    let mut row = vec![ColumnValue::Text(None); target.columns.len()];
                    for c in &plan.insert_columns {
                        if let Some(i) = target.index_of(c) {
                            row[i] = lookup(source, c);
                        }
                    }
                    target.rows.push(row);
                    affected += 1;
                }
            }
        }
        Ok(affected)
    }

    async fn list_tables(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self.tables_with_prefix(prefix))
    }
}

#[async_trait]
impl QueueStore for MemoryStore {
    async fn find_unqueued(
        &self,
        window: &DiscoveryWindow,
        diagram_ids: &[&str],
    ) -> Result<Vec<QueueCandidate>> {
        let state = self.lock();
        Ok(state
            .approved
            .iter()
            .filter(|(c, start, last)| {
                window.contains(*start, *last)
                    && diagram_ids.contains(&c.diagram_id.as_str())
                    && !state.queue.iter().any(|e| e.requisition_id == c.requisition_id)
            })
            .map(|(c, _, _)| c.clone())
            .collect())
    }

    async fn insert_entries(&self, entries: &[QueueEntry]) -> Result<u64> {
        let mut state = self.lock();
        let mut inserted = 0;
        for entry in entries {
            if state
                .queue
                .iter()
                .any(|e| e.requisition_id == entry.requisition_id)
            {
                continue;
            }
            state.queue.push(entry.clone());
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn mark_processed(&self, processed_at: NaiveDateTime) -> Result<u64> {
        let mut state = self.lock();
        let mut affected = 0;
        for entry in state.queue.iter_mut().filter(|e| !e.is_processed()) {
            entry.processed_at = Some(processed_at);
            affected += 1;
        }
        Ok(affected)
    }

    async fn queue_counts(&self) -> Result<Vec<QueueCounts>> {
        let state = self.lock();
        Ok(DomainVariant::ALL
            .iter()
            .map(|v| {
                let entries = state.queue.iter().filter(|e| e.diagram_id == v.diagram_id());
                let (processed, pending): (Vec<_>, Vec<_>) =
                    entries.partition(|e| e.is_processed());
                QueueCounts {
                    diagram_id: v.diagram_id().to_string(),
                    pending: pending.len() as u64,
                    processed: processed.len() as u64,
                }
            })
            .collect())
    }
}

#[async_trait]
impl SourceProvider for MemoryStore {
    async fn fetch_order_batch(&self) -> Result<OrderBatch> {
        let state = self.lock();
        state.check_source(DomainVariant::Order)?;
        Ok(OrderBatch {
            details: state
                .orders
                .details
                .iter()
                .filter(|d| state.is_pending(&d.header.requisition_id))
                .cloned()
                .collect(),
            free_goods: state
                .orders
                .free_goods
                .iter()
                .filter(|f| state.is_pending(&f.requisition_id))
                .cloned()
                .collect(),
            add_ons: state
                .orders
                .add_ons
                .iter()
                .filter(|a| state.is_pending(&a.header.requisition_id))
                .cloned()
                .collect(),
        })
    }

    async fn fetch_sample_details(&self) -> Result<Vec<SampleDetail>> {
        let state = self.lock();
        state.check_source(DomainVariant::Sample)?;
        Ok(state
            .samples
            .iter()
            .filter(|d| state.is_pending(&d.header.requisition_id))
            .cloned()
            .collect())
    }

    async fn fetch_return_details(&self) -> Result<Vec<ReturnDetail>> {
        let state = self.lock();
        state.check_source(DomainVariant::Return)?;
        Ok(state
            .returns
            .iter()
            .filter(|d| state.is_pending(&d.header.requisition_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ExportStore for MemoryStore {
    async fn pending_exports(&self, receiving_party: Option<&str>) -> Result<Vec<ExportLineItem>> {
        Ok(self
            .lock()
            .exports
            .iter()
            .filter(|(line, at)| {
                at.is_none() && receiving_party.map_or(true, |p| line.receiving_party == p)
            })
            .map(|(line, _)| line.clone())
            .collect())
    }

    async fn mark_exported(&self, exported_at: NaiveDateTime) -> Result<u64> {
        let mut state = self.lock();
        let mut affected = 0;
        for (line, at) in state.exports.iter_mut().filter(|(_, at)| at.is_none()) {
            *at = Some(exported_at);
            line.export_status = 1;
            affected += 1;
        }
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::load::MergeStrategy;
    use crate::domain::{FieldSpec, TableSchema};

    const FIELDS: &[FieldSpec] = &[FieldSpec::text("Code", "CODE"), FieldSpec::text("Name", "NAME")];

    #[tokio::test]
    async fn test_bulk_insert_is_atomic() {
        let store = MemoryStore::new();
        store.create_table("T", &["Code", "Name"], &[]);
        store.reject_value("Name", "bad");

        let rows = vec![
            vec![ColumnValue::text("1"), ColumnValue::text("ok")],
            vec![ColumnValue::text("2"), ColumnValue::text("bad")],
        ];
        assert!(store.bulk_insert("T", &["Code", "Name"], &rows).await.is_err());
        assert_eq!(store.row_count("T"), 0);
    }

    #[tokio::test]
    async fn test_key_uniqueness_enforced() {
        let store = MemoryStore::new();
        store.create_table("T", &["Code", "Name"], &["Code"]);
        let row = vec![ColumnValue::text("1"), ColumnValue::text("a")];
        store.insert_row("T", &["Code", "Name"], &row).await.unwrap();
        assert!(store.insert_row("T", &["Code", "Name"], &row).await.is_err());
    }

    #[tokio::test]
    async fn test_merge_updates_only_changed_rows() {
        let store = MemoryStore::new();
        store.create_table("T", &["Code", "Name"], &["Code"]);
        store.create_table("S", &["Code", "Name"], &[]);
        let cols = ["Code", "Name"];
        store.insert_row("T", &cols, &[ColumnValue::text("1"), ColumnValue::text("a")]).await.unwrap();
        store.insert_row("T", &cols, &[ColumnValue::text("2"), ColumnValue::Text(None)]).await.unwrap();
        store.insert_row("S", &cols, &[ColumnValue::text("1"), ColumnValue::text("a")]).await.unwrap();
        store.insert_row("S", &cols, &[ColumnValue::text("2"), ColumnValue::text("b")]).await.unwrap();
        store.insert_row("S", &cols, &[ColumnValue::text("3"), ColumnValue::text("c")]).await.unwrap();

        let schema = TableSchema::new("T", "ROW", &["Code"], FIELDS);
        let plan = MergePlan::from_schema(&schema, "S", MergeStrategy::Merge);

        assert_eq!(store.merge(&plan).await.unwrap(), 2);
        assert_eq!(store.row_count("T"), 3);
        assert_eq!(store.rows("T")[1]["Name"], ColumnValue::text("b"));
    }
}
