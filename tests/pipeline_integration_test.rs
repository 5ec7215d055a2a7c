//! Integration tests for the sync pipeline and the bpm-upload job
//!
//! The pipeline is wired from configuration exactly as the CLI does it, with
//! the in-memory store standing in for PostgreSQL.

use chrono::{Duration, Local, NaiveDateTime};
use formbridge::adapters::memory::MemoryStore;
use formbridge::cli::context::AppContext;
use formbridge::config::parse_config;
use formbridge::domain::{
    DomainVariant, FormHeader, OrderBatch, OrderDetail, QueueCandidate, RequisitionId,
    SampleDetail, EXPORT_FIELDS,
};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::watch;

const EXPORT_TABLE: &str = "fourpl_datatrans_export";

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn context(store: &Arc<MemoryStore>, root: &Path, extra: &str) -> AppContext<MemoryStore> {
    let text = format!(
        r#"
[database]
connection_string = "postgresql://fb:pw@localhost:5432/erp"

[reference]
root = '{}'

[xml_export]
root = '{}'

[logging]
local_enabled = false

[jobs.aliases]
BpmDataUploadJob = "bpm-upload"
{extra}
"#,
        root.join("reference").display(),
        root.join("export").display(),
    );
    let columns: Vec<&str> = EXPORT_FIELDS.iter().map(|f| f.column).collect();
    store.create_table(EXPORT_TABLE, &columns, &["RequisitionID", "FormItem"]);
    AppContext::new(parse_config(&text).unwrap(), store.clone())
}

fn header(id: &str, serial: &str) -> FormHeader {
    FormHeader {
        requisition_id: RequisitionId::new(id).unwrap(),
        serial_id: serial.to_string(),
        time_last_action: now() - Duration::hours(2),
        applicant_id: "E1".to_string(),
        invoice: 2,
        customer_code: "C1".to_string(),
        customer_name: "Harbor Clinic".to_string(),
        ship_to_code: "SP1".to_string(),
        remark: None,
    }
}

fn approve(store: &MemoryStore, id: &str, serial: &str, variant: DomainVariant) {
    store.add_approved(
        QueueCandidate {
            requisition_id: RequisitionId::new(id).unwrap(),
            diagram_id: variant.diagram_id().to_string(),
            serial_id: serial.to_string(),
        },
        now() - Duration::days(1),
        now() - Duration::hours(2),
    );
}

/// One discounted order (two lines) and one sample (one line)
fn seeded() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    approve(&store, "REQ-1", "TWC12512000001", DomainVariant::Order);
    approve(&store, "REQ-2", "TWC02512000002", DomainVariant::Sample);
    store.seed_orders(OrderBatch {
        details: vec![OrderDetail {
            header: header("REQ-1", "TWC12512000001"),
            request_type: 1,
            quotation_type: "1".to_string(),
            price_group: None,
            item_no: 1,
            material_code: "M1".to_string(),
            qty: Decimal::from(10),
            uom: "BOX".to_string(),
            purpose: None,
            old_invoice_price: Decimal::from(105),
            new_invoice_price: Decimal::from(105),
            old_sale_price: Decimal::from(84),
            new_sale_price: Decimal::from(84),
        }],
        ..OrderBatch::default()
    });
    store.seed_samples(vec![SampleDetail {
        header: header("REQ-2", "TWC02512000002"),
        funding_source: None,
        d_no: 1,
        material_code: "S1".to_string(),
        qty: Decimal::ONE,
        uom: "PCS".to_string(),
        purpose: "trial".to_string(),
    }]);
    store
}

#[tokio::test]
async fn test_sync_persists_lines_and_marks_queue() {
    let root = TempDir::new().unwrap();
    let store = seeded();
    let ctx = context(&store, root.path(), "");

    let result = ctx.orchestrator(false).unwrap().run().await;

    assert!(result.success, "{:?}", result.errors);
    assert_eq!(result.enqueued, 2);
    assert_eq!(result.processed_count, 3);
    assert_eq!(result.requisition_ids, vec!["REQ-1", "REQ-2"]);
    assert_eq!(store.row_count(EXPORT_TABLE), 3);
    assert!(store.queue_entries().iter().all(|e| e.is_processed()));
    assert!(store
        .tables_with_prefix(&format!("{EXPORT_TABLE}_Staging_"))
        .is_empty());
}

#[tokio::test]
async fn test_repeated_sync_changes_nothing() {
    let root = TempDir::new().unwrap();
    let store = seeded();
    let ctx = context(&store, root.path(), "");
    let orchestrator = ctx.orchestrator(false).unwrap();

    orchestrator.run().await;
    let second = orchestrator.run().await;

    assert!(second.success);
    assert_eq!(second.enqueued, 0);
    assert_eq!(second.processed_count, 0);
    assert_eq!(store.row_count(EXPORT_TABLE), 3);
    assert_eq!(store.queue_entries().len(), 2);
}

#[tokio::test]
async fn test_upsert_strategy_loads_the_same_rows() {
    let root = TempDir::new().unwrap();
    let store = seeded();
    let ctx = context(&store, root.path(), "[pipeline]\nmerge_strategy = \"upsert\"\n");

    let result = ctx.orchestrator(false).unwrap().run().await;

    assert!(result.success, "{:?}", result.errors);
    assert_eq!(store.row_count(EXPORT_TABLE), 3);
}

#[tokio::test]
async fn test_failing_source_does_not_stop_other_variants() {
    let root = TempDir::new().unwrap();
    let store = seeded();
    store.fail_source(DomainVariant::Order);
    let ctx = context(&store, root.path(), "");

    let result = ctx.orchestrator(false).unwrap().run().await;

    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("[TWC1D002] "));
    assert_eq!(result.requisition_ids, vec!["REQ-2"]);
    assert_eq!(store.row_count(EXPORT_TABLE), 1);
}

#[tokio::test]
async fn test_rejected_line_is_isolated_when_merge_aborts() {
    let root = TempDir::new().unwrap();
    let store = seeded();
    store.fail_merges(true);
    store.reject_value("ItemCategory", "ZTW6");
    let ctx = context(&store, root.path(), "");

    let result = ctx.orchestrator(false).unwrap().run().await;

    assert!(!result.success);
    assert_eq!(result.processed_count, 2);
    assert_eq!(store.row_count(EXPORT_TABLE), 2);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("RequisitionID=REQ-2"));
}

#[tokio::test]
async fn test_configured_dry_run_writes_nothing() {
    let root = TempDir::new().unwrap();
    let store = seeded();
    let ctx = context(&store, root.path(), "");
    let mut config = ctx.config.clone();
    config.application.dry_run = true;
    let ctx = AppContext::new(config, store.clone());

    let result = ctx.orchestrator(false).unwrap().run().await;

    assert!(result.dry_run);
    assert_eq!(result.processed_count, 0);
    assert!(store.queue_entries().is_empty());
    assert_eq!(store.row_count(EXPORT_TABLE), 0);
}

#[tokio::test]
async fn test_bpm_upload_job_runs_through_legacy_alias() {
    let root = TempDir::new().unwrap();
    let store = seeded();
    let ctx = context(&store, root.path(), "");
    let (_tx, rx) = watch::channel(false);
    let registry = ctx.job_registry(rx).unwrap();

    let report = registry.run("BpmDataUploadJob").await.unwrap();

    assert_eq!(report.key, "bpm-upload");
    assert!(report.success, "{}", report.message);
    assert_eq!(report.details["sync"]["processed_count"], 3);
    assert_eq!(store.row_count(EXPORT_TABLE), 3);
}

#[tokio::test]
async fn test_unknown_job_is_rejected() {
    let root = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());
    let ctx = context(&store, root.path(), "");
    let (_tx, rx) = watch::channel(false);
    let registry = ctx.job_registry(rx).unwrap();

    assert!(registry.run("NightlyCleanupJob").await.is_err());
}
