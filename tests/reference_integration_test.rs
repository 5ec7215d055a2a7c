//! Integration tests for reference-data file processing and shutdown

use formbridge::adapters::memory::MemoryStore;
use formbridge::cli::context::AppContext;
use formbridge::config::parse_config;
use formbridge::core::reference::ReferenceKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::watch;

const SALES_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ROOT>
  <SALES><SALES_AD>amy.lin</SALES_AD><ENAME>Amy Lin</ENAME><BZIRK>N1</BZIRK></SALES>
  <SALES><SALES_AD>bo.chen</SALES_AD><ENAME>Bo Chen</ENAME><BZIRK>S2</BZIRK></SALES>
</ROOT>"#;

const SALES_UPDATE_XML: &str = r#"<ROOT>
  <SALES><SALES_AD>amy.lin</SALES_AD><ENAME>Amy Lin-Wu</ENAME><BZIRK>N1</BZIRK></SALES>
</ROOT>"#;

fn context(root: &Path) -> (Arc<MemoryStore>, AppContext<MemoryStore>) {
    let text = format!(
        r#"
[database]
connection_string = "postgresql://fb:pw@localhost:5432/erp"

[reference]
root = '{}'

[logging]
local_enabled = false

[jobs.aliases]
MasterDataJob = "master-data"
"#,
        root.display()
    );

    let store = Arc::new(MemoryStore::new());
    for kind in ReferenceKind::ALL {
        let columns: Vec<&str> = kind.fields().iter().map(|f| f.column).collect();
        store.create_table(kind.table(), &columns, kind.primary_key());
    }
    let ctx = AppContext::new(parse_config(&text).unwrap(), store.clone());
    (store, ctx)
}

fn kind_dir(root: &Path, kind: ReferenceKind, leaf: &str) -> PathBuf {
    root.join(kind.name()).join(leaf)
}

fn drop_file(root: &Path, kind: ReferenceKind, name: &str, content: &str) {
    let dir = kind_dir(root, kind, "In");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), content).unwrap();
}

#[tokio::test]
async fn test_each_kind_is_processed_independently() {
    let root = TempDir::new().unwrap();
    let (store, ctx) = context(root.path());
    drop_file(root.path(), ReferenceKind::Sales, "SALES_1.xml", SALES_XML);
    drop_file(root.path(), ReferenceKind::Price, "PRICE_1.xml", "<ROOT><PRICE>");
    let (_tx, rx) = watch::channel(false);

    let results = ctx.reference_processor(rx).unwrap().process_all().await;

    assert_eq!(results.len(), 4);
    let price = results.iter().find(|r| r.kind == ReferenceKind::Price).unwrap();
    let sales = results.iter().find(|r| r.kind == ReferenceKind::Sales).unwrap();
    assert_eq!(price.fail_count, 1);
    assert!(sales.is_success());
    assert_eq!(sales.success_count, 1);

    assert_eq!(store.row_count("Sales_SalesMaster"), 2);
    assert!(kind_dir(root.path(), ReferenceKind::Sales, "Success")
        .join("SALES_1.xml")
        .exists());
    assert!(kind_dir(root.path(), ReferenceKind::Price, "Fail")
        .join("PRICE_1.xml")
        .exists());
}

#[tokio::test]
async fn test_reloading_updates_existing_rows() {
    let root = TempDir::new().unwrap();
    let (store, ctx) = context(root.path());
    let (_tx, rx) = watch::channel(false);
    let processor = ctx.reference_processor(rx).unwrap();

    drop_file(root.path(), ReferenceKind::Sales, "SALES_1.xml", SALES_XML);
    processor.process_kind(ReferenceKind::Sales).await;
    drop_file(root.path(), ReferenceKind::Sales, "SALES_2.xml", SALES_UPDATE_XML);
    let result = processor.process_kind(ReferenceKind::Sales).await;

    assert!(result.is_success());
    let rows = store.rows("Sales_SalesMaster");
    assert_eq!(rows.len(), 2);
    let amy = rows
        .iter()
        .find(|r| r["ADAccount"].render() == "amy.lin")
        .unwrap();
    assert_eq!(amy["Name"].render(), "Amy Lin-Wu");
}

#[tokio::test]
async fn test_master_data_job_reports_file_counts() {
    let root = TempDir::new().unwrap();
    let (_store, ctx) = context(root.path());
    drop_file(root.path(), ReferenceKind::Sales, "SALES_1.xml", SALES_XML);
    let (_tx, rx) = watch::channel(false);

    let report = ctx.job_registry(rx).unwrap().run("MasterDataJob").await.unwrap();

    assert_eq!(report.key, "master-data");
    assert!(report.success, "{}", report.message);
    assert_eq!(report.message, "Processed 1 reference files, 0 failed");
}

#[tokio::test]
async fn test_shutdown_before_start_processes_nothing() {
    let root = TempDir::new().unwrap();
    let (store, ctx) = context(root.path());
    drop_file(root.path(), ReferenceKind::Sales, "SALES_1.xml", SALES_XML);
    let (tx, rx) = watch::channel(false);
    let processor = ctx.reference_processor(rx).unwrap();

    tx.send(true).unwrap();
    let results = processor.process_all().await;

    assert!(results.is_empty());
    assert_eq!(store.row_count("Sales_SalesMaster"), 0);
    assert!(kind_dir(root.path(), ReferenceKind::Sales, "In")
        .join("SALES_1.xml")
        .exists());
}

#[tokio::test]
async fn test_shutdown_leaves_remaining_files_in_place() {
    let root = TempDir::new().unwrap();
    let (_store, ctx) = context(root.path());
    drop_file(root.path(), ReferenceKind::Sales, "SALES_1.xml", SALES_XML);
    let (tx, rx) = watch::channel(false);
    let processor = ctx.reference_processor(rx).unwrap();

    tx.send(true).unwrap();
    let result = processor.process_kind(ReferenceKind::Sales).await;

    assert!(result.interrupted);
    assert!(!result.is_success());
    assert_eq!(result.total_count, 1);
    assert!(result.file_results.is_empty());
}
