//! Error reports for rejected reference-data rows

use crate::core::load::UpsertBatchResult;
use crate::domain::Result;
use chrono::NaiveDateTime;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// `{stem}_Error_{yyyyMMddHHmmss}.log` for the processed file
pub fn report_file_name(source: &Path, at: NaiveDateTime) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string());
    format!("{stem}_Error_{}.log", at.format("%Y%m%d%H%M%S"))
}

/// Report text: header, totals, then one block per failed row
pub fn render_report(
    kind: &str,
    source: &Path,
    result: &UpsertBatchResult,
    at: NaiveDateTime,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {kind} processing error report ===");
    let _ = writeln!(out, "Source file: {}", source.display());
    let _ = writeln!(out, "Processed at: {}", at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "Total rows: {}", result.total_count);
    let _ = writeln!(out, "Succeeded: {}", result.success_count);
    let _ = writeln!(out, "Failed: {}", result.failed_count);
    if let Some(summary) = &result.error_summary {
        let _ = writeln!(out, "Summary: {summary}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "=== Failed items ===");
    let _ = writeln!(out);

    for item in &result.failed_items {
        let _ = writeln!(out, "Key: {}", item.primary_key);
        let _ = writeln!(out, "Error: {}", item.error_message);
        let _ = writeln!(out, "Raw data: {}", item.raw_data);
        let _ = writeln!(out, "---");
    }
    out
}

/// Write the report into `dir` and return its path
pub async fn write_report(
    dir: &Path,
    kind: &str,
    source: &Path,
    result: &UpsertBatchResult,
    at: NaiveDateTime,
) -> Result<PathBuf> {
    let path = dir.join(report_file_name(source, at));
    tokio::fs::write(&path, render_report(kind, source, result, at)).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(23, 59, 1)
            .unwrap()
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(
            report_file_name(Path::new("/in/PRICE_0001.xml"), at()),
            "PRICE_0001_Error_20240229235901.log"
        );
    }

    #[test]
    fn test_render_report_lists_items() {
        let mut result = UpsertBatchResult::new(3);
        result.success_count = 2;
        result.add_failure("M1|TW02".into(), "bad price".into(), "{\"Price\":\"x\"}".into());
        result.error_summary = Some(result.fallback_summary());

        let text = render_report("Price", Path::new("PRICE_0001.xml"), &result, at());

        assert!(text.starts_with("=== Price processing error report ==="));
        assert!(text.contains("Total rows: 3"));
        assert!(text.contains("Failed: 1"));
        assert!(text.contains("Key: M1|TW02\nError: bad price\nRaw data: {\"Price\":\"x\"}\n---"));
    }
}
