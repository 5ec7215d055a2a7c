//! PostgreSQL implementation of the storage traits
//!
//! Pipeline tables (queue, export, reference) use quoted PascalCase columns.
//! The approval workflow tables are read from `workflow_schema` and use
//! snake_case names.

use super::client::PostgresClient;
use crate::adapters::database::traits::{
    DatabaseClient, ExportStore, QueueCounts, QueueStore, SourceProvider, TableStore,
};
use crate::core::intake::DiscoveryWindow;
use crate::core::load::merge::{quote_ident, quote_qualified};
use crate::core::load::MergePlan;
use crate::domain::{
    AddOnDetail, ColumnValue, DomainVariant, ExportLineItem, FormHeader, FormbridgeError,
    FreeGoodsDetail, OrderBatch, OrderDetail, QueueCandidate, QueueEntry, RequisitionId, Result,
    ReturnDetail, SampleDetail,
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Arc;
use tokio_postgres::types::ToSql;
use tokio_postgres::Row;

/// Bind parameter limit of the PostgreSQL wire protocol
const MAX_BIND_PARAMS: usize = 65_535;

/// Invoice kinds forwarded to the ERP
const FORWARDED_INVOICES: &str = "(2, 3)";

/// Order request types handled by the order rule set
const ORDER_REQUEST_TYPES: &str = "(1, 3, 4)";

/// Table names the adapter works against
#[derive(Debug, Clone)]
pub struct PostgresTables {
    pub queue: String,
    pub export: String,
    pub workflow_schema: String,
    /// Schema of the reference and sales-order master tables
    pub reference_schema: Option<String>,
}

impl PostgresTables {
    fn reference(&self, table: &str) -> String {
        match &self.reference_schema {
            Some(schema) => format!("{}.{}", quote_ident(schema), quote_ident(table)),
            None => quote_ident(table),
        }
    }

    fn workflow(&self, table: &str) -> String {
        format!("{}.{}", quote_ident(&self.workflow_schema), table)
    }
}

pub struct PostgresStore {
    client: Arc<PostgresClient>,
    tables: PostgresTables,
}

impl PostgresStore {
    pub fn new(client: Arc<PostgresClient>, tables: PostgresTables) -> Self {
        Self { client, tables }
    }

    pub fn client(&self) -> &Arc<PostgresClient> {
        &self.client
    }

    fn queue(&self) -> String {
        quote_qualified(&self.tables.queue)
    }

    fn export(&self) -> String {
        quote_qualified(&self.tables.export)
    }

    /// FROM/WHERE clause joining requisition, master and detail rows of
    /// pending queue entries of `variant`
    fn pending_source(
        &self,
        variant: DomainVariant,
        master: &str,
        detail: &str,
        alias: &str,
    ) -> String {
        format!(
            "FROM {req} s
             INNER JOIN {master} m ON m.requisition_id = s.requisition_id
             INNER JOIN {detail} {alias} ON {alias}.requisition_id = s.requisition_id
             INNER JOIN {queue} q ON q.\"RequisitionID\" = s.requisition_id
             WHERE q.\"DiagramID\" = '{diagram}' AND q.\"ProcessedAt\" IS NULL
               AND m.invoice IN {FORWARDED_INVOICES}",
            req = self.tables.workflow("requisition"),
            master = self.tables.workflow(master),
            detail = self.tables.workflow(detail),
            queue = self.queue(),
            diagram = variant.diagram_id(),
        )
    }
}

fn as_param(value: &ColumnValue) -> &(dyn ToSql + Sync) {
    match value {
        ColumnValue::Text(v) => v,
        ColumnValue::Decimal(v) => v,
        ColumnValue::Int(v) => v,
        ColumnValue::Timestamp(v) => v,
    }
}

/// Column values of `row` as bind parameters
fn bind(row: &[ColumnValue]) -> impl Iterator<Item = &(dyn ToSql + Sync)> {
    row.iter().map(as_param)
}

/// `INSERT INTO table (columns) VALUES ($1, ..), (..)` for `rows` rows
fn insert_sql(table: &str, columns: &[&str], rows: usize) -> String {
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let width = columns.len();
    let tuples = (0..rows)
        .map(|r| {
            let placeholders = (1..=width)
                .map(|c| format!("${}", r * width + c))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({placeholders})")
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({column_list}) VALUES {tuples}",
        quote_qualified(table)
    )
}

fn rows_per_statement(width: usize) -> usize {
    (MAX_BIND_PARAMS / width.max(1)).max(1)
}

fn check_width(columns: &[&str], rows: &[Vec<ColumnValue>]) -> Result<()> {
    match rows.iter().position(|r| r.len() != columns.len()) {
        Some(i) => Err(FormbridgeError::Validation(format!(
            "Row {i} has {} values for {} columns",
            rows[i].len(),
            columns.len()
        ))),
        None => Ok(()),
    }
}

fn requisition_id(row: &Row) -> Result<RequisitionId> {
    let raw: String = row.try_get("requisition_id")?;
    RequisitionId::new(raw).map_err(FormbridgeError::Validation)
}

fn header_from_row(row: &Row) -> Result<FormHeader> {
    Ok(FormHeader {
        requisition_id: requisition_id(row)?,
        serial_id: row.try_get("serial_id")?,
        time_last_action: row.try_get("time_last_action")?,
        applicant_id: row.try_get("applicant_id")?,
        invoice: row.try_get("invoice")?,
        customer_code: row.try_get("customer_code")?,
        customer_name: row.try_get("customer_name")?,
        ship_to_code: row.try_get("ship_to_code")?,
        remark: row.try_get("remark")?,
    })
}

fn parse_field<T>(row: &Row, column: &str) -> Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(FormbridgeError::Validation)
}

fn export_line_from_row(row: &Row) -> Result<ExportLineItem> {
    let raw_id: String = row.try_get("RequisitionID")?;
    Ok(ExportLineItem {
        requisition_id: RequisitionId::new(raw_id).map_err(FormbridgeError::Validation)?,
        form_no: row.try_get("FormNo")?,
        form_item: row.try_get("FormItem")?,
        form_ref_item: row.try_get("FormRefItem")?,
        applicant_id: row.try_get("ApplicantID")?,
        sales_org: row.try_get("SalesOrg")?,
        distribution_channel: row.try_get("DistributionChannel")?,
        division: row.try_get("Division")?,
        receiving_party: row.try_get("ReceivingParty")?,
        customer_code: row.try_get("CustomerCode")?,
        customer_name: row.try_get("CustomerName")?,
        sp_number: row.try_get("SPNumber")?,
        sales_channel: row.try_get("SalesChannel")?,
        approval_date: row.try_get("ApprovalDate")?,
        remark: row.try_get("Remark")?,
        item_category: parse_field(row, "ItemCategory")?,
        pricing_type: row.try_get("PricingType")?,
        pricing_group: row.try_get("PricingGroup")?,
        material_code: row.try_get("MaterialCode")?,
        batch: row.try_get("Batch")?,
        sales_unit: row.try_get("SalesUnit")?,
        qty: row.try_get("Qty")?,
        debit_credit: parse_field(row, "DebitCreditType")?,
        currency: row.try_get("Currency")?,
        invoice_price_with_tax: row.try_get("InvoicePriceWithTax")?,
        invoice_price: row.try_get("InvoicePrice")?,
        total_invoice_price_with_tax: row.try_get("TotalInvoicePriceWithTax")?,
        total_invoice_price: row.try_get("TotalInvoicePrice")?,
        fixed_price_with_tax: row.try_get("FixedPriceWithTax")?,
        pricing_unit: row.try_get("PricingUnit")?,
        item_purpose: row.try_get("ItemPurpose")?,
        return_code: row.try_get("ReturnCode")?,
        sales_date: row.try_get("SalesDate")?,
        origin_so_number: row.try_get("OriginSONumber")?,
        origin_so_item: row.try_get("OriginSOItem")?,
        new_so_number: row.try_get("NewSONumber")?,
        new_so_item: row.try_get("NewSOItem")?,
        invoice_number: row.try_get("InvoiceNumber")?,
        invoice_date: row.try_get("InvoiceDate")?,
        credit_note: row.try_get("CreditNote")?,
        validity_period: row.try_get("ValidityPeriod")?,
        cost_center: row.try_get("CostCenter")?,
        sloc: row.try_get("Sloc")?,
        export_status: row.try_get("ExportStatus")?,
        created_at: row.try_get("CreatedAt")?,
    })
}

fn count(row: &Row, index: usize) -> Result<u64> {
    let value: i64 = row.try_get(index)?;
    Ok(u64::try_from(value).unwrap_or_default())
}

#[async_trait]
impl DatabaseClient for PostgresStore {
    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.client.run_migrations().await
    }
}

#[async_trait]
impl TableStore for PostgresStore {
    async fn create_staging_table(&self, target: &str, staging: &str) -> Result<()> {
        let sql = format!(
            "CREATE TABLE {} (LIKE {} INCLUDING DEFAULTS INCLUDING CONSTRAINTS INCLUDING IDENTITY)",
            quote_qualified(staging),
            quote_qualified(target)
        );
        self.client.execute(&sql, &[]).await?;
        tracing::debug!(target = target, staging = staging, "Staging table created");
        Ok(())
    }

    async fn bulk_insert(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<ColumnValue>],
    ) -> Result<u64> {
        check_width(columns, rows)?;

        let mut conn = self.client.connection().await?;
        let tx = conn.transaction().await?;
        let mut inserted = 0;

        for chunk in rows.chunks(rows_per_statement(columns.len())) {
            let sql = insert_sql(table, columns, chunk.len());
            let params: Vec<&(dyn ToSql + Sync)> =
                chunk.iter().flat_map(|row| bind(row)).collect();
            inserted += tx.execute(sql.as_str(), &params).await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn insert_row(&self, table: &str, columns: &[&str], row: &[ColumnValue]) -> Result<()> {
        let sql = insert_sql(table, columns, 1);
        let params: Vec<&(dyn ToSql + Sync)> = bind(row).collect();
        self.client.execute(&sql, &params).await?;
        Ok(())
    }

    async fn truncate_table(&self, table: &str) -> Result<()> {
        let sql = format!("TRUNCATE TABLE {}", quote_qualified(table));
        self.client.execute(&sql, &[]).await?;
        Ok(())
    }

    async fn drop_table(&self, table: &str) -> Result<()> {
        let sql = format!("DROP TABLE IF EXISTS {}", quote_qualified(table));
        self.client.execute(&sql, &[]).await?;
        Ok(())
    }

    async fn merge(&self, plan: &MergePlan) -> Result<u64> {
        let sql = plan.to_sql();
        tracing::debug!(target = %plan.target, strategy = %plan.strategy, "Merging staging table");
        self.client.execute(&sql, &[]).await
    }

    async fn list_tables(&self, prefix: &str) -> Result<Vec<String>> {
        let (schema, name_prefix) = match prefix.split_once('.') {
            Some((schema, name)) => (Some(schema), name),
            None => (None, prefix),
        };

        let rows = self
            .client
            .query(
                "SELECT table_name::text
                 FROM information_schema.tables
                 WHERE table_schema::text = COALESCE($1::text, current_schema()::text)
                   AND left(table_name::text, length($2::text)) = $2::text
                 ORDER BY table_name",
                &[&schema, &name_prefix],
            )
            .await?;

        rows.iter()
            .map(|row| {
                let name: String = row.try_get(0)?;
                Ok(match schema {
                    Some(schema) => format!("{schema}.{name}"),
                    None => name,
                })
            })
            .collect()
    }
}

#[async_trait]
impl QueueStore for PostgresStore {
    async fn find_unqueued(
        &self,
        window: &DiscoveryWindow,
        diagram_ids: &[&str],
    ) -> Result<Vec<QueueCandidate>> {
        let sql = format!(
            "SELECT s.requisition_id, s.serial_id, s.diagram_id
             FROM {req} s
             LEFT JOIN {queue} q ON q.\"RequisitionID\" = s.requisition_id
             WHERE s.status = 1
               AND s.diagram_id = ANY($1)
               AND ($2::timestamp IS NULL OR s.time_start >= $2)
               AND s.time_last_action < $3
               AND q.\"RequisitionID\" IS NULL
             ORDER BY s.requisition_id",
            req = self.tables.workflow("requisition"),
            queue = self.queue(),
        );
        let diagrams: Vec<&str> = diagram_ids.to_vec();
        let rows = self
            .client
            .query(&sql, &[&diagrams, &window.start, &window.end])
            .await?;

        rows.iter()
            .map(|row| {
                Ok(QueueCandidate {
                    requisition_id: requisition_id(row)?,
                    diagram_id: row.try_get("diagram_id")?,
                    serial_id: row.try_get("serial_id")?,
                })
            })
            .collect()
    }

    async fn insert_entries(&self, entries: &[QueueEntry]) -> Result<u64> {
        if entries.is_empty() {
            return Ok(0);
        }

        let columns = [
            "RequisitionID",
            "DiagramID",
            "SerialID",
            "CreatedAt",
            "ProcessedAt",
            "ExportCount",
        ];
        let values: Vec<Vec<ColumnValue>> = entries
            .iter()
            .map(|e| {
                vec![
                    ColumnValue::text(e.requisition_id.as_str()),
                    ColumnValue::text(e.diagram_id.as_str()),
                    ColumnValue::text(e.serial_id.as_str()),
                    ColumnValue::Timestamp(Some(e.created_at)),
                    ColumnValue::Timestamp(e.processed_at),
                    ColumnValue::Int(Some(e.export_count)),
                ]
            })
            .collect();

        let mut conn = self.client.connection().await?;
        let tx = conn.transaction().await?;
        let mut inserted = 0;

        for chunk in values.chunks(rows_per_statement(columns.len())) {
            let sql = format!(
                "{} ON CONFLICT (\"RequisitionID\") DO NOTHING",
                insert_sql(&self.tables.queue, &columns, chunk.len())
            );
            let params: Vec<&(dyn ToSql + Sync)> =
                chunk.iter().flat_map(|row| bind(row)).collect();
            inserted += tx.execute(sql.as_str(), &params).await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn mark_processed(&self, processed_at: NaiveDateTime) -> Result<u64> {
        let sql = format!(
            "UPDATE {} SET \"ProcessedAt\" = $1 WHERE \"ProcessedAt\" IS NULL",
            self.queue()
        );
        self.client.execute(&sql, &[&processed_at]).await
    }

    async fn queue_counts(&self) -> Result<Vec<QueueCounts>> {
        let sql = format!(
            "SELECT \"DiagramID\",
                    COUNT(*) FILTER (WHERE \"ProcessedAt\" IS NULL),
                    COUNT(*) FILTER (WHERE \"ProcessedAt\" IS NOT NULL)
             FROM {}
             GROUP BY \"DiagramID\"
             ORDER BY \"DiagramID\"",
            self.queue()
        );
        let rows = self.client.query(&sql, &[]).await?;

        rows.iter()
            .map(|row| {
                Ok(QueueCounts {
                    diagram_id: row.try_get(0)?,
                    pending: count(row, 1)?,
                    processed: count(row, 2)?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl SourceProvider for PostgresStore {
    async fn fetch_order_batch(&self) -> Result<OrderBatch> {
        let source = |detail: &str, alias: &str| {
            self.pending_source(DomainVariant::Order, "order_master", detail, alias)
        };
        let order_filter = format!("AND m.request_type IN {ORDER_REQUEST_TYPES}");

        let details_sql = format!(
            "SELECT s.requisition_id, s.serial_id, s.time_last_action,
                    m.applicant_id, m.invoice, m.customer_code, m.customer_name,
                    COALESCE(m.customer_sp_code, '') AS ship_to_code, m.remark,
                    m.request_type, m.quotation_type, m.price_group,
                    d.item_no, d.material_code, d.qty, d.uom, d.purpose,
                    d.old_invoice_price_with_tax, d.new_invoice_price_with_tax,
                    d.old_sale_price_with_tax, d.new_sale_price_with_tax
             {source}
             {order_filter}
             ORDER BY s.requisition_id, d.item_no",
            source = source("order_detail", "d"),
        );

        let free_goods_sql = format!(
            "SELECT f.requisition_id, f.material_code, f.free_material_code, f.free_qty,
                    f.uom, f.purpose
             {source}
             {order_filter}
               AND f.free_qty > 0
             ORDER BY f.requisition_id",
            source = source("order_free_goods", "f"),
        );

        let add_ons_sql = format!(
            "SELECT s.requisition_id, s.serial_id, s.time_last_action,
                    m.applicant_id, m.invoice, m.customer_code, m.customer_name,
                    COALESCE(m.customer_sp_code, '') AS ship_to_code, m.remark,
                    a.item_no, a.material_code, a.add_qty, a.uom, a.purpose
             {source}
             {order_filter}
               AND a.add_qty > 0
             ORDER BY s.requisition_id, a.item_no",
            source = source("order_add_on", "a"),
        );

        let details = self
            .client
            .query(&details_sql, &[])
            .await?
            .iter()
            .map(|row| {
                Ok(OrderDetail {
                    header: header_from_row(row)?,
                    request_type: row.try_get("request_type")?,
                    quotation_type: row.try_get("quotation_type")?,
                    price_group: row.try_get("price_group")?,
                    item_no: row.try_get("item_no")?,
                    material_code: row.try_get("material_code")?,
                    qty: row.try_get("qty")?,
                    uom: row.try_get("uom")?,
                    purpose: row.try_get("purpose")?,
                    old_invoice_price: row.try_get("old_invoice_price_with_tax")?,
                    new_invoice_price: row.try_get("new_invoice_price_with_tax")?,
                    old_sale_price: row.try_get("old_sale_price_with_tax")?,
                    new_sale_price: row.try_get("new_sale_price_with_tax")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let free_goods = self
            .client
            .query(&free_goods_sql, &[])
            .await?
            .iter()
            .map(|row| {
                Ok(FreeGoodsDetail {
                    requisition_id: requisition_id(row)?,
                    material_code: row.try_get("material_code")?,
                    free_material_code: row.try_get("free_material_code")?,
                    free_qty: row.try_get("free_qty")?,
                    uom: row.try_get("uom")?,
                    purpose: row.try_get("purpose")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let add_ons = self
            .client
            .query(&add_ons_sql, &[])
            .await?
            .iter()
            .map(|row| {
                Ok(AddOnDetail {
                    header: header_from_row(row)?,
                    item_no: row.try_get("item_no")?,
                    material_code: row.try_get("material_code")?,
                    add_qty: row.try_get("add_qty")?,
                    uom: row.try_get("uom")?,
                    purpose: row.try_get("purpose")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            details = details.len(),
            free_goods = free_goods.len(),
            add_ons = add_ons.len(),
            "Fetched order rows"
        );
        Ok(OrderBatch {
            details,
            free_goods,
            add_ons,
        })
    }

    async fn fetch_sample_details(&self) -> Result<Vec<SampleDetail>> {
        let source =
            self.pending_source(DomainVariant::Sample, "sample_master", "sample_detail", "d");
        let sql = format!(
            "SELECT s.requisition_id, s.serial_id, s.time_last_action,
                    m.applicant_id, m.invoice, m.customer_code, m.customer_name,
                    COALESCE(m.customer_sp_code, m.customer_code) AS ship_to_code,
                    m.remark, m.funding_source,
                    d.d_no, d.material_code, d.qty, d.uom, COALESCE(d.purpose, '') AS purpose
             {source}
             ORDER BY s.requisition_id, d.d_no"
        );

        self.client
            .query(&sql, &[])
            .await?
            .iter()
            .map(|row| {
                Ok(SampleDetail {
                    header: header_from_row(row)?,
                    funding_source: row.try_get("funding_source")?,
                    d_no: row.try_get("d_no")?,
                    material_code: row.try_get("material_code")?,
                    qty: row.try_get("qty")?,
                    uom: row.try_get("uom")?,
                    purpose: row.try_get("purpose")?,
                })
            })
            .collect()
    }

    async fn fetch_return_details(&self) -> Result<Vec<ReturnDetail>> {
        let source =
            self.pending_source(DomainVariant::Return, "return_master", "return_detail", "d");
        let arich = self.tables.reference("Sales_ArichSOMaster");
        let zl = self.tables.reference("Sales_ZLSOMaster");
        let sql = format!(
            "SELECT s.requisition_id, s.serial_id, s.time_last_action,
                    m.applicant_id, m.invoice, m.customer_code, m.customer_name,
                    COALESCE((
                        SELECT sp.\"SPNumber\" FROM (
                            SELECT \"SPNumber\" FROM {arich}
                            WHERE \"SONumber\" = d.sales_order_number AND \"SOItem\" = d.so_item
                            UNION ALL
                            SELECT \"SPNumber\" FROM {zl}
                            WHERE \"SONumber\" = d.sales_order_number AND \"SOItem\" = d.so_item
                        ) sp LIMIT 1
                    ), '') AS ship_to_code,
                    m.remark, m.request_type,
                    d.item_no, d.material_code, d.qty, d.uom, COALESCE(d.notes, '') AS notes,
                    d.batch, d.sales_order_number, d.so_item, d.invoice_number, d.invoice_date,
                    d.old_unit_price_in_tax, d.total_unit_price_in_tax,
                    d.new_unit_price_in_tax, d.new_total_unit_price_in_tax,
                    d.exchange_out, d.return_code, d.sales_date, d.discount_order_number
             {source}
             ORDER BY s.requisition_id, d.item_no"
        );

        self.client
            .query(&sql, &[])
            .await?
            .iter()
            .map(|row| {
                Ok(ReturnDetail {
                    header: header_from_row(row)?,
                    request_type: row.try_get("request_type")?,
                    item_no: row.try_get("item_no")?,
                    material_code: row.try_get("material_code")?,
                    qty: row.try_get("qty")?,
                    uom: row.try_get("uom")?,
                    notes: row.try_get("notes")?,
                    batch: row.try_get("batch")?,
                    sales_order_number: row.try_get("sales_order_number")?,
                    so_item: row.try_get("so_item")?,
                    invoice_number: row.try_get("invoice_number")?,
                    invoice_date: row.try_get("invoice_date")?,
                    old_unit_price: row.try_get("old_unit_price_in_tax")?,
                    total_unit_price: row.try_get("total_unit_price_in_tax")?,
                    new_unit_price: row.try_get("new_unit_price_in_tax")?,
                    new_total_unit_price: row.try_get("new_total_unit_price_in_tax")?,
                    exchange_out: row.try_get("exchange_out")?,
                    return_code: row.try_get("return_code")?,
                    sales_date: row.try_get("sales_date")?,
                    discount_order_number: row.try_get("discount_order_number")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl ExportStore for PostgresStore {
    async fn pending_exports(&self, receiving_party: Option<&str>) -> Result<Vec<ExportLineItem>> {
        let sql = format!(
            "SELECT * FROM {}
             WHERE \"ExportedAt\" IS NULL
               AND ($1::varchar IS NULL OR \"ReceivingParty\" = $1)
             ORDER BY \"FormNo\", \"FormItem\"",
            self.export()
        );
        let rows = self.client.query(&sql, &[&receiving_party]).await?;
        rows.iter().map(export_line_from_row).collect()
    }

    async fn mark_exported(&self, exported_at: NaiveDateTime) -> Result<u64> {
        let sql = format!(
            "UPDATE {} SET \"ExportedAt\" = $1, \"ExportStatus\" = 1 WHERE \"ExportedAt\" IS NULL",
            self.export()
        );
        self.client.execute(&sql, &[&exported_at]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_sql_numbers_placeholders_per_row() {
        let sql = insert_sql("erp.Items", &["Code", "Name"], 2);
        assert_eq!(
            sql,
            "INSERT INTO \"erp\".\"Items\" (\"Code\", \"Name\") VALUES ($1, $2), ($3, $4)"
        );
    }

    #[test]
    fn test_rows_per_statement_respects_bind_limit() {
        assert_eq!(rows_per_statement(45), 1456);
        assert!(rows_per_statement(45) * 45 <= MAX_BIND_PARAMS);
        assert_eq!(rows_per_statement(0), MAX_BIND_PARAMS);
    }

    #[test]
    fn test_check_width_rejects_ragged_rows() {
        let rows = vec![
            vec![ColumnValue::text("a"), ColumnValue::text("b")],
            vec![ColumnValue::text("c")],
        ];
        let err = check_width(&["A", "B"], &rows).unwrap_err();
        assert!(err.to_string().contains("Row 1"));
    }

    #[test]
    fn test_bind_keeps_value_order() {
        let row = vec![ColumnValue::text("x"), ColumnValue::Int(None)];
        assert_eq!(bind(&row).count(), 2);
    }

    #[test]
    fn test_reference_table_qualification() {
        let tables = PostgresTables {
            queue: "fourpl_datatrans_queue".to_string(),
            export: "fourpl_datatrans_export".to_string(),
            workflow_schema: "bpm".to_string(),
            reference_schema: Some("sapds".to_string()),
        };
        assert_eq!(
            tables.reference("Sales_ZLSOMaster"),
            "\"sapds\".\"Sales_ZLSOMaster\""
        );
        assert_eq!(tables.workflow("requisition"), "\"bpm\".requisition");
    }
}
