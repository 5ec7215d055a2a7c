//! Source detail rows read from the workflow store
//!
//! Every row is a flattened join of requisition, master and detail data.
//! Rows are read-only inputs to the rule engine.

use super::ids::RequisitionId;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Form-level fields repeated on every detail row of a requisition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormHeader {
    pub requisition_id: RequisitionId,
    /// Workflow serial code; the form number is cut out of it
    pub serial_id: String,
    pub time_last_action: NaiveDateTime,
    pub applicant_id: String,
    /// Invoicing party flag: 2 bills through the logistics partner
    pub invoice: i32,
    pub customer_code: String,
    pub customer_name: String,
    /// Ship-to code
    pub ship_to_code: String,
    pub remark: Option<String>,
}

/// Order form detail line with its pricing pairs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub header: FormHeader,
    pub request_type: i32,
    pub quotation_type: String,
    pub price_group: Option<String>,
    pub item_no: i32,
    pub material_code: String,
    pub qty: Decimal,
    pub uom: String,
    pub purpose: Option<String>,
    pub old_invoice_price: Decimal,
    pub new_invoice_price: Decimal,
    pub old_sale_price: Decimal,
    pub new_sale_price: Decimal,
}

/// Free goods attached to an order material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeGoodsDetail {
    pub requisition_id: RequisitionId,
    /// Material of the order line this row belongs to
    pub material_code: String,
    pub free_material_code: String,
    pub free_qty: Decimal,
    pub uom: String,
    pub purpose: Option<String>,
}

/// Extra no-charge item requested on an order form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOnDetail {
    pub header: FormHeader,
    pub item_no: i32,
    pub material_code: String,
    pub add_qty: Decimal,
    pub uom: String,
    pub purpose: Option<String>,
}

/// All order inputs of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBatch {
    pub details: Vec<OrderDetail>,
    pub free_goods: Vec<FreeGoodsDetail>,
    pub add_ons: Vec<AddOnDetail>,
}

impl OrderBatch {
    pub fn is_empty(&self) -> bool {
        self.details.is_empty() && self.free_goods.is_empty() && self.add_ons.is_empty()
    }
}

/// Sample request detail line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleDetail {
    pub header: FormHeader,
    pub funding_source: Option<String>,
    /// Row number on the form, expected to run 1, 2, 3, ...
    pub d_no: i32,
    pub material_code: String,
    pub qty: Decimal,
    pub uom: String,
    pub purpose: String,
}

/// Return form detail line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnDetail {
    pub header: FormHeader,
    pub request_type: i32,
    pub item_no: i32,
    pub material_code: String,
    pub qty: Decimal,
    pub uom: String,
    pub notes: String,
    pub batch: Option<String>,
    pub sales_order_number: Option<String>,
    pub so_item: Option<String>,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<String>,
    pub old_unit_price: Decimal,
    pub total_unit_price: Decimal,
    pub new_unit_price: Decimal,
    pub new_total_unit_price: Decimal,
    pub exchange_out: Decimal,
    pub return_code: Option<String>,
    pub sales_date: Option<String>,
    pub discount_order_number: Option<String>,
}

/// Requisition not yet in the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCandidate {
    pub requisition_id: RequisitionId,
    pub diagram_id: String,
    pub serial_id: String,
}

/// Dedup and state record for one requisition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub requisition_id: RequisitionId,
    pub diagram_id: String,
    pub serial_id: String,
    pub created_at: NaiveDateTime,
    pub processed_at: Option<NaiveDateTime>,
    pub export_count: i32,
}

impl QueueEntry {
    /// New unprocessed entry for a discovered requisition
    pub fn enqueue(candidate: QueueCandidate, now: NaiveDateTime) -> Self {
        Self {
            requisition_id: candidate.requisition_id,
            diagram_id: candidate.diagram_id,
            serial_id: candidate.serial_id,
            created_at: now,
            processed_at: None,
            export_count: 0,
        }
    }

    pub fn is_processed(&self) -> bool {
        self.processed_at.is_some()
    }
}
