//! Export line assembly
//!
//! A line is the form context of its requisition plus the per-rule parts:
//! item basis, price fields and line extras. Organisation constants are
//! filled in here.

use super::format::{approval_date, form_no, format_item};
use super::pricing::PriceFields;
use crate::domain::{DebitCredit, ExportLineItem, FormHeader, ItemCategory, RequisitionId};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;

pub const SALES_ORG: &str = "TW02";
pub const DISTRIBUTION_CHANNEL: &str = "10";
pub const DIVISION: &str = "10";
pub const CURRENCY: &str = "TWD";

/// Invoice flag value billed through the logistics partner
const PARTNER_INVOICE: i32 = 2;

/// Requisition-level fields shared by every line of one form
#[derive(Debug, Clone, PartialEq)]
pub struct FormContext {
    pub requisition_id: RequisitionId,
    pub form_no: String,
    pub approval_date: String,
    pub applicant_id: String,
    pub invoice: i32,
    pub customer_code: String,
    pub customer_name: String,
    pub sp_number: String,
    pub remark: String,
    pub created_at: NaiveDateTime,
}

impl FormContext {
    pub fn from_header(header: &FormHeader, created_at: NaiveDateTime) -> Self {
        Self {
            requisition_id: header.requisition_id.clone(),
            form_no: form_no(&header.serial_id),
            approval_date: approval_date(header.time_last_action),
            applicant_id: header.applicant_id.clone(),
            invoice: header.invoice,
            customer_code: header.customer_code.clone(),
            customer_name: header.customer_name.clone(),
            sp_number: header.ship_to_code.clone(),
            remark: header.remark.clone().unwrap_or_default(),
            created_at,
        }
    }

    pub fn with_remark(mut self, remark: String) -> Self {
        self.remark = remark;
        self
    }

    /// `L` for partner-invoiced forms, `B` otherwise
    pub fn receiving_party(&self) -> &'static str {
        if self.invoice == PARTNER_INVOICE {
            "L"
        } else {
            "B"
        }
    }
}

/// Material and quantity part of a line
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemBasis {
    pub pricing_type: String,
    pub pricing_group: String,
    pub material_code: String,
    pub batch: String,
    pub qty: Decimal,
    pub sales_unit: String,
}

/// Purpose, return and cost-center fields of a line
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineExtras {
    pub item_purpose: String,
    pub return_code: String,
    pub sales_date: String,
    pub origin_so_number: String,
    pub origin_so_item: String,
    pub invoice_number: String,
    pub invoice_date: String,
    pub credit_note: String,
    pub cost_center: String,
}

impl LineExtras {
    /// Extras carrying only an item purpose
    pub fn purpose(item_purpose: impl Into<String>) -> Self {
        Self {
            item_purpose: item_purpose.into(),
            ..Self::default()
        }
    }

    pub fn with_return_code(mut self, code: impl Into<String>) -> Self {
        self.return_code = code.into();
        self
    }
}

/// Everything a rule decides about one line
#[derive(Debug, Clone, PartialEq)]
pub struct LineParts {
    pub category: ItemCategory,
    pub debit_credit: DebitCredit,
    pub item: ItemBasis,
    pub price: PriceFields,
    pub extras: LineExtras,
}

/// Builds the export line for item `item_no`
pub fn build_line(
    ctx: &FormContext,
    item_no: u32,
    form_ref_item: Option<u32>,
    parts: LineParts,
) -> ExportLineItem {
    let LineParts {
        category,
        debit_credit,
        item,
        price,
        extras,
    } = parts;

    ExportLineItem {
        requisition_id: ctx.requisition_id.clone(),
        form_no: ctx.form_no.clone(),
        form_item: format_item(item_no),
        form_ref_item: form_ref_item
            .filter(|r| *r > 0)
            .map(format_item)
            .unwrap_or_default(),
        applicant_id: ctx.applicant_id.clone(),
        sales_org: SALES_ORG.to_string(),
        distribution_channel: DISTRIBUTION_CHANNEL.to_string(),
        division: DIVISION.to_string(),
        receiving_party: ctx.receiving_party().to_string(),
        customer_code: ctx.customer_code.clone(),
        customer_name: ctx.customer_name.clone(),
        sp_number: ctx.sp_number.clone(),
        sales_channel: String::new(),
        approval_date: ctx.approval_date.clone(),
        remark: non_empty(&ctx.remark),
        item_category: category,
        pricing_type: item.pricing_type,
        pricing_group: item.pricing_group,
        material_code: item.material_code,
        batch: item.batch,
        sales_unit: item.sales_unit,
        qty: item.qty,
        debit_credit,
        currency: CURRENCY.to_string(),
        invoice_price_with_tax: price.invoice_price_with_tax,
        invoice_price: price.invoice_price,
        total_invoice_price_with_tax: price.total_invoice_price_with_tax,
        total_invoice_price: price.total_invoice_price,
        fixed_price_with_tax: price.fixed_price_with_tax,
        pricing_unit: price.pricing_unit.to_string(),
        item_purpose: extras.item_purpose,
        return_code: extras.return_code,
        sales_date: extras.sales_date,
        origin_so_number: extras.origin_so_number,
        origin_so_item: extras.origin_so_item,
        new_so_number: String::new(),
        new_so_item: String::new(),
        invoice_number: extras.invoice_number,
        invoice_date: extras.invoice_date,
        credit_note: extras.credit_note,
        validity_period: String::new(),
        cost_center: non_empty(&extras.cost_center),
        sloc: String::new(),
        export_status: 0,
        created_at: ctx.created_at,
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
