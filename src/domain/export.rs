//! Canonical export line
//!
//! One `ExportLineItem` is one ERP-bound line. Lines are built by the rule
//! engine and never mutated afterwards.

use super::ids::RequisitionId;
use super::schema::{FieldDefault, FieldSpec, TableSchema};
use super::value::{ColumnValue, StageRow};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output line classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    /// Primary sale
    #[serde(rename = "ZTW1")]
    Primary,
    /// Price discount against a primary line
    #[serde(rename = "ZTW2")]
    Discount,
    /// Return discount or sales discount
    #[serde(rename = "ZTW3")]
    ReturnDiscount,
    /// Sales return
    #[serde(rename = "ZTW4")]
    SalesReturn,
    /// Free goods and add-on items
    #[serde(rename = "ZTW5")]
    FreeGoods,
    /// Free sample
    #[serde(rename = "ZTW6")]
    Sample,
    /// Goods returned to stock
    #[serde(rename = "ZTW7")]
    ReturnToStock,
    /// Replacement shipped out
    #[serde(rename = "ZTW8")]
    ExchangeOut,
    /// Rebill at the new price
    #[serde(rename = "ZTWB")]
    ExchangeRebill,
}

impl ItemCategory {
    pub fn code(self) -> &'static str {
        match self {
            Self::Primary => "ZTW1",
            Self::Discount => "ZTW2",
            Self::ReturnDiscount => "ZTW3",
            Self::SalesReturn => "ZTW4",
            Self::FreeGoods => "ZTW5",
            Self::Sample => "ZTW6",
            Self::ReturnToStock => "ZTW7",
            Self::ExchangeOut => "ZTW8",
            Self::ExchangeRebill => "ZTWB",
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ItemCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ZTW1" => Ok(Self::Primary),
            "ZTW2" => Ok(Self::Discount),
            "ZTW3" => Ok(Self::ReturnDiscount),
            "ZTW4" => Ok(Self::SalesReturn),
            "ZTW5" => Ok(Self::FreeGoods),
            "ZTW6" => Ok(Self::Sample),
            "ZTW7" => Ok(Self::ReturnToStock),
            "ZTW8" => Ok(Self::ExchangeOut),
            "ZTWB" => Ok(Self::ExchangeRebill),
            other => Err(format!("Unknown item category '{other}'")),
        }
    }
}

/// Debit or credit side of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebitCredit {
    #[serde(rename = "D")]
    Debit,
    #[serde(rename = "C")]
    Credit,
}

impl DebitCredit {
    pub fn code(self) -> &'static str {
        match self {
            Self::Debit => "D",
            Self::Credit => "C",
        }
    }
}

impl FromStr for DebitCredit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "D" => Ok(Self::Debit),
            "C" => Ok(Self::Credit),
            other => Err(format!("Unknown debit/credit type '{other}'")),
        }
    }
}

/// One canonical ERP-bound line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportLineItem {
    #[serde(rename = "RequisitionID")]
    pub requisition_id: RequisitionId,
    pub form_no: String,
    pub form_item: String,
    pub form_ref_item: String,
    #[serde(rename = "ApplicantID")]
    pub applicant_id: String,
    pub sales_org: String,
    pub distribution_channel: String,
    pub division: String,
    pub receiving_party: String,
    pub customer_code: String,
    pub customer_name: String,
    #[serde(rename = "SPNumber")]
    pub sp_number: String,
    pub sales_channel: String,
    pub approval_date: String,
    pub remark: Option<String>,
    pub item_category: ItemCategory,
    pub pricing_type: String,
    pub pricing_group: String,
    pub material_code: String,
    pub batch: String,
    pub sales_unit: String,
    pub qty: Decimal,
    #[serde(rename = "DebitCreditType")]
    pub debit_credit: DebitCredit,
    pub currency: String,
    pub invoice_price_with_tax: Decimal,
    pub invoice_price: Decimal,
    pub total_invoice_price_with_tax: Decimal,
    pub total_invoice_price: Decimal,
    pub fixed_price_with_tax: Decimal,
    pub pricing_unit: String,
    pub item_purpose: String,
    pub return_code: String,
    pub sales_date: String,
    #[serde(rename = "OriginSONumber")]
    pub origin_so_number: String,
    #[serde(rename = "OriginSOItem")]
    pub origin_so_item: String,
    #[serde(rename = "NewSONumber")]
    pub new_so_number: String,
    #[serde(rename = "NewSOItem")]
    pub new_so_item: String,
    pub invoice_number: String,
    pub invoice_date: String,
    pub credit_note: String,
    pub validity_period: String,
    pub cost_center: Option<String>,
    pub sloc: String,
    pub export_status: i32,
    pub created_at: NaiveDateTime,
}

/// Export table columns in storage order
pub const EXPORT_FIELDS: &[FieldSpec] = &[
    FieldSpec::column("RequisitionID"),
    FieldSpec::column("FormNo"),
    FieldSpec::column("FormItem"),
    FieldSpec::column("FormRefItem"),
    FieldSpec::column("ApplicantID"),
    FieldSpec::column("SalesOrg"),
    FieldSpec::column("DistributionChannel"),
    FieldSpec::column("Division"),
    FieldSpec::column("ReceivingParty"),
    FieldSpec::column("CustomerCode"),
    FieldSpec::column("CustomerName"),
    FieldSpec::column("SPNumber"),
    FieldSpec::column("SalesChannel"),
    FieldSpec::column("ApprovalDate"),
    FieldSpec::column("Remark"),
    FieldSpec::column("ItemCategory"),
    FieldSpec::column("PricingType"),
    FieldSpec::column("PricingGroup"),
    FieldSpec::column("MaterialCode"),
    FieldSpec::column("Batch"),
    FieldSpec::column("SalesUnit"),
    FieldSpec::numeric("Qty", "Qty"),
    FieldSpec::column("DebitCreditType"),
    FieldSpec::column("Currency"),
    FieldSpec::numeric("InvoicePriceWithTax", "InvoicePriceWithTax"),
    FieldSpec::numeric("InvoicePrice", "InvoicePrice"),
    FieldSpec::numeric("TotalInvoicePriceWithTax", "TotalInvoicePriceWithTax"),
    FieldSpec::numeric("TotalInvoicePrice", "TotalInvoicePrice"),
    FieldSpec::numeric("FixedPriceWithTax", "FixedPriceWithTax"),
    FieldSpec::column("PricingUnit"),
    FieldSpec::column("ItemPurpose"),
    FieldSpec::column("ReturnCode"),
    FieldSpec::column("SalesDate"),
    FieldSpec::column("OriginSONumber"),
    FieldSpec::column("OriginSOItem"),
    FieldSpec::column("NewSONumber"),
    FieldSpec::column("NewSOItem"),
    FieldSpec::column("InvoiceNumber"),
    FieldSpec::column("InvoiceDate"),
    FieldSpec::column("CreditNote"),
    FieldSpec::column("ValidityPeriod"),
    FieldSpec::column("CostCenter"),
    FieldSpec::column("Sloc"),
    FieldSpec::skipped("ExportStatus", FieldDefault::Text("0")),
    FieldSpec::skipped("CreatedAt", FieldDefault::Now),
];

/// Export lines are matched on requisition and item number
pub const EXPORT_KEY: &[&str] = &["RequisitionID", "FormItem"];

/// Descriptor of the export table
pub fn export_schema(table: impl Into<String>) -> TableSchema {
    TableSchema::new(table, "Record", EXPORT_KEY, EXPORT_FIELDS)
}

impl ExportLineItem {
    /// Key string used in failure reports
    pub fn key(&self) -> String {
        format!("{}|{}", self.requisition_id, self.form_item)
    }

    /// Short description used in row-level error messages
    pub fn describe(&self) -> String {
        format!(
            "RequisitionID={}, FormNo={}, FormItem={}, Category={}",
            self.requisition_id, self.form_no, self.form_item, self.item_category
        )
    }
}

impl StageRow for ExportLineItem {
    fn column_values(&self) -> Vec<ColumnValue> {
        let text = |s: &str| ColumnValue::text(s);
        let money = |d: Decimal| ColumnValue::Decimal(Some(d));
        vec![
            text(self.requisition_id.as_str()),
            text(&self.form_no),
            text(&self.form_item),
            text(&self.form_ref_item),
            text(&self.applicant_id),
            text(&self.sales_org),
            text(&self.distribution_channel),
            text(&self.division),
            text(&self.receiving_party),
            text(&self.customer_code),
            text(&self.customer_name),
            text(&self.sp_number),
            text(&self.sales_channel),
            text(&self.approval_date),
            ColumnValue::Text(self.remark.clone()),
            text(self.item_category.code()),
            text(&self.pricing_type),
            text(&self.pricing_group),
            text(&self.material_code),
            text(&self.batch),
            text(&self.sales_unit),
            money(self.qty),
            text(self.debit_credit.code()),
            text(&self.currency),
            money(self.invoice_price_with_tax),
            money(self.invoice_price),
            money(self.total_invoice_price_with_tax),
            money(self.total_invoice_price),
            money(self.fixed_price_with_tax),
            text(&self.pricing_unit),
            text(&self.item_purpose),
            text(&self.return_code),
            text(&self.sales_date),
            text(&self.origin_so_number),
            text(&self.origin_so_item),
            text(&self.new_so_number),
            text(&self.new_so_item),
            text(&self.invoice_number),
            text(&self.invoice_date),
            text(&self.credit_note),
            text(&self.validity_period),
            ColumnValue::Text(self.cost_center.clone()),
            text(&self.sloc),
            ColumnValue::Int(Some(self.export_status)),
            ColumnValue::Timestamp(Some(self.created_at)),
        ]
    }
}
