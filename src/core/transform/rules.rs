//! Declarative rule tables
//!
//! Each variant is an ordered list of `LineRule`s evaluated against one
//! detail row. A rule decides whether it fires, the category and side of
//! the line, how quantity and price are selected, and which item number the
//! line references. All lines produced from one detail row form a group;
//! the first number handed out to the group is its head.

use super::format::ItemCounter;
use super::line::{build_line, FormContext, ItemBasis, LineExtras, LineParts};
use super::pricing::{discount_amount, pro_rate, PriceFields};
use crate::domain::{
    AddOnDetail, DebitCredit, ExportLineItem, FreeGoodsDetail, ItemCategory, OrderDetail,
    ReturnDetail, SampleDetail, TransformError,
};
use rust_decimal::Decimal;

/// Cost center charged for samples
pub const SAMPLE_COST_CENTER: &str = "TW02_72100";

/// Return code on order discount lines
const DISCOUNT_RETURN_CODE: &str = "201";

/// Return code on return-form sales discounts
const SALES_DISCOUNT_RETURN_CODE: &str = "200";

/// Which item number a line points back to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefLink {
    /// First item number of the detail row's group
    GroupHead,
    /// The line's own item number
    OwnItem,
    /// No reference
    Blank,
}

/// One row of a rule table
pub struct LineRule<D> {
    pub category: ItemCategory,
    pub debit_credit: DebitCredit,
    pub applies: fn(&D) -> bool,
    pub item: fn(&D) -> ItemBasis,
    pub price: fn(&D) -> Result<PriceFields, TransformError>,
    pub extras: fn(&D) -> LineExtras,
    pub link: RefLink,
}

impl<D> LineRule<D> {
    /// Builds the line parts if the rule fires for `detail`
    pub fn evaluate(&self, detail: &D) -> Result<Option<LineParts>, TransformError> {
        if !(self.applies)(detail) {
            return Ok(None);
        }
        Ok(Some(LineParts {
            category: self.category,
            debit_credit: self.debit_credit,
            item: (self.item)(detail),
            price: (self.price)(detail)?,
            extras: (self.extras)(detail),
        }))
    }
}

/// Runs `rules` against one detail row, numbering lines from `counter`
///
/// The group head is the number the first line receives.
pub fn apply_rules<D>(
    rules: &[LineRule<D>],
    detail: &D,
    ctx: &FormContext,
    counter: &mut ItemCounter,
    out: &mut Vec<ExportLineItem>,
) -> Result<(), TransformError> {
    let head = counter.peek();
    apply_linked(rules, detail, ctx, head, counter, out)
}

/// Like [`apply_rules`] but joins an existing group headed by `head`
///
/// Lines are only appended to `out` when every rule evaluated cleanly.
pub fn apply_linked<D>(
    rules: &[LineRule<D>],
    detail: &D,
    ctx: &FormContext,
    head: u32,
    counter: &mut ItemCounter,
    out: &mut Vec<ExportLineItem>,
) -> Result<(), TransformError> {
    let mut parts = Vec::with_capacity(rules.len());
    for rule in rules {
        if let Some(p) = rule.evaluate(detail)? {
            parts.push((rule.link, p));
        }
    }

    for (link, p) in parts {
        let item_no = counter.advance();
        let reference = match link {
            RefLink::GroupHead => Some(head),
            RefLink::OwnItem => Some(item_no),
            RefLink::Blank => None,
        };
        out.push(build_line(ctx, item_no, reference, p));
    }
    Ok(())
}

fn always<D>(_: &D) -> bool {
    true
}

// ---------------------------------------------------------------------------
// Order

/// Request types priced with the old invoice/sale pair
fn uses_old_prices(request_type: i32) -> bool {
    matches!(request_type, 1 | 4)
}

/// Charged and fixed unit price selected by request type
pub fn order_prices(d: &OrderDetail) -> (Decimal, Decimal) {
    if uses_old_prices(d.request_type) {
        (d.old_invoice_price, d.old_sale_price)
    } else {
        (d.new_invoice_price, d.new_sale_price)
    }
}

fn pricing_group(quotation_type: &str, customer_code: &str, price_group: Option<&str>) -> String {
    if quotation_type == "1" {
        customer_code.to_string()
    } else {
        price_group.unwrap_or_default().to_string()
    }
}

fn order_item(d: &OrderDetail) -> ItemBasis {
    ItemBasis {
        pricing_type: d.quotation_type.clone(),
        pricing_group: pricing_group(
            &d.quotation_type,
            &d.header.customer_code,
            d.price_group.as_deref(),
        ),
        material_code: d.material_code.clone(),
        batch: String::new(),
        qty: d.qty,
        sales_unit: d.uom.clone(),
    }
}

fn order_primary_price(d: &OrderDetail) -> Result<PriceFields, TransformError> {
    let (invoice, fixed) = order_prices(d);
    PriceFields::primary(invoice, fixed, d.qty)
}

fn order_discount(d: &OrderDetail) -> Result<Decimal, TransformError> {
    let (invoice, fixed) = order_prices(d);
    discount_amount(invoice, fixed, d.qty)
}

/// Fires unless the discount is exactly zero; an overflow lets the price
/// step report the error
fn has_discount(d: &OrderDetail) -> bool {
    order_discount(d).map_or(true, |amount| !amount.is_zero())
}

fn order_discount_price(d: &OrderDetail) -> Result<PriceFields, TransformError> {
    PriceFields::discount(order_discount(d)?)
}

fn order_extras(d: &OrderDetail) -> LineExtras {
    LineExtras::purpose(d.purpose.clone().unwrap_or_default())
}

fn order_discount_extras(d: &OrderDetail) -> LineExtras {
    order_extras(d).with_return_code(DISCOUNT_RETURN_CODE)
}

/// Primary sale, then its discount when the charged price differs
pub const ORDER_RULES: &[LineRule<OrderDetail>] = &[
    LineRule {
        category: ItemCategory::Primary,
        debit_credit: DebitCredit::Debit,
        applies: always::<OrderDetail>,
        item: order_item,
        price: order_primary_price,
        extras: order_extras,
        link: RefLink::GroupHead,
    },
    LineRule {
        category: ItemCategory::Discount,
        debit_credit: DebitCredit::Credit,
        applies: has_discount,
        item: order_item,
        price: order_discount_price,
        extras: order_discount_extras,
        link: RefLink::GroupHead,
    },
];

/// A free-goods row paired with the order line it was matched to
pub struct FreeGoodsLine<'a> {
    pub parent: &'a OrderDetail,
    pub free: &'a FreeGoodsDetail,
}

/// Free goods continue the parent order line's group
pub fn free_goods_rules<'a>() -> [LineRule<FreeGoodsLine<'a>>; 1] {
    [LineRule {
        category: ItemCategory::FreeGoods,
        debit_credit: DebitCredit::Debit,
        applies: |_| true,
        item: |l| ItemBasis {
            pricing_type: l.parent.quotation_type.clone(),
            pricing_group: pricing_group(
                &l.parent.quotation_type,
                &l.parent.header.customer_code,
                l.parent.price_group.as_deref(),
            ),
            material_code: l.free.free_material_code.clone(),
            batch: String::new(),
            qty: l.free.free_qty,
            sales_unit: l.free.uom.clone(),
        },
        price: |_| Ok(PriceFields::zero()),
        extras: |l| LineExtras::purpose(l.free.purpose.clone().unwrap_or_default()),
        link: RefLink::GroupHead,
    }]
}

fn add_on_item(d: &AddOnDetail) -> ItemBasis {
    ItemBasis {
        material_code: d.material_code.clone(),
        qty: d.add_qty,
        sales_unit: d.uom.clone(),
        ..ItemBasis::default()
    }
}

/// Add-on items reference themselves
pub const ADD_ON_RULES: &[LineRule<AddOnDetail>] = &[LineRule {
    category: ItemCategory::FreeGoods,
    debit_credit: DebitCredit::Debit,
    applies: always::<AddOnDetail>,
    item: add_on_item,
    price: |_| Ok(PriceFields::zero()),
    extras: |d| LineExtras::purpose(d.purpose.clone().unwrap_or_default()),
    link: RefLink::OwnItem,
}];

// ---------------------------------------------------------------------------
// Sample

fn sample_item(d: &SampleDetail) -> ItemBasis {
    ItemBasis {
        material_code: d.material_code.clone(),
        qty: d.qty,
        sales_unit: d.uom.clone(),
        ..ItemBasis::default()
    }
}

fn sample_extras(d: &SampleDetail) -> LineExtras {
    LineExtras {
        item_purpose: d.purpose.clone(),
        cost_center: SAMPLE_COST_CENTER.to_string(),
        ..LineExtras::default()
    }
}

pub const SAMPLE_RULES: &[LineRule<SampleDetail>] = &[LineRule {
    category: ItemCategory::Sample,
    debit_credit: DebitCredit::Debit,
    applies: always::<SampleDetail>,
    item: sample_item,
    price: |_| Ok(PriceFields::sample_zero()),
    extras: sample_extras,
    link: RefLink::Blank,
}];

// ---------------------------------------------------------------------------
// Return

fn return_item(d: &ReturnDetail, qty: Decimal, with_batch: bool) -> ItemBasis {
    ItemBasis {
        material_code: d.material_code.clone(),
        batch: if with_batch {
            d.batch.clone().unwrap_or_default()
        } else {
            String::new()
        },
        qty,
        sales_unit: d.uom.clone(),
        ..ItemBasis::default()
    }
}

fn return_extras(d: &ReturnDetail, return_code: String, include_invoice: bool) -> LineExtras {
    LineExtras {
        item_purpose: d.notes.clone(),
        return_code,
        sales_date: d.sales_date.clone().unwrap_or_default(),
        origin_so_number: d.sales_order_number.clone().unwrap_or_default(),
        origin_so_item: d.so_item.clone().unwrap_or_default(),
        invoice_number: if include_invoice {
            d.invoice_number.clone().unwrap_or_default()
        } else {
            String::new()
        },
        invoice_date: if include_invoice {
            d.invoice_date.clone().unwrap_or_default()
        } else {
            String::new()
        },
        credit_note: String::new(),
        cost_center: String::new(),
    }
}

fn own_return_code(d: &ReturnDetail) -> String {
    d.return_code.clone().unwrap_or_default()
}

/// Type 1: sales return at the old price
pub const RETURN_TYPE_1: &[LineRule<ReturnDetail>] = &[LineRule {
    category: ItemCategory::SalesReturn,
    debit_credit: DebitCredit::Credit,
    applies: always::<ReturnDetail>,
    item: |d| return_item(d, d.qty, true),
    price: |d| PriceFields::returned(d.old_unit_price, d.total_unit_price),
    extras: |d| return_extras(d, own_return_code(d), true),
    link: RefLink::GroupHead,
}];

/// Type 2: goods back to stock, replacement shipped out
pub const RETURN_TYPE_2: &[LineRule<ReturnDetail>] = &[
    LineRule {
        category: ItemCategory::ReturnToStock,
        debit_credit: DebitCredit::Credit,
        applies: always::<ReturnDetail>,
        item: |d| return_item(d, d.qty, true),
        price: |_| Ok(PriceFields::zero()),
        extras: |d| return_extras(d, own_return_code(d), true),
        link: RefLink::GroupHead,
    },
    LineRule {
        category: ItemCategory::ExchangeOut,
        debit_credit: DebitCredit::Debit,
        applies: always::<ReturnDetail>,
        item: |d| return_item(d, d.exchange_out, false),
        price: |_| Ok(PriceFields::zero()),
        extras: |d| return_extras(d, own_return_code(d), true),
        link: RefLink::GroupHead,
    },
];

fn return_discount_price(d: &ReturnDetail) -> Result<PriceFields, TransformError> {
    let total = pro_rate(d.total_unit_price, d.qty, d.exchange_out)?;
    PriceFields::returned(d.old_unit_price, total)
}

/// Type 3: credit at the old price, rebill at the new price
pub const RETURN_TYPE_3: &[LineRule<ReturnDetail>] = &[
    LineRule {
        category: ItemCategory::ReturnDiscount,
        debit_credit: DebitCredit::Credit,
        applies: always::<ReturnDetail>,
        item: |d| return_item(d, d.exchange_out, false),
        price: return_discount_price,
        extras: |d| {
            let mut extras = return_extras(d, own_return_code(d), true);
            extras.credit_note = d.discount_order_number.clone().unwrap_or_default();
            extras
        },
        link: RefLink::GroupHead,
    },
    LineRule {
        category: ItemCategory::ExchangeRebill,
        debit_credit: DebitCredit::Debit,
        applies: always::<ReturnDetail>,
        item: |d| return_item(d, d.exchange_out, false),
        price: |d| PriceFields::returned(d.new_unit_price, d.new_total_unit_price),
        extras: |d| return_extras(d, own_return_code(d), false),
        link: RefLink::GroupHead,
    },
];

/// Type 4: sales discount with a fixed reason code
pub const RETURN_TYPE_4: &[LineRule<ReturnDetail>] = &[LineRule {
    category: ItemCategory::ReturnDiscount,
    debit_credit: DebitCredit::Credit,
    applies: always::<ReturnDetail>,
    item: |d| return_item(d, d.qty, false),
    price: |d| PriceFields::returned(Decimal::ZERO, d.new_total_unit_price),
    extras: |d| return_extras(d, SALES_DISCOUNT_RETURN_CODE.to_string(), true),
    link: RefLink::GroupHead,
}];

/// Rule set for a return form's request type
pub fn return_rules(request_type: i32) -> Option<&'static [LineRule<ReturnDetail>]> {
    match request_type {
        1 => Some(RETURN_TYPE_1),
        2 => Some(RETURN_TYPE_2),
        3 => Some(RETURN_TYPE_3),
        4 => Some(RETURN_TYPE_4),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FormHeader, RequisitionId};
    use chrono::NaiveDateTime;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn header() -> FormHeader {
        FormHeader {
            requisition_id: RequisitionId::new("R1").unwrap(),
            serial_id: "TWC0202406010003".to_string(),
            time_last_action: NaiveDateTime::default(),
            applicant_id: "E7".to_string(),
            invoice: 3,
            customer_code: "C9".to_string(),
            customer_name: "North Pharmacy".to_string(),
            ship_to_code: "SP9".to_string(),
            remark: Some("note".to_string()),
        }
    }

    fn order(request_type: i32) -> OrderDetail {
        OrderDetail {
            header: header(),
            request_type,
            quotation_type: "2".to_string(),
            price_group: Some("PG1".to_string()),
            item_no: 1,
            material_code: "M1".to_string(),
            qty: d("10"),
            uom: "BOX".to_string(),
            purpose: None,
            old_invoice_price: d("105"),
            new_invoice_price: d("210"),
            old_sale_price: d("84"),
            new_sale_price: d("210"),
        }
    }

    fn return_detail(request_type: i32) -> ReturnDetail {
        ReturnDetail {
            header: header(),
            request_type,
            item_no: 1,
            material_code: "M5".to_string(),
            qty: d("4"),
            uom: "BTL".to_string(),
            notes: "damaged".to_string(),
            batch: Some("B-01".to_string()),
            sales_order_number: Some("SO1".to_string()),
            so_item: Some("000010".to_string()),
            invoice_number: Some("INV1".to_string()),
            invoice_date: Some("20240501".to_string()),
            old_unit_price: d("21"),
            total_unit_price: d("84"),
            new_unit_price: d("10.5"),
            new_total_unit_price: d("31.5"),
            exchange_out: d("3"),
            return_code: Some("101".to_string()),
            sales_date: Some("20240420".to_string()),
            discount_order_number: Some("DO-9".to_string()),
        }
    }

    #[test]
    fn test_old_prices_for_request_types_one_and_four() {
        assert_eq!(order_prices(&order(1)), (d("105"), d("84")));
        assert_eq!(order_prices(&order(4)), (d("105"), d("84")));
        assert_eq!(order_prices(&order(3)), (d("210"), d("210")));
    }

    #[test]
    fn test_discount_rule_fires_only_on_difference() {
        let discount = &ORDER_RULES[1];
        assert!(discount.evaluate(&order(1)).unwrap().is_some());
        assert!(discount.evaluate(&order(3)).unwrap().is_none());
    }

    #[test]
    fn test_discount_rule_parts() {
        let parts = ORDER_RULES[1].evaluate(&order(1)).unwrap().unwrap();
        assert_eq!(parts.category, ItemCategory::Discount);
        assert_eq!(parts.debit_credit, DebitCredit::Credit);
        assert_eq!(parts.extras.return_code, "201");
        assert_eq!(parts.price.total_invoice_price_with_tax, d("210"));
    }

    #[test]
    fn test_pricing_group_by_quotation_type() {
        let mut detail = order(1);
        assert_eq!(order_item(&detail).pricing_group, "PG1");
        detail.quotation_type = "1".to_string();
        assert_eq!(order_item(&detail).pricing_group, "C9");
    }

    #[test]
    fn test_apply_rules_links_group_to_head() {
        let ctx = FormContext::from_header(&header(), NaiveDateTime::default());
        let mut counter = ItemCounter::starting_at(4);
        let mut out = Vec::new();

        apply_rules(ORDER_RULES, &order(1), &ctx, &mut counter, &mut out).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].form_item, "000040");
        assert_eq!(out[1].form_item, "000050");
        assert!(out.iter().all(|l| l.form_ref_item == "000040"));
        assert_eq!(counter.peek(), 6);
    }

    #[test]
    fn test_return_type_three_pro_rates_credit() {
        let detail = return_detail(3);
        let credit = RETURN_TYPE_3[0].evaluate(&detail).unwrap().unwrap();
        assert_eq!(credit.item.qty, d("3"));
        assert_eq!(credit.price.total_invoice_price_with_tax, d("63"));
        assert_eq!(credit.extras.credit_note, "DO-9");
        assert_eq!(credit.extras.invoice_number, "INV1");

        let rebill = RETURN_TYPE_3[1].evaluate(&detail).unwrap().unwrap();
        assert_eq!(rebill.category, ItemCategory::ExchangeRebill);
        assert_eq!(rebill.extras.invoice_number, "");
        assert_eq!(rebill.extras.invoice_date, "");
        assert_eq!(rebill.price.invoice_price_with_tax, d("10500"));
    }

    #[test]
    fn test_return_type_two_batches() {
        let detail = return_detail(2);
        let stock = RETURN_TYPE_2[0].evaluate(&detail).unwrap().unwrap();
        let out = RETURN_TYPE_2[1].evaluate(&detail).unwrap().unwrap();
        assert_eq!(stock.item.batch, "B-01");
        assert_eq!(stock.item.qty, d("4"));
        assert_eq!(out.item.batch, "");
        assert_eq!(out.item.qty, d("3"));
        assert_eq!(out.debit_credit, DebitCredit::Debit);
    }

    #[test]
    fn test_return_type_four_fixed_code() {
        let parts = RETURN_TYPE_4[0].evaluate(&return_detail(4)).unwrap().unwrap();
        assert_eq!(parts.extras.return_code, "200");
        assert_eq!(parts.price.invoice_price_with_tax, Decimal::ZERO);
        assert_eq!(parts.price.total_invoice_price_with_tax, d("31.5"));
    }

    #[test]
    fn test_unknown_request_type_has_no_rules() {
        assert!(return_rules(5).is_none());
        assert_eq!(return_rules(2).map(|r| r.len()), Some(2));
    }
}
