//! Rule engine driving the per-variant rule tables
//!
//! Each requisition is expanded on its own. A requisition whose rules fail
//! contributes no lines and one `"{requisition}: {message}"` error; the rest
//! of the batch is unaffected.

use super::format::{group_by_requisition, ItemCounter};
use super::line::FormContext;
use super::rules::{
    apply_linked, apply_rules, free_goods_rules, return_rules, FreeGoodsLine, ADD_ON_RULES,
    ORDER_RULES, SAMPLE_RULES,
};
use crate::domain::{
    ExportLineItem, FreeGoodsDetail, OrderBatch, OrderDetail, RequisitionId, ReturnDetail,
    SampleDetail, TransformError,
};
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// Engine switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    /// Sample rows must be numbered 1, 2, 3, ...; rows out of sequence are skipped
    pub strict_sample_sequence: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            strict_sample_sequence: true,
        }
    }
}

/// Lines and per-requisition errors of one variant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantOutput {
    pub lines: Vec<ExportLineItem>,
    pub errors: Vec<String>,
    /// Requisitions looked at
    pub requisitions: usize,
}

impl VariantOutput {
    fn record_failure(&mut self, requisition_id: &RequisitionId, err: TransformError) {
        tracing::warn!(
            requisition_id = %requisition_id,
            error = %err,
            "Requisition could not be transformed"
        );
        self.errors.push(format!("{requisition_id}: {err}"));
    }
}

/// Expands source detail rows into export lines
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    options: TransformOptions,
}

impl RuleEngine {
    pub fn new(options: TransformOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> TransformOptions {
        self.options
    }

    /// Order forms: primary lines with discounts and free goods, then add-ons
    ///
    /// Add-ons continue the item numbering of their requisition's order lines,
    /// or start at 1 when the requisition has none.
    pub fn transform_orders(&self, batch: &OrderBatch, now: NaiveDateTime) -> VariantOutput {
        let mut output = VariantOutput::default();

        let mut free_goods: HashMap<&RequisitionId, Vec<&FreeGoodsDetail>> = HashMap::new();
        for fg in &batch.free_goods {
            free_goods.entry(&fg.requisition_id).or_default().push(fg);
        }

        let mut next_item: HashMap<&RequisitionId, u32> = HashMap::new();

        for (requisition_id, rows) in
            group_by_requisition(&batch.details, |d| &d.header.requisition_id)
        {
            output.requisitions += 1;
            let matching = free_goods
                .get(requisition_id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            match expand_order(&rows, matching, now) {
                Ok((lines, counter)) => {
                    output.lines.extend(lines);
                    next_item.insert(requisition_id, counter.peek());
                }
                Err(err) => output.record_failure(requisition_id, err),
            }
        }

        for (requisition_id, mut rows) in
            group_by_requisition(&batch.add_ons, |d| &d.header.requisition_id)
        {
            let mut counter = match next_item.get(requisition_id) {
                Some(&next) => ItemCounter::starting_at(next),
                None => {
                    output.requisitions += 1;
                    ItemCounter::new()
                }
            };

            let ctx = FormContext::from_header(&rows[0].header, now);
            rows.sort_by_key(|d| d.item_no);

            let mut lines = Vec::new();
            let result = rows
                .iter()
                .try_for_each(|d| apply_rules(ADD_ON_RULES, *d, &ctx, &mut counter, &mut lines));
            match result {
                Ok(()) => output.lines.extend(lines),
                Err(err) => output.record_failure(requisition_id, err),
            }
        }

        tracing::debug!(
            requisitions = output.requisitions,
            lines = output.lines.len(),
            errors = output.errors.len(),
            "Order forms transformed"
        );
        output
    }

    /// Sample forms: one sample line per row
    pub fn transform_samples(&self, rows: &[SampleDetail], now: NaiveDateTime) -> VariantOutput {
        let mut output = VariantOutput::default();

        for (requisition_id, mut group) in group_by_requisition(rows, |d| &d.header.requisition_id)
        {
            output.requisitions += 1;
            group.sort_by_key(|d| d.d_no);

            let base = FormContext::from_header(&group[0].header, now);
            let item_count = u32::try_from(group.len()).unwrap_or(u32::MAX);
            let mut counter = ItemCounter::new();
            let mut lines = Vec::new();

            let result = group.iter().try_for_each(|d| {
                if self.options.strict_sample_sequence {
                    if i64::from(d.d_no) != i64::from(counter.peek()) {
                        tracing::debug!(
                            requisition_id = %requisition_id,
                            d_no = d.d_no,
                            expected = counter.peek(),
                            "Skipping sample row out of sequence"
                        );
                        return Ok(());
                    }
                    if counter.peek() > item_count {
                        return Ok(());
                    }
                }
                let ctx = base.clone().with_remark(sample_remark(d));
                apply_rules(SAMPLE_RULES, *d, &ctx, &mut counter, &mut lines)
            });

            match result {
                Ok(()) => output.lines.extend(lines),
                Err(err) => output.record_failure(requisition_id, err),
            }
        }

        tracing::debug!(
            requisitions = output.requisitions,
            lines = output.lines.len(),
            "Sample forms transformed"
        );
        output
    }

    /// Return forms: the first row's request type picks the rule set
    pub fn transform_returns(&self, rows: &[ReturnDetail], now: NaiveDateTime) -> VariantOutput {
        let mut output = VariantOutput::default();

        for (requisition_id, group) in group_by_requisition(rows, |d| &d.header.requisition_id) {
            output.requisitions += 1;
            match expand_return(&group, now) {
                Ok(lines) => output.lines.extend(lines),
                Err(err) => output.record_failure(requisition_id, err),
            }
        }

        tracing::debug!(
            requisitions = output.requisitions,
            lines = output.lines.len(),
            errors = output.errors.len(),
            "Return forms transformed"
        );
        output
    }
}

fn expand_order(
    rows: &[&OrderDetail],
    free_goods: &[&FreeGoodsDetail],
    now: NaiveDateTime,
) -> Result<(Vec<ExportLineItem>, ItemCounter), TransformError> {
    let ctx = FormContext::from_header(&rows[0].header, now);
    let mut sorted = rows.to_vec();
    sorted.sort_by_key(|d| d.item_no);

    let free_rules = free_goods_rules();
    let mut counter = ItemCounter::new();
    let mut lines = Vec::new();

    for detail in sorted {
        let head = counter.peek();
        apply_rules(ORDER_RULES, detail, &ctx, &mut counter, &mut lines)?;

        for fg in free_goods
            .iter()
            .filter(|fg| fg.material_code == detail.material_code)
        {
            let pair = FreeGoodsLine {
                parent: detail,
                free: fg,
            };
            apply_linked(&free_rules, &pair, &ctx, head, &mut counter, &mut lines)?;
        }
    }

    Ok((lines, counter))
}

fn expand_return(
    rows: &[&ReturnDetail],
    now: NaiveDateTime,
) -> Result<Vec<ExportLineItem>, TransformError> {
    let request_type = rows[0].request_type;
    let rules =
        return_rules(request_type).ok_or(TransformError::UnsupportedRequestType(request_type))?;

    let ctx = FormContext::from_header(&rows[0].header, now);
    let mut sorted = rows.to_vec();
    sorted.sort_by_key(|d| d.item_no);

    let mut counter = ItemCounter::new();
    let mut lines = Vec::new();
    for detail in sorted {
        apply_rules(rules, detail, &ctx, &mut counter, &mut lines)?;
    }
    Ok(lines)
}

/// Remark with the funding source appended when one is given
pub fn sample_remark(detail: &SampleDetail) -> String {
    let remark = detail.header.remark.clone().unwrap_or_default();
    match detail.funding_source.as_deref() {
        Some(source) if !source.is_empty() => format!("{remark}(charged to {source})"),
        _ => remark,
    }
}
