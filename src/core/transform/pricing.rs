//! Price shapes written on export lines
//!
//! Unit prices go out per thousand units. Amounts without tax divide by the
//! fixed tax factor. All arithmetic is checked.

use crate::domain::TransformError;
use rust_decimal::Decimal;

/// Tax factor applied to tax-inclusive prices
pub const TAX_FACTOR: Decimal = Decimal::from_parts(105, 0, 0, false, 2);

const PER_THOUSAND: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Pricing unit for priced and zero-priced lines
pub const PRICING_UNIT: &str = "1000";

/// The five price columns plus the pricing unit
#[derive(Debug, Clone, PartialEq)]
pub struct PriceFields {
    pub invoice_price_with_tax: Decimal,
    pub invoice_price: Decimal,
    pub total_invoice_price_with_tax: Decimal,
    pub total_invoice_price: Decimal,
    pub fixed_price_with_tax: Decimal,
    pub pricing_unit: &'static str,
}

impl PriceFields {
    /// All prices zero
    pub fn zero() -> Self {
        Self {
            invoice_price_with_tax: Decimal::ZERO,
            invoice_price: Decimal::ZERO,
            total_invoice_price_with_tax: Decimal::ZERO,
            total_invoice_price: Decimal::ZERO,
            fixed_price_with_tax: Decimal::ZERO,
            pricing_unit: PRICING_UNIT,
        }
    }

    /// All prices zero with no pricing unit, used on sample lines
    pub fn sample_zero() -> Self {
        Self {
            pricing_unit: "",
            ..Self::zero()
        }
    }

    /// Primary sale: charged price `invoice` and fixed price `fixed` per unit
    pub fn primary(invoice: Decimal, fixed: Decimal, qty: Decimal) -> Result<Self, TransformError> {
        Ok(Self {
            invoice_price_with_tax: mul(invoice, PER_THOUSAND, "invoice price")?,
            invoice_price: mul(ex_tax(invoice)?, PER_THOUSAND, "invoice price")?,
            total_invoice_price_with_tax: mul(invoice, qty, "total invoice price")?,
            total_invoice_price: mul(ex_tax(invoice)?, qty, "total invoice price")?,
            fixed_price_with_tax: mul(fixed, PER_THOUSAND, "fixed price")?,
            pricing_unit: PRICING_UNIT,
        })
    }

    /// Discount line carrying only the extended difference
    pub fn discount(amount: Decimal) -> Result<Self, TransformError> {
        Ok(Self {
            total_invoice_price_with_tax: amount,
            total_invoice_price: ex_tax(amount)?,
            ..Self::zero()
        })
    }

    /// Return-side price from a unit price and an extended total
    pub fn returned(unit: Decimal, total: Decimal) -> Result<Self, TransformError> {
        Ok(Self {
            invoice_price_with_tax: mul(unit, PER_THOUSAND, "unit price")?,
            invoice_price: mul(ex_tax(unit)?, PER_THOUSAND, "unit price")?,
            total_invoice_price_with_tax: total,
            total_invoice_price: ex_tax(total)?,
            fixed_price_with_tax: Decimal::ZERO,
            pricing_unit: PRICING_UNIT,
        })
    }
}

/// `(invoice - fixed) * qty`
pub fn discount_amount(invoice: Decimal, fixed: Decimal, qty: Decimal) -> Result<Decimal, TransformError> {
    let diff = invoice
        .checked_sub(fixed)
        .ok_or(TransformError::Overflow("discount"))?;
    mul(diff, qty, "discount")
}

/// Pro-rated amount: `total / qty * share`, zero when `qty` is not positive
pub fn pro_rate(total: Decimal, qty: Decimal, share: Decimal) -> Result<Decimal, TransformError> {
    if qty <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    let per_unit = total
        .checked_div(qty)
        .ok_or(TransformError::Overflow("pro-rated price"))?;
    mul(per_unit, share, "pro-rated price")
}

fn mul(a: Decimal, b: Decimal, what: &'static str) -> Result<Decimal, TransformError> {
    a.checked_mul(b).ok_or(TransformError::Overflow(what))
}

fn ex_tax(amount: Decimal) -> Result<Decimal, TransformError> {
    amount
        .checked_div(TAX_FACTOR)
        .ok_or(TransformError::Overflow("tax-exclusive amount"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_tax_factor() {
        assert_eq!(TAX_FACTOR, d("1.05"));
    }

    #[test]
    fn test_primary_price() {
        let price = PriceFields::primary(d("105"), d("94.5"), d("10")).unwrap();
        assert_eq!(price.invoice_price_with_tax, d("105000"));
        assert_eq!(price.invoice_price, d("100000"));
        assert_eq!(price.total_invoice_price_with_tax, d("1050"));
        assert_eq!(price.total_invoice_price, d("1000"));
        assert_eq!(price.fixed_price_with_tax, d("94500"));
        assert_eq!(price.pricing_unit, "1000");
    }

    #[test]
    fn test_discount_amount_and_price() {
        let amount = discount_amount(d("105"), d("84"), d("10")).unwrap();
        assert_eq!(amount, d("210"));

        let price = PriceFields::discount(amount).unwrap();
        assert_eq!(price.invoice_price_with_tax, Decimal::ZERO);
        assert_eq!(price.total_invoice_price_with_tax, d("210"));
        assert_eq!(price.total_invoice_price, d("200"));
    }

    #[test]
    fn test_discount_amount_zero_when_prices_match() {
        assert!(discount_amount(d("52.5"), d("52.5"), d("3")).unwrap().is_zero());
    }

    #[test]
    fn test_returned_price() {
        let price = PriceFields::returned(d("21"), d("42")).unwrap();
        assert_eq!(price.invoice_price_with_tax, d("21000"));
        assert_eq!(price.invoice_price, d("20000"));
        assert_eq!(price.total_invoice_price, d("40"));
        assert_eq!(price.fixed_price_with_tax, Decimal::ZERO);
    }

    #[test]
    fn test_pro_rate() {
        assert_eq!(pro_rate(d("300"), d("10"), d("4")).unwrap(), d("120"));
        assert_eq!(pro_rate(d("300"), Decimal::ZERO, d("4")).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_overflow_is_reported() {
        let err = PriceFields::primary(Decimal::MAX, Decimal::ZERO, d("1")).unwrap_err();
        assert!(matches!(err, TransformError::Overflow(_)));
    }

    #[test]
    fn test_sample_zero_has_no_unit() {
        assert_eq!(PriceFields::sample_zero().pricing_unit, "");
        assert_eq!(PriceFields::zero().pricing_unit, "1000");
    }
}
