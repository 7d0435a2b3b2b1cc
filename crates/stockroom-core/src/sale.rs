//! # Sale Pricing & Requests
//!
//! Everything about a sale that can be decided without storage: the
//! request shape and its validation, line pricing, header totals, and the
//! per-item stock demand a request places on the catalog.
//!
//! ## Totals
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line.subtotal = unit_price × quantity − line.discount                 │
//! │  total_amount  = Σ line.subtotal                                       │
//! │  grand_total   = total_amount − header.discount + header.tax           │
//! │                                                                         │
//! │  Example: 3 × 100.00 − 5.00 = 295.00                                   │
//! │           295.00 − 10.00 + 2.00 = 287.00                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Neither a line subtotal nor the grand total is clamped at zero.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::PaymentStatus;
use crate::{MAX_INVOICE_NUMBER_LEN, MAX_LINE_QUANTITY, MAX_MONEY_CENTS, MAX_SALE_LINES};

// =============================================================================
// Requests
// =============================================================================

/// One requested line of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLineRequest {
    pub item_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub discount: Money,
}

/// A sale as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateSaleRequest {
    pub invoice_number: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub discount: Money,
    #[serde(default)]
    pub tax: Money,
    pub lines: Vec<SaleLineRequest>,
}

impl CreateSaleRequest {
    /// Checks the request shape. Stock and item existence are checked later,
    /// inside the sale transaction.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invoice = self.invoice_number.trim();
        if invoice.is_empty() {
            return Err(ValidationError::Required {
                field: "invoice_number".to_string(),
            });
        }
        if invoice.chars().count() > MAX_INVOICE_NUMBER_LEN {
            return Err(ValidationError::TooLong {
                field: "invoice_number".to_string(),
                max: MAX_INVOICE_NUMBER_LEN,
            });
        }

        if self.lines.is_empty() {
            return Err(ValidationError::Empty {
                field: "items".to_string(),
            });
        }
        if self.lines.len() > MAX_SALE_LINES {
            return Err(ValidationError::OutOfRange {
                field: "items".to_string(),
                min: 1,
                max: MAX_SALE_LINES as i64,
            });
        }

        for line in &self.lines {
            if line.item_id.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: "item_id".to_string(),
                });
            }
            if line.quantity <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                });
            }
            if line.quantity > MAX_LINE_QUANTITY {
                return Err(ValidationError::OutOfRange {
                    field: "quantity".to_string(),
                    min: 1,
                    max: MAX_LINE_QUANTITY,
                });
            }
            check_amount("discount", line.discount)?;
        }

        check_amount("discount", self.discount)?;
        check_amount("tax", self.tax)?;

        Ok(())
    }
}

/// Discounts and tax are non-negative and at most `MAX_MONEY_CENTS`.
fn check_amount(field: &str, amount: Money) -> Result<(), ValidationError> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if amount.cents() > MAX_MONEY_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_MONEY_CENTS,
        });
    }
    Ok(())
}

/// Editable fields of a recorded sale. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleUpdate {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub payment_status: Option<PaymentStatus>,
}

impl SaleUpdate {
    pub fn is_empty(&self) -> bool {
        self.customer_name.is_none()
            && self.customer_phone.is_none()
            && self.customer_email.is_none()
            && self.payment_method.is_none()
            && self.notes.is_none()
            && self.payment_status.is_none()
    }
}

// =============================================================================
// Pricing
// =============================================================================

fn overflow(field: &str) -> ValidationError {
    ValidationError::Overflow {
        field: field.to_string(),
    }
}

/// Prices one line: `unit_price × quantity − discount`.
///
/// Fails instead of wrapping when a stored price is large enough for the
/// product to leave the `i64` range.
pub fn price_line(
    unit_price: Money,
    quantity: i64,
    discount: Money,
) -> Result<Money, ValidationError> {
    unit_price
        .checked_mul_quantity(quantity)
        .and_then(|gross| gross.checked_sub(discount))
        .ok_or_else(|| overflow("subtotal"))
}

/// Header totals of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaleTotals {
    pub total_amount: Money,
    pub discount: Money,
    pub tax: Money,
    pub grand_total: Money,
}

impl SaleTotals {
    /// Sums line subtotals and applies the header discount and tax.
    pub fn compute<I>(subtotals: I, discount: Money, tax: Money) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = Money>,
    {
        let total_amount = subtotals
            .into_iter()
            .try_fold(Money::zero(), Money::checked_add)
            .ok_or_else(|| overflow("total_amount"))?;
        let grand_total = total_amount
            .checked_sub(discount)
            .and_then(|net| net.checked_add(tax))
            .ok_or_else(|| overflow("grand_total"))?;

        Ok(SaleTotals {
            total_amount,
            discount,
            tax,
            grand_total,
        })
    }
}

// =============================================================================
// Stock Demand
// =============================================================================

/// Running per-item requested quantity across the lines of one sale.
///
/// An item appearing on several lines is checked against the sum of its
/// quantities, not each line on its own.
#[derive(Debug, Clone, Default)]
pub struct StockDemand {
    entries: Vec<(String, i64)>,
}

impl StockDemand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` for `item_id` and returns the new total for that item.
    pub fn add(&mut self, item_id: &str, quantity: i64) -> i64 {
        if let Some((_, total)) = self.entries.iter_mut().find(|(id, _)| id == item_id) {
            *total += quantity;
            return *total;
        }
        self.entries.push((item_id.to_string(), quantity));
        quantity
    }

    /// Total requested for `item_id` so far.
    pub fn requested(&self, item_id: &str) -> i64 {
        self.entries
            .iter()
            .find(|(id, _)| id == item_id)
            .map(|(_, total)| *total)
            .unwrap_or(0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(item_id: &str, quantity: i64, discount: i64) -> SaleLineRequest {
        SaleLineRequest {
            item_id: item_id.to_string(),
            quantity,
            discount: Money::from_cents(discount),
        }
    }

    fn request(lines: Vec<SaleLineRequest>) -> CreateSaleRequest {
        CreateSaleRequest {
            invoice_number: "INV-0001".to_string(),
            customer_name: None,
            customer_phone: None,
            customer_email: None,
            payment_method: None,
            notes: None,
            discount: Money::zero(),
            tax: Money::zero(),
            lines,
        }
    }

    #[test]
    fn test_worked_example_totals() {
        let subtotal = price_line(Money::from_cents(10_000), 3, Money::from_cents(500)).unwrap();
        assert_eq!(subtotal.cents(), 29_500);

        let totals =
            SaleTotals::compute([subtotal], Money::from_cents(1_000), Money::from_cents(200))
                .unwrap();
        assert_eq!(totals.total_amount.cents(), 29_500);
        assert_eq!(totals.grand_total.cents(), 28_700);
    }

    #[test]
    fn test_negative_totals_are_not_clamped() {
        let subtotal = price_line(Money::from_cents(100), 1, Money::from_cents(500)).unwrap();
        assert_eq!(subtotal.cents(), -400);

        let totals = SaleTotals::compute([subtotal], Money::from_cents(100), Money::zero()).unwrap();
        assert_eq!(totals.grand_total.cents(), -500);
    }

    #[test]
    fn test_pricing_overflow_is_an_error() {
        let huge = Money::from_cents(i64::MAX);

        assert!(matches!(
            price_line(huge, 2, Money::zero()),
            Err(ValidationError::Overflow { .. })
        ));
        assert!(matches!(
            price_line(Money::from_cents(-1), 1, huge),
            Ok(m) if m == Money::from_cents(i64::MIN)
        ));
        assert!(matches!(
            SaleTotals::compute([huge, Money::from_cents(1)], Money::zero(), Money::zero()),
            Err(ValidationError::Overflow { .. })
        ));
        assert!(matches!(
            SaleTotals::compute([huge], Money::zero(), Money::from_cents(1)),
            Err(ValidationError::Overflow { .. })
        ));
    }

    #[test]
    fn test_stock_demand_aggregates_per_item() {
        let mut demand = StockDemand::new();
        assert_eq!(demand.add("a", 4), 4);
        assert_eq!(demand.add("b", 1), 1);
        assert_eq!(demand.add("a", 3), 7);

        assert_eq!(demand.requested("a"), 7);
        assert_eq!(demand.requested("b"), 1);
        assert_eq!(demand.requested("zzz"), 0);
    }

    #[test]
    fn test_valid_request() {
        assert!(request(vec![line("a", 3, 500)]).validate().is_ok());
    }

    #[test]
    fn test_rejects_blank_invoice() {
        let mut req = request(vec![line("a", 1, 0)]);
        req.invoice_number = "   ".to_string();
        assert!(matches!(req.validate(), Err(ValidationError::Required { .. })));

        req.invoice_number = "X".repeat(MAX_INVOICE_NUMBER_LEN + 1);
        assert!(matches!(req.validate(), Err(ValidationError::TooLong { .. })));
    }

    #[test]
    fn test_rejects_empty_lines() {
        assert!(matches!(
            request(vec![]).validate(),
            Err(ValidationError::Empty { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_quantities() {
        assert!(matches!(
            request(vec![line("a", 0, 0)]).validate(),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            request(vec![line("a", -2, 0)]).validate(),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            request(vec![line("a", MAX_LINE_QUANTITY + 1, 0)]).validate(),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_rejects_negative_money() {
        assert!(request(vec![line("a", 1, -1)]).validate().is_err());

        let mut req = request(vec![line("a", 1, 0)]);
        req.tax = Money::from_cents(-1);
        assert!(matches!(req.validate(), Err(ValidationError::Negative { .. })));
    }

    #[test]
    fn test_rejects_amounts_above_ceiling() {
        let near_max = i64::MAX - 1;
        let req = request(vec![line("a", 1, near_max), line("b", 1, near_max)]);
        assert!(matches!(req.validate(), Err(ValidationError::OutOfRange { .. })));

        let mut req = request(vec![line("a", 1, MAX_MONEY_CENTS)]);
        assert!(req.validate().is_ok());
        req.discount = Money::from_cents(MAX_MONEY_CENTS + 1);
        assert!(matches!(req.validate(), Err(ValidationError::OutOfRange { .. })));

        req.discount = Money::zero();
        req.tax = Money::from_cents(i64::MAX);
        assert!(matches!(req.validate(), Err(ValidationError::OutOfRange { .. })));
    }

    #[test]
    fn test_full_sale_at_ceiling_prices_without_overflow() {
        let unit = Money::from_cents(MAX_MONEY_CENTS);
        let subtotals: Vec<Money> = (0..MAX_SALE_LINES)
            .map(|_| price_line(unit, MAX_LINE_QUANTITY, Money::zero()).unwrap())
            .collect();
        let totals =
            SaleTotals::compute(subtotals, Money::zero(), Money::from_cents(MAX_MONEY_CENTS))
                .unwrap();
        assert!(totals.grand_total.cents() > 0);
    }

    #[test]
    fn test_sale_update_is_empty() {
        assert!(SaleUpdate::default().is_empty());
        let update = SaleUpdate {
            payment_status: Some(PaymentStatus::Paid),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
