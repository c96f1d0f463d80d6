//! # Pricing
//!
//! Line totals and container totals for carts and orders.
//!
//! Both aggregates price the same way: a line costs `unit_price × quantity`
//! and a container costs the sum of its lines. Only the source of the unit
//! price differs. A cart line carries the product's *current* price (joined
//! fresh on every read) while an order line carries the price snapshotted
//! at checkout.
//!
//! Nothing here is cached or persisted; totals are recomputed from the
//! lines every time they are asked for.

use crate::money::Money;

/// Anything that can be priced as `unit_price × quantity`.
pub trait PricedLine {
    fn unit_price(&self) -> Money;

    fn quantity(&self) -> i64;

    fn line_total(&self) -> Money {
        line_total(self.unit_price(), self.quantity())
    }
}

/// `unit_price × quantity`.
#[inline]
pub fn line_total(unit_price: Money, quantity: i64) -> Money {
    unit_price.multiply_quantity(quantity)
}

/// Sum of the line totals of `lines`. An empty slice totals zero.
pub fn container_total<L: PricedLine>(lines: &[L]) -> Money {
    lines.iter().map(PricedLine::line_total).sum()
}

/// Sum of the quantities of `lines`.
pub fn total_quantity<L: PricedLine>(lines: &[L]) -> i64 {
    lines.iter().map(PricedLine::quantity).sum()
}
