//! Cart totals: subtotal, shipping, tax and grand total.
//!
//! Amounts are whole currency units. Everything here is a pure function of the joined
//! cart lines, so callers can recompute at any time without touching cart state.

use serde::{Deserialize, Serialize};

use crate::models::CartLine;

/// Basis points per whole (10_000 bps = 100%).
const BPS_SCALE: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRules {
    /// Shipping is waived when the subtotal is strictly above this value.
    pub free_shipping_threshold: i64,
    pub flat_shipping_fee: i64,
    pub tax_rate_bps: i64,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            free_shipping_threshold: 50_000,
            flat_shipping_fee: 5_000,
            tax_rate_bps: 1_800,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: i64,
    pub shipping_cost: i64,
    pub tax: i64,
    pub discount: i64,
    pub total: i64,
}

pub fn subtotal(lines: &[CartLine]) -> i64 {
    lines.iter().map(CartLine::line_total).sum()
}

pub fn shipping_cost(subtotal: i64, rules: &PricingRules) -> i64 {
    if subtotal > rules.free_shipping_threshold {
        0
    } else {
        rules.flat_shipping_fee
    }
}

/// Tax rounded half-up to the nearest whole unit.
pub fn tax(subtotal: i64, rules: &PricingRules) -> i64 {
    (subtotal * rules.tax_rate_bps + BPS_SCALE / 2).div_euclid(BPS_SCALE)
}

pub fn calculate_totals(lines: &[CartLine], rules: &PricingRules) -> OrderTotals {
    let subtotal = subtotal(lines);
    let shipping_cost = shipping_cost(subtotal, rules);
    let tax = tax(subtotal, rules);
    let discount = 0;
    OrderTotals {
        subtotal,
        shipping_cost,
        tax,
        discount,
        total: subtotal + shipping_cost + tax - discount,
    }
}
