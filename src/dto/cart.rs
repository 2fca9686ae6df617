use serde::Serialize;

use crate::models::CartLine;

/// Derived cart figures, computed on read from the live catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub total_items: i64,
    pub total_amount: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    #[serde(flatten)]
    pub summary: CartSummary,
}
