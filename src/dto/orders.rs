use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    models::{Address, Order, OrderStatus},
    params::SortOrder,
};

#[derive(Debug, Clone, Deserialize)]
pub struct ShippingDetails {
    pub shipping: Address,
    #[serde(default = "default_true")]
    pub billing_same_as_shipping: bool,
    pub billing: Option<Address>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSortField {
    #[default]
    Date,
    Amount,
    Status,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderHistoryFilter {
    pub status: Option<OrderStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub min_amount: Option<i64>,
    pub max_amount: Option<i64>,
    #[serde(default)]
    pub sort_by: OrderSortField,
    /// Newest / largest first when unset.
    pub sort_order: Option<SortOrder>,
}

impl OrderHistoryFilter {
    pub fn matches(&self, order: &Order) -> bool {
        self.status.is_none_or(|status| order.status == status)
            && self.from.is_none_or(|from| order.created_at >= from)
            && self.to.is_none_or(|to| order.created_at <= to)
            && self.min_amount.is_none_or(|min| order.total_amount >= min)
            && self.max_amount.is_none_or(|max| order.total_amount <= max)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderConfirmation {
    pub order_number: String,
    pub total_amount: i64,
    pub estimated_delivery: DateTime<Utc>,
}

impl From<&Order> for OrderConfirmation {
    fn from(order: &Order) -> Self {
        Self {
            order_number: order.order_number.clone(),
            total_amount: order.total_amount,
            estimated_delivery: order.estimated_delivery,
        }
    }
}
