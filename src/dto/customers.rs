use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    models::{AccountStatus, CustomerSummary, LoyaltyTier, NoteKind},
    params::{Pagination, SortOrder},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSortField {
    Name,
    JoinedDate,
    LastActive,
    OrderCount,
    TotalSpent,
}

/// Admin customer search. Unset fields do not filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerSearchParams {
    /// Matched case-insensitively against name and email.
    pub query: Option<String>,
    pub status: Option<AccountStatus>,
    pub loyalty_tier: Option<LoyaltyTier>,
    pub joined_after: Option<DateTime<Utc>>,
    pub joined_before: Option<DateTime<Utc>>,
    pub last_active_after: Option<DateTime<Utc>>,
    pub last_active_before: Option<DateTime<Utc>>,
    pub order_count_min: Option<i64>,
    pub order_count_max: Option<i64>,
    pub total_spent_min: Option<i64>,
    pub total_spent_max: Option<i64>,
    pub sort_by: Option<CustomerSortField>,
    pub sort_order: Option<SortOrder>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

impl CustomerSearchParams {
    pub fn matches(&self, customer: &CustomerSummary) -> bool {
        let query_matches = match self.query.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                let q = q.to_lowercase();
                customer.name.to_lowercase().contains(&q) || customer.email.to_lowercase().contains(&q)
            }
            _ => true,
        };

        query_matches
            && self.status.is_none_or(|s| customer.status == s)
            && self.loyalty_tier.is_none_or(|t| customer.loyalty_tier == t)
            && self.joined_after.is_none_or(|d| customer.joined_date >= d)
            && self.joined_before.is_none_or(|d| customer.joined_date <= d)
            && self.last_active_after.is_none_or(|d| customer.last_active >= d)
            && self.last_active_before.is_none_or(|d| customer.last_active <= d)
            && self.order_count_min.is_none_or(|n| customer.order_count >= n)
            && self.order_count_max.is_none_or(|n| customer.order_count <= n)
            && self.total_spent_min.is_none_or(|n| customer.total_spent >= n)
            && self.total_spent_max.is_none_or(|n| customer.total_spent <= n)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerSearchResult {
    pub customers: Vec<CustomerSummary>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
    pub has_more: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewNote {
    pub note: String,
    pub kind: NoteKind,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteUpdate {
    pub note: Option<String>,
    pub kind: Option<NoteKind>,
    pub is_private: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataPoint {
    pub date: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeographicData {
    pub state: String,
    pub customer_count: i64,
    pub revenue: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSegment {
    pub name: String,
    pub tier: LoyaltyTier,
    pub count: i64,
    pub percentage: f64,
    pub average_spent: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerAnalytics {
    pub total_customers: i64,
    pub active_customers: i64,
    pub new_customers_this_month: i64,
    pub new_customers_this_week: i64,
    pub average_order_value: i64,
    pub customer_lifetime_value: i64,
    /// Share of buying customers with more than one order.
    pub retention_rate: f64,
    pub churn_rate: f64,
    pub top_customers: Vec<CustomerSummary>,
    pub customer_growth: Vec<ChartDataPoint>,
    pub geographic_distribution: Vec<GeographicData>,
    pub customer_segments: Vec<CustomerSegment>,
}
