use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    Address, CustomerActivity, CustomerPreferences, CustomerProfile, Order, SavedAddress,
    WishlistItem,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// An empty string clears the stored number.
    pub phone_number: Option<String>,
    pub preferences: Option<CustomerPreferences>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAddress {
    pub label: String,
    #[serde(flatten)]
    pub address: Address,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_shipping: bool,
    #[serde(default)]
    pub is_billing: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressUpdate {
    pub label: Option<String>,
    pub address: Option<Address>,
    pub is_default: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    Shipping,
    Billing,
}

/// One-shot snapshot of everything stored for a customer.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileExport {
    pub profile: CustomerProfile,
    pub addresses: Vec<SavedAddress>,
    pub wishlist: Vec<WishlistItem>,
    pub orders: Vec<Order>,
    pub activity: Vec<CustomerActivity>,
    pub export_date: DateTime<Utc>,
}
