use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub password_hash: String,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub images: Vec<String>,
    pub regular_price: i64,
    pub discounted_price: Option<i64>,
    pub category: String,
    pub subcategory: Option<String>,
    pub description: String,
    pub stock: i32,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Discounted price when it is a real discount, regular price otherwise.
    pub fn effective_price(&self) -> i64 {
        match self.discounted_price {
            Some(price) if price > 0 && price < self.regular_price => price,
            _ => self.regular_price,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Product name is required"));
        }
        if self.images.is_empty() {
            return Err(AppError::validation("At least one product image is required"));
        }
        if self.regular_price <= 0 {
            return Err(AppError::validation("Regular price must be greater than 0"));
        }
        if let Some(discounted) = self.discounted_price {
            if discounted <= 0 || discounted >= self.regular_price {
                return Err(AppError::validation(
                    "Discounted price must be lower than the regular price",
                ));
            }
        }
        if self.stock < 0 {
            return Err(AppError::validation("Stock cannot be negative"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub subcategories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(user_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total_items(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }

    pub fn item(&self, product_id: Uuid) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }
}

/// A cart line joined with the live catalog product it points to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLine {
    pub item: CartItem,
    pub product: Product,
}

impl CartLine {
    pub fn line_total(&self) -> i64 {
        self.product.effective_price() * i64::from(self.item.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
}

impl Address {
    pub fn validate(&self) -> AppResult<()> {
        let required = [
            ("First name", &self.first_name),
            ("Last name", &self.last_name),
            ("Address", &self.address1),
            ("City", &self.city),
            ("State", &self.state),
            ("Postal code", &self.postal_code),
            ("Country", &self.country),
        ];
        for (label, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{label} is required")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    Card {
        last4: Option<String>,
        brand: Option<String>,
        expiry_month: Option<u8>,
        expiry_year: Option<u16>,
    },
    Upi {
        vpa: Option<String>,
    },
    NetBanking {
        bank: Option<String>,
    },
    Wallet {
        provider: Option<String>,
    },
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "Cash on Delivery",
            PaymentMethod::Card { .. } => "Credit/Debit Card",
            PaymentMethod::Upi { .. } => "UPI",
            PaymentMethod::NetBanking { .. } => "Net Banking",
            PaymentMethod::Wallet { .. } => "Wallet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Whether the order still counts toward the customer's spend.
    pub fn counts_toward_spend(self) -> bool {
        !matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub added_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn line_total(&self) -> i64 {
        self.unit_price * i64::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_number: String,
    pub items: Vec<OrderItem>,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub subtotal: i64,
    pub shipping_cost: i64,
    pub tax: i64,
    pub discount: i64,
    pub total_amount: i64,
    pub estimated_delivery: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Suspended,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoyaltyTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedAddress {
    pub id: Uuid,
    pub label: String,
    #[serde(flatten)]
    pub address: Address,
    pub is_default: bool,
    pub is_shipping: bool,
    pub is_billing: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub added_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub price_when_added: i64,
    pub notify_on_sale: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailNotifications {
    pub order_updates: bool,
    pub promotions: bool,
    pub new_products: bool,
    pub price_drops: bool,
    pub back_in_stock: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsNotifications {
    pub order_updates: bool,
    pub delivery_updates: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileVisibility {
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacySettings {
    pub profile_visibility: ProfileVisibility,
    pub allow_data_collection: bool,
    pub allow_third_party_sharing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
    Auto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingDefaults {
    pub default_currency: String,
    pub preferred_language: String,
    pub theme: Theme,
    pub items_per_page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerPreferences {
    pub email_notifications: EmailNotifications,
    pub sms_notifications: SmsNotifications,
    pub privacy: PrivacySettings,
    pub shopping: ShoppingDefaults,
}

impl Default for CustomerPreferences {
    fn default() -> Self {
        Self {
            email_notifications: EmailNotifications {
                order_updates: true,
                promotions: true,
                new_products: false,
                price_drops: true,
                back_in_stock: true,
            },
            sms_notifications: SmsNotifications {
                order_updates: true,
                delivery_updates: true,
            },
            privacy: PrivacySettings {
                profile_visibility: ProfileVisibility::Private,
                allow_data_collection: true,
                allow_third_party_sharing: false,
            },
            shopping: ShoppingDefaults {
                default_currency: "INR".to_string(),
                preferred_language: "en".to_string(),
                theme: Theme::Light,
                items_per_page: 12,
            },
        }
    }
}

/// Persisted profile record. Addresses, wishlist and orders live under their own keys
/// and are attached when the profile is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub role: Role,
    #[serde(skip)]
    pub addresses: Vec<SavedAddress>,
    #[serde(skip)]
    pub order_history: Vec<Order>,
    #[serde(skip)]
    pub wishlist: Vec<WishlistItem>,
    pub loyalty_points: i64,
    pub total_spent: i64,
    pub last_active: DateTime<Utc>,
    pub account_status: AccountStatus,
    pub profile_completion: u8,
    pub order_count: i64,
    pub average_order_value: i64,
    pub joined_date: DateTime<Utc>,
    pub preferences: Option<CustomerPreferences>,
    pub updated_at: DateTime<Utc>,
}

impl CustomerProfile {
    pub fn new_for(user: &User) -> Self {
        let now = Utc::now();
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone_number: user.phone_number.clone(),
            role: user.role,
            addresses: Vec::new(),
            order_history: Vec::new(),
            wishlist: Vec::new(),
            loyalty_points: 0,
            total_spent: 0,
            last_active: now,
            account_status: AccountStatus::Active,
            profile_completion: 0,
            order_count: 0,
            average_order_value: 0,
            joined_date: user.created_at,
            preferences: None,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Login,
    Order,
    ProfileUpdate,
    PasswordChange,
    AddressAdd,
    WishlistAdd,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerActivity {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub kind: ActivityKind,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    General,
    Support,
    Billing,
    Shipping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerNote {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub admin_id: Uuid,
    pub note: String,
    pub kind: NoteKind,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub joined_date: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub order_count: i64,
    pub total_spent: i64,
    pub status: AccountStatus,
    pub loyalty_tier: LoyaltyTier,
}
