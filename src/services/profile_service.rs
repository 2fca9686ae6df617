use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    activity::{self, log_activity},
    dto::{
        orders::{OrderHistoryFilter, OrderSortField},
        profile::{AddressType, AddressUpdate, NewAddress, ProfileExport, ProfileUpdateRequest},
    },
    error::{AppError, AppResult},
    gate::OperationGate,
    loyalty::{LoyaltyProgram, points_for},
    models::{
        ActivityKind, CustomerActivity, CustomerPreferences, CustomerProfile, Order, Product,
        SavedAddress, User, WishlistItem,
    },
    params::SortOrder,
    services::{
        auth_service::AuthService,
        cart_service::{CartOwner, CartService},
        catalog_service::Catalog,
    },
    store::{CUSTOMER_NAMESPACES, KeyValueStore, Namespace, load_json, save_json},
};

const NAME_WEIGHT: u8 = 20;
const EMAIL_WEIGHT: u8 = 10;
const PHONE_WEIGHT: u8 = 10;
const ADDRESS_WEIGHT: u8 = 20;
const ORDER_WEIGHT: u8 = 20;
const PREFERENCES_WEIGHT: u8 = 20;

/// Share of optional profile sections that are filled in, 0 to 100.
pub fn profile_completion(profile: &CustomerProfile) -> u8 {
    let filled = |present: bool, weight: u8| if present { weight } else { 0 };
    let total = filled(
        !profile.first_name.trim().is_empty() && !profile.last_name.trim().is_empty(),
        NAME_WEIGHT,
    ) + filled(!profile.email.trim().is_empty(), EMAIL_WEIGHT)
        + filled(
            profile
                .phone_number
                .as_deref()
                .is_some_and(|p| !p.trim().is_empty()),
            PHONE_WEIGHT,
        )
        + filled(!profile.addresses.is_empty(), ADDRESS_WEIGHT)
        + filled(!profile.order_history.is_empty(), ORDER_WEIGHT)
        + filled(profile.preferences.is_some(), PREFERENCES_WEIGHT);
    total.min(100)
}

/// Rebuilds every spend-derived field from the attached order history.
pub fn recompute_derived(profile: &mut CustomerProfile) {
    let counted: Vec<&Order> = profile
        .order_history
        .iter()
        .filter(|order| order.status.counts_toward_spend())
        .collect();

    profile.total_spent = counted.iter().map(|order| order.total_amount).sum();
    profile.order_count = profile.order_history.len() as i64;
    profile.average_order_value = match counted.len() as i64 {
        0 => 0,
        n => profile.total_spent / n,
    };
    profile.loyalty_points = points_for(profile.total_spent);
    profile.profile_completion = profile_completion(profile);
}

/// The signed-in customer's profile with its addresses, wishlist and orders attached.
pub struct ProfileService<S> {
    store: Arc<S>,
    profile: CustomerProfile,
}

impl<S: KeyValueStore> ProfileService<S> {
    /// Loads the stored profile for `user`, creating one on first use.
    pub async fn open(store: Arc<S>, user: &User) -> AppResult<Self> {
        let stored: Option<CustomerProfile> =
            load_json(store.as_ref(), &Namespace::Profile.key(user.id)).await?;
        let mut profile = stored.unwrap_or_else(|| {
            tracing::info!(user_id = %user.id, "creating customer profile");
            CustomerProfile::new_for(user)
        });

        profile.addresses = load_json(store.as_ref(), &Namespace::Addresses.key(user.id))
            .await?
            .unwrap_or_default();
        profile.wishlist = load_json(store.as_ref(), &Namespace::Wishlist.key(user.id))
            .await?
            .unwrap_or_default();
        profile.order_history = load_json(store.as_ref(), &Namespace::Orders.key(user.id))
            .await?
            .unwrap_or_default();
        profile.last_active = Utc::now();
        recompute_derived(&mut profile);

        let service = Self { store, profile };
        service.persist(Namespace::Profile).await;
        Ok(service)
    }

    pub fn profile(&self) -> &CustomerProfile {
        &self.profile
    }

    pub fn customer_id(&self) -> Uuid {
        self.profile.id
    }

    pub fn addresses(&self) -> &[SavedAddress] {
        &self.profile.addresses
    }

    pub fn wishlist(&self) -> &[WishlistItem] {
        &self.profile.wishlist
    }

    pub fn orders(&self) -> &[Order] {
        &self.profile.order_history
    }

    pub fn loyalty_program(&self) -> LoyaltyProgram {
        LoyaltyProgram::from_total_spent(self.profile.total_spent)
    }

    /// Either every field is applied or, on a validation error, none is.
    pub async fn update_profile(&mut self, updates: ProfileUpdateRequest) -> AppResult<&CustomerProfile> {
        if updates.first_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::validation("First name is required"));
        }
        if updates.last_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::validation("Last name is required"));
        }

        if let Some(first_name) = updates.first_name {
            self.profile.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = updates.last_name {
            self.profile.last_name = last_name.trim().to_string();
        }
        if let Some(phone) = updates.phone_number {
            let phone = phone.trim();
            self.profile.phone_number = (!phone.is_empty()).then(|| phone.to_string());
        }
        if let Some(preferences) = updates.preferences {
            self.profile.preferences = Some(preferences);
        }

        self.touch();
        self.persist(Namespace::Profile).await;
        self.log(ActivityKind::ProfileUpdate, "Profile information updated", None)
            .await;
        Ok(&self.profile)
    }

    pub async fn update_preferences(&mut self, preferences: CustomerPreferences) {
        self.profile.preferences = Some(preferences);
        self.touch();
        self.persist(Namespace::Profile).await;
    }

    pub async fn add_address(&mut self, new: NewAddress) -> AppResult<SavedAddress> {
        if new.label.trim().is_empty() {
            return Err(AppError::validation("Label is required"));
        }
        new.address.validate()?;

        let now = Utc::now();
        let saved = SavedAddress {
            id: Uuid::new_v4(),
            label: new.label.trim().to_string(),
            address: new.address,
            is_default: new.is_default,
            is_shipping: new.is_shipping,
            is_billing: new.is_billing,
            created_at: now,
            updated_at: now,
        };
        let id = saved.id;
        self.profile.addresses.push(saved.clone());
        if saved.is_default {
            self.flag_only(id, |a| &mut a.is_default);
        }
        if saved.is_shipping {
            self.flag_only(id, |a| &mut a.is_shipping);
        }
        if saved.is_billing {
            self.flag_only(id, |a| &mut a.is_billing);
        }

        self.save_addresses().await;
        self.log(
            ActivityKind::AddressAdd,
            &format!("Added new address: {}", saved.label),
            Some(json!({ "address_id": id })),
        )
        .await;
        Ok(saved)
    }

    pub async fn update_address(&mut self, id: Uuid, update: AddressUpdate) -> AppResult<SavedAddress> {
        if let Some(address) = &update.address {
            address.validate()?;
        }
        if update.label.as_deref().is_some_and(|l| l.trim().is_empty()) {
            return Err(AppError::validation("Label is required"));
        }

        let entry = self.address_mut(id)?;
        if let Some(label) = update.label {
            entry.label = label.trim().to_string();
        }
        if let Some(address) = update.address {
            entry.address = address;
        }
        if let Some(is_default) = update.is_default {
            entry.is_default = is_default;
        }
        entry.updated_at = Utc::now();
        let updated = entry.clone();

        if updated.is_default {
            self.flag_only(id, |a| &mut a.is_default);
        }
        self.save_addresses().await;
        Ok(updated)
    }

    pub async fn delete_address(&mut self, id: Uuid) -> AppResult<()> {
        let before = self.profile.addresses.len();
        self.profile.addresses.retain(|a| a.id != id);
        if self.profile.addresses.len() == before {
            return Err(AppError::not_found("Address"));
        }
        self.save_addresses().await;
        Ok(())
    }

    /// Makes `id` the only address flagged for `kind`.
    pub async fn set_default_address(&mut self, id: Uuid, kind: AddressType) -> AppResult<()> {
        self.address_mut(id)?;
        match kind {
            AddressType::Shipping => self.flag_only(id, |a| &mut a.is_shipping),
            AddressType::Billing => self.flag_only(id, |a| &mut a.is_billing),
        }
        self.save_addresses().await;
        Ok(())
    }

    /// Adding a product that is already listed is a no-op.
    pub async fn add_to_wishlist(&mut self, product: &Product, notes: Option<String>) -> bool {
        if self.profile.wishlist.iter().any(|w| w.product_id == product.id) {
            return false;
        }
        self.profile.wishlist.push(WishlistItem {
            id: Uuid::new_v4(),
            product_id: product.id,
            added_at: Utc::now(),
            notes: notes.filter(|n| !n.trim().is_empty()),
            price_when_added: product.effective_price(),
            notify_on_sale: false,
        });
        self.persist(Namespace::Wishlist).await;
        self.log(
            ActivityKind::WishlistAdd,
            &format!("Added {} to wishlist", product.name),
            Some(json!({ "product_id": product.id })),
        )
        .await;
        true
    }

    pub async fn remove_from_wishlist(&mut self, product_id: Uuid) {
        self.profile.wishlist.retain(|w| w.product_id != product_id);
        self.persist(Namespace::Wishlist).await;
    }

    pub async fn clear_wishlist(&mut self) {
        self.profile.wishlist.clear();
        self.persist(Namespace::Wishlist).await;
    }

    pub async fn toggle_wishlist_notification(&mut self, product_id: Uuid) -> AppResult<bool> {
        let item = self
            .profile
            .wishlist
            .iter_mut()
            .find(|w| w.product_id == product_id)
            .ok_or_else(|| AppError::not_found("Wishlist item"))?;
        item.notify_on_sale = !item.notify_on_sale;
        let enabled = item.notify_on_sale;
        self.persist(Namespace::Wishlist).await;
        Ok(enabled)
    }

    /// Adds a placed order to the history (replacing an entry with the same id) and
    /// recomputes spend, loyalty points and completion.
    pub async fn record_order(&mut self, order: Order) -> AppResult<()> {
        if order.user_id != self.profile.id {
            return Err(AppError::Forbidden);
        }

        let is_new = !self.profile.order_history.iter().any(|o| o.id == order.id);
        let description = format!("Placed order {}", order.order_number);
        let metadata = json!({ "order_number": order.order_number, "total": order.total_amount });

        self.profile.order_history.retain(|o| o.id != order.id);
        self.profile.order_history.insert(0, order);
        self.profile
            .order_history
            .sort_by(|a, b| b.created_at.cmp(&a.created_at));

        self.persist(Namespace::Orders).await;
        self.touch();
        self.persist(Namespace::Profile).await;
        if is_new {
            self.log(ActivityKind::Order, &description, Some(metadata)).await;
        }
        Ok(())
    }

    pub fn filter_orders(&self, filter: &OrderHistoryFilter) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .profile
            .order_history
            .iter()
            .filter(|order| filter.matches(order))
            .cloned()
            .collect();

        let direction = filter.sort_order.unwrap_or(SortOrder::Desc);
        orders.sort_by(|a, b| {
            let ordering = match filter.sort_by {
                OrderSortField::Date => a.created_at.cmp(&b.created_at),
                OrderSortField::Amount => a.total_amount.cmp(&b.total_amount),
                OrderSortField::Status => a.status.cmp(&b.status),
            };
            direction.apply(ordering)
        });
        orders
    }

    /// Puts the order's products that are still in the catalog back into the cart.
    /// Returns how many lines were added.
    pub async fn reorder(
        &self,
        order_id: Uuid,
        cart: &mut CartService<S>,
        catalog: &Catalog,
    ) -> AppResult<usize> {
        if cart.owner() != CartOwner::User(self.profile.id) {
            return Err(AppError::Forbidden);
        }
        let order = self
            .profile
            .order_history
            .iter()
            .find(|o| o.id == order_id)
            .ok_or_else(|| AppError::not_found("Order"))?;

        let mut added = 0;
        for item in &order.items {
            match catalog.product(item.product_id) {
                Some(product) => {
                    cart.add_to_cart(product, item.quantity).await?;
                    added += 1;
                }
                None => {
                    tracing::debug!(product_id = %item.product_id, "reorder skipped missing product");
                }
            }
        }

        self.log(
            ActivityKind::Order,
            &format!("Reordered items from order {}", order.order_number),
            None,
        )
        .await;
        Ok(added)
    }

    pub async fn activity_history(&self, limit: usize) -> AppResult<Vec<CustomerActivity>> {
        activity::activity_history(self.store.as_ref(), self.profile.id, limit).await
    }

    pub async fn export_customer_data(&self, gate: &OperationGate) -> AppResult<ProfileExport> {
        let _guard = gate.try_begin()?;
        self.snapshot().await
    }

    /// Writes the export as pretty JSON into `dir` and returns the file path.
    pub async fn write_export(&self, gate: &OperationGate, dir: &Path) -> AppResult<PathBuf> {
        let _guard = gate.try_begin()?;
        let export = self.snapshot().await?;
        let path = dir.join(format!(
            "storefront-data-{}-{}.json",
            self.profile.email,
            export.export_date.timestamp_millis()
        ));
        let body = serde_json::to_vec_pretty(&export)?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("writing {}: {e}", path.display())))?;
        tracing::info!(user_id = %self.profile.id, path = %path.display(), "customer data exported");
        Ok(path)
    }

    /// Verifies the password, then removes every stored key of the customer and the
    /// account itself.
    pub async fn delete_account(
        self,
        gate: &OperationGate,
        auth: &AuthService<S>,
        password: &str,
    ) -> AppResult<()> {
        let _guard = gate.try_begin()?;
        auth.verify_credentials(self.profile.id, password).await?;

        for namespace in CUSTOMER_NAMESPACES {
            self.store.delete(&namespace.key(self.profile.id)).await?;
        }
        auth.delete_user(self.profile.id).await?;
        tracing::info!(user_id = %self.profile.id, "customer account deleted");
        Ok(())
    }

    async fn snapshot(&self) -> AppResult<ProfileExport> {
        let activity =
            activity::activity_history(self.store.as_ref(), self.profile.id, activity::ACTIVITY_LIMIT)
                .await?;
        Ok(ProfileExport {
            profile: self.profile.clone(),
            addresses: self.profile.addresses.clone(),
            wishlist: self.profile.wishlist.clone(),
            orders: self.profile.order_history.clone(),
            activity,
            export_date: Utc::now(),
        })
    }

    fn address_mut(&mut self, id: Uuid) -> AppResult<&mut SavedAddress> {
        self.profile
            .addresses
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AppError::not_found("Address"))
    }

    fn flag_only(&mut self, id: Uuid, flag: impl Fn(&mut SavedAddress) -> &mut bool) {
        let now = Utc::now();
        for address in &mut self.profile.addresses {
            let selected = address.id == id;
            let field = flag(address);
            if *field != selected {
                *field = selected;
                address.updated_at = now;
            }
        }
    }

    async fn save_addresses(&mut self) {
        self.persist(Namespace::Addresses).await;
        self.touch();
        self.persist(Namespace::Profile).await;
    }

    fn touch(&mut self) {
        let now = Utc::now();
        self.profile.updated_at = now;
        self.profile.last_active = now;
        recompute_derived(&mut self.profile);
    }

    async fn persist(&self, namespace: Namespace) {
        let key = namespace.key(self.profile.id);
        let result = match namespace {
            Namespace::Addresses => save_json(self.store.as_ref(), &key, &self.profile.addresses).await,
            Namespace::Wishlist => save_json(self.store.as_ref(), &key, &self.profile.wishlist).await,
            Namespace::Orders => save_json(self.store.as_ref(), &key, &self.profile.order_history).await,
            _ => save_json(self.store.as_ref(), &key, &self.profile).await,
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, key = %key, "profile persistence failed");
        }
    }

    async fn log(&self, kind: ActivityKind, description: &str, metadata: Option<serde_json::Value>) {
        if let Err(err) =
            log_activity(self.store.as_ref(), self.profile.id, kind, description, metadata).await
        {
            tracing::warn!(error = %err, "activity log failed");
        }
    }
}
