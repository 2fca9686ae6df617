use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::cart::{CartSummary, CartView},
    error::{AppError, AppResult},
    models::{Cart, CartItem, CartLine, Product},
    pricing::{self, OrderTotals, PricingRules},
    services::catalog_service::Catalog,
    session::AuthUser,
    store::{GUEST_CART_KEY, KeyValueStore, Namespace, load_json, save_json},
};

/// Whose keyspace the cart is read from and written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOwner {
    Guest,
    User(Uuid),
}

impl CartOwner {
    pub fn key(self) -> String {
        match self {
            CartOwner::Guest => GUEST_CART_KEY.to_string(),
            CartOwner::User(id) => Namespace::Cart.key(id),
        }
    }

    pub fn user_id(self) -> Option<Uuid> {
        match self {
            CartOwner::Guest => None,
            CartOwner::User(id) => Some(id),
        }
    }
}

impl From<Option<&AuthUser>> for CartOwner {
    fn from(user: Option<&AuthUser>) -> Self {
        user.map_or(CartOwner::Guest, |u| CartOwner::User(u.user_id))
    }
}

/// The shopping cart of the current identity.
///
/// Every mutation is written through to the store. A failed write is logged and the
/// in-memory cart stays authoritative for the session.
pub struct CartService<S> {
    store: Arc<S>,
    owner: CartOwner,
    cart: Cart,
}

impl<S: KeyValueStore> CartService<S> {
    pub async fn load(store: Arc<S>, owner: CartOwner) -> Self {
        let cart = read_cart(store.as_ref(), owner).await;
        Self { store, owner, cart }
    }

    pub fn owner(&self) -> CartOwner {
        self.owner
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Replace the cart with the one persisted for `owner`. Carts are never merged.
    pub async fn switch_owner(&mut self, owner: CartOwner) {
        if owner == self.owner {
            return;
        }
        self.cart = read_cart(self.store.as_ref(), owner).await;
        self.owner = owner;
        tracing::debug!(cart_key = %owner.key(), items = self.cart.items.len(), "cart loaded");
    }

    /// Adds `quantity` to the product's line, creating it if needed.
    ///
    /// Stock is not checked here; a direct call can exceed the current stock. Order
    /// placement rejects such a cart.
    pub async fn add_to_cart(&mut self, product: &Product, quantity: i32) -> AppResult<()> {
        if quantity <= 0 {
            return Err(AppError::validation("quantity must be greater than 0"));
        }

        match self
            .cart
            .items
            .iter_mut()
            .find(|item| item.product_id == product.id)
        {
            Some(item) => item.quantity = item.quantity.saturating_add(quantity),
            None => self.cart.items.push(CartItem {
                product_id: product.id,
                quantity,
                added_at: Utc::now(),
            }),
        }

        self.touch_and_persist().await;
        Ok(())
    }

    pub async fn remove_from_cart(&mut self, product_id: Uuid) {
        self.cart.items.retain(|item| item.product_id != product_id);
        self.touch_and_persist().await;
    }

    /// Sets the line to exactly `quantity`; zero or less removes it.
    pub async fn update_quantity(&mut self, product_id: Uuid, quantity: i32) {
        if quantity <= 0 {
            self.remove_from_cart(product_id).await;
            return;
        }

        if let Some(item) = self
            .cart
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
        {
            item.quantity = quantity;
        }
        self.touch_and_persist().await;
    }

    pub async fn clear_cart(&mut self) {
        self.cart.items.clear();
        self.touch_and_persist().await;
    }

    /// Lines joined with the live catalog. Lines whose product is gone are left out.
    pub fn items_with_products(&self, catalog: &Catalog) -> Vec<CartLine> {
        self.cart
            .items
            .iter()
            .filter_map(|item| match catalog.product(item.product_id) {
                Some(product) => Some(CartLine {
                    item: item.clone(),
                    product: product.clone(),
                }),
                None => {
                    tracing::debug!(product_id = %item.product_id, "cart line skipped, product no longer in catalog");
                    None
                }
            })
            .collect()
    }

    pub fn total_items(&self) -> i64 {
        self.cart.total_items()
    }

    pub fn total_amount(&self, catalog: &Catalog) -> i64 {
        pricing::subtotal(&self.items_with_products(catalog))
    }

    /// Counts and amount cover only lines whose product is still in the catalog.
    pub fn summary(&self, catalog: &Catalog) -> CartSummary {
        summarize_lines(&self.items_with_products(catalog))
    }

    pub fn view(&self, catalog: &Catalog) -> CartView {
        let lines = self.items_with_products(catalog);
        CartView {
            summary: summarize_lines(&lines),
            lines,
        }
    }

    pub fn totals(&self, catalog: &Catalog, rules: &PricingRules) -> OrderTotals {
        pricing::calculate_totals(&self.items_with_products(catalog), rules)
    }

    async fn touch_and_persist(&mut self) {
        self.cart.updated_at = Utc::now();
        let key = self.owner.key();
        if let Err(err) = save_json(self.store.as_ref(), &key, &self.cart).await {
            tracing::warn!(error = %err, cart_key = %key, "cart persistence failed");
        }
    }
}

fn summarize_lines(lines: &[CartLine]) -> CartSummary {
    CartSummary {
        total_items: lines.iter().map(|line| i64::from(line.item.quantity)).sum(),
        total_amount: pricing::subtotal(lines),
    }
}

async fn read_cart<S: KeyValueStore>(store: &S, owner: CartOwner) -> Cart {
    match load_json::<S, Cart>(store, &owner.key()).await {
        Ok(Some(mut cart)) => {
            cart.user_id = owner.user_id();
            cart.items.retain(|item| item.quantity > 0);
            cart
        }
        Ok(None) => Cart::new(owner.user_id()),
        Err(err) => {
            tracing::warn!(error = %err, cart_key = %owner.key(), "cart load failed, starting empty");
            Cart::new(owner.user_id())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn product(price: i64, discounted: Option<i64>) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Premium Wireless Headphones".into(),
            images: vec!["headphones.jpg".into()],
            regular_price: price,
            discounted_price: discounted,
            category: "Electronics".into(),
            subcategory: None,
            description: String::new(),
            stock: 25,
            featured: false,
            created_at: Utc::now(),
        }
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> AppResult<Option<Vec<u8>>> {
            Err(AppError::Internal(anyhow::anyhow!("disk unavailable")))
        }

        async fn set(&self, _key: &str, _value: Vec<u8>) -> AppResult<()> {
            Err(AppError::Internal(anyhow::anyhow!("disk unavailable")))
        }

        async fn delete(&self, _key: &str) -> AppResult<()> {
            Ok(())
        }

        async fn list_keys(&self, _prefix: &str) -> AppResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn assert_consistent<S: KeyValueStore>(cart: &CartService<S>, catalog: &Catalog) {
        let lines = cart.items_with_products(catalog);
        let quantities: i64 = cart.cart().items.iter().map(|i| i64::from(i.quantity)).sum();
        assert_eq!(cart.total_items(), quantities);
        assert_eq!(cart.total_amount(catalog), pricing::subtotal(&lines));
        assert!(cart.cart().items.iter().all(|i| i.quantity >= 1));
    }

    #[tokio::test]
    async fn add_increments_existing_line() {
        let headphones = product(24_999, Some(20_799));
        let catalog = Catalog::new(vec![headphones.clone()], Vec::new());
        let mut cart = CartService::load(Arc::new(MemoryStore::new()), CartOwner::Guest).await;

        cart.add_to_cart(&headphones, 1).await.unwrap();
        cart.add_to_cart(&headphones, 2).await.unwrap();

        assert_eq!(cart.cart().items.len(), 1);
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_amount(&catalog), 3 * 20_799);
        assert_consistent(&cart, &catalog);
    }

    #[tokio::test]
    async fn add_rejects_non_positive_quantity() {
        let item = product(1_000, None);
        let mut cart = CartService::load(Arc::new(MemoryStore::new()), CartOwner::Guest).await;
        let err = cart.add_to_cart(&item, 0).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(cart.cart().items.is_empty());
    }

    #[tokio::test]
    async fn update_quantity_sets_exact_value_and_is_idempotent() {
        let a = product(1_000, None);
        let b = product(2_500, None);
        let catalog = Catalog::new(vec![a.clone(), b.clone()], Vec::new());
        let mut cart = CartService::load(Arc::new(MemoryStore::new()), CartOwner::Guest).await;

        cart.add_to_cart(&a, 1).await.unwrap();
        cart.add_to_cart(&b, 4).await.unwrap();

        cart.update_quantity(b.id, 2).await;
        let once = cart.cart().items.clone();
        cart.update_quantity(b.id, 2).await;
        assert_eq!(cart.cart().items, once);
        assert_eq!(cart.total_amount(&catalog), 1_000 + 2 * 2_500);

        cart.update_quantity(a.id, 0).await;
        assert!(cart.cart().item(a.id).is_none());
        assert_consistent(&cart, &catalog);

        // re-adding a removed product starts a fresh line
        cart.add_to_cart(&a, 1).await.unwrap();
        assert_eq!(cart.cart().item(a.id).map(|i| i.quantity), Some(1));
    }

    #[tokio::test]
    async fn missing_products_are_filtered_from_views() {
        let kept = product(1_000, None);
        let dropped = product(9_000, None);
        let mut cart = CartService::load(Arc::new(MemoryStore::new()), CartOwner::Guest).await;
        cart.add_to_cart(&kept, 1).await.unwrap();
        cart.add_to_cart(&dropped, 1).await.unwrap();

        let catalog = Catalog::new(vec![kept.clone()], Vec::new());
        let lines = cart.items_with_products(&catalog);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product.id, kept.id);
        assert_eq!(cart.total_amount(&catalog), 1_000);

        let view = cart.view(&catalog);
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.summary.total_items, 1);
        assert_eq!(view.summary.total_amount, 1_000);
        assert_eq!(cart.summary(&catalog), view.summary);
        // the stored cart still holds both lines
        assert_eq!(cart.total_items(), 2);
    }

    #[tokio::test]
    async fn totals_follow_catalog_price_changes() {
        let mut item = product(10_000, None);
        let mut cart = CartService::load(Arc::new(MemoryStore::new()), CartOwner::Guest).await;
        cart.add_to_cart(&item, 1).await.unwrap();

        let before = Catalog::new(vec![item.clone()], Vec::new());
        assert_eq!(cart.total_amount(&before), 10_000);

        item.discounted_price = Some(8_000);
        let after = Catalog::new(vec![item], Vec::new());
        assert_eq!(cart.total_amount(&after), 8_000);
    }

    #[tokio::test]
    async fn carts_are_scoped_per_identity() {
        let store = Arc::new(MemoryStore::new());
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let item = product(1_000, None);

        let mut cart = CartService::load(Arc::clone(&store), CartOwner::User(alice)).await;
        cart.add_to_cart(&item, 2).await.unwrap();

        cart.switch_owner(CartOwner::User(bob)).await;
        assert!(cart.cart().items.is_empty());
        cart.add_to_cart(&item, 5).await.unwrap();

        cart.switch_owner(CartOwner::User(alice)).await;
        assert_eq!(cart.total_items(), 2);

        let reloaded = CartService::load(store, CartOwner::User(bob)).await;
        assert_eq!(reloaded.total_items(), 5);
        assert_eq!(reloaded.cart().user_id, Some(bob));
    }

    #[tokio::test]
    async fn clear_zeroes_totals() {
        let item = product(1_000, None);
        let catalog = Catalog::new(vec![item.clone()], Vec::new());
        let mut cart = CartService::load(Arc::new(MemoryStore::new()), CartOwner::Guest).await;
        cart.add_to_cart(&item, 3).await.unwrap();
        cart.clear_cart().await;
        assert_eq!(cart.summary(&catalog), CartSummary::default());
    }

    #[tokio::test]
    async fn storage_failures_do_not_block_shopping() {
        let item = product(1_000, None);
        let catalog = Catalog::new(vec![item.clone()], Vec::new());
        let mut cart = CartService::load(Arc::new(BrokenStore), CartOwner::Guest).await;

        cart.add_to_cart(&item, 2).await.unwrap();
        cart.update_quantity(item.id, 3).await;
        assert_eq!(cart.summary(&catalog).total_amount, 3_000);
    }
}
