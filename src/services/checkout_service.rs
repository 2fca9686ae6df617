use std::{
    collections::{HashMap, VecDeque},
    future::Future,
    sync::atomic::{AtomicI64, Ordering},
    time::Duration,
};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    config::CheckoutSettings,
    dto::orders::{OrderConfirmation, ShippingDetails},
    error::{AppError, AppResult},
    gate::OperationGate,
    models::{Address, CartLine, Order, OrderItem, OrderStatus, PaymentMethod},
    pricing::{self, OrderTotals, PricingRules},
    services::{
        cart_service::{CartOwner, CartService},
        catalog_service::Catalog,
    },
    session::{AuthUser, require_user},
    store::KeyValueStore,
};

pub const ORDER_NUMBER_PREFIX: &str = "SH";
pub const DELIVERY_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    Shipping,
    Payment,
    Review,
    Confirmation,
}

/// One pass through shipping, payment, review and confirmation for a signed-in customer.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    user: AuthUser,
    step: CheckoutStep,
    shipping_address: Option<Address>,
    billing_address: Option<Address>,
    payment_method: Option<PaymentMethod>,
    placed_order: Option<Order>,
    last_error: Option<String>,
}

impl CheckoutSession {
    pub fn open(user: Option<&AuthUser>) -> AppResult<Self> {
        let user = *require_user(user)?;
        Ok(Self {
            user,
            step: CheckoutStep::Shipping,
            shipping_address: None,
            billing_address: None,
            payment_method: None,
            placed_order: None,
            last_error: None,
        })
    }

    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn shipping_address(&self) -> Option<&Address> {
        self.shipping_address.as_ref()
    }

    pub fn billing_address(&self) -> Option<&Address> {
        self.billing_address.as_ref()
    }

    pub fn payment_method(&self) -> Option<&PaymentMethod> {
        self.payment_method.as_ref()
    }

    pub fn placed_order(&self) -> Option<&Order> {
        self.placed_order.as_ref()
    }

    pub fn confirmation(&self) -> Option<OrderConfirmation> {
        self.placed_order.as_ref().map(OrderConfirmation::from)
    }

    /// Message of the last failed placement, cleared on the next attempt.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn submit_shipping(&mut self, details: ShippingDetails) -> AppResult<()> {
        self.expect_step(CheckoutStep::Shipping)?;
        details.shipping.validate()?;

        let billing = if details.billing_same_as_shipping {
            details.shipping.clone()
        } else {
            let billing = details
                .billing
                .ok_or_else(|| AppError::validation("Billing address is required"))?;
            billing.validate()?;
            billing
        };

        self.shipping_address = Some(details.shipping);
        self.billing_address = Some(billing);
        self.step = CheckoutStep::Payment;
        Ok(())
    }

    pub fn submit_payment(&mut self, method: PaymentMethod) -> AppResult<()> {
        self.expect_step(CheckoutStep::Payment)?;
        self.payment_method = Some(method);
        self.step = CheckoutStep::Review;
        Ok(())
    }

    pub fn back(&mut self) -> AppResult<()> {
        self.step = match self.step {
            CheckoutStep::Payment => CheckoutStep::Shipping,
            CheckoutStep::Review => CheckoutStep::Payment,
            CheckoutStep::Shipping | CheckoutStep::Confirmation => {
                return Err(AppError::validation("Cannot go back from this step"));
            }
        };
        Ok(())
    }

    /// Close and reopen: always lands on a fresh shipping step.
    pub fn reset(&mut self) {
        *self = Self {
            user: self.user,
            step: CheckoutStep::Shipping,
            shipping_address: None,
            billing_address: None,
            payment_method: None,
            placed_order: None,
            last_error: None,
        };
    }

    fn expect_step(&self, step: CheckoutStep) -> AppResult<()> {
        if self.step != step {
            return Err(AppError::Validation(format!(
                "Checkout is at the {:?} step",
                self.step
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Worth retrying.
    #[error("{0}")]
    Transient(String),
    #[error("{0}")]
    Rejected(String),
}

/// External order-placement collaborator. Submitting the same order id twice must not
/// create a second order.
pub trait OrderGateway: Send + Sync {
    fn submit(&self, order: &Order) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

/// Stand-in gateway: waits `latency`, then records the order in an in-memory ledger.
#[derive(Debug, Default)]
pub struct SimulatedOrderGateway {
    latency: Duration,
    ledger: Mutex<HashMap<Uuid, Order>>,
    scripted_failures: Mutex<VecDeque<GatewayError>>,
}

impl SimulatedOrderGateway {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// Makes the next submission fail with `error` instead of reaching the ledger.
    pub async fn fail_next(&self, error: GatewayError) {
        self.scripted_failures.lock().await.push_back(error);
    }

    pub async fn placed_orders(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self.ledger.lock().await.values().cloned().collect();
        orders.sort_by(|a, b| a.order_number.cmp(&b.order_number));
        orders
    }
}

impl OrderGateway for SimulatedOrderGateway {
    async fn submit(&self, order: &Order) -> Result<(), GatewayError> {
        tokio::time::sleep(self.latency).await;

        if let Some(error) = self.scripted_failures.lock().await.pop_front() {
            return Err(error);
        }

        self.ledger
            .lock()
            .await
            .entry(order.id)
            .or_insert_with(|| order.clone());
        Ok(())
    }
}

/// `SH` followed by a millisecond stamp that never repeats within the process.
#[derive(Debug, Default)]
pub struct OrderNumberGenerator {
    last: AtomicI64,
}

impl OrderNumberGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> String {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        format!("{ORDER_NUMBER_PREFIX}{}", now.max(previous + 1))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReview {
    pub lines: Vec<CartLine>,
    pub totals: OrderTotals,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub payment_method: PaymentMethod,
}

/// Turns a reviewed checkout session plus the current cart into an order.
pub struct CheckoutService<G> {
    gateway: G,
    numbers: OrderNumberGenerator,
    pricing: PricingRules,
    settings: CheckoutSettings,
}

impl<G: OrderGateway> CheckoutService<G> {
    pub fn new(gateway: G, pricing: PricingRules, settings: CheckoutSettings) -> Self {
        Self {
            gateway,
            numbers: OrderNumberGenerator::new(),
            pricing,
            settings,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn pricing(&self) -> &PricingRules {
        &self.pricing
    }

    pub fn review<S: KeyValueStore>(
        &self,
        session: &CheckoutSession,
        cart: &CartService<S>,
        catalog: &Catalog,
    ) -> AppResult<CheckoutReview> {
        session.expect_step(CheckoutStep::Review)?;
        let (shipping_address, billing_address, payment_method) = session_choices(session)?;
        let lines = cart.items_with_products(catalog);
        let totals = pricing::calculate_totals(&lines, &self.pricing);
        Ok(CheckoutReview {
            lines,
            totals,
            shipping_address,
            billing_address,
            payment_method,
        })
    }

    /// Places the order. All or nothing: on any failure the session stays on review with
    /// `last_error` set and the cart is left as it was.
    pub async fn place_order<S: KeyValueStore>(
        &self,
        session: &mut CheckoutSession,
        gate: &OperationGate,
        cart: &mut CartService<S>,
        catalog: &Catalog,
    ) -> AppResult<Order> {
        let _guard = gate.try_begin()?;
        session.expect_step(CheckoutStep::Review)?;
        if cart.owner() != CartOwner::User(session.user.user_id) {
            tracing::warn!(user_id = %session.user.user_id, cart_key = %cart.owner().key(), "checkout with a foreign cart");
            return Err(AppError::Forbidden);
        }
        session.last_error = None;

        let result = self.build_and_submit(session, cart, catalog).await;
        match result {
            Ok(order) => {
                cart.clear_cart().await;
                session.placed_order = Some(order.clone());
                session.step = CheckoutStep::Confirmation;
                tracing::info!(
                    user_id = %order.user_id,
                    order_number = %order.order_number,
                    total = order.total_amount,
                    "order placed"
                );
                Ok(order)
            }
            Err(err) => {
                tracing::warn!(error = %err, user_id = %session.user.user_id, "order placement failed");
                session.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    async fn build_and_submit<S: KeyValueStore>(
        &self,
        session: &CheckoutSession,
        cart: &CartService<S>,
        catalog: &Catalog,
    ) -> AppResult<Order> {
        let (shipping_address, billing_address, payment_method) = session_choices(session)?;

        let lines = cart.items_with_products(catalog);
        if lines.is_empty() {
            return Err(AppError::validation("Your cart is empty"));
        }
        for line in &lines {
            if line.item.quantity > line.product.stock {
                return Err(AppError::Validation(format!(
                    "Only {} of {} left in stock",
                    line.product.stock, line.product.name
                )));
            }
        }

        let totals = pricing::calculate_totals(&lines, &self.pricing);
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            user_id: session.user.user_id,
            order_number: self.numbers.issue(),
            items: lines
                .iter()
                .map(|line| OrderItem {
                    product_id: line.product.id,
                    product_name: line.product.name.clone(),
                    quantity: line.item.quantity,
                    unit_price: line.product.effective_price(),
                    added_at: line.item.added_at,
                })
                .collect(),
            shipping_address,
            billing_address,
            payment_method,
            status: OrderStatus::Pending,
            subtotal: totals.subtotal,
            shipping_cost: totals.shipping_cost,
            tax: totals.tax,
            discount: totals.discount,
            total_amount: totals.total,
            estimated_delivery: now + chrono::Duration::days(DELIVERY_DAYS),
            created_at: now,
            updated_at: now,
        };

        self.submit_with_retry(&order).await?;
        Ok(order)
    }

    /// Timed-out and transient attempts are retried with linear backoff; the gateway is
    /// idempotent by order id so a late success is never duplicated.
    async fn submit_with_retry(&self, order: &Order) -> AppResult<()> {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let error = match tokio::time::timeout(self.settings.timeout, self.gateway.submit(order))
                .await
            {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(GatewayError::Rejected(reason))) => return Err(AppError::Gateway(reason)),
                Ok(Err(GatewayError::Transient(reason))) => AppError::Gateway(reason),
                Err(_) => AppError::Timeout,
            };

            if attempt >= max_attempts {
                return Err(error);
            }
            tracing::debug!(
                attempt,
                order_number = %order.order_number,
                error = %error,
                "retrying order submission"
            );
            tokio::time::sleep(self.settings.retry_backoff * attempt).await;
            attempt += 1;
        }
    }
}

fn session_choices(session: &CheckoutSession) -> AppResult<(Address, Address, PaymentMethod)> {
    let shipping = session
        .shipping_address
        .clone()
        .ok_or_else(|| AppError::validation("Shipping address is required"))?;
    let billing = session
        .billing_address
        .clone()
        .ok_or_else(|| AppError::validation("Billing address is required"))?;
    let payment = session
        .payment_method
        .clone()
        .ok_or_else(|| AppError::validation("Payment method is required"))?;
    Ok((shipping, billing, payment))
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Arc};

    use super::*;
    use crate::{
        models::{Product, Role},
        store::MemoryStore,
    };

    fn customer() -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::Customer,
        }
    }

    fn address(city: &str) -> Address {
        Address {
            first_name: "Asha".into(),
            last_name: "Rao".into(),
            address1: "12 MG Road".into(),
            city: city.into(),
            state: "Karnataka".into(),
            postal_code: "560001".into(),
            country: "India".into(),
            ..Address::default()
        }
    }

    fn headphones(stock: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Premium Wireless Headphones".into(),
            images: vec!["headphones.jpg".into()],
            regular_price: 24_999,
            discounted_price: Some(20_799),
            category: "Electronics".into(),
            subcategory: Some("Headphones".into()),
            description: String::new(),
            stock,
            featured: true,
            created_at: Utc::now(),
        }
    }

    fn fast_settings() -> CheckoutSettings {
        CheckoutSettings {
            timeout: Duration::from_millis(200),
            max_attempts: 3,
            retry_backoff: Duration::from_millis(1),
            simulated_latency: Duration::ZERO,
        }
    }

    fn service(latency: Duration) -> CheckoutService<SimulatedOrderGateway> {
        CheckoutService::new(
            SimulatedOrderGateway::new(latency),
            PricingRules::default(),
            fast_settings(),
        )
    }

    fn reviewed(user: &AuthUser) -> CheckoutSession {
        let mut session = CheckoutSession::open(Some(user)).unwrap();
        session
            .submit_shipping(ShippingDetails {
                shipping: address("Bengaluru"),
                billing_same_as_shipping: true,
                billing: None,
            })
            .unwrap();
        session.submit_payment(PaymentMethod::CashOnDelivery).unwrap();
        session
    }

    async fn cart_with(user: &AuthUser, product: &Product, quantity: i32) -> CartService<MemoryStore> {
        let mut cart =
            CartService::load(Arc::new(MemoryStore::new()), CartOwner::User(user.user_id)).await;
        cart.add_to_cart(product, quantity).await.unwrap();
        cart
    }

    #[test]
    fn checkout_requires_a_signed_in_user() {
        assert!(matches!(
            CheckoutSession::open(None),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn steps_are_linear() {
        let user = customer();
        let mut session = CheckoutSession::open(Some(&user)).unwrap();

        assert!(session.submit_payment(PaymentMethod::CashOnDelivery).is_err());
        assert!(session.back().is_err());

        let mut incomplete = address("Bengaluru");
        incomplete.postal_code.clear();
        let err = session
            .submit_shipping(ShippingDetails {
                shipping: incomplete,
                billing_same_as_shipping: true,
                billing: None,
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "Postal code is required");
        assert_eq!(session.step(), CheckoutStep::Shipping);

        session
            .submit_shipping(ShippingDetails {
                shipping: address("Bengaluru"),
                billing_same_as_shipping: true,
                billing: None,
            })
            .unwrap();
        assert_eq!(session.step(), CheckoutStep::Payment);
        session.submit_payment(PaymentMethod::Upi { vpa: None }).unwrap();
        assert_eq!(session.step(), CheckoutStep::Review);

        session.back().unwrap();
        assert_eq!(session.step(), CheckoutStep::Payment);
        session.back().unwrap();
        assert_eq!(session.step(), CheckoutStep::Shipping);
    }

    #[test]
    fn billing_is_a_copy_taken_at_submit() {
        let user = customer();
        let mut session = CheckoutSession::open(Some(&user)).unwrap();
        session
            .submit_shipping(ShippingDetails {
                shipping: address("Bengaluru"),
                billing_same_as_shipping: true,
                billing: None,
            })
            .unwrap();
        session.back().unwrap();
        session
            .submit_shipping(ShippingDetails {
                shipping: address("Mysuru"),
                billing_same_as_shipping: false,
                billing: Some(address("Bengaluru")),
            })
            .unwrap();

        assert_eq!(session.shipping_address().map(|a| a.city.as_str()), Some("Mysuru"));
        assert_eq!(session.billing_address().map(|a| a.city.as_str()), Some("Bengaluru"));
    }

    #[test]
    fn separate_billing_must_be_given() {
        let user = customer();
        let mut session = CheckoutSession::open(Some(&user)).unwrap();
        let err = session
            .submit_shipping(ShippingDetails {
                shipping: address("Bengaluru"),
                billing_same_as_shipping: false,
                billing: None,
            })
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn placing_an_order_freezes_totals_and_clears_the_cart() {
        let user = customer();
        let product = headphones(25);
        let catalog = Catalog::new(vec![product.clone()], Vec::new());
        let mut cart = cart_with(&user, &product, 2).await;
        let mut session = reviewed(&user);
        let checkout = service(Duration::ZERO);

        let review = checkout.review(&session, &cart, &catalog).unwrap();
        assert_eq!(review.totals.total, 54_086);

        let order = checkout
            .place_order(&mut session, &OperationGate::new(), &mut cart, &catalog)
            .await
            .unwrap();

        assert_eq!(order.subtotal, 41_598);
        assert_eq!(order.shipping_cost, 5_000);
        assert_eq!(order.tax, 7_488);
        assert_eq!(order.total_amount, 54_086);
        assert_eq!(order.items[0].unit_price, 20_799);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.estimated_delivery, order.created_at + chrono::Duration::days(7));
        assert!(order.order_number.starts_with("SH"));

        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_amount(&catalog), 0);
        assert_eq!(session.step(), CheckoutStep::Confirmation);
        assert_eq!(checkout.gateway().placed_orders().await.len(), 1);

        assert!(session.back().is_err());
        session.reset();
        assert_eq!(session.step(), CheckoutStep::Shipping);
        assert!(session.placed_order().is_none());
    }

    #[tokio::test]
    async fn only_the_customers_own_cart_can_be_ordered() {
        let user = customer();
        let product = headphones(25);
        let catalog = Catalog::new(vec![product.clone()], Vec::new());
        let checkout = service(Duration::ZERO);
        let store = Arc::new(MemoryStore::new());

        let mut guest = CartService::load(Arc::clone(&store), CartOwner::Guest).await;
        guest.add_to_cart(&product, 1).await.unwrap();
        let mut other = CartService::load(store, CartOwner::User(Uuid::new_v4())).await;
        other.add_to_cart(&product, 1).await.unwrap();

        for cart in [&mut guest, &mut other] {
            let mut session = reviewed(&user);
            let err = checkout
                .place_order(&mut session, &OperationGate::new(), &mut *cart, &catalog)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Forbidden));
            assert_eq!(session.step(), CheckoutStep::Review);
            assert_eq!(cart.total_items(), 1);
        }
        assert!(checkout.gateway().placed_orders().await.is_empty());
    }

    #[tokio::test]
    async fn rejected_order_leaves_cart_and_step_untouched() {
        let user = customer();
        let product = headphones(25);
        let catalog = Catalog::new(vec![product.clone()], Vec::new());
        let mut cart = cart_with(&user, &product, 1).await;
        let mut session = reviewed(&user);
        let checkout = service(Duration::ZERO);
        checkout
            .gateway()
            .fail_next(GatewayError::Rejected("payment declined".into()))
            .await;

        let err = checkout
            .place_order(&mut session, &OperationGate::new(), &mut cart, &catalog)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Order could not be placed: payment declined");
        assert_eq!(session.step(), CheckoutStep::Review);
        assert_eq!(
            session.last_error(),
            Some("Order could not be placed: payment declined")
        );
        assert_eq!(cart.total_items(), 1);
        assert!(checkout.gateway().placed_orders().await.is_empty());
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let user = customer();
        let product = headphones(25);
        let catalog = Catalog::new(vec![product.clone()], Vec::new());
        let mut cart = cart_with(&user, &product, 1).await;
        let mut session = reviewed(&user);
        let checkout = service(Duration::ZERO);
        for _ in 0..2 {
            checkout
                .gateway()
                .fail_next(GatewayError::Transient("connection reset".into()))
                .await;
        }

        let order = checkout
            .place_order(&mut session, &OperationGate::new(), &mut cart, &catalog)
            .await
            .unwrap();
        assert_eq!(checkout.gateway().placed_orders().await, vec![order]);
    }

    #[tokio::test]
    async fn slow_gateway_times_out() {
        let user = customer();
        let product = headphones(25);
        let catalog = Catalog::new(vec![product.clone()], Vec::new());
        let mut cart = cart_with(&user, &product, 1).await;
        let mut session = reviewed(&user);
        let checkout = CheckoutService::new(
            SimulatedOrderGateway::new(Duration::from_millis(500)),
            PricingRules::default(),
            CheckoutSettings {
                timeout: Duration::from_millis(20),
                max_attempts: 2,
                ..fast_settings()
            },
        );

        let err = checkout
            .place_order(&mut session, &OperationGate::new(), &mut cart, &catalog)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Timeout));
        assert_eq!(session.step(), CheckoutStep::Review);
        assert_eq!(cart.total_items(), 1);
    }

    #[tokio::test]
    async fn stock_and_empty_cart_are_checked_at_placement() {
        let user = customer();
        let scarce = headphones(1);
        let catalog = Catalog::new(vec![scarce.clone()], Vec::new());
        let checkout = service(Duration::ZERO);

        let mut cart = cart_with(&user, &scarce, 3).await;
        let mut session = reviewed(&user);
        let err = checkout
            .place_order(&mut session, &OperationGate::new(), &mut cart, &catalog)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("left in stock"));

        cart.clear_cart().await;
        let err = checkout
            .place_order(&mut session, &OperationGate::new(), &mut cart, &catalog)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Your cart is empty");
    }

    #[tokio::test]
    async fn concurrent_placement_is_rejected() {
        let user = customer();
        let product = headphones(25);
        let catalog = Catalog::new(vec![product.clone()], Vec::new());
        let mut cart = cart_with(&user, &product, 1).await;
        let mut session = reviewed(&user);
        let checkout = service(Duration::ZERO);
        let gate = OperationGate::new();

        let _in_flight = gate.try_begin().unwrap();
        let err = checkout
            .place_order(&mut session, &gate, &mut cart, &catalog)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::OperationInFlight));
        assert_eq!(cart.total_items(), 1);
    }

    #[test]
    fn order_numbers_never_repeat() {
        let numbers = OrderNumberGenerator::new();
        let issued: Vec<String> = (0..500).map(|_| numbers.issue()).collect();
        let unique: HashSet<&String> = issued.iter().collect();
        assert_eq!(unique.len(), issued.len());

        let stamps: Vec<i64> = issued
            .iter()
            .map(|n| n.trim_start_matches("SH").parse().unwrap())
            .collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn gateway_is_idempotent_by_order_id() {
        let user = customer();
        let product = headphones(25);
        let catalog = Catalog::new(vec![product.clone()], Vec::new());
        let mut cart = cart_with(&user, &product, 1).await;
        let mut session = reviewed(&user);
        let checkout = service(Duration::ZERO);
        let order = checkout
            .place_order(&mut session, &OperationGate::new(), &mut cart, &catalog)
            .await
            .unwrap();

        checkout.gateway().submit(&order).await.unwrap();
        assert_eq!(checkout.gateway().placed_orders().await.len(), 1);
    }
}
