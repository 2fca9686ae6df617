use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    error::{AppError, AppResult},
    gate::OperationGate,
    models::Order,
    services::{
        admin_service::AdminService,
        auth_service::AuthService,
        cart_service::{CartOwner, CartService},
        catalog_service::Catalog,
        checkout_service::{CheckoutService, CheckoutSession, SimulatedOrderGateway},
        profile_service::ProfileService,
    },
    session::AuthUser,
    store::{KeyValueStore, SqliteStore},
};

/// Services sharing one store, built once per process.
pub struct AppState<S> {
    pub config: AppConfig,
    pub store: Arc<S>,
    pub auth: AuthService<S>,
    pub admin: AdminService<S>,
    pub checkout: CheckoutService<SimulatedOrderGateway>,
    /// Process-wide in-flight gate shared by order placement, export and account deletion.
    pub gate: OperationGate,
}

impl<S: KeyValueStore> AppState<S> {
    pub fn new(config: AppConfig, store: Arc<S>) -> Self {
        let auth = AuthService::new(
            Arc::clone(&store),
            config.jwt_secret.clone(),
            config.session_ttl_secs,
        );
        let checkout = CheckoutService::new(
            SimulatedOrderGateway::new(config.checkout.simulated_latency),
            config.pricing,
            config.checkout.clone(),
        );
        Self {
            admin: AdminService::new(Arc::clone(&store)),
            auth,
            checkout,
            gate: OperationGate::new(),
            store,
            config,
        }
    }

    pub async fn cart_for(&self, user: Option<&AuthUser>) -> CartService<S> {
        CartService::load(Arc::clone(&self.store), CartOwner::from(user)).await
    }

    pub async fn open_profile(&self, user: &AuthUser) -> AppResult<ProfileService<S>> {
        let account = self.auth.get_user(user.user_id).await?;
        ProfileService::open(Arc::clone(&self.store), &account).await
    }

    /// Places the reviewed order, then adds it to the customer's order history so spend and
    /// loyalty are recomputed. A failed history write is logged; the order stands.
    pub async fn place_order(
        &self,
        session: &mut CheckoutSession,
        cart: &mut CartService<S>,
        catalog: &Catalog,
    ) -> AppResult<Order> {
        let order = self
            .checkout
            .place_order(session, &self.gate, cart, catalog)
            .await?;

        let recorded = match self.open_profile(session.user()).await {
            Ok(mut profile) => profile.record_order(order.clone()).await,
            Err(err) => Err(err),
        };
        if let Err(err) = recorded {
            tracing::warn!(
                error = %err,
                order_number = %order.order_number,
                "placed order missing from customer history"
            );
        }
        Ok(order)
    }

    /// Profile lookup by email, for operator tooling.
    pub async fn open_profile_by_email(&self, email: &str) -> AppResult<ProfileService<S>> {
        let account = self
            .auth
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found("Customer"))?;
        ProfileService::open(Arc::clone(&self.store), &account).await
    }
}

impl AppState<SqliteStore> {
    /// Opens the configured database and applies pending migrations.
    pub async fn connect(config: AppConfig) -> anyhow::Result<Self> {
        let pool = create_pool(&config.database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(config, Arc::new(SqliteStore::new(pool))))
    }
}
