use std::{env, str::FromStr, time::Duration};

use crate::pricing::PricingRules;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub session_ttl_secs: i64,
    pub pricing: PricingRules,
    pub checkout: CheckoutSettings,
}

/// Bounds for the order-placement call.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
    pub simulated_latency: Duration,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(10_000),
            max_attempts: 3,
            retry_backoff: Duration::from_millis(200),
            simulated_latency: Duration::from_millis(1_000),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://storefront.db?mode=rwc".to_string());
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;

        let pricing_defaults = PricingRules::default();
        let pricing = PricingRules {
            free_shipping_threshold: env_or(
                "FREE_SHIPPING_THRESHOLD",
                pricing_defaults.free_shipping_threshold,
            ),
            flat_shipping_fee: env_or("FLAT_SHIPPING_FEE", pricing_defaults.flat_shipping_fee),
            tax_rate_bps: env_or("TAX_RATE_BPS", pricing_defaults.tax_rate_bps),
        };

        let checkout_defaults = CheckoutSettings::default();
        let checkout = CheckoutSettings {
            timeout: env_millis("CHECKOUT_TIMEOUT_MS", checkout_defaults.timeout),
            max_attempts: env_or("CHECKOUT_MAX_ATTEMPTS", checkout_defaults.max_attempts).max(1),
            retry_backoff: env_millis("CHECKOUT_RETRY_BACKOFF_MS", checkout_defaults.retry_backoff),
            simulated_latency: env_millis("ORDER_LATENCY_MS", checkout_defaults.simulated_latency),
        };

        Ok(Self {
            database_url,
            jwt_secret,
            session_ttl_secs: env_or("SESSION_TTL_SECS", 1800),
            pricing,
            checkout,
        })
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_millis(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}
