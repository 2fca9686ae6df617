//! Key-value persistence port.
//!
//! Every piece of customer state is stored as a JSON document under a key of the form
//! `<namespace>:<scope>`, where the scope is a user id (or `guest` for anonymous carts).
//! Writes overwrite by key, so repeating one is always safe.

use std::{collections::HashMap, future::Future};

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = AppResult<Option<Vec<u8>>>> + Send;

    fn set(&self, key: &str, value: Vec<u8>) -> impl Future<Output = AppResult<()>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = AppResult<()>> + Send;

    /// Keys starting with `prefix`, in lexical order.
    fn list_keys(&self, prefix: &str) -> impl Future<Output = AppResult<Vec<String>>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Cart,
    Profile,
    Addresses,
    Wishlist,
    Orders,
    Activity,
    Notes,
    User,
}

impl Namespace {
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Cart => "cart",
            Namespace::Profile => "profile",
            Namespace::Addresses => "addresses",
            Namespace::Wishlist => "wishlist",
            Namespace::Orders => "orders",
            Namespace::Activity => "activity",
            Namespace::Notes => "notes",
            Namespace::User => "user",
        }
    }

    pub fn prefix(self) -> String {
        format!("{}:", self.as_str())
    }

    pub fn key(self, user_id: Uuid) -> String {
        format!("{}:{}", self.as_str(), user_id)
    }
}

/// Namespaces holding one customer's data, removed together on account deletion.
pub const CUSTOMER_NAMESPACES: [Namespace; 7] = [
    Namespace::Cart,
    Namespace::Profile,
    Namespace::Addresses,
    Namespace::Wishlist,
    Namespace::Orders,
    Namespace::Activity,
    Namespace::Notes,
];

pub const GUEST_CART_KEY: &str = "cart:guest";

pub fn user_email_key(email: &str) -> String {
    format!("{}{}", Namespace::User.prefix(), email.trim().to_lowercase())
}

pub async fn load_json<S, T>(store: &S, key: &str) -> AppResult<Option<T>>
where
    S: KeyValueStore,
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

pub async fn save_json<S, T>(store: &S, key: &str, value: &T) -> AppResult<()>
where
    S: KeyValueStore,
    T: Serialize,
{
    let bytes = serde_json::to_vec(value)?;
    store.set(key, bytes).await
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> AppResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> AppResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .await
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}

/// SQLite-backed store over the `kv_entries` table.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as("SELECT value FROM kv_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (key) DO UPDATE
            SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM kv_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> AppResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT key FROM kv_entries WHERE substr(key, 1, ?) = ? ORDER BY key",
        )
        .bind(prefix.chars().count() as i64)
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(key,)| key).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations};

    async fn exercise<S: KeyValueStore>(store: &S) {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        save_json(store, &Namespace::Cart.key(alice), &vec![1, 2, 3])
            .await
            .unwrap();
        save_json(store, &Namespace::Cart.key(bob), &vec![4]).await.unwrap();
        save_json(store, &Namespace::Profile.key(alice), &"profile")
            .await
            .unwrap();

        // overwrite by key
        save_json(store, &Namespace::Cart.key(alice), &vec![9]).await.unwrap();
        let cart: Option<Vec<i32>> = load_json(store, &Namespace::Cart.key(alice)).await.unwrap();
        assert_eq!(cart, Some(vec![9]));

        let keys = store.list_keys(&Namespace::Cart.prefix()).await.unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|key| key.starts_with("cart:")));

        store.delete(&Namespace::Cart.key(alice)).await.unwrap();
        store.delete(&Namespace::Cart.key(alice)).await.unwrap();
        let gone: Option<Vec<i32>> = load_json(store, &Namespace::Cart.key(alice)).await.unwrap();
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn memory_store_behaves_like_a_keyspace() {
        exercise(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn sqlite_store_behaves_like_a_keyspace() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        exercise(&SqliteStore::new(pool)).await;
    }

    #[test]
    fn keys_are_namespaced_per_user() {
        let id = Uuid::nil();
        assert_eq!(
            Namespace::Orders.key(id),
            "orders:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(user_email_key(" Asha@Example.com "), "user:asha@example.com");
    }
}
