use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{ActivityKind, CustomerActivity},
    store::{KeyValueStore, Namespace, load_json, save_json},
};

/// Entries kept per customer, newest first.
pub const ACTIVITY_LIMIT: usize = 50;

pub async fn log_activity<S: KeyValueStore>(
    store: &S,
    customer_id: Uuid,
    kind: ActivityKind,
    description: &str,
    metadata: Option<Value>,
) -> AppResult<CustomerActivity> {
    let key = Namespace::Activity.key(customer_id);
    let mut entries: Vec<CustomerActivity> = load_json(store, &key).await?.unwrap_or_default();

    let activity = CustomerActivity {
        id: Uuid::new_v4(),
        customer_id,
        kind,
        description: description.to_string(),
        timestamp: Utc::now(),
        metadata,
    };
    entries.insert(0, activity.clone());
    entries.truncate(ACTIVITY_LIMIT);

    save_json(store, &key, &entries).await?;
    Ok(activity)
}

pub async fn activity_history<S: KeyValueStore>(
    store: &S,
    customer_id: Uuid,
    limit: usize,
) -> AppResult<Vec<CustomerActivity>> {
    let mut entries: Vec<CustomerActivity> = load_json(store, &Namespace::Activity.key(customer_id))
        .await?
        .unwrap_or_default();
    entries.truncate(limit);
    Ok(entries)
}
