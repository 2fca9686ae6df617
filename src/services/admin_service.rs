use std::{collections::BTreeMap, sync::Arc};

use chrono::{Datelike, Duration, Months, NaiveTime, Utc};
use uuid::Uuid;

use crate::{
    activity::activity_history,
    dto::customers::{
        ChartDataPoint, CustomerAnalytics, CustomerSearchParams, CustomerSearchResult,
        CustomerSegment, CustomerSortField, GeographicData, NewNote, NoteUpdate,
    },
    error::{AppError, AppResult},
    models::{
        AccountStatus, CustomerActivity, CustomerNote, CustomerProfile, CustomerSummary,
        LoyaltyTier, Order, OrderStatus, SavedAddress,
    },
    response::Meta,
    services::{auth_service::AuthService, profile_service::recompute_derived},
    session::{AuthUser, ensure_admin},
    store::{CUSTOMER_NAMESPACES, KeyValueStore, Namespace, load_json, save_json},
};

const TOP_CUSTOMERS: usize = 10;
const GROWTH_MONTHS: u32 = 12;

/// Back-office view over every stored customer. Every call requires an admin.
pub struct AdminService<S> {
    store: Arc<S>,
}

impl<S: KeyValueStore> AdminService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn search_customers(
        &self,
        admin: &AuthUser,
        params: &CustomerSearchParams,
    ) -> AppResult<CustomerSearchResult> {
        ensure_admin(admin)?;

        let mut customers: Vec<CustomerSummary> = self
            .load_customers()
            .await?
            .iter()
            .map(summarize)
            .filter(|c| params.matches(c))
            .collect();

        let field = params.sort_by.unwrap_or(CustomerSortField::Name);
        let direction = params.sort_order.unwrap_or_default();
        customers.sort_by(|a, b| {
            let ordering = match field {
                CustomerSortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                CustomerSortField::JoinedDate => a.joined_date.cmp(&b.joined_date),
                CustomerSortField::LastActive => a.last_active.cmp(&b.last_active),
                CustomerSortField::OrderCount => a.order_count.cmp(&b.order_count),
                CustomerSortField::TotalSpent => a.total_spent.cmp(&b.total_spent),
            };
            direction.apply(ordering)
        });

        let (page, per_page, offset) = params.pagination.normalize();
        let meta = Meta::new(page, per_page, customers.len() as i64);
        let customers = customers
            .into_iter()
            .skip(offset as usize)
            .take(per_page as usize)
            .collect();

        Ok(CustomerSearchResult {
            customers,
            total: meta.total.unwrap_or_default(),
            page,
            total_pages: meta.total_pages(),
            has_more: meta.has_more(),
        })
    }

    /// Profile with addresses, wishlist and orders attached.
    pub async fn get_customer_details(&self, admin: &AuthUser, id: Uuid) -> AppResult<CustomerProfile> {
        ensure_admin(admin)?;
        let mut profile = self.load_profile(id).await?;
        profile.wishlist = load_json(self.store.as_ref(), &Namespace::Wishlist.key(id))
            .await?
            .unwrap_or_default();
        Ok(profile)
    }

    pub async fn update_customer_status(
        &self,
        admin: &AuthUser,
        id: Uuid,
        status: AccountStatus,
    ) -> AppResult<CustomerSummary> {
        ensure_admin(admin)?;
        let mut profile = self.load_profile(id).await?;
        profile.account_status = status;
        profile.updated_at = Utc::now();
        save_json(self.store.as_ref(), &Namespace::Profile.key(id), &profile).await?;
        tracing::info!(admin_id = %admin.user_id, customer_id = %id, ?status, "customer status updated");
        Ok(summarize(&profile))
    }

    /// Applies `status` to every listed customer that exists. Returns how many changed.
    pub async fn bulk_update_status(
        &self,
        admin: &AuthUser,
        ids: &[Uuid],
        status: AccountStatus,
    ) -> AppResult<usize> {
        ensure_admin(admin)?;
        let mut updated = 0;
        for &id in ids {
            match self.update_customer_status(admin, id, status).await {
                Ok(_) => updated += 1,
                Err(AppError::NotFound(_)) => {
                    tracing::debug!(customer_id = %id, "bulk update skipped unknown customer");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(updated)
    }

    pub async fn delete_customer(
        &self,
        admin: &AuthUser,
        auth: &AuthService<S>,
        id: Uuid,
    ) -> AppResult<()> {
        ensure_admin(admin)?;
        if id == admin.user_id {
            return Err(AppError::validation("You cannot delete your own account"));
        }
        self.load_profile(id).await?;

        for namespace in CUSTOMER_NAMESPACES {
            self.store.delete(&namespace.key(id)).await?;
        }
        match auth.delete_user(id).await {
            Ok(()) | Err(AppError::NotFound(_)) => {}
            Err(err) => return Err(err),
        }
        tracing::info!(admin_id = %admin.user_id, customer_id = %id, "customer deleted");
        Ok(())
    }

    pub async fn customer_notes(&self, admin: &AuthUser, customer_id: Uuid) -> AppResult<Vec<CustomerNote>> {
        ensure_admin(admin)?;
        self.load_notes(customer_id).await
    }

    pub async fn add_note(
        &self,
        admin: &AuthUser,
        customer_id: Uuid,
        new: NewNote,
    ) -> AppResult<CustomerNote> {
        ensure_admin(admin)?;
        if new.note.trim().is_empty() {
            return Err(AppError::validation("Note cannot be empty"));
        }
        self.load_profile(customer_id).await?;

        let now = Utc::now();
        let note = CustomerNote {
            id: Uuid::new_v4(),
            customer_id,
            admin_id: admin.user_id,
            note: new.note.trim().to_string(),
            kind: new.kind,
            is_private: new.is_private,
            created_at: now,
            updated_at: now,
        };
        let mut notes = self.load_notes(customer_id).await?;
        notes.insert(0, note.clone());
        self.save_notes(customer_id, &notes).await?;
        Ok(note)
    }

    pub async fn update_note(
        &self,
        admin: &AuthUser,
        customer_id: Uuid,
        note_id: Uuid,
        update: NoteUpdate,
    ) -> AppResult<CustomerNote> {
        ensure_admin(admin)?;
        if update.note.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::validation("Note cannot be empty"));
        }

        let mut notes = self.load_notes(customer_id).await?;
        let note = notes
            .iter_mut()
            .find(|n| n.id == note_id)
            .ok_or_else(|| AppError::not_found("Note"))?;
        if let Some(text) = update.note {
            note.note = text.trim().to_string();
        }
        if let Some(kind) = update.kind {
            note.kind = kind;
        }
        if let Some(is_private) = update.is_private {
            note.is_private = is_private;
        }
        note.updated_at = Utc::now();
        let updated = note.clone();

        self.save_notes(customer_id, &notes).await?;
        Ok(updated)
    }

    pub async fn delete_note(&self, admin: &AuthUser, customer_id: Uuid, note_id: Uuid) -> AppResult<()> {
        ensure_admin(admin)?;
        let mut notes = self.load_notes(customer_id).await?;
        let before = notes.len();
        notes.retain(|n| n.id != note_id);
        if notes.len() == before {
            return Err(AppError::not_found("Note"));
        }
        self.save_notes(customer_id, &notes).await
    }

    pub async fn customer_activity(
        &self,
        admin: &AuthUser,
        customer_id: Uuid,
        limit: usize,
    ) -> AppResult<Vec<CustomerActivity>> {
        ensure_admin(admin)?;
        activity_history(self.store.as_ref(), customer_id, limit).await
    }

    /// Moves an order to `status`. Monetary fields are left as placed.
    pub async fn update_order_status(
        &self,
        admin: &AuthUser,
        customer_id: Uuid,
        order_id: Uuid,
        status: OrderStatus,
    ) -> AppResult<Order> {
        ensure_admin(admin)?;
        let key = Namespace::Orders.key(customer_id);
        let mut orders: Vec<Order> = load_json(self.store.as_ref(), &key).await?.unwrap_or_default();
        let order = orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| AppError::not_found("Order"))?;
        order.status = status;
        order.updated_at = Utc::now();
        let updated = order.clone();
        save_json(self.store.as_ref(), &key, &orders).await?;

        if let Ok(mut profile) = self.load_profile(customer_id).await {
            profile.updated_at = Utc::now();
            save_json(self.store.as_ref(), &Namespace::Profile.key(customer_id), &profile).await?;
        }
        tracing::info!(
            admin_id = %admin.user_id,
            order_number = %updated.order_number,
            ?status,
            "order status updated"
        );
        Ok(updated)
    }

    pub async fn analytics(&self, admin: &AuthUser) -> AppResult<CustomerAnalytics> {
        ensure_admin(admin)?;
        let profiles = self.load_customers().await?;
        Ok(build_analytics(&profiles))
    }

    /// CSV of customer summaries; all customers when `ids` is `None`.
    pub async fn export_customers_csv(&self, admin: &AuthUser, ids: Option<&[Uuid]>) -> AppResult<String> {
        ensure_admin(admin)?;
        let customers: Vec<CustomerSummary> = self
            .load_customers()
            .await?
            .iter()
            .filter(|p| ids.is_none_or(|ids| ids.contains(&p.id)))
            .map(summarize)
            .collect();

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record([
                "ID",
                "Name",
                "Email",
                "Status",
                "Loyalty Tier",
                "Total Spent",
                "Order Count",
                "Joined Date",
                "Last Active",
            ])
            .map_err(|e| AppError::Internal(e.into()))?;
        for c in &customers {
            writer
                .write_record([
                    c.id.to_string(),
                    c.name.clone(),
                    c.email.clone(),
                    status_label(c.status).to_string(),
                    c.loyalty_tier.as_str().to_string(),
                    c.total_spent.to_string(),
                    c.order_count.to_string(),
                    c.joined_date.to_rfc3339(),
                    c.last_active.to_rfc3339(),
                ])
                .map_err(|e| AppError::Internal(e.into()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;
        String::from_utf8(bytes).map_err(|e| AppError::Internal(e.into()))
    }

    async fn load_customers(&self) -> AppResult<Vec<CustomerProfile>> {
        let mut profiles = Vec::new();
        for key in self.store.list_keys(&Namespace::Profile.prefix()).await? {
            let Some(profile) = load_json::<S, CustomerProfile>(self.store.as_ref(), &key).await? else {
                continue;
            };
            profiles.push(self.attach(profile).await?);
        }
        Ok(profiles)
    }

    async fn load_profile(&self, id: Uuid) -> AppResult<CustomerProfile> {
        let profile: CustomerProfile = load_json(self.store.as_ref(), &Namespace::Profile.key(id))
            .await?
            .ok_or_else(|| AppError::not_found("Customer"))?;
        self.attach(profile).await
    }

    async fn attach(&self, mut profile: CustomerProfile) -> AppResult<CustomerProfile> {
        profile.addresses = load_json(self.store.as_ref(), &Namespace::Addresses.key(profile.id))
            .await?
            .unwrap_or_default();
        profile.order_history = load_json(self.store.as_ref(), &Namespace::Orders.key(profile.id))
            .await?
            .unwrap_or_default();
        recompute_derived(&mut profile);
        Ok(profile)
    }

    async fn load_notes(&self, customer_id: Uuid) -> AppResult<Vec<CustomerNote>> {
        Ok(load_json(self.store.as_ref(), &Namespace::Notes.key(customer_id))
            .await?
            .unwrap_or_default())
    }

    async fn save_notes(&self, customer_id: Uuid, notes: &[CustomerNote]) -> AppResult<()> {
        save_json(self.store.as_ref(), &Namespace::Notes.key(customer_id), &notes).await
    }
}

pub fn summarize(profile: &CustomerProfile) -> CustomerSummary {
    CustomerSummary {
        id: profile.id,
        name: profile.full_name(),
        email: profile.email.clone(),
        joined_date: profile.joined_date,
        last_active: profile.last_active,
        order_count: profile.order_count,
        total_spent: profile.total_spent,
        status: profile.account_status,
        loyalty_tier: LoyaltyTier::for_total_spent(profile.total_spent),
    }
}

fn status_label(status: AccountStatus) -> &'static str {
    match status {
        AccountStatus::Active => "active",
        AccountStatus::Suspended => "suspended",
        AccountStatus::Pending => "pending",
    }
}

fn region_of(addresses: &[SavedAddress]) -> String {
    addresses
        .iter()
        .find(|a| a.is_shipping)
        .or_else(|| addresses.iter().find(|a| a.is_default))
        .or_else(|| addresses.first())
        .map(|a| a.address.state.trim().to_string())
        .filter(|state| !state.is_empty())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn ratio(part: i64, whole: i64) -> f64 {
    if whole == 0 { 0.0 } else { part as f64 / whole as f64 }
}

fn build_analytics(profiles: &[CustomerProfile]) -> CustomerAnalytics {
    let now = Utc::now();
    let summaries: Vec<CustomerSummary> = profiles.iter().map(summarize).collect();
    let total_customers = summaries.len() as i64;

    let month_start = now
        .date_naive()
        .with_day(1)
        .unwrap_or_else(|| now.date_naive())
        .and_time(NaiveTime::MIN)
        .and_utc();
    let week_ago = now - Duration::days(7);

    let revenue: i64 = summaries.iter().map(|c| c.total_spent).sum();
    let counted_orders: i64 = profiles
        .iter()
        .flat_map(|p| &p.order_history)
        .filter(|o| o.status.counts_toward_spend())
        .count() as i64;
    let buyers = summaries.iter().filter(|c| c.order_count > 0).count() as i64;
    let repeat_buyers = summaries.iter().filter(|c| c.order_count > 1).count() as i64;
    let retention_rate = ratio(repeat_buyers, buyers);

    let mut top_customers = summaries.clone();
    top_customers.sort_by(|a, b| b.total_spent.cmp(&a.total_spent));
    top_customers.truncate(TOP_CUSTOMERS);

    let customer_growth = (0..GROWTH_MONTHS)
        .rev()
        .filter_map(|back| month_start.checked_sub_months(Months::new(back)))
        .map(|start| ChartDataPoint {
            date: start.format("%b %Y").to_string(),
            value: summaries
                .iter()
                .filter(|c| c.joined_date.year() == start.year() && c.joined_date.month() == start.month())
                .count() as i64,
        })
        .collect();

    let mut regions: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    for profile in profiles {
        let entry = regions.entry(region_of(&profile.addresses)).or_default();
        entry.0 += 1;
        entry.1 += profile.total_spent;
    }
    let mut geographic_distribution: Vec<GeographicData> = regions
        .into_iter()
        .map(|(state, (customer_count, revenue))| GeographicData {
            state,
            customer_count,
            revenue,
        })
        .collect();
    geographic_distribution.sort_by(|a, b| b.customer_count.cmp(&a.customer_count));

    let customer_segments = [
        LoyaltyTier::Platinum,
        LoyaltyTier::Gold,
        LoyaltyTier::Silver,
        LoyaltyTier::Bronze,
    ]
    .into_iter()
    .map(|tier| {
        let members: Vec<&CustomerSummary> =
            summaries.iter().filter(|c| c.loyalty_tier == tier).collect();
        let count = members.len() as i64;
        let spent: i64 = members.iter().map(|c| c.total_spent).sum();
        CustomerSegment {
            name: tier.as_str().to_string(),
            tier,
            count,
            percentage: ratio(count, total_customers) * 100.0,
            average_spent: if count == 0 { 0 } else { spent / count },
        }
    })
    .collect();

    CustomerAnalytics {
        total_customers,
        active_customers: summaries
            .iter()
            .filter(|c| c.status == AccountStatus::Active)
            .count() as i64,
        new_customers_this_month: summaries.iter().filter(|c| c.joined_date >= month_start).count() as i64,
        new_customers_this_week: summaries.iter().filter(|c| c.joined_date >= week_ago).count() as i64,
        average_order_value: if counted_orders == 0 { 0 } else { revenue / counted_orders },
        customer_lifetime_value: if total_customers == 0 { 0 } else { revenue / total_customers },
        retention_rate,
        churn_rate: if buyers == 0 { 0.0 } else { 1.0 - retention_rate },
        top_customers,
        customer_growth,
        geographic_distribution,
        customer_segments,
    }
}
