use storefront_core::{
    config::{AppConfig, CheckoutSettings},
    dto::{
        auth::{LoginRequest, RegisterRequest},
        profile::{AddressType, NewAddress, ProfileUpdateRequest},
    },
    error::AppError,
    models::{ActivityKind, Address, CustomerPreferences, Product},
    pricing::PricingRules,
    session::AuthUser,
    state::AppState,
    store::{CUSTOMER_NAMESPACES, KeyValueStore},
};

const PASSWORD: &str = "CustomerPass123!";

async fn setup() -> anyhow::Result<(AppState<storefront_core::store::SqliteStore>, AuthUser)> {
    let state = AppState::connect(AppConfig {
        database_url: "sqlite::memory:".into(),
        jwt_secret: "integration-secret".into(),
        session_ttl_secs: 1800,
        pricing: PricingRules::default(),
        checkout: CheckoutSettings::default(),
    })
    .await?;

    state
        .auth
        .register(RegisterRequest {
            email: "priya@example.com".into(),
            password: PASSWORD.into(),
            first_name: "Priya".into(),
            last_name: "Sharma".into(),
            phone_number: None,
            marketing_consent: false,
            terms_accepted: true,
        })
        .await?;
    let login = state
        .auth
        .login(LoginRequest {
            email: "priya@example.com".into(),
            password: PASSWORD.into(),
        })
        .await?;
    Ok((state, login.user))
}

fn home() -> NewAddress {
    NewAddress {
        label: "Home".into(),
        address: Address {
            first_name: "Priya".into(),
            last_name: "Sharma".into(),
            address1: "14 Marine Drive".into(),
            city: "Mumbai".into(),
            state: "Maharashtra".into(),
            postal_code: "400020".into(),
            country: "India".into(),
            ..Address::default()
        },
        is_default: true,
        is_shipping: true,
        is_billing: true,
    }
}

#[tokio::test]
async fn profile_sections_persist_and_drive_completion() -> anyhow::Result<()> {
    let (state, user) = setup().await?;

    let mut profile = state.open_profile(&user).await?;
    assert_eq!(profile.profile().profile_completion, 30);

    profile
        .update_profile(ProfileUpdateRequest {
            phone_number: Some("+91 99300 12345".into()),
            ..ProfileUpdateRequest::default()
        })
        .await?;
    let home = profile.add_address(home()).await?;
    let mut office = home.clone();
    office.label = "Office".into();
    let office = profile
        .add_address(NewAddress {
            label: office.label,
            address: office.address,
            is_default: false,
            is_shipping: false,
            is_billing: false,
        })
        .await?;
    profile
        .set_default_address(office.id, AddressType::Billing)
        .await?;
    profile.update_preferences(CustomerPreferences::default()).await;
    assert_eq!(profile.profile().profile_completion, 80);

    // everything is read back from storage
    let reopened = state.open_profile(&user).await?;
    assert_eq!(reopened.profile().profile_completion, 80);
    assert_eq!(reopened.addresses().len(), 2);
    let billing: Vec<&str> = reopened
        .addresses()
        .iter()
        .filter(|a| a.is_billing)
        .map(|a| a.label.as_str())
        .collect();
    assert_eq!(billing, vec!["Office"]);
    assert_eq!(
        reopened.profile().preferences.as_ref().map(|p| p.shopping.default_currency.as_str()),
        Some("INR")
    );

    let activity = reopened.activity_history(50).await?;
    assert!(activity.iter().any(|a| a.kind == ActivityKind::Login));
    assert!(activity.iter().any(|a| a.kind == ActivityKind::AddressAdd));
    assert_eq!(activity[0].kind, ActivityKind::AddressAdd);
    Ok(())
}

#[tokio::test]
async fn export_then_delete_account() -> anyhow::Result<()> {
    let (state, user) = setup().await?;
    let mut profile = state.open_profile(&user).await?;
    profile.add_address(home()).await?;

    let product = Product {
        id: uuid::Uuid::new_v4(),
        name: "Silk Saree".into(),
        images: vec!["saree.jpg".into()],
        regular_price: 8_999,
        discounted_price: Some(7_499),
        category: "Fashion".into(),
        subcategory: None,
        description: String::new(),
        stock: 3,
        featured: false,
        created_at: chrono::Utc::now(),
    };
    profile.add_to_wishlist(&product, Some("for Diwali".into())).await;

    let dir = tempfile::tempdir()?;
    let path = profile.write_export(&state.gate, dir.path()).await?;
    let export: serde_json::Value = serde_json::from_slice(&tokio::fs::read(&path).await?)?;
    assert_eq!(export["wishlist"][0]["price_when_added"], 7_499);
    assert_eq!(export["wishlist"][0]["notes"], "for Diwali");
    assert!(export["export_date"].is_string());

    let err = state
        .open_profile(&user)
        .await?
        .delete_account(&state.gate, &state.auth, "WrongPass123!")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    profile.delete_account(&state.gate, &state.auth, PASSWORD).await?;
    for namespace in CUSTOMER_NAMESPACES {
        assert!(state.store.get(&namespace.key(user.user_id)).await?.is_none());
    }
    assert!(matches!(
        state.open_profile(&user).await,
        Err(AppError::NotFound(_))
    ));
    assert!(
        state
            .auth
            .login(LoginRequest {
                email: "priya@example.com".into(),
                password: PASSWORD.into(),
            })
            .await
            .is_err()
    );
    Ok(())
}
