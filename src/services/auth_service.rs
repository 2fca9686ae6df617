use std::{collections::HashMap, sync::Arc};

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    activity::log_activity,
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest},
    error::{AppError, AppResult},
    models::{ActivityKind, Role, User},
    session::AuthUser,
    store::{KeyValueStore, Namespace, load_json, save_json, user_email_key},
};

pub const MIN_PASSWORD_LENGTH: usize = 12;
pub const MAX_LOGIN_ATTEMPTS: u32 = 5;
/// Both the window failures are counted in and the lockout length.
pub const LOGIN_WINDOW_MINUTES: i64 = 15;

const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";
const COMMON_PASSWORDS: [&str; 5] = ["password", "123456", "qwerty", "admin", "letmein"];

#[derive(Debug, Clone, Copy)]
struct LoginAttempts {
    count: u32,
    last_attempt: DateTime<Utc>,
    locked_until: Option<DateTime<Utc>>,
}

/// Local identity provider: accounts live in the key-value store under `user:<email>`.
pub struct AuthService<S> {
    store: Arc<S>,
    jwt_secret: String,
    session_ttl: Duration,
    attempts: Mutex<HashMap<String, LoginAttempts>>,
}

impl<S: KeyValueStore> AuthService<S> {
    pub fn new(store: Arc<S>, jwt_secret: impl Into<String>, session_ttl_secs: i64) -> Self {
        Self {
            store,
            jwt_secret: jwt_secret.into(),
            session_ttl: Duration::seconds(session_ttl_secs),
            attempts: Mutex::new(HashMap::new()),
        }
    }

    pub async fn register(&self, payload: RegisterRequest) -> AppResult<User> {
        let RegisterRequest {
            email,
            password,
            first_name,
            last_name,
            phone_number,
            marketing_consent,
            terms_accepted,
        } = payload;

        if !terms_accepted {
            return Err(AppError::validation(
                "You must accept the terms and conditions",
            ));
        }
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(AppError::validation("First and last name are required"));
        }

        let user = self
            .create_user(&email, &password, &first_name, &last_name, phone_number, Role::Customer)
            .await?;
        tracing::info!(user_id = %user.id, marketing_consent, "customer registered");
        Ok(user)
    }

    pub async fn create_admin(&self, email: &str, name: &str, password: &str) -> AppResult<User> {
        let (first_name, last_name) = name.trim().split_once(' ').unwrap_or((name.trim(), ""));
        if first_name.is_empty() {
            return Err(AppError::validation("Name is required"));
        }
        let user = self
            .create_user(email, password, first_name, last_name.trim(), None, Role::Admin)
            .await?;
        tracing::info!(user_id = %user.id, "admin account created");
        Ok(user)
    }

    pub async fn login(&self, payload: LoginRequest) -> AppResult<LoginResponse> {
        let email = normalize_email(&payload.email);
        self.check_rate_limit(&email).await?;

        let user = match self.find_by_email(&email).await? {
            Some(user) if verify_password(&user, &payload.password).is_ok() => user,
            _ => {
                self.record_failure(&email).await;
                tracing::debug!(email = %email, "login rejected");
                return Err(AppError::validation("Invalid email or password"));
            }
        };
        self.attempts.lock().await.remove(&email);

        let mut user = user;
        user.last_login = Some(Utc::now());
        save_json(self.store.as_ref(), &user_email_key(&user.email), &user).await?;

        let token = self.issue_token(&user)?;

        if let Err(err) = log_activity(
            self.store.as_ref(),
            user.id,
            ActivityKind::Login,
            "Signed in",
            None,
        )
        .await
        {
            tracing::warn!(error = %err, "activity log failed");
        }

        Ok(LoginResponse {
            token: format!("Bearer {token}"),
            user: AuthUser {
                user_id: user.id,
                role: user.role,
            },
        })
    }

    pub fn authenticate(&self, token: &str) -> AppResult<AuthUser> {
        AuthUser::from_token(token, &self.jwt_secret)
    }

    pub async fn change_password(
        &self,
        user: &AuthUser,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let mut account = self.get_user(user.user_id).await?;
        verify_password(&account, current_password)
            .map_err(|_| AppError::validation("Current password is incorrect"))?;
        validate_password(new_password)?;

        account.password_hash = hash_password(new_password)?;
        account.updated_at = Utc::now();
        save_json(self.store.as_ref(), &user_email_key(&account.email), &account).await?;

        if let Err(err) = log_activity(
            self.store.as_ref(),
            account.id,
            ActivityKind::PasswordChange,
            "Password changed",
            None,
        )
        .await
        {
            tracing::warn!(error = %err, "activity log failed");
        }
        Ok(())
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        load_json(self.store.as_ref(), &user_email_key(email)).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        for key in self.store.list_keys(&Namespace::User.prefix()).await? {
            if let Some(user) = load_json::<S, User>(self.store.as_ref(), &key).await? {
                if user.id == id {
                    return Ok(Some(user));
                }
            }
        }
        Ok(None)
    }

    pub async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Checks `password` against the stored hash of account `id`.
    pub async fn verify_credentials(&self, id: Uuid, password: &str) -> AppResult<User> {
        let user = self.get_user(id).await?;
        verify_password(&user, password).map_err(|_| AppError::validation("Password is incorrect"))?;
        Ok(user)
    }

    pub async fn delete_user(&self, id: Uuid) -> AppResult<()> {
        let user = self.get_user(id).await?;
        self.store.delete(&user_email_key(&user.email)).await?;
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        phone_number: Option<String>,
        role: Role,
    ) -> AppResult<User> {
        let email = normalize_email(email);
        validate_email(&email)?;
        validate_password(password)?;

        if self.find_by_email(&email).await?.is_some() {
            return Err(AppError::validation("Email is already taken"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            phone_number: phone_number.filter(|p| !p.trim().is_empty()),
            role,
            password_hash: hash_password(password)?,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        save_json(self.store.as_ref(), &user_email_key(&user.email), &user).await?;
        Ok(user)
    }

    fn issue_token(&self, user: &User) -> AppResult<String> {
        let expiration = Utc::now()
            .checked_add_signed(self.session_ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role,
            exp: expiration.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    async fn check_rate_limit(&self, email: &str) -> AppResult<()> {
        let now = Utc::now();
        let window = Duration::minutes(LOGIN_WINDOW_MINUTES);
        let mut attempts = self.attempts.lock().await;
        let Some(entry) = attempts.get_mut(email) else {
            return Ok(());
        };

        if let Some(until) = entry.locked_until {
            if now < until {
                let minutes = (until - now).num_seconds().div_euclid(60) + 1;
                return Err(AppError::Validation(format!(
                    "Too many login attempts. Try again in {minutes} minutes"
                )));
            }
            attempts.remove(email);
            return Ok(());
        }

        if now - entry.last_attempt > window {
            attempts.remove(email);
            return Ok(());
        }

        if entry.count >= MAX_LOGIN_ATTEMPTS {
            entry.locked_until = Some(now + window);
            tracing::warn!(email = %email, "login locked after repeated failures");
            return Err(AppError::Validation(format!(
                "Too many login attempts. Try again in {LOGIN_WINDOW_MINUTES} minutes"
            )));
        }
        Ok(())
    }

    async fn record_failure(&self, email: &str) {
        let now = Utc::now();
        let mut attempts = self.attempts.lock().await;
        let entry = attempts.entry(email.to_string()).or_insert(LoginAttempts {
            count: 0,
            last_attempt: now,
            locked_until: None,
        });
        entry.count += 1;
        entry.last_attempt = now;
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> AppResult<()> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'));
    if !valid {
        return Err(AppError::validation("Please enter a valid email address"));
    }
    Ok(())
}

/// Every broken rule is reported, joined into one message.
pub fn validate_password(password: &str) -> AppResult<()> {
    let mut errors = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one number".to_string());
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        errors.push("Password must contain at least one special character".to_string());
    }
    if COMMON_PASSWORDS.contains(&password.to_lowercase().as_str()) {
        errors.push("Password is too common, please choose a stronger password".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors.join("; ")))
    }
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string())
}

fn verify_password(user: &User, password: &str) -> AppResult<()> {
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::validation("Invalid email or password"))
}
