/// Account registration and credential checks
///
/// Registration runs its checks in a fixed order and stops at the first
/// stage that fails:
///
/// 1. password and confirmation must match
/// 2. field format (non-empty username, valid email)
/// 3. password policy, reporting every violated rule
/// 4. username and email uniqueness
///
/// Hashing and verification are CPU-heavy (Argon2id with 64 MiB) and run on
/// the blocking thread pool.

use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::password::{self, check_password_policy};
use crate::error::{FieldViolation, ServiceError, ServiceResult};
use crate::models::user::{CreateUser, User};
use crate::store::{StoreError, UserStore};

/// Signup payload
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "A username is required"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,

    pub password_confirmation: String,
}

/// Lower-cases and trims an email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates a signup request and creates the account
///
/// # Errors
///
/// - `ServiceError::Validation` for mismatched confirmation, bad formats, or
///   a weak password
/// - `ServiceError::Conflict` when the username or email is taken
pub async fn register<U>(users: &U, mut request: SignupRequest) -> ServiceResult<User>
where
    U: UserStore + ?Sized,
{
    if request.password != request.password_confirmation {
        return Err(ServiceError::invalid(
            "passwordConfirmation",
            "Password mismatched, please check password and try again",
        ));
    }

    request.username = request.username.trim().to_string();
    request.email = normalize_email(&request.email);
    request.validate()?;

    let violations: Vec<FieldViolation> = check_password_policy(&request.password)
        .into_iter()
        .map(|rule| FieldViolation::new("password", rule.to_string()))
        .collect();
    if !violations.is_empty() {
        return Err(ServiceError::Validation(violations));
    }

    if users.find_user_by_username(&request.username).await?.is_some() {
        return Err(conflict("username", &request.username));
    }
    if users.find_user_by_email(&request.email).await?.is_some() {
        return Err(conflict("email", &request.email));
    }

    let password_hash = hash(request.password).await?;

    let user = users
        .create_user(CreateUser {
            username: request.username.clone(),
            email: request.email.clone(),
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::Duplicate(field) if field == "username" => conflict("username", &request.username),
            StoreError::Duplicate(_) => conflict("email", &request.email),
            other => ServiceError::Store(other),
        })?;

    info!(user_id = %user.id, username = %user.username, "User registered");

    Ok(user)
}

fn conflict(field: &str, value: &str) -> ServiceError {
    ServiceError::Conflict(format!("A user with {} \"{}\" already exists", field, value))
}

/// Looks up a user by email, normalizing it first
pub async fn find_by_email<U>(users: &U, email: &str) -> ServiceResult<Option<User>>
where
    U: UserStore + ?Sized,
{
    Ok(users.find_user_by_email(&normalize_email(email)).await?)
}

/// Verifies `password` against a stored hash off the async runtime
pub async fn verify(password: &str, stored_hash: &str) -> ServiceResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();

    tokio::task::spawn_blocking(move || password::verify_password(&password, &stored_hash))
        .await
        .map_err(|e| ServiceError::Password(password::PasswordError::VerifyError(e.to_string())))?
        .map_err(ServiceError::from)
}

async fn hash(password: String) -> ServiceResult<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| ServiceError::Password(password::PasswordError::HashError(e.to_string())))?
        .map_err(ServiceError::from)
}
