/// User account endpoints
///
/// # Endpoints
///
/// - `POST /api/user/signup` - Register a new user
/// - `POST /api/user/login` - Exchange credentials for a session token

use crate::{app::AppState, error::ApiResult, extract::ApiJson};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use taskhub_shared::auth::credentials::{self, SignupRequest};

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Signup response
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,

    /// Bearer token, valid for 24 hours
    pub token: String,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/user/signup
/// Content-Type: application/json
///
/// {
///   "username": "ada",
///   "email": "ada@example.com",
///   "password": "Secur3P@ss",
///   "passwordConfirmation": "Secur3P@ss"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: mismatched confirmation, invalid fields, weak
///   password, or username/email already taken
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> ApiResult<(StatusCode, Json<SignupResponse>)> {
    let user = credentials::register(state.store.as_ref(), req).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: format!("Sign up successful - Username: {}", user.username),
        }),
    ))
}

/// Log in
///
/// # Errors
///
/// - `404 Not Found`: no user with this email
/// - `401 Unauthorized`: wrong password
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let session = state
        .sessions
        .authenticate(state.store.as_ref(), &req.email, &req.password)
        .await?;

    tracing::info!(user_id = %session.user.id, "User logged in");

    Ok(Json(LoginResponse {
        message: format!("Login successful, welcome {}", session.user.username),
        token: session.token,
    }))
}
