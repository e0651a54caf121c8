/// Request extractors shared by the route handlers
///
/// - [`Caller`] resolves the `Authorization` header to the calling user and
///   rejects the request with 401 when it cannot
/// - [`ApiJson`] is `axum::Json` with rejections rendered as our JSON error body
/// - [`parse_id`] turns a path segment into a UUID, 400 on garbage

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::{header, request::Parts},
    Json,
};
use serde::de::DeserializeOwned;
use std::ops::Deref;
use taskhub_shared::auth::session::AuthContext;
use uuid::Uuid;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct Caller(pub AuthContext);

impl Caller {
    pub fn context(&self) -> &AuthContext {
        &self.0
    }
}

impl Deref for Caller {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // A header that is not valid ASCII resolves like a malformed one
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .map(|v| v.to_str().unwrap_or_default());

        let context = state.sessions.resolve(state.store.as_ref(), header).await?;

        Ok(Caller(context))
    }
}

/// JSON body extractor with API-shaped rejections
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::BadRequest(rejection.body_text()))?;

        Ok(ApiJson(value))
    }
}

/// Parses a UUID from a path segment
pub fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid id: {}", raw)))
}
