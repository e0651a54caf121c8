/// Session issuing and resolution
///
/// `SessionIssuer` owns the signing secret. It is built once at startup and
/// shared read-only by every request:
///
/// - `authenticate` exchanges an email and password for a signed token
/// - `resolve` turns an `Authorization` header back into an [`AuthContext`]
///
/// Tokens are never stored. A token resolves only while its signature and
/// expiry hold *and* its user still exists.

use chrono::Duration;
use std::fmt;
use tracing::{debug, warn};
use uuid::Uuid;

use super::credentials;
use super::jwt::{self, Claims, JwtError};
use crate::error::{ServiceError, ServiceResult};
use crate::models::user::User;
use crate::store::UserStore;

/// Identity of the caller, attached to a request once its token resolves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
}

impl AuthContext {
    pub fn new(user_id: Uuid, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Signs and verifies session tokens
#[derive(Clone)]
pub struct SessionIssuer {
    secret: String,
    ttl: Duration,
}

impl fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionIssuer {
    /// Creates an issuer with the default 24-hour token lifetime
    ///
    /// # Errors
    ///
    /// `ServiceError::Config` if `secret` is empty or blank.
    pub fn new(secret: impl Into<String>) -> ServiceResult<Self> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(ServiceError::Config("JWT secret must not be empty".to_string()));
        }

        Ok(Self {
            secret,
            ttl: Duration::hours(jwt::DEFAULT_EXPIRATION_HOURS),
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Signs a fresh token for `user`
    pub fn issue(&self, user: &User) -> ServiceResult<String> {
        let claims = Claims::with_expiration(user.id, user.email.clone(), self.ttl);
        Ok(jwt::create_token(&claims, &self.secret)?)
    }

    /// Checks credentials and issues a token
    ///
    /// # Errors
    ///
    /// - `ServiceError::NotFound` when no user has this email
    /// - `ServiceError::Auth` when the password is wrong
    pub async fn authenticate<U>(&self, users: &U, email: &str, password: &str) -> ServiceResult<Session>
    where
        U: UserStore + ?Sized,
    {
        let email = credentials::normalize_email(email);

        let user = credentials::find_by_email(users, &email)
            .await?
            .ok_or_else(|| {
                warn!(email = %email, "Login attempt for unknown email");
                ServiceError::NotFound(format!("Login failed. User with email \"{}\" not found", email))
            })?;

        if !credentials::verify(password, &user.password_hash).await? {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(ServiceError::Auth("Login failed. Wrong password/username".to_string()));
        }

        let token = self.issue(&user)?;
        debug!(user_id = %user.id, "Session issued");

        Ok(Session { token, user })
    }

    /// Resolves an `Authorization` header value to the caller's identity
    ///
    /// Expects `Bearer <token>`. Fails with `ServiceError::Auth` when the
    /// header is missing or malformed, when the token is invalid or expired,
    /// and when the token's user no longer exists.
    pub async fn resolve<U>(&self, users: &U, header: Option<&str>) -> ServiceResult<AuthContext>
    where
        U: UserStore + ?Sized,
    {
        let header = header.ok_or_else(|| ServiceError::Auth("Unauthorized: No token provided".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ServiceError::Auth("Unauthorized! Invalid JWT".to_string()))?;

        let claims = jwt::validate_token(token, &self.secret).map_err(|e| {
            debug!(error = %e, "Token rejected");
            match e {
                JwtError::Expired => ServiceError::Auth("Token expired".to_string()),
                _ => ServiceError::Auth("Unauthorized! Invalid JWT".to_string()),
            }
        })?;

        let user = users
            .find_user(claims.sub)
            .await?
            .ok_or_else(|| ServiceError::Auth("User not found. Invalid JWT!".to_string()))?;

        Ok(AuthContext::new(user.id, user.email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::{register, SignupRequest};
    use crate::store::MemoryStore;

    const SECRET: &str = "session-test-secret-at-least-32-bytes";

    async fn registered(store: &MemoryStore) -> User {
        register(
            store,
            SignupRequest {
                username: "ada".to_string(),
                email: "Ada@Example.com".to_string(),
                password: "Passw0rd!".to_string(),
                password_confirmation: "Passw0rd!".to_string(),
            },
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_empty_secret_is_config_error() {
        assert!(matches!(SessionIssuer::new(""), Err(ServiceError::Config(_))));
        assert!(matches!(SessionIssuer::new("   "), Err(ServiceError::Config(_))));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let issuer = SessionIssuer::new(SECRET).unwrap();
        let debug = format!("{:?}", issuer);

        assert!(!debug.contains(SECRET));
        assert!(debug.contains("REDACTED"));
    }

    #[tokio::test]
    async fn test_authenticate_then_resolve() {
        let store = MemoryStore::new();
        let user = registered(&store).await;
        let issuer = SessionIssuer::new(SECRET).unwrap();

        let session = issuer.authenticate(&store, "ada@example.com", "Passw0rd!").await.unwrap();
        assert_eq!(session.user.id, user.id);

        let header = format!("Bearer {}", session.token);
        let context = issuer.resolve(&store, Some(&header)).await.unwrap();
        assert_eq!(context.user_id, user.id);
        assert_eq!(context.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_authenticate_failures() {
        let store = MemoryStore::new();
        registered(&store).await;
        let issuer = SessionIssuer::new(SECRET).unwrap();

        let err = issuer.authenticate(&store, "ada@example.com", "Wr0ng!pass").await.unwrap_err();
        assert!(matches!(err, ServiceError::Auth(_)));

        let err = issuer.authenticate(&store, "nobody@example.com", "Passw0rd!").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m.contains("nobody@example.com")));
    }

    #[tokio::test]
    async fn test_resolve_rejects_bad_headers() {
        let store = MemoryStore::new();
        let user = registered(&store).await;
        let issuer = SessionIssuer::new(SECRET).unwrap();
        let token = issuer.issue(&user).unwrap();

        for header in [None, Some(token.as_str()), Some("Bearer "), Some("Bearer garbage")] {
            let err = issuer.resolve(&store, header).await.unwrap_err();
            assert!(matches!(err, ServiceError::Auth(_)), "{header:?}");
        }
    }

    #[tokio::test]
    async fn test_resolve_rejects_expired_token() {
        let store = MemoryStore::new();
        let user = registered(&store).await;
        let issuer = SessionIssuer::new(SECRET).unwrap().with_ttl(Duration::seconds(-10));
        let token = issuer.issue(&user).unwrap();

        let err = issuer
            .resolve(&store, Some(&format!("Bearer {token}")))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Auth(ref m) if m == "Token expired"));
    }

    #[tokio::test]
    async fn test_resolve_rejects_token_for_unknown_user() {
        let store = MemoryStore::new();
        let issuer = SessionIssuer::new(SECRET).unwrap();
        let claims = Claims::new(Uuid::new_v4(), "ghost@example.com");
        let token = jwt::create_token(&claims, SECRET).unwrap();

        let err = issuer
            .resolve(&store, Some(&format!("Bearer {token}")))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Auth(ref m) if m.contains("User not found")));
    }

    #[tokio::test]
    async fn test_resolve_rejects_token_signed_elsewhere() {
        let store = MemoryStore::new();
        let user = registered(&store).await;
        let issuer = SessionIssuer::new(SECRET).unwrap();
        let other = SessionIssuer::new("a-completely-different-signing-secret").unwrap();
        let token = other.issue(&user).unwrap();

        assert!(issuer.resolve(&store, Some(&format!("Bearer {token}"))).await.is_err());
    }
}
