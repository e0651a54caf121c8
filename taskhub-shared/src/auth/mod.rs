/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and the password policy
/// - [`jwt`]: HS256 token creation and validation
/// - [`credentials`]: signup, email normalization, password verification
/// - [`session`]: login and bearer-token resolution
/// - [`access`]: pure allow/deny decisions for tasks and todos
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::auth::credentials::{register, SignupRequest};
/// use taskhub_shared::auth::session::SessionIssuer;
/// use taskhub_shared::store::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let issuer = SessionIssuer::new("a-long-random-signing-secret")?;
///
/// register(&store, SignupRequest {
///     username: "ada".to_string(),
///     email: "ada@example.com".to_string(),
///     password: "Passw0rd!".to_string(),
///     password_confirmation: "Passw0rd!".to_string(),
/// }).await?;
///
/// let session = issuer.authenticate(&store, "ada@example.com", "Passw0rd!").await?;
/// let caller = issuer.resolve(&store, Some(&format!("Bearer {}", session.token))).await?;
/// assert_eq!(caller.user_id, session.user.id);
/// # Ok(())
/// # }
/// ```

pub mod access;
pub mod credentials;
pub mod jwt;
pub mod password;
pub mod session;
