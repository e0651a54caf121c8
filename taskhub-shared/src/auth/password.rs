/// Password hashing and password policy
///
/// Hashes are Argon2id PHC strings (64 MiB memory, 3 passes, 4 lanes, 32-byte
/// output, 16-byte random salt). The policy check is a pure function that
/// reports every violated rule so signup can surface them all at once.
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::password::{check_password_policy, hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let password = "Secur3P@ss";
/// assert!(check_password_policy(password).is_empty());
///
/// let hash = hash_password(password)?;
/// assert!(verify_password(password, &hash)?);
/// assert!(!verify_password("Secur3P@sz", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, ParamsBuilder, Version,
};

/// Memory cost in KiB
const MEMORY_COST_KIB: u32 = 64 * 1024;
const TIME_COST: u32 = 3;
const LANES: u32 = 4;
const HASH_LENGTH: usize = 32;

/// Characters that satisfy the special-character rule
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*()-_=+[]{};:'\",.<>/?\\|`~";

/// Minimum password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Stored value is not a PHC string
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// A single password policy rule that a candidate password violates
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PasswordRule {
    #[error("Password must be at least 8 characters long")]
    TooShort,

    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,

    #[error("Password must contain at least one lowercase letter")]
    MissingLowercase,

    #[error("Password must contain at least one digit")]
    MissingDigit,

    #[error("Password must contain at least one special character")]
    MissingSpecial,
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = ParamsBuilder::new()
        .m_cost(MEMORY_COST_KIB)
        .t_cost(TIME_COST)
        .p_cost(LANES)
        .output_len(HASH_LENGTH)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes `password` with a fresh random salt
///
/// The result embeds algorithm, parameters and salt, e.g.
/// `$argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>`.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Checks `password` against a stored PHC hash
///
/// Returns `Ok(false)` on mismatch. Parameters are read from the hash itself,
/// so hashes made with older settings still verify.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

/// Returns every policy rule `password` violates, in a fixed order
///
/// An empty result means the password is acceptable. Length is measured in
/// characters, not bytes.
///
/// ```
/// use taskhub_shared::auth::password::{check_password_policy, PasswordRule};
///
/// assert!(check_password_policy("MyP@ssw0rd!").is_empty());
/// assert_eq!(check_password_policy("short1!"), vec![
///     PasswordRule::TooShort,
///     PasswordRule::MissingUppercase,
/// ]);
/// ```
pub fn check_password_policy(password: &str) -> Vec<PasswordRule> {
    let checks = [
        (password.chars().count() >= MIN_PASSWORD_LENGTH, PasswordRule::TooShort),
        (password.chars().any(char::is_uppercase), PasswordRule::MissingUppercase),
        (password.chars().any(char::is_lowercase), PasswordRule::MissingLowercase),
        (password.chars().any(|c| c.is_ascii_digit()), PasswordRule::MissingDigit),
        (
            password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)),
            PasswordRule::MissingSpecial,
        ),
    ];

    checks
        .into_iter()
        .filter(|(passed, _)| !passed)
        .map(|(_, rule)| rule)
        .collect()
}
