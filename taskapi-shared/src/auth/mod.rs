/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Token service (HS256 issue and verify)
/// - [`middleware`]: Auth context resolver and the `AuthContext` extractor
///
/// # Example
///
/// ```no_run
/// use chrono::Duration;
/// use taskapi_shared::auth::password::{hash_password, verify_password};
/// use taskapi_shared::auth::jwt::{issue_token, verify_token};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let token = issue_token("user@example.com", Duration::hours(24), "secret-key")?;
/// let claims = verify_token(&token, "secret-key")?;
/// assert_eq!(claims.sub, "user@example.com");
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
