/// Token service: issues and verifies signed, time-bound identity tokens
///
/// Tokens are compact JWTs signed with HS256 (HMAC-SHA256) over a shared secret.
/// The claims bind the subject (the user's email) to an expiry instant.
///
/// # Security
///
/// - **Algorithm**: HS256 only. A token whose header asserts any other algorithm
///   (another HMAC width, RSA, EC, `none`) is rejected before its claims are read.
/// - **Expiry**: a token is valid only while `now < exp`. No leeway is applied.
/// - **Stateless**: nothing is persisted; verification is a pure function of
///   (secret, token, current time).
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use taskapi_shared::auth::jwt::{issue_token, verify_token};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "your-secret-key-at-least-32-bytes-long";
/// let token = issue_token("user@example.com", Duration::hours(1), secret)?;
///
/// let claims = verify_token(&token, secret)?;
/// assert_eq!(claims.sub, "user@example.com");
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey,
    Header, Validation,
};
use serde::{Deserialize, Serialize};

/// The only signing algorithm issued and accepted
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Error type for token operations
///
/// Verification failures keep distinct kinds so callers can log them apart,
/// even though all of them end up as the same unauthorized response.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to sign a token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token could not be parsed or decoded
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// Signature does not match the secret, or the algorithm is not HS256
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Expiry is at or before the current time
    #[error("Token has expired")]
    Expired,
}

/// JWT claims structure
///
/// - `sub`: Subject (user email, the account's natural key)
/// - `iat`: Issued at (Unix timestamp)
/// - `exp`: Expiration time (Unix timestamp)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user email
    pub sub: String,

    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims for `subject` expiring `ttl` from now
    pub fn new(subject: impl Into<String>, ttl: Duration) -> Self {
        Self::issued_at(subject, ttl, Utc::now())
    }

    /// Creates claims as if issued at `now`
    pub fn issued_at(subject: impl Into<String>, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            sub: subject.into(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// Expiry as a UTC instant
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// True when `now` is at or past the expiry
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Signs claims into a token string
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(TOKEN_ALGORITHM);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Issues a token for `subject` valid for `ttl`
pub fn issue_token(subject: &str, ttl: Duration, secret: &str) -> Result<String, JwtError> {
    create_token(&Claims::new(subject, ttl), secret)
}

/// Verifies a token against the current clock
///
/// # Errors
///
/// - `JwtError::MalformedToken` if the token cannot be parsed
/// - `JwtError::InvalidSignature` if the signature or algorithm is wrong
/// - `JwtError::Expired` if the expiry has passed
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    verify_token_at(token, secret, Utc::now())
}

/// Verifies a token as of `now`
pub fn verify_token_at(token: &str, secret: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
    let header = decode_header(token).map_err(classify_header)?;
    if header.alg != TOKEN_ALGORITHM {
        return Err(JwtError::InvalidSignature);
    }

    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(TOKEN_ALGORITHM);
    // Expiry is checked against `now` below rather than the system clock.
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data = decode::<Claims>(token, &key, &validation).map_err(classify)?;

    if token_data.claims.is_expired_at(now) {
        return Err(JwtError::Expired);
    }

    Ok(token_data.claims)
}

/// A header that is well-formed JSON but fails to deserialize names an
/// algorithm outside the supported set, `none` included.
fn classify_header(err: jsonwebtoken::errors::Error) -> JwtError {
    match err.kind() {
        ErrorKind::Json(e) if e.classify() == serde_json::error::Category::Data => {
            JwtError::InvalidSignature
        }
        _ => JwtError::MalformedToken(err.to_string()),
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> JwtError {
    match err.kind() {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat => JwtError::InvalidSignature,
        ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::MalformedToken(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_creation() {
        let now = Utc::now();
        let claims = Claims::issued_at("a@example.com", Duration::hours(1), now);

        assert_eq!(claims.sub, "a@example.com");
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp, now.timestamp() + 3600);
        assert_eq!(claims.expires_at().timestamp(), claims.exp);
        assert!(!claims.is_expired_at(now));
    }

    #[test]
    fn test_issue_and_verify_token() {
        let token = issue_token("a@example.com", Duration::hours(1), SECRET).unwrap();

        let claims = verify_token(&token, SECRET).expect("Should verify token");
        assert_eq!(claims.sub, "a@example.com");
    }

    #[test]
    fn test_issue_is_deterministic() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let claims = Claims::issued_at("a@example.com", Duration::minutes(5), now);

        let first = create_token(&claims, SECRET).unwrap();
        let second = create_token(&claims, SECRET).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_verify_after_ttl_is_expired() {
        let now = Utc::now();
        let claims = Claims::issued_at("a@example.com", Duration::hours(1), now);
        let token = create_token(&claims, SECRET).unwrap();

        assert!(verify_token_at(&token, SECRET, now + Duration::minutes(59)).is_ok());

        let result = verify_token_at(&token, SECRET, now + Duration::hours(2));
        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let claims = Claims::issued_at("a@example.com", Duration::seconds(30), now);
        let token = create_token(&claims, SECRET).unwrap();

        let result = verify_token_at(&token, SECRET, now + Duration::seconds(30));
        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_already_expired_token() {
        let token = issue_token("a@example.com", Duration::seconds(-3600), SECRET).unwrap();

        let result = verify_token(&token, SECRET);
        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let token = issue_token("a@example.com", Duration::hours(1), SECRET).unwrap();

        let result = verify_token(&token, "another-secret-key-at-least-32-bytes");
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_rejects_other_hmac_algorithm() {
        // Same secret, different algorithm: still rejected.
        let claims = Claims::new("a@example.com", Duration::hours(1));
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let result = verify_token(&token, SECRET);
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_rejects_asymmetric_algorithm_header() {
        // {"alg":"ES256","typ":"JWT"} . {"sub":"a@example.com","exp":9999999999} . junk
        let token = "eyJhbGciOiJFUzI1NiIsInR5cCI6IkpXVCJ9.\
                     eyJzdWIiOiJhQGV4YW1wbGUuY29tIiwiZXhwIjo5OTk5OTk5OTk5fQ.\
                     c2lnbmF0dXJl";

        let result = verify_token(token, SECRET);
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_rejects_unsigned_token() {
        // {"alg":"none","typ":"JWT"} . {"sub":"a@example.com","exp":9999999999} .
        let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.\
                     eyJzdWIiOiJhQGV4YW1wbGUuY29tIiwiZXhwIjo5OTk5OTk5OTk5fQ.";

        let result = verify_token(token, SECRET);
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_garbage_header_is_malformed() {
        // "notjson" . {"sub":"a@example.com","exp":9999999999} . junk
        let token = "bm90anNvbg.\
                     eyJzdWIiOiJhQGV4YW1wbGUuY29tIiwiZXhwIjo5OTk5OTk5OTk5fQ.\
                     c2lnbmF0dXJl";

        let result = verify_token(token, SECRET);
        assert!(matches!(result, Err(JwtError::MalformedToken(_))));
    }

    #[test]
    fn test_malformed_token() {
        let result = verify_token("not-a-token", SECRET);
        assert!(matches!(result, Err(JwtError::MalformedToken(_))));

        let result = verify_token("", SECRET);
        assert!(matches!(result, Err(JwtError::MalformedToken(_))));
    }

    #[test]
    fn test_tampered_payload_fails_signature() {
        let token = issue_token("a@example.com", Duration::hours(1), SECRET).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        // payload of {"sub":"b@example.com","exp":9999999999}
        let forged = format!(
            "{}.{}.{}",
            parts[0], "eyJzdWIiOiJiQGV4YW1wbGUuY29tIiwiZXhwIjo5OTk5OTk5OTk5fQ", parts[2]
        );

        let result = verify_token(&forged, SECRET);
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }
}
