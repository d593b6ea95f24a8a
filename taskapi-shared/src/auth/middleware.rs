/// Auth context resolver
///
/// Turns the `Authorization: Bearer <token>` header of an inbound request into
/// a verified principal:
///
/// 1. Extract the bearer token (missing or malformed header is rejected)
/// 2. Verify it with the token service
/// 3. Look the subject email up in the store
/// 4. Hand the resolved [`AuthContext`] to the downstream handler
///
/// Every failure collapses to the same 401 response. The distinct kind is
/// logged but never sent to the client, so a caller cannot tell a bad
/// signature from an expired token or a deleted account.
///
/// # Example
///
/// ```no_run
/// use taskapi_shared::auth::middleware::AuthContext;
///
/// async fn protected_handler(auth: AuthContext) -> String {
///     format!("Hello, {}!", auth.email())
/// }
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use super::jwt::{verify_token, JwtError};
use crate::{models::user::User, store::TaskStore};

/// The verified principal for one request
///
/// Inserted into request extensions by the auth layer and read back by
/// handlers through the extractor impl below. Lives exactly as long as the
/// request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The authenticated user
    pub user: User,
}

impl AuthContext {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    /// Owner id used to scope every task operation
    pub fn user_id(&self) -> i64 {
        self.user.id
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Authorization header absent or not of the form `Bearer <token>`
    #[error("Missing or malformed authorization header")]
    MissingCredential,

    /// Token failed verification
    #[error("Token rejected: {0}")]
    Token(#[from] JwtError),

    /// Token is valid but its subject matches no user
    #[error("Token subject matches no user")]
    UnknownSubject,

    /// The user lookup itself failed
    #[error("User lookup failed: {0}")]
    Lookup(String),
}

impl AuthError {
    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::Token(JwtError::MalformedToken(_)) => "malformed_token",
            AuthError::Token(JwtError::InvalidSignature) => "invalid_signature",
            AuthError::Token(JwtError::Expired) => "expired",
            AuthError::Token(JwtError::CreateError(_)) => "token_error",
            AuthError::UnknownSubject => "unknown_subject",
            AuthError::Lookup(_) => "lookup_failed",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "unauthorized",
                "message": "Unauthorized",
            })),
        )
            .into_response()
    }
}

/// Extracts the token from an `Authorization` header value
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let token = header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(AuthError::MissingCredential)?;

    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthError::MissingCredential);
    }

    Ok(token)
}

/// Resolves an `Authorization` header value to a verified principal
///
/// Side-effect free apart from the user lookup. Failures are logged here
/// with their kind.
pub async fn resolve_principal(
    store: &dyn TaskStore,
    secret: &str,
    header: Option<&str>,
) -> Result<AuthContext, AuthError> {
    let result = authenticate(store, secret, header).await;

    if let Err(ref e) = result {
        warn!(reason = e.kind(), error = %e, "Rejected request authentication");
    }

    result
}

async fn authenticate(
    store: &dyn TaskStore,
    secret: &str,
    header: Option<&str>,
) -> Result<AuthContext, AuthError> {
    let token = extract_bearer(header)?;
    let claims = verify_token(token, secret)?;

    let user = store
        .find_user_by_email(&claims.sub)
        .await
        .map_err(|e| AuthError::Lookup(e.to_string()))?
        .ok_or(AuthError::UnknownSubject)?;

    Ok(AuthContext::new(user))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::issue_token;
    use crate::models::user::CreateUser;
    use crate::store::memory::MemoryStore;
    use chrono::Duration;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    async fn store_with_user(email: &str) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_user(CreateUser {
                email: email.to_string(),
                password_hash: "hash".to_string(),
                first_name: None,
                last_name: None,
            })
            .await
            .unwrap();
        store
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");

        assert!(matches!(extract_bearer(None), Err(AuthError::MissingCredential)));
        assert!(matches!(
            extract_bearer(Some("Basic dXNlcjpwYXNz")),
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(extract_bearer(Some("Bearer ")), Err(AuthError::MissingCredential)));
        assert!(matches!(
            extract_bearer(Some("Bearer two tokens")),
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(extract_bearer(Some("abc.def.ghi")), Err(AuthError::MissingCredential)));
    }

    #[tokio::test]
    async fn test_resolves_valid_token() {
        let store = store_with_user("ada@example.com").await;
        let token = issue_token("ada@example.com", Duration::hours(1), SECRET).unwrap();
        let header = format!("Bearer {}", token);

        let auth = resolve_principal(&store, SECRET, Some(&header)).await.unwrap();

        assert_eq!(auth.email(), "ada@example.com");
        assert_eq!(auth.user_id(), 1);
    }

    #[tokio::test]
    async fn test_rejects_each_failure_kind() {
        let store = store_with_user("ada@example.com").await;

        let missing = resolve_principal(&store, SECRET, None).await.unwrap_err();
        assert_eq!(missing.kind(), "missing_credential");

        let garbage = resolve_principal(&store, SECRET, Some("Bearer garbage")).await.unwrap_err();
        assert_eq!(garbage.kind(), "malformed_token");

        let forged = issue_token("ada@example.com", Duration::hours(1), "another-secret-32-bytes-long-xxxx")
            .unwrap();
        let forged = resolve_principal(&store, SECRET, Some(&format!("Bearer {}", forged)))
            .await
            .unwrap_err();
        assert_eq!(forged.kind(), "invalid_signature");

        let expired = issue_token("ada@example.com", Duration::seconds(-10), SECRET).unwrap();
        let expired = resolve_principal(&store, SECRET, Some(&format!("Bearer {}", expired)))
            .await
            .unwrap_err();
        assert_eq!(expired.kind(), "expired");

        let stranger = issue_token("ghost@example.com", Duration::hours(1), SECRET).unwrap();
        let stranger = resolve_principal(&store, SECRET, Some(&format!("Bearer {}", stranger)))
            .await
            .unwrap_err();
        assert_eq!(stranger.kind(), "unknown_subject");
    }

    #[tokio::test]
    async fn test_all_failures_share_one_response() {
        let errors = vec![
            AuthError::MissingCredential,
            AuthError::Token(JwtError::Expired),
            AuthError::Token(JwtError::InvalidSignature),
            AuthError::Token(JwtError::MalformedToken("bad".to_string())),
            AuthError::UnknownSubject,
            AuthError::Lookup("connection reset".to_string()),
        ];

        let mut bodies = Vec::new();
        for err in errors {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            bodies.push(body);
        }

        assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
    }
}
