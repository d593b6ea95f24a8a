/// Account endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/user/register/` - Register new user
/// - `POST /api/v1/user/login/` - Login and get a bearer token
/// - `GET /api/v1/user/profile/` - The authenticated user's profile

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, UNAUTHORIZED_MESSAGE},
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskapi_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::user::{CreateUser, User},
};
use tracing::{debug, info};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(max = 100, message = "First name must be at most 100 characters"))]
    pub first_name: Option<String>,

    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token
    pub token: String,

    /// Always "Bearer"
    pub token_type: String,

    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
}

/// Public view of a user
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            display_name: user.display_name(),
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_verified: user.verified,
            created_at: user.created_at,
        }
    }
}

/// Register a new user
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `409 Conflict`: Email already exists
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ProfileResponse>)> {
    req.validate()?;

    let password_hash = password::hash_password(&req.password)?;

    let user = state
        .store
        .create_user(CreateUser {
            email: req.email,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
        })
        .await?;

    info!(user_id = user.id, "Registered new user");

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Login endpoint
///
/// Unknown email and wrong password produce the same response.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `401 Unauthorized`: Invalid credentials
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let user = state
        .store
        .find_user_by_email(&req.email)
        .await?
        .ok_or_else(|| {
            debug!("Login for unknown email");
            ApiError::Unauthorized(UNAUTHORIZED_MESSAGE.to_string())
        })?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        debug!(user_id = user.id, "Login with wrong password");
        return Err(ApiError::Unauthorized(UNAUTHORIZED_MESSAGE.to_string()));
    }

    let claims = jwt::Claims::new(user.email.as_str(), state.config.jwt.ttl());
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_at: claims.expires_at(),
    }))
}

/// Profile of the authenticated user
pub async fn profile(auth: AuthContext) -> Json<ProfileResponse> {
    Json(auth.user.into())
}
