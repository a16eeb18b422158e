/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register a new user and get a token
/// - `POST /v1/auth/login` - Login with username or email and get a token
/// - `GET /v1/auth/user` - Profile of the token holder

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use warbler_shared::{
    auth::middleware::AuthContext,
    credentials::{Authentication, Registration},
    models::user::{User, UserSummary},
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Register request
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    /// Handle used in mentions
    #[validate(length(min = 1, max = 255, message = "Username must be 1 to 255 characters"))]
    pub username: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Login request
///
/// At least one of `username` and `email` must be present; `username` wins
/// when both are.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_login_identifier"))]
pub struct LoginRequest {
    pub username: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub password: String,
}

fn validate_login_identifier(req: &LoginRequest) -> Result<(), ValidationError> {
    if req.username.is_none() && req.email.is_none() {
        let mut err = ValidationError::new("identifier_required");
        err.message = Some("Either username or email is required".into());
        return Err(err);
    }
    Ok(())
}

/// Token plus the account it was issued for
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "email": "alice@example.org",
///   "password": "alice@password"
/// }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// {
///   "token": "eyJ...",
///   "user": { "id": 1, "username": "alice", "email": "alice@example.org", ... }
/// }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Username or email already taken
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    let outcome = state
        .credentials
        .register_if_available(&req.username, &req.email, &req.password)
        .await?;

    let user = match outcome {
        Registration::Created(user) => user,
        Registration::Conflict => {
            return Err(ApiError::Conflict("Username or email already taken".to_string()))
        }
    };

    let token = state.credentials.issue_token(&user)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// { "username": "alice", "password": "alice@password" }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown account or wrong password
/// - `422 Unprocessable Entity`: Neither username nor email given
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let outcome = state
        .credentials
        .authenticate(req.username.as_deref(), req.email.as_deref(), &req.password)
        .await?;

    let user = match outcome {
        Authentication::Authenticated(user) => user,
        Authentication::InvalidCredentials => {
            return Err(ApiError::Unauthorized("Invalid credentials".to_string()))
        }
    };

    let token = state.credentials.issue_token(&user)?;
    Ok(Json(AuthResponse { token, user }))
}

/// Returns the profile carried by the caller's token
pub async fn current_user(Extension(auth): Extension<AuthContext>) -> Json<UserSummary> {
    Json(UserSummary {
        id: auth.user_id,
        username: auth.username,
        email: auth.email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.org".to_string(),
            password: "alice@password".to_string(),
        };
        assert!(valid.validate().is_ok());

        let short_password = RegisterRequest {
            password: "short".to_string(),
            ..valid
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_register_request_rejects_unknown_fields() {
        let body = r#"{"username":"a","email":"a@example.org","password":"12345678","admin":true}"#;
        assert!(serde_json::from_str::<RegisterRequest>(body).is_err());
    }

    #[test]
    fn test_login_request_needs_an_identifier() {
        let req: LoginRequest = serde_json::from_str(r#"{"password":"secret"}"#).unwrap();
        assert!(req.validate().is_err());

        let req: LoginRequest =
            serde_json::from_str(r#"{"email":"bob@example.org","password":"secret"}"#).unwrap();
        assert!(req.validate().is_ok());
    }
}
