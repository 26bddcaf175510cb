use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        jwt::JwtKeys,
        middleware::{require_auth, AuthUser},
        password::{hash_password, verify_password},
        repo::User,
    },
    error::ApiError,
    extract::ApiJson,
    response::ApiResponse,
    serde_util::{non_blank, within_limit},
    state::AppState,
};

const NAME_MAX: usize = 100;
const EMAIL_MAX: usize = 255;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(get_me))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, ApiResponse<AuthResponse>), ApiError> {
    let (Some(name), Some(email), Some(password)) = (
        non_blank(payload.name.as_deref()),
        non_blank(payload.email.as_deref()),
        payload.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        warn!("register with missing fields");
        return Err(ApiError::validation("Please provide name, email, and password"));
    };

    if !is_valid_email(email) {
        warn!(email, "invalid email");
        return Err(ApiError::validation("Please provide a valid email address"));
    }
    within_limit("name", name, NAME_MAX)?;
    within_limit("email", email, EMAIL_MAX)?;

    let hash = hash_password(password)?;
    let user = User::create(&state.db, name, email, &hash).await?;

    let token = JwtKeys::from_ref(&state).sign(user.user_id)?;

    info!(user_id = user.user_id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(
            "User registered successfully",
            AuthResponse {
                token,
                user: user.into(),
            },
        ),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<ApiResponse<AuthResponse>, ApiError> {
    let (Some(email), Some(password)) = (
        non_blank(payload.email.as_deref()),
        payload.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::validation("Please provide email and password"));
    };

    let found = User::find_by_email(&state.db, email).await?;
    let verified = verify_password(password, found.as_ref().map(|u| u.password_hash.as_str()))?;
    let Some(user) = found.filter(|_| verified) else {
        warn!(email, "login rejected");
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    let token = JwtKeys::from_ref(&state).sign(user.user_id)?;

    info!(user_id = user.user_id, "user logged in");
    Ok(ApiResponse::with_message(
        "Login successful",
        AuthResponse {
            token,
            user: user.into(),
        },
    ))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<ApiResponse<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::ok(user.into()))
}
