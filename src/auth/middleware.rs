use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::jwt::JwtKeys;
use crate::{error::ApiError, state::AppState};

/// Authenticated user id, inserted into request extensions by [`require_auth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub i32);

/// Verifies the bearer token before any protected handler runs.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let user = authenticate(&JwtKeys::from_ref(&state), header)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

pub(crate) fn authenticate(keys: &JwtKeys, header: Option<&str>) -> Result<AuthUser, ApiError> {
    let header = header.ok_or_else(|| {
        warn!("missing Authorization header");
        ApiError::unauthorized("No token provided, authorization denied")
    })?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            warn!("malformed Authorization header");
            ApiError::unauthorized("Invalid Authorization header")
        })?;

    let claims = keys.verify(token).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        ApiError::unauthorized("Token is not valid")
    })?;

    Ok(AuthUser(claims.sub))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized("No token provided, authorization denied"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;

    fn keys() -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: "secret".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: 5,
        })
    }

    #[test]
    fn accepts_valid_bearer_token() {
        let keys = keys();
        let token = keys.sign(11).unwrap();
        let header = format!("Bearer {}", token);
        assert_eq!(authenticate(&keys, Some(&header)).unwrap(), AuthUser(11));
    }

    #[test]
    fn rejects_missing_or_malformed_header() {
        let keys = keys();
        let token = keys.sign(11).unwrap();
        for header in [None, Some("Bearer "), Some(token.as_str()), Some("Basic abc")] {
            let err = authenticate(&keys, header).unwrap_err();
            assert!(matches!(err, ApiError::Unauthorized(_)), "{:?}", header);
        }
    }

    #[test]
    fn rejects_invalid_token() {
        let err = authenticate(&keys(), Some("Bearer not-a-token")).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
