use axum::{middleware, Router};

use crate::{auth::require_auth, state::AppState};

pub mod dto;
pub mod handlers;
pub mod repo;

pub fn router(state: AppState) -> Router<AppState> {
    handlers::course_routes().route_layer(middleware::from_fn_with_state(state, require_auth))
}
