use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod query;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::feed_routes())
}
