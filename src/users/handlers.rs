use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{extractors::CurrentUser, services::IdentityService},
    error::{AppError, AppResult, Envelope},
    extract::AppPath,
    state::AppState,
    users::{repo_types::User, services::may_delete_user},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/activate/:token", put(activate_user))
        .route("/users/:id", get(get_user).delete(delete_user))
}

#[instrument(skip(state, token))]
pub async fn activate_user(
    State(state): State<AppState>,
    AppPath(token): AppPath<String>,
) -> AppResult<StatusCode> {
    IdentityService::from_ref(&state).activate(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _actor))]
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(_actor): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<Envelope<User>>> {
    let user = IdentityService::from_ref(&state).get_user(id).await?;
    Ok(Envelope::new(user))
}

#[instrument(skip(state, actor), fields(actor_id = %actor.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    if !may_delete_user(state.store.roles.as_ref(), &actor, id).await? {
        warn!(target_id = %id, "user delete forbidden");
        return Err(AppError::Forbidden);
    }
    IdentityService::from_ref(&state).delete_user(id).await?;
    info!(target_id = %id, "user removed");
    Ok(StatusCode::NO_CONTENT)
}
