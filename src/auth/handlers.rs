use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{RegisterRequest, TokenRequest, TokenResponse, UserWithToken},
        services::IdentityService,
    },
    error::{AppResult, Envelope},
    extract::AppJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/authentication/user", post(register))
        .route("/authentication/token", post(create_token))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<Envelope<UserWithToken>>)> {
    let payload = payload.validate(&state.validator)?;
    let (user, token) = IdentityService::from_ref(&state).register(payload).await?;
    info!(user_id = %user.id, "registration complete");
    Ok((StatusCode::CREATED, Envelope::new(UserWithToken { user, token })))
}

#[instrument(skip(state, payload))]
pub async fn create_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TokenRequest>,
) -> AppResult<(StatusCode, Json<Envelope<TokenResponse>>)> {
    let payload = payload.validate(&state.validator)?;
    let token = IdentityService::from_ref(&state).authenticate(payload).await?;
    Ok((StatusCode::CREATED, Envelope::new(TokenResponse { token })))
}
