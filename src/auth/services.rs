//! Identity and invitation lifecycle: registration with its compensating
//! delete, activation, lookup, deletion and token issuance.

use std::sync::Arc;

use axum::extract::FromRef;
use time::OffsetDateTime;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{RegisterRequest, TokenRequest},
        invitation,
        jwt::JwtKeys,
        password::{hash_password_blocking, verify_password_blocking},
    },
    config::AppConfig,
    error::{AppError, AppResult},
    mailer::{Mailer, Recipient, Template, TemplateData},
    state::AppState,
    store::{Storage, StoreError},
    users::{
        repo_types::{NewUser, User},
        roles::DEFAULT_ROLE,
    },
};

#[derive(Clone)]
pub struct IdentityService {
    store: Storage,
    mailer: Arc<dyn Mailer>,
    config: Arc<AppConfig>,
    jwt: JwtKeys,
}

impl FromRef<AppState> for IdentityService {
    fn from_ref(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            mailer: state.mailer.clone(),
            config: state.config.clone(),
            jwt: JwtKeys::from_ref(state),
        }
    }
}

impl IdentityService {
    /// Create an inactive user plus invitation, then mail the activation link.
    ///
    /// If the mail cannot be delivered the user is deleted again and the
    /// delivery error is returned. Returns the plaintext invitation token.
    pub async fn register(&self, req: RegisterRequest) -> AppResult<(User, String)> {
        let password_hash = hash_password_blocking(req.password)
            .await
            .map_err(AppError::Internal)?;
        let (plain_token, token_hash) = invitation::generate();
        let expires_at = OffsetDateTime::now_utc()
            .checked_add(self.config.invitation_ttl())
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("invitation expiry out of range"))
            })?;

        let created = self
            .store
            .users
            .create_and_invite(
                NewUser {
                    username: req.username,
                    email: req.email,
                    password_hash,
                    role_name: DEFAULT_ROLE.to_string(),
                },
                &token_hash,
                expires_at,
            )
            .await;
        let user = match created {
            Ok(user) => user,
            Err(StoreError::Timeout) => {
                // the commit may still have landed after the deadline fired
                warn!("registration timed out, discarding any committed user");
                match self.store.users.discard_invited(&token_hash).await {
                    Ok(()) => info!("timed out registration discarded"),
                    Err(StoreError::NotFound) => {}
                    Err(e) => error!(error = %e, "could not discard timed out registration"),
                }
                return Err(AppError::Persistence(StoreError::Timeout));
            }
            Err(e) => return Err(e.into()),
        };
        info!(user_id = %user.id, "user registered, invitation stored");

        // the registration transaction is committed before any mail goes out
        let data = TemplateData {
            username: user.username.clone(),
            activation_url: format!("{}/confirm/{}", self.config.frontend_url, plain_token),
        };
        let to = Recipient {
            name: user.username.clone(),
            email: user.email.clone(),
        };
        let sandbox = !self.config.is_production();

        if let Err(mail_err) = self
            .mailer
            .send(Template::UserInvitation, &to, &data, sandbox)
            .await
        {
            warn!(user_id = %user.id, error = %mail_err, "invitation not delivered, removing user");
            if let Err(e) = self.store.users.delete(user.id).await {
                error!(user_id = %user.id, error = %e, "compensating delete failed");
            }
            return Err(AppError::Delivery(mail_err));
        }

        Ok((user, plain_token))
    }

    /// Unknown, expired and already used tokens are all `NotFound`.
    pub async fn activate(&self, plain_token: &str) -> AppResult<()> {
        let token_hash = invitation::hash_token(plain_token);
        self.store.users.activate(&token_hash).await?;
        info!("user activated");
        Ok(())
    }

    pub async fn delete_user(&self, user_id: Uuid) -> AppResult<()> {
        self.store.users.delete(user_id).await?;
        info!(user_id = %user_id, "user deleted");
        Ok(())
    }

    pub async fn get_user(&self, user_id: Uuid) -> AppResult<User> {
        Ok(self.store.users.get_by_id(user_id).await?)
    }

    /// Issue a bearer token for an active user with a matching password.
    pub async fn authenticate(&self, req: TokenRequest) -> AppResult<String> {
        let user = match self.store.users.get_by_email(&req.email).await {
            Ok(u) => u,
            Err(StoreError::NotFound) => {
                warn!("token requested for unknown or inactive email");
                return Err(AppError::Unauthorized);
            }
            Err(e) => return Err(e.into()),
        };

        if !verify_password_blocking(req.password, user.password_hash.clone()).await {
            warn!(user_id = %user.id, "token requested with invalid password");
            return Err(AppError::Unauthorized);
        }

        let token = self.jwt.issue(user.id).map_err(AppError::Internal)?;
        info!(user_id = %user.id, "token issued");
        Ok(token)
    }
}
