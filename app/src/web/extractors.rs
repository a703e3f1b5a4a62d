// app/src/web/extractors.rs

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::Utc;
use futures_util::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{Role, UserRow};
use crate::state::AppState;

/// Caller identified by a valid `Authorization: Bearer <token>` header.
/// Only the signature and expiry are checked here; anything that depends on
/// the user's current record re-reads it through [`AuthenticatedUser::load`].
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
  pub token: String,
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
  req
    .headers()
    .get(actix_web::http::header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
      return ready(Err(AppError::Internal("Application state is not configured".to_string())));
    };
    let Some(token) = bearer_token(req) else {
      warn!("Request without a bearer token.");
      return ready(Err(AppError::Unauthorized("Missing bearer token".to_string())));
    };
    ready(state.tokens.verify(token, Utc::now()).map(|claims| AuthenticatedUser {
      user_id: claims.sub,
      token: token.to_string(),
    }))
  }
}

impl AuthenticatedUser {
  /// Current record for the token's subject.
  pub async fn load(&self, state: &AppState) -> Result<UserRow> {
    state
      .users
      .find_by_id(self.user_id)
      .await?
      .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))
  }

  /// Current record, provided its role passes `allowed`.
  pub async fn require(&self, state: &AppState, allowed: fn(Role) -> bool) -> Result<UserRow> {
    let user = self.load(state).await?;
    if allowed(user.role()) {
      Ok(user)
    } else {
      warn!(user_id = %self.user_id, role = user.role().as_str(), "Role not allowed for this operation.");
      Err(AppError::Forbidden("Insufficient permissions".to_string()))
    }
  }
}

pub fn is_staff(role: Role) -> bool {
  role.is_staff()
}

pub fn is_admin(role: Role) -> bool {
  role == Role::Admin
}
