// app/src/pipelines/login_pipeline.rs

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use workflow::{ContextData, Pipeline, PipelineControl, PipelineResult, Workflows};

use crate::errors::{AppError, Result as AppResult};
use crate::models::UserView;
use crate::pipelines::contexts::LoginCtxData;
use crate::services::auth_service;
use crate::state::AppState;

/// Same message for unknown email and wrong password.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
  pub token: String,
  pub user: UserView,
}

fn invalid_credentials() -> AppError {
  AppError::Unauthorized(INVALID_CREDENTIALS.to_string())
}

pub fn register_login_pipeline(workflows: &Arc<Workflows<AppError>>) {
  let mut p = Pipeline::<LoginCtxData, AppError>::new(&[
    ("find_user_by_email", false, None),
    ("verify_credentials", false, None),
    ("issue_token", false, None),
  ]);

  p.on_root("find_user_by_email", |ctx_data: ContextData<LoginCtxData>| {
    Box::pin(async move {
      let (email, users) = {
        let guard = ctx_data.read();
        (guard.email.clone(), guard.app_state.users.clone())
      };

      match users.find_by_email(&email).await? {
        Some(row) => {
          ctx_data.write().user = Some(row);
          Ok(PipelineControl::Continue)
        }
        None => {
          debug!("Login for an unknown email.");
          Err(invalid_credentials())
        }
      }
    })
  });

  p.on_root("verify_credentials", |ctx_data: ContextData<LoginCtxData>| {
    Box::pin(async move {
      let (stored_hash, password) = {
        let guard = ctx_data.read();
        let user = guard
          .user
          .as_ref()
          .ok_or_else(|| AppError::Internal("verify_credentials ran without a user".to_string()))?;
        (user.password.clone(), guard.password.clone())
      };

      if auth_service::spawn_verify_password(stored_hash, password).await? {
        Ok(PipelineControl::Continue)
      } else {
        warn!("Login with a wrong password.");
        Err(invalid_credentials())
      }
    })
  });

  p.on_root("issue_token", |ctx_data: ContextData<LoginCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let token = match guard.user.as_ref() {
        Some(user) => guard.app_state.tokens.issue(user, guard.now)?,
        None => return Err(AppError::Internal("issue_token ran without a user".to_string())),
      };
      guard.token = Some(token);
      Ok(PipelineControl::Continue)
    })
  });

  workflows.register_pipeline(p);
  tracing::info!("Login pipeline registered.");
}

/// Checks credentials and issues a token.
#[instrument(name = "workflow::login", skip(app_state, input), fields(email = %input.email), err(Display))]
pub async fn login(app_state: &AppState, input: LoginInput) -> AppResult<LoginResponse> {
  let ctx_data = ContextData::new(LoginCtxData {
    app_state: app_state.clone(),
    email: input.email,
    password: input.password,
    now: Utc::now(),
    user: None,
    token: None,
  });

  match app_state.workflows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let guard = ctx_data.read();
      match (&guard.token, &guard.user) {
        (Some(token), Some(user)) => {
          info!(user_id = %user.id, "Login succeeded.");
          Ok(LoginResponse {
            token: token.clone(),
            user: UserView::from(user),
          })
        }
        _ => Err(AppError::Internal("Login completed without a token".to_string())),
      }
    }
    PipelineResult::Stopped => Err(AppError::Internal("Login was halted by an internal step".to_string())),
  }
}
