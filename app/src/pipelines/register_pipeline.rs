// app/src/pipelines/register_pipeline.rs

use std::sync::Arc;

use serde::Deserialize;
use tracing::{event, info, instrument, warn, Level};
use workflow::{ContextData, Pipeline, PipelineControl, PipelineResult, Workflows};

use crate::errors::{AppError, Result as AppResult};
use crate::models::{NewUser, Role, UserView};
use crate::pipelines::contexts::RegisterCtxData;
use crate::services::auth_service;
use crate::state::AppState;
use crate::store::email_registered;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
  #[serde(default)]
  pub full_name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub password: String,
}

pub fn register_registration_pipeline(workflows: &Arc<Workflows<AppError>>) {
  let mut p = Pipeline::<RegisterCtxData, AppError>::new(&[
    ("validate_registration_input", false, None),
    ("check_email_available", false, None),
    ("create_user", false, None),
  ]);

  p.on_root("validate_registration_input", |ctx_data: ContextData<RegisterCtxData>| {
    Box::pin(async move {
      let (full_name, email, password_len) = {
        let guard = ctx_data.read();
        (guard.full_name.clone(), guard.email.clone(), guard.password.chars().count())
      };

      if full_name.trim().is_empty() {
        return Err(AppError::Validation("Full name is required".to_string()));
      }
      if email.trim().is_empty() || !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".to_string()));
      }
      if password_len < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
          "Password must be at least {} characters long",
          MIN_PASSWORD_LEN
        )));
      }
      Ok(PipelineControl::Continue)
    })
  });

  // Advisory only: the unique constraint on insert is what actually guards.
  p.on_root("check_email_available", |ctx_data: ContextData<RegisterCtxData>| {
    Box::pin(async move {
      let (email, users) = {
        let guard = ctx_data.read();
        (guard.email.clone(), guard.app_state.users.clone())
      };

      if users.find_by_email(&email).await?.is_some() {
        warn!(%email, "Registration attempted with an existing email.");
        return Err(email_registered());
      }
      Ok(PipelineControl::Continue)
    })
  });

  p.on_root("create_user", |ctx_data: ContextData<RegisterCtxData>| {
    Box::pin(async move {
      let (full_name, email, password, users) = {
        let guard = ctx_data.read();
        (
          guard.full_name.clone(),
          guard.email.clone(),
          guard.password.clone(),
          guard.app_state.users.clone(),
        )
      };

      let password_hash = auth_service::spawn_hash_password(password).await?;
      let new_user = NewUser {
        full_name,
        email,
        password_hash,
        role: Role::Customer,
      };
      event!(Level::DEBUG, email = %new_user.email, "Inserting user.");
      let row = users.insert(new_user).await?;
      info!(user_id = %row.id, "User registered.");
      ctx_data.write().created_user = Some(row);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  workflows.register_pipeline(p);
  tracing::info!("Registration pipeline registered.");
}

/// Runs the registration workflow and returns the new user's view.
#[instrument(name = "workflow::register", skip(app_state, input), fields(email = %input.email), err(Display))]
pub async fn register_user(app_state: &AppState, input: RegisterInput) -> AppResult<UserView> {
  let ctx_data = ContextData::new(RegisterCtxData {
    app_state: app_state.clone(),
    full_name: input.full_name,
    email: input.email,
    password: input.password,
    created_user: None,
  });

  match app_state.workflows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let guard = ctx_data.read();
      guard
        .created_user
        .as_ref()
        .map(UserView::from)
        .ok_or_else(|| AppError::Internal("Registration completed without creating a user".to_string()))
    }
    PipelineResult::Stopped => Err(AppError::Internal("Registration was halted by an internal step".to_string())),
  }
}
