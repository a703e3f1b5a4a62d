// app/src/pipelines/profile_pipeline.rs

//! Profile update: every check stages its field, and a single store update
//! applies them once all checks have passed.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use workflow::{ContextData, Pipeline, PipelineControl, PipelineResult, SkipCondition, Workflows};

use crate::errors::{AppError, Result as AppResult};
use crate::models::{UserChanges, UserView};
use crate::pipelines::contexts::{ProfileUpdateCtxData, ProfileUpdateInput};
use crate::services::auth_service;
use crate::state::AppState;
use crate::store::email_taken;

pub const PROFILE_UPDATED: &str = "Profile updated successfully";

#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdateResponse {
  pub success: bool,
  pub message: String,
  pub user: UserView,
}

/// Skips the step unless `wanted` holds for the request input.
fn run_only_if(
  wanted: impl Fn(&ProfileUpdateInput) -> bool + Send + Sync + 'static,
) -> Option<SkipCondition<ProfileUpdateCtxData>> {
  let cond: SkipCondition<ProfileUpdateCtxData> =
    Arc::new(move |ctx_data: ContextData<ProfileUpdateCtxData>| !wanted(&ctx_data.read().input));
  Some(cond)
}

fn stage(ctx_data: &ContextData<ProfileUpdateCtxData>, apply: impl FnOnce(&mut UserChanges)) -> AppResult<()> {
  let mut guard = ctx_data.write();
  let changes = guard
    .changes
    .as_mut()
    .ok_or_else(|| AppError::Internal("Profile changes were not stamped".to_string()))?;
  apply(changes);
  Ok(())
}

/// Empty string clears the phone, like an explicit `null`.
fn normalize_phone(phone: Option<String>) -> Option<String> {
  phone.filter(|p| !p.is_empty())
}

pub fn register_profile_pipeline(workflows: &Arc<Workflows<AppError>>) {
  let mut p = Pipeline::<ProfileUpdateCtxData, AppError>::new(&[
    ("stamp_updated_at", false, None),
    ("stage_full_name", false, run_only_if(|i| i.full_name.is_some())),
    ("stage_email", false, run_only_if(|i| i.email.is_some())),
    ("stage_phone", false, run_only_if(|i| i.phone.is_some())),
    ("stage_password", false, run_only_if(ProfileUpdateInput::wants_password_change)),
    ("apply_update", false, None),
  ]);

  p.on_root("stamp_updated_at", |ctx_data: ContextData<ProfileUpdateCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      let now = guard.now;
      guard.changes = Some(UserChanges::stamped(now));
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("stage_full_name", |ctx_data: ContextData<ProfileUpdateCtxData>| {
    Box::pin(async move {
      let full_name = ctx_data.read().input.full_name.clone();
      stage(&ctx_data, |c| c.full_name = full_name)?;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("stage_email", |ctx_data: ContextData<ProfileUpdateCtxData>| {
    Box::pin(async move {
      let (email, user_id, users) = {
        let guard = ctx_data.read();
        (guard.input.email.clone(), guard.user_id, guard.app_state.users.clone())
      };
      let Some(email) = email else {
        return Ok(PipelineControl::Continue);
      };

      if users.email_taken_by_other(&email, user_id).await? {
        warn!(%user_id, "Profile email already belongs to another account.");
        return Err(email_taken());
      }
      stage(&ctx_data, |c| c.email = Some(email))?;
      Ok(PipelineControl::Continue)
    })
  });

  p.on_root("stage_phone", |ctx_data: ContextData<ProfileUpdateCtxData>| {
    Box::pin(async move {
      let phone = ctx_data.read().input.phone.clone();
      if let Some(phone) = phone {
        stage(&ctx_data, |c| c.phone = Some(normalize_phone(phone)))?;
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("stage_password", |ctx_data: ContextData<ProfileUpdateCtxData>| {
    Box::pin(async move {
      let (current_password, new_password, user_id, users) = {
        let guard = ctx_data.read();
        (
          guard.input.current_password.clone().unwrap_or_default(),
          guard.input.new_password.clone().unwrap_or_default(),
          guard.user_id,
          guard.app_state.users.clone(),
        )
      };

      let user = users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
      if !auth_service::spawn_verify_password(user.password, current_password).await? {
        warn!(%user_id, "Password change with a wrong current password.");
        return Err(AppError::Validation("Current password is incorrect".to_string()));
      }

      let new_hash = auth_service::spawn_hash_password(new_password).await?;
      stage(&ctx_data, |c| c.password_hash = Some(new_hash))?;
      debug!(%user_id, "New password staged.");
      Ok(PipelineControl::Continue)
    })
  });

  p.on_root("apply_update", |ctx_data: ContextData<ProfileUpdateCtxData>| {
    Box::pin(async move {
      let (changes, user_id, users) = {
        let guard = ctx_data.read();
        let changes = guard
          .changes
          .clone()
          .ok_or_else(|| AppError::Internal("Profile changes were not stamped".to_string()))?;
        (changes, guard.user_id, guard.app_state.users.clone())
      };

      let updated = users
        .update(user_id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
      ctx_data.write().updated_user = Some(updated);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  workflows.register_pipeline(p);
  tracing::info!("Profile update pipeline registered.");
}

/// Applies a partial profile update for the authenticated `user_id`.
#[instrument(name = "workflow::update_profile", skip(app_state, input), err(Display))]
pub async fn update_profile(
  app_state: &AppState,
  user_id: Uuid,
  input: ProfileUpdateInput,
) -> AppResult<ProfileUpdateResponse> {
  let ctx_data = ContextData::new(ProfileUpdateCtxData {
    app_state: app_state.clone(),
    user_id,
    input,
    now: Utc::now(),
    changes: None,
    updated_user: None,
  });

  match app_state.workflows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let guard = ctx_data.read();
      let user = guard
        .updated_user
        .as_ref()
        .ok_or_else(|| AppError::Internal("Profile update completed without a user".to_string()))?;
      info!("Profile updated.");
      Ok(ProfileUpdateResponse {
        success: true,
        message: PROFILE_UPDATED.to_string(),
        user: UserView::from(user),
      })
    }
    PipelineResult::Stopped => Err(AppError::Internal("Profile update was halted by an internal step".to_string())),
  }
}
