// app/src/pipelines/contexts.rs

//! Context data for the auth workflows. Handlers receive these wrapped in
//! `workflow::ContextData`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::models::{UserChanges, UserRow};
use crate::state::AppState;

#[derive(Clone)]
pub struct RegisterCtxData {
  pub app_state: AppState,
  pub full_name: String,
  pub email: String,
  pub password: String,
  pub created_user: Option<UserRow>,
}

#[derive(Clone)]
pub struct LoginCtxData {
  pub app_state: AppState,
  pub email: String,
  pub password: String,
  pub now: DateTime<Utc>,
  pub user: Option<UserRow>,
  pub token: Option<String>,
}

/// Partial profile update. `phone: Some(None)` is an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateInput {
  pub full_name: Option<String>,
  pub email: Option<String>,
  #[serde(default, deserialize_with = "present")]
  pub phone: Option<Option<String>>,
  pub current_password: Option<String>,
  pub new_password: Option<String>,
}

impl ProfileUpdateInput {
  /// A password change needs both passwords, and both non-empty.
  pub fn wants_password_change(&self) -> bool {
    let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
    filled(&self.current_password) && filled(&self.new_password)
  }
}

/// Distinguishes a field sent as `null` from a missing one.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  T::deserialize(deserializer).map(Some)
}

#[derive(Clone)]
pub struct ProfileUpdateCtxData {
  pub app_state: AppState,
  /// Taken from the verified token, never from the request body.
  pub user_id: Uuid,
  pub input: ProfileUpdateInput,
  pub now: DateTime<Utc>,
  pub changes: Option<UserChanges>,
  pub updated_user: Option<UserRow>,
}
