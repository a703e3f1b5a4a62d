// app/src/pipelines/mod.rs

//! The auth workflows: registration, login and profile update, each a
//! pipeline keyed by its context type.

use std::sync::Arc;

use workflow::Workflows;

use crate::errors::AppError;

pub mod contexts;
pub mod login_pipeline;
pub mod profile_pipeline;
pub mod register_pipeline;

/// Registers every workflow. Called once at startup, before serving.
pub fn register_all_pipelines(workflows: &Arc<Workflows<AppError>>) {
  tracing::info!("Registering workflows...");
  register_pipeline::register_registration_pipeline(workflows);
  login_pipeline::register_login_pipeline(workflows);
  profile_pipeline::register_profile_pipeline(workflows);
  tracing::info!("All workflows registered.");
}
