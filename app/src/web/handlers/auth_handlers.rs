// app/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::pipelines::contexts::ProfileUpdateInput;
use crate::pipelines::login_pipeline::{self, LoginInput};
use crate::pipelines::profile_pipeline;
use crate::pipelines::register_pipeline::{self, RegisterInput};
use crate::services::auth_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::register", skip(app_state, payload), fields(req_email = %payload.email))]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<RegisterInput>,
) -> Result<HttpResponse, AppError> {
  let user = register_pipeline::register_user(app_state.get_ref(), payload.into_inner()).await?;
  info!(user_id = %user.id, "Registration succeeded.");
  Ok(HttpResponse::Created().json(user))
}

#[instrument(name = "handler::login", skip(app_state, payload), fields(req_email = %payload.email))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<LoginInput>,
) -> Result<HttpResponse, AppError> {
  let response = login_pipeline::login(app_state.get_ref(), payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(response))
}

#[instrument(name = "handler::me", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn me_handler(app_state: web::Data<AppState>, auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
  let user = auth_service::current_user(
    &app_state.tokens,
    app_state.users.as_ref(),
    &auth_user.token,
    Utc::now(),
  )
  .await?;
  Ok(HttpResponse::Ok().json(user))
}

#[instrument(name = "handler::update_profile", skip_all, fields(user_id = %auth_user.user_id))]
pub async fn update_profile_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  payload: web::Json<ProfileUpdateInput>,
) -> Result<HttpResponse, AppError> {
  let response =
    profile_pipeline::update_profile(app_state.get_ref(), auth_user.user_id, payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(response))
}
