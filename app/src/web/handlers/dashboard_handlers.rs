// app/src/web/handlers/dashboard_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::instrument;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::{is_admin, AuthenticatedUser};

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
  #[serde(default)]
  pub refresh: bool,
}

#[instrument(name = "handler::dashboard", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn dashboard_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  query: web::Query<DashboardQuery>,
) -> Result<HttpResponse, AppError> {
  auth_user.require(&app_state, is_admin).await?;
  let stats = app_state.dashboard.load(query.refresh).await;
  Ok(HttpResponse::Ok().json(stats))
}
