// app/src/main.rs

use std::sync::Arc;

use actix_web::{web as actix_data, App, HttpServer};
use chrono::Utc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use bookstore::config::{AppConfig, LogFormat};
use bookstore::errors::Result as AppResult;
use bookstore::models::{NewUser, Role};
use bookstore::services::auth_service;
use bookstore::state::AppState;
use bookstore::store::{MemoryStore, PgStore, UserStore};
use bookstore::web::configure_app_routes;

const SEED_ADMIN_EMAIL: &str = "admin@bookstore.local";

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Text => builder.init(),
  }
}

async fn seed_memory_store(store: &MemoryStore, config: &AppConfig) -> AppResult<()> {
  store.seed_demo(Utc::now())?;
  if let Some(password) = &config.seed_admin_password {
    let password_hash = auth_service::spawn_hash_password(password.clone()).await?;
    let admin = store
      .insert(NewUser {
        full_name: "Bookstore Admin".to_string(),
        email: SEED_ADMIN_EMAIL.to_string(),
        password_hash,
        role: Role::Admin,
      })
      .await?;
    tracing::info!(user_id = %admin.id, email = SEED_ADMIN_EMAIL, "Seeded admin account.");
  }
  Ok(())
}

async fn build_state(config: Arc<AppConfig>) -> AppResult<AppState> {
  match &config.database_url {
    Some(url) => {
      let store = PgStore::connect(url, config.database_key.as_deref()).await?;
      if config.seed_db {
        tracing::warn!("SEED_DB only applies to the in-memory store; ignoring it.");
      }
      Ok(AppState::new(Arc::new(store), &config))
    }
    None => {
      tracing::warn!("DATABASE_URL is not set; running on the in-memory store. Data will not persist.");
      let store = Arc::new(MemoryStore::new());
      if config.seed_db {
        seed_memory_store(&store, &config).await?;
      }
      Ok(AppState::new(store, &config))
    }
  }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // LOG_FORMAT is read before the full config so that config errors are logged
  // in the requested format.
  dotenvy::dotenv().ok();
  let log_format = match std::env::var("LOG_FORMAT").as_deref() {
    Ok("json") => LogFormat::Json,
    _ => LogFormat::Text,
  };
  init_tracing(log_format);

  tracing::info!("Starting bookstore server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };

  let app_state = match build_state(app_config.clone()).await {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = %e, "Failed to initialise application state.");
      return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }
  };

  let _refresh = app_state
    .dashboard
    .clone()
    .spawn_refresh(std::time::Duration::from_secs(app_config.dashboard_refresh_secs));

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
  .map_err(|e| {
    tracing::error!(error = %e, "Server stopped with an error.");
    e
  })
}

