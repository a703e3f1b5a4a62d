// app/src/state.rs

use std::sync::Arc;

use workflow::Workflows;

use crate::config::AppConfig;
use crate::dashboard::{DashboardService, StoreStatsSource};
use crate::errors::AppError;
use crate::pipelines;
use crate::services::token::TokenSigner;
use crate::store::{BookStore, OrderStore, UserStore};

#[derive(Clone)]
pub struct AppState {
  pub users: Arc<dyn UserStore>,
  pub books: Arc<dyn BookStore>,
  pub orders: Arc<dyn OrderStore>,
  pub workflows: Arc<Workflows<AppError>>,
  pub tokens: Arc<TokenSigner>,
  pub dashboard: Arc<DashboardService>,
}

impl AppState {
  /// Wires the services over one backing store and registers the workflows.
  pub fn new<S>(store: Arc<S>, config: &AppConfig) -> Self
  where
    S: UserStore + BookStore + OrderStore + 'static,
  {
    let users: Arc<dyn UserStore> = store.clone();
    let books: Arc<dyn BookStore> = store.clone();
    let orders: Arc<dyn OrderStore> = store;

    let source = StoreStatsSource::new(users.clone(), books.clone(), orders.clone());
    let dashboard = Arc::new(DashboardService::new(Arc::new(source), config.dashboard_ttl()));
    let tokens = Arc::new(TokenSigner::new(config.jwt_secret.as_bytes(), config.jwt_lifetime()));

    let workflows = Arc::new(Workflows::<AppError>::new());
    pipelines::register_all_pipelines(&workflows);

    AppState {
      users,
      books,
      orders,
      workflows,
      tokens,
      dashboard,
    }
  }
}
