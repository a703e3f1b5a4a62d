// tests/common/mod.rs
#![allow(dead_code)]

use std::sync::Arc;

use bookstore::config::AppConfig;
use bookstore::models::{NewUser, Role, UserRow, UserView};
use bookstore::pipelines::register_pipeline::{self, RegisterInput};
use bookstore::services::auth_service;
use bookstore::state::AppState;
use bookstore::store::{MemoryStore, UserStore};
use once_cell::sync::Lazy;
use tracing::Level;

pub const TEST_SECRET: &str = "test-signing-secret";

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// Fresh in-memory state plus a handle on the store behind it.
pub fn test_state() -> (AppState, Arc<MemoryStore>) {
  setup_tracing();
  let store = Arc::new(MemoryStore::new());
  let state = AppState::new(store.clone(), &AppConfig::local(TEST_SECRET));
  (state, store)
}

pub async fn register(state: &AppState, full_name: &str, email: &str, password: &str) -> UserView {
  register_pipeline::register_user(
    state,
    RegisterInput {
      full_name: full_name.to_string(),
      email: email.to_string(),
      password: password.to_string(),
    },
  )
  .await
  .expect("registration should succeed")
}

/// Inserts a user with an explicit role, bypassing registration.
pub async fn insert_with_role(store: &MemoryStore, email: &str, password: &str, role: Role) -> UserRow {
  UserStore::insert(
    store,
    NewUser {
      full_name: format!("{} user", role.as_str()),
      email: email.to_string(),
      password_hash: auth_service::hash_password(password).unwrap(),
      role,
    },
  )
  .await
  .unwrap()
}

pub async fn stored_user(store: &MemoryStore, email: &str) -> UserRow {
  UserStore::find_by_email(store, email)
    .await
    .unwrap()
    .expect("user should exist")
}
