// tests/auth_workflow_tests.rs
mod common;

use bookstore::errors::AppError;
use bookstore::models::Role;
use bookstore::pipelines::login_pipeline::{self, LoginInput, INVALID_CREDENTIALS};
use bookstore::pipelines::register_pipeline::{self, RegisterInput};
use bookstore::services::auth_service;
use bookstore::store::UserStore;
use chrono::Utc;
use common::*;

fn register_input(email: &str) -> RegisterInput {
  RegisterInput {
    full_name: "Le Van C".to_string(),
    email: email.to_string(),
    password: "secret123".to_string(),
  }
}

#[tokio::test]
async fn test_register_returns_customer_view_without_password() {
  let (state, store) = test_state();
  let view = register(&state, "Le Van C", "c@example.com", "secret123").await;

  assert_eq!(view.email, "c@example.com");
  assert_eq!(view.full_name, "Le Van C");
  assert_eq!(view.role, Role::Customer);
  assert!(!view.is_admin);

  let row = stored_user(&store, "c@example.com").await;
  assert_ne!(row.password, "secret123");
  assert!(auth_service::verify_password(&row.password, "secret123").unwrap());
  let json = serde_json::to_value(&view).unwrap();
  assert!(json.get("password").is_none());
}

#[tokio::test]
async fn test_duplicate_registration_is_unauthorized_without_second_row() {
  let (state, store) = test_state();
  register(&state, "Le Van C", "c@example.com", "secret123").await;

  let err = register_pipeline::register_user(&state, register_input("c@example.com"))
    .await
    .unwrap_err();
  assert!(matches!(&err, AppError::Unauthorized(m) if m == "Email is already registered"));
  assert_eq!(UserStore::count(store.as_ref()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_store_constraint_guards_when_precheck_is_raced() {
  let (_state, store) = test_state();
  insert_with_role(&store, "race@example.com", "secret123", Role::Customer).await;

  // A second insert that skipped the pre-check still hits the unique guard.
  let err = UserStore::insert(
    store.as_ref(),
    bookstore::models::NewUser {
      full_name: "Racer".to_string(),
      email: "race@example.com".to_string(),
      password_hash: auth_service::hash_password("secret123").unwrap(),
      role: Role::Customer,
    },
  )
  .await
  .unwrap_err();
  assert!(matches!(&err, AppError::Unauthorized(m) if m == "Email is already registered"));
  assert_eq!(UserStore::count(store.as_ref()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_register_validates_input_before_touching_store() {
  let (state, store) = test_state();

  for (name, email, password) in [
    ("", "a@example.com", "secret123"),
    ("A", "not-an-email", "secret123"),
    ("A", "a@example.com", "12345"),
  ] {
    let err = register_pipeline::register_user(
      &state,
      RegisterInput {
        full_name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
      },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "unexpected error: {:?}", err);
  }
  assert_eq!(UserStore::count(store.as_ref()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_login_errors_are_indistinguishable() {
  let (state, _store) = test_state();
  register(&state, "Le Van C", "c@example.com", "secret123").await;

  let wrong_password = login_pipeline::login(
    &state,
    LoginInput {
      email: "c@example.com".to_string(),
      password: "wrong-pass".to_string(),
    },
  )
  .await
  .unwrap_err();
  let unknown_email = login_pipeline::login(
    &state,
    LoginInput {
      email: "nobody@example.com".to_string(),
      password: "secret123".to_string(),
    },
  )
  .await
  .unwrap_err();

  assert_eq!(wrong_password.to_string(), unknown_email.to_string());
  assert_eq!(wrong_password.public_message(), INVALID_CREDENTIALS);
  assert!(matches!(wrong_password, AppError::Unauthorized(_)));
  assert!(matches!(unknown_email, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn test_login_issues_token_with_identity_claims() {
  let (state, store) = test_state();
  let admin = insert_with_role(&store, "admin@example.com", "adminpass", Role::Admin).await;

  let response = login_pipeline::login(
    &state,
    LoginInput {
      email: "admin@example.com".to_string(),
      password: "adminpass".to_string(),
    },
  )
  .await
  .unwrap();

  assert_eq!(response.user.id, admin.id);
  assert!(response.user.is_admin);
  let claims = state.tokens.verify(&response.token, Utc::now()).unwrap();
  assert_eq!(claims.sub, admin.id);
  assert_eq!(claims.email, "admin@example.com");
  assert!(claims.is_admin);
  assert_eq!(claims.role, Role::Admin);
}

#[tokio::test]
async fn test_current_user_rereads_the_store() {
  let (state, store) = test_state();
  let view = register(&state, "Le Van C", "c@example.com", "secret123").await;
  let response = login_pipeline::login(
    &state,
    LoginInput {
      email: "c@example.com".to_string(),
      password: "secret123".to_string(),
    },
  )
  .await
  .unwrap();

  let me = auth_service::current_user(&state.tokens, store.as_ref(), &response.token, Utc::now())
    .await
    .unwrap();
  assert_eq!(me, view);

  assert!(store.remove_user(view.id));
  let err = auth_service::current_user(&state.tokens, store.as_ref(), &response.token, Utc::now())
    .await
    .unwrap_err();
  assert!(matches!(&err, AppError::Unauthorized(m) if m == "User not found"));
}

#[tokio::test]
async fn test_current_user_rejects_bad_tokens() {
  let (state, store) = test_state();
  let err = auth_service::current_user(&state.tokens, store.as_ref(), "a.b.c", Utc::now())
    .await
    .unwrap_err();
  assert!(matches!(&err, AppError::Unauthorized(m) if m == "Invalid token"));
}
