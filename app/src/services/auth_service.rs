// app/src/services/auth_service.rs

//! Password hashing and token-based identity lookup.

use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use chrono::{DateTime, Utc};
use tracing::{debug, error, instrument, warn, Span};

use crate::errors::{AppError, Result};
use crate::models::UserView;
use crate::services::token::TokenSigner;
use crate::store::UserStore;

/// Hashes a plain-text password with Argon2 default parameters and a fresh salt.
#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String> {
  if password.is_empty() {
    return Err(AppError::Validation("Password cannot be empty".to_string()));
  }

  let salt = SaltString::generate(&mut OsRng);
  match Argon2::default().hash_password(password.as_bytes(), &salt) {
    Ok(hash) => {
      debug!("Password hashed.");
      Ok(hash.to_string())
    }
    Err(argon_err) => {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      Err(AppError::Internal(format!("Password hashing failed: {}", argon_err)))
    }
  }
}

/// Verifies `provided_password` against a stored Argon2 hash.
///
/// Returns `Ok(false)` on mismatch. A malformed stored hash is an internal
/// error, not a mismatch.
#[instrument(name = "auth_service::verify_password", skip_all, err(Display))]
pub fn verify_password(stored_hash: &str, provided_password: &str) -> Result<bool> {
  if provided_password.is_empty() {
    return Ok(false);
  }
  let parsed = PasswordHash::new(stored_hash).map_err(|parse_err| {
    error!(error = %parse_err, "Stored password hash could not be parsed.");
    AppError::Internal(format!("Invalid stored password hash format: {}", parse_err))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password mismatch.");
      Ok(false)
    }
    Err(other) => {
      error!(error = %other, "Argon2 verification failed.");
      Err(AppError::Internal(format!("Password verification failed: {}", other)))
    }
  }
}

/// Runs a CPU-bound hashing job on tokio's blocking pool, inside the caller's span.
async fn off_worker<T, F>(job: F) -> Result<T>
where
  T: Send + 'static,
  F: FnOnce() -> Result<T> + Send + 'static,
{
  let span = Span::current();
  tokio::task::spawn_blocking(move || span.in_scope(job))
    .await
    .map_err(|join_err| AppError::Internal(format!("Password hashing task failed: {}", join_err)))?
}

/// [`hash_password`] without stalling the async worker.
pub async fn spawn_hash_password(password: String) -> Result<String> {
  off_worker(move || hash_password(&password)).await
}

/// [`verify_password`] without stalling the async worker.
pub async fn spawn_verify_password(stored_hash: String, provided_password: String) -> Result<bool> {
  off_worker(move || verify_password(&stored_hash, &provided_password)).await
}

/// Resolves a bearer token to the user's current record. Claims other than
/// the subject are not trusted; the row is re-read every time.
#[instrument(name = "auth_service::current_user", skip_all, err(Display))]
pub async fn current_user(
  signer: &TokenSigner,
  users: &dyn UserStore,
  token: &str,
  now: DateTime<Utc>,
) -> Result<UserView> {
  let claims = signer.verify(token, now)?;
  match users.find_by_id(claims.sub).await? {
    Some(row) => Ok(UserView::from(row)),
    None => {
      warn!(user_id = %claims.sub, "Token subject no longer exists.");
      Err(AppError::Unauthorized("User not found".to_string()))
    }
  }
}
