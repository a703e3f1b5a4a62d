// app/src/store/mod.rs

//! Data access. The managed database is authoritative; these traits are the
//! only way the rest of the crate reaches it.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{
  AuthorRef, Book, BookPatch, CategoryRef, NewBook, NewUser, Order, PublisherRef, UserChanges, UserRow,
};
use crate::services::catalog::ListingQuery;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub(crate) const EMAIL_REGISTERED: &str = "Email is already registered";
pub(crate) const EMAIL_TAKEN: &str = "Email is already used by another account";

/// Registration with a known email is an authentication failure, like the
/// other auth errors.
pub(crate) fn email_registered() -> AppError {
  AppError::Unauthorized(EMAIL_REGISTERED.to_string())
}

/// Another account already holds the email a profile update asked for.
pub(crate) fn email_taken() -> AppError {
  AppError::Conflict(EMAIL_TAKEN.to_string())
}

#[async_trait]
pub trait UserStore: Send + Sync {
  async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>>;

  async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRow>>;

  /// Whether a user other than `except` holds `email`.
  async fn email_taken_by_other(&self, email: &str, except: Uuid) -> Result<bool>;

  /// Inserts a user. A unique violation on email is `Unauthorized(EMAIL_REGISTERED)`.
  async fn insert(&self, user: NewUser) -> Result<UserRow>;

  /// Single-row update keyed by id. `Ok(None)` when the row is gone; an email
  /// held by another user is `Conflict(EMAIL_TAKEN)`.
  async fn update(&self, id: Uuid, changes: &UserChanges) -> Result<Option<UserRow>>;

  async fn count(&self) -> Result<i64>;
}

#[async_trait]
pub trait BookStore: Send + Sync {
  /// One page of books matching the filters, plus the unpaged match count.
  async fn list(&self, query: &ListingQuery) -> Result<(Vec<Book>, i64)>;

  async fn get(&self, id: Uuid) -> Result<Option<Book>>;

  async fn create(&self, input: &NewBook) -> Result<Book>;

  async fn update(&self, id: Uuid, patch: &BookPatch) -> Result<Option<Book>>;

  async fn delete(&self, id: Uuid) -> Result<bool>;

  async fn count(&self) -> Result<i64>;

  /// Books with `stock < below`, lowest stock first.
  async fn low_stock(&self, below: i32, limit: i64) -> Result<Vec<Book>>;

  /// All categories, by name.
  async fn categories(&self) -> Result<Vec<CategoryRef>>;

  /// All authors, by name. `role` is a per-book attribute and is left empty.
  async fn authors(&self) -> Result<Vec<AuthorRef>>;

  /// All publishers, by name.
  async fn publishers(&self) -> Result<Vec<PublisherRef>>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Newest first.
  async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>>;

  /// Newest first across all users.
  async fn recent(&self, limit: i64) -> Result<Vec<Order>>;

  async fn count(&self) -> Result<i64>;

  /// Sum of `total_amount` over orders that are not cancelled.
  async fn total_revenue(&self) -> Result<f64>;
}
