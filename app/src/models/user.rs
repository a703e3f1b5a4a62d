// app/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  #[default]
  Customer,
  Admin,
  WarehouseManager,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::Customer => "customer",
      Role::Admin => "admin",
      Role::WarehouseManager => "warehouse_manager",
    }
  }

  /// Missing or unknown role values read back from the store count as `customer`.
  pub fn from_db(value: Option<&str>) -> Self {
    match value {
      Some("admin") => Role::Admin,
      Some("warehouse_manager") => Role::WarehouseManager,
      _ => Role::Customer,
    }
  }

  /// Roles allowed to change the catalog.
  pub fn is_staff(&self) -> bool {
    matches!(self, Role::Admin | Role::WarehouseManager)
  }
}

/// A `users` row exactly as stored.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
  pub id: Uuid,
  pub full_name: String,
  pub email: String,
  /// Argon2 PHC string.
  pub password: String,
  pub role: Option<String>,
  pub phone: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: Option<DateTime<Utc>>,
}

impl UserRow {
  pub fn role(&self) -> Role {
    Role::from_db(self.role.as_deref())
  }
}

/// What callers see of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
  pub id: Uuid,
  pub full_name: String,
  pub email: String,
  pub is_admin: bool,
  pub role: Role,
  pub created_at: DateTime<Utc>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub updated_at: Option<DateTime<Utc>>,
  pub phone: Option<String>,
}

impl From<&UserRow> for UserView {
  fn from(row: &UserRow) -> Self {
    let role = row.role();
    UserView {
      id: row.id,
      full_name: row.full_name.clone(),
      email: row.email.clone(),
      is_admin: role == Role::Admin,
      role,
      created_at: row.created_at,
      updated_at: row.updated_at,
      phone: row.phone.clone(),
    }
  }
}

impl From<UserRow> for UserView {
  fn from(row: UserRow) -> Self {
    UserView::from(&row)
  }
}

/// Insert payload for registration.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub full_name: String,
  pub email: String,
  pub password_hash: String,
  pub role: Role,
}

/// Fields staged by the profile workflow and written in one update.
/// `phone: Some(None)` clears the phone.
#[derive(Debug, Clone)]
pub struct UserChanges {
  pub updated_at: DateTime<Utc>,
  pub full_name: Option<String>,
  pub email: Option<String>,
  pub phone: Option<Option<String>>,
  pub password_hash: Option<String>,
}

impl UserChanges {
  pub fn stamped(updated_at: DateTime<Utc>) -> Self {
    UserChanges {
      updated_at,
      full_name: None,
      email: None,
      phone: None,
      password_hash: None,
    }
  }

  pub fn apply_to(&self, row: &mut UserRow) {
    row.updated_at = Some(self.updated_at);
    if let Some(full_name) = &self.full_name {
      row.full_name = full_name.clone();
    }
    if let Some(email) = &self.email {
      row.email = email.clone();
    }
    if let Some(phone) = &self.phone {
      row.phone = phone.clone();
    }
    if let Some(hash) = &self.password_hash {
      row.password = hash.clone();
    }
  }
}
