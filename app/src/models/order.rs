// app/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  #[default]
  Pending,
  Confirmed,
  Processing,
  Shipped,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Confirmed => "confirmed",
      OrderStatus::Processing => "processing",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
    }
  }

  pub fn from_db(value: &str) -> Self {
    match value {
      "confirmed" => OrderStatus::Confirmed,
      "processing" => OrderStatus::Processing,
      "shipped" => OrderStatus::Shipped,
      "delivered" => OrderStatus::Delivered,
      "cancelled" => OrderStatus::Cancelled,
      _ => OrderStatus::Pending,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  #[default]
  Pending,
  Processing,
  Completed,
  Failed,
  Refunded,
}

impl PaymentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentStatus::Pending => "pending",
      PaymentStatus::Processing => "processing",
      PaymentStatus::Completed => "completed",
      PaymentStatus::Failed => "failed",
      PaymentStatus::Refunded => "refunded",
    }
  }

  pub fn from_db(value: &str) -> Self {
    match value {
      "processing" => PaymentStatus::Processing,
      "completed" => PaymentStatus::Completed,
      "failed" => PaymentStatus::Failed,
      "refunded" => PaymentStatus::Refunded,
      _ => PaymentStatus::Pending,
    }
  }
}

/// A line of an order. `title` and `author` are copied at purchase time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub book_id: Uuid,
  pub quantity: i32,
  pub unit_price: f64,
  pub title: String,
  pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub items: Vec<OrderItem>,
  pub status: OrderStatus,
  pub payment_status: PaymentStatus,
  pub payment_method: String,
  pub total_amount: f64,
  pub created_at: DateTime<Utc>,
  pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
  /// Cancelled orders do not count towards revenue.
  pub fn counts_towards_revenue(&self) -> bool {
    self.status != OrderStatus::Cancelled
  }
}
