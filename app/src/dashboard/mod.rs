// app/src/dashboard/mod.rs

//! Admin dashboard statistics: a TTL cache in front of the store aggregates,
//! refreshed on demand and by a periodic timer.

pub mod cache;
pub mod service;
pub mod stats;

pub use cache::{CacheRead, StatsCache};
pub use service::{DashboardService, StatsSource, StoreStatsSource};
pub use stats::DashboardStats;
