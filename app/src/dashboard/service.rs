// app/src/dashboard/service.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::cache::{CacheRead, StatsCache};
use super::stats::DashboardStats;
use crate::errors::Result;
use crate::services::catalog::POPULAR_STOCK_BELOW;
use crate::store::{BookStore, OrderStore, UserStore};

const RECENT_ORDERS: i64 = 5;
const LOW_STOCK_BOOKS: i64 = 5;

/// Where fresh statistics come from.
#[async_trait]
pub trait StatsSource: Send + Sync {
  async fn fetch(&self) -> Result<DashboardStats>;
}

/// Aggregates straight from the stores.
pub struct StoreStatsSource {
  users: Arc<dyn UserStore>,
  books: Arc<dyn BookStore>,
  orders: Arc<dyn OrderStore>,
}

impl StoreStatsSource {
  pub fn new(users: Arc<dyn UserStore>, books: Arc<dyn BookStore>, orders: Arc<dyn OrderStore>) -> Self {
    StoreStatsSource { users, books, orders }
  }
}

#[async_trait]
impl StatsSource for StoreStatsSource {
  #[instrument(name = "StoreStatsSource::fetch", skip(self), err(Display))]
  async fn fetch(&self) -> Result<DashboardStats> {
    let (total_books, total_orders, total_users, total_revenue, recent_orders, low_stock_books) = futures_util::try_join!(
      self.books.count(),
      self.orders.count(),
      self.users.count(),
      self.orders.total_revenue(),
      self.orders.recent(RECENT_ORDERS),
      self.books.low_stock(POPULAR_STOCK_BELOW, LOW_STOCK_BOOKS),
    )?;
    Ok(DashboardStats {
      total_books,
      total_orders,
      total_users,
      total_revenue,
      recent_orders,
      low_stock_books,
    })
  }
}

/// Read-through cache over a [`StatsSource`]. Reads never fail: a failed
/// fetch serves the last good value, or the fallback when there is none.
pub struct DashboardService {
  source: Arc<dyn StatsSource>,
  cache: Mutex<StatsCache>,
}

impl DashboardService {
  pub fn new(source: Arc<dyn StatsSource>, ttl: Duration) -> Self {
    DashboardService {
      source,
      cache: Mutex::new(StatsCache::new(ttl)),
    }
  }

  pub async fn load(&self, force: bool) -> DashboardStats {
    self.load_at(force, Utc::now()).await
  }

  #[instrument(name = "DashboardService::load", skip(self, now))]
  pub async fn load_at(&self, force: bool, now: DateTime<Utc>) -> DashboardStats {
    if !force {
      let cached = self.cache.lock().read(now);
      if let CacheRead::Fresh(stats) = cached {
        debug!("Serving cached dashboard statistics.");
        return stats;
      }
    }

    match self.source.fetch().await {
      Ok(stats) => {
        self.cache.lock().write(stats.clone(), now);
        debug!("Dashboard statistics refreshed.");
        stats
      }
      Err(err) => {
        let mut cache = self.cache.lock();
        match cache.last_value() {
          Some(stale) => {
            warn!(error = %err, "Statistics fetch failed; keeping the previous value.");
            stale.clone()
          }
          None => {
            warn!(error = %err, "Statistics fetch failed with nothing cached; using fallback.");
            let fallback = DashboardStats::fallback();
            cache.seed_stale(fallback.clone());
            fallback
          }
        }
      }
    }
  }

  /// Forces a refresh every `period`, regardless of freshness.
  pub fn spawn_refresh(self: Arc<Self>, period: std::time::Duration) -> JoinHandle<()> {
    info!(period_secs = period.as_secs(), "Starting dashboard refresh timer.");
    tokio::spawn(async move {
      let mut ticker = tokio::time::interval(period);
      // The first tick completes immediately.
      ticker.tick().await;
      loop {
        ticker.tick().await;
        self.load(true).await;
      }
    })
  }
}
