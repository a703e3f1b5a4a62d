// app/src/dashboard/cache.rs

use chrono::{DateTime, Duration, Utc};

use super::stats::DashboardStats;

#[derive(Debug, Clone, PartialEq)]
pub enum CacheRead {
  Fresh(DashboardStats),
  NeedsFetch,
}

/// Single cached statistics value. Both operations are pure with respect to
/// time: the caller supplies `now`.
#[derive(Debug, Clone)]
pub struct StatsCache {
  value: Option<DashboardStats>,
  fetched_at: Option<DateTime<Utc>>,
  ttl: Duration,
}

impl StatsCache {
  pub fn new(ttl: Duration) -> Self {
    StatsCache {
      value: None,
      fetched_at: None,
      ttl,
    }
  }

  pub fn read(&self, now: DateTime<Utc>) -> CacheRead {
    match (&self.value, self.fetched_at) {
      (Some(value), Some(fetched_at)) if now - fetched_at < self.ttl => CacheRead::Fresh(value.clone()),
      _ => CacheRead::NeedsFetch,
    }
  }

  pub fn write(&mut self, value: DashboardStats, now: DateTime<Utc>) {
    self.value = Some(value);
    self.fetched_at = Some(now);
  }

  /// Stores `value` without a fetch time, so the next `read` asks for a fetch
  /// while `last_value` still has something to serve.
  pub fn seed_stale(&mut self, value: DashboardStats) {
    self.value = Some(value);
    self.fetched_at = None;
  }

  /// The cached value regardless of age.
  pub fn last_value(&self) -> Option<&DashboardStats> {
    self.value.as_ref()
  }

  pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
    self.fetched_at
  }
}
