use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::source::SalesSource;
use crate::dashboards::d402_sales_report::error::ReportError;

/// Process-wide cache of fetched exports
pub static SOURCE_CACHE: Lazy<SourceCache> = Lazy::new(SourceCache::new);

/// Fetched CSV text keyed by source id, expired by age or dropped on demand
#[derive(Default)]
pub struct SourceCache {
    entries: RwLock<HashMap<String, (Instant, Arc<String>)>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached text younger than `ttl`, otherwise a fresh fetch.
    ///
    /// The fetch runs under the write lock, so concurrent misses share one
    /// fetch. Failed fetches are not cached.
    pub async fn get_or_fetch(
        &self,
        source: &dyn SalesSource,
        ttl: Duration,
    ) -> Result<Arc<String>, ReportError> {
        let key = source.source_id();

        {
            let entries = self.entries.read().await;
            if let Some(text) = fresh(&entries, key, ttl) {
                tracing::debug!("Source cache hit: {}", key);
                return Ok(text);
            }
        }

        let mut entries = self.entries.write().await;
        // Another request may have fetched while we waited for the lock
        if let Some(text) = fresh(&entries, key, ttl) {
            tracing::debug!("Source cache filled concurrently: {}", key);
            return Ok(text);
        }

        let text = Arc::new(source.fetch_csv().await?);
        entries.insert(key.to_string(), (Instant::now(), Arc::clone(&text)));

        Ok(text)
    }

    /// Drop the cached export; true when something was cached
    pub async fn invalidate(&self, source_id: &str) -> bool {
        let removed = self.entries.write().await.remove(source_id).is_some();
        if removed {
            tracing::info!("Source cache invalidated: {}", source_id);
        }
        removed
    }
}

fn fresh(
    entries: &HashMap<String, (Instant, Arc<String>)>,
    key: &str,
    ttl: Duration,
) -> Option<Arc<String>> {
    entries
        .get(key)
        .filter(|(fetched_at, _)| fetched_at.elapsed() < ttl)
        .map(|(_, text)| Arc::clone(text))
}
