use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::cache::ttl_cache::TtlCache;
use crate::observability::metrics::get_metrics;

pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically drop expired entries so keys that are written but never
/// read again do not accumulate.
pub fn spawn_cleanup_task<V>(cache: Arc<TtlCache<V>>, every: Duration) -> JoinHandle<()>
where
    V: Clone + Serialize + Send + 'static,
{
    info!("cache cleanup task started, interval {:?}", every);
    tokio::spawn(async move {
        let metrics = get_metrics().await;
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = cache.cleanup_expired();
            if removed > 0 {
                info!("cleaned up {} expired cache items", removed);
                metrics.cache_evictions.inc_by(removed as u64);
            } else {
                debug!("cache cleanup: nothing expired");
            }
            metrics.cache_entries.set(cache.len() as i64);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ttl_cache::DEFAULT_TTL;
    use crate::helpers::time::system_clock;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn sweeper_removes_write_only_keys() {
        let cache: Arc<TtlCache<Value>> = Arc::new(TtlCache::new(DEFAULT_TTL, system_clock()));
        cache.set("write-only", json!(1), Some(Duration::from_millis(20)));
        cache.set("kept", json!(2), Some(Duration::from_secs(60)));

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.abort();

        // no read happened on "write-only", only the sweep can have removed it
        assert_eq!(cache.len(), 1);
        assert!(cache.has("kept"));
    }
}
