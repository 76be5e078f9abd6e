use crate::geo::Geolocator;
use lru::LruCache;
use std::net::IpAddr;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

/// Memoizing front for a [`Geolocator`]
///
/// Successful answers (including "unknown") are cached in a bounded LRU map
/// shared by every worker. Failed lookups are not cached and are retried the
/// next time the IP is seen.
pub struct GeoResolver {
    geolocator: Arc<dyn Geolocator>,
    cache: Mutex<LruCache<IpAddr, Option<String>>>,
}

impl GeoResolver {
    pub fn new(geolocator: Arc<dyn Geolocator>, cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            geolocator,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns the region for `ip`, consulting the cache first
    pub async fn region_for(&self, ip: IpAddr) -> Option<String> {
        if let Some(cached) = self.cached(ip) {
            return cached;
        }

        match self.geolocator.lookup(ip).await {
            Ok(region) => {
                if let Ok(mut cache) = self.cache.lock() {
                    cache.put(ip, region.clone());
                }
                region
            }
            Err(e) => {
                tracing::debug!("Geolocation lookup for {} failed: {}", ip, e);
                None
            }
        }
    }

    fn cached(&self, ip: IpAddr) -> Option<Option<String>> {
        // LruCache::get needs mutable access to update recency
        self.cache.lock().ok()?.get(&ip).cloned()
    }

    /// Number of cached IPs
    pub fn cached_entries(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGeolocator {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Geolocator for CountingGeolocator {
        async fn lookup(&self, ip: IpAddr) -> Result<Option<String>, GeoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GeoError::Rejected {
                    ip,
                    message: "quota".to_string(),
                });
            }
            Ok(Some(format!("region-of-{}", ip)))
        }
    }

    fn counting(fail: bool) -> Arc<CountingGeolocator> {
        Arc::new(CountingGeolocator {
            calls: AtomicUsize::new(0),
            fail,
        })
    }

    #[tokio::test]
    async fn test_lookups_are_cached() {
        let geo = counting(false);
        let resolver = GeoResolver::new(geo.clone(), 8);
        let ip: IpAddr = "1.1.1.1".parse().unwrap();

        assert_eq!(resolver.region_for(ip).await.as_deref(), Some("region-of-1.1.1.1"));
        assert_eq!(resolver.region_for(ip).await.as_deref(), Some("region-of-1.1.1.1"));
        assert_eq!(geo.calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.cached_entries(), 1);
    }

    #[tokio::test]
    async fn test_cache_is_bounded() {
        let geo = counting(false);
        let resolver = GeoResolver::new(geo.clone(), 2);
        for last in 1..=3u8 {
            resolver.region_for(IpAddr::from([10, 0, 0, last])).await;
        }
        assert_eq!(resolver.cached_entries(), 2);

        // The oldest entry was evicted and is looked up again
        resolver.region_for(IpAddr::from([10, 0, 0, 1])).await;
        assert_eq!(geo.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let geo = counting(true);
        let resolver = GeoResolver::new(geo.clone(), 8);
        let ip: IpAddr = "2.2.2.2".parse().unwrap();

        assert!(resolver.region_for(ip).await.is_none());
        assert!(resolver.region_for(ip).await.is_none());
        assert_eq!(geo.calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.cached_entries(), 0);
    }
}
