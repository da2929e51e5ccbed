use super::*;
use std::time::Instant;
use tokio::sync::RwLock;

/// Longest wait before retrying upstream after a failed refresh
const RETRY_BACKOFF: Duration = Duration::from_secs(30);

struct Entry {
    items: Vec<CatalogItem>,
    valid_until: Instant,
}

impl Entry {
    fn fresh(&self) -> Option<&Vec<CatalogItem>> {
        (Instant::now() < self.valid_until).then_some(&self.items)
    }
}

/// Serves a source's last successful result until it is older than the TTL.
///
/// A failed refresh falls back to the stale list when there is one, and the
/// stale list is kept for a short back-off before upstream is tried again.
pub struct CachedSource<S> {
    inner: S,
    ttl: Duration,
    cached: RwLock<Option<Entry>>,
}

impl<S: CatalogSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cached: RwLock::new(None),
        }
    }

    /// Drop the cached list so the next fetch goes upstream
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }
}

#[async_trait]
impl<S: CatalogSource> CatalogSource for CachedSource<S> {
    async fn fetch(&self) -> CatalogResult<Vec<CatalogItem>> {
        if let Some(items) = self.cached.read().await.as_ref().and_then(Entry::fresh) {
            return Ok(items.clone());
        }

        // Hold the write lock while refreshing so concurrent misses fetch once
        let mut cached = self.cached.write().await;
        if let Some(items) = cached.as_ref().and_then(Entry::fresh) {
            return Ok(items.clone());
        }

        match self.inner.fetch().await {
            Ok(items) => {
                tracing::info!("Refreshed catalog {} ({} items)", self.inner.name(), items.len());
                *cached = Some(Entry {
                    items: items.clone(),
                    valid_until: Instant::now() + self.ttl,
                });
                Ok(items)
            }
            Err(e) => match cached.as_mut() {
                Some(stale) => {
                    let backoff = self.ttl.min(RETRY_BACKOFF);
                    tracing::warn!(
                        "Refreshing catalog {} failed: {}, serving stale list for {:?}",
                        self.inner.name(),
                        e,
                        backoff
                    );
                    stale.valid_until = Instant::now() + backoff;
                    Ok(stale.items.clone())
                }
                None => Err(e),
            },
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
