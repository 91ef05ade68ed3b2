use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::feed::FeedPage;

pub type SharedPage = Arc<Mutex<FeedPage>>;

struct MountedPage {
    page: SharedPage,
    last_seen: DateTime<Utc>,
}

/// Mounted pages keyed by the browser's page cookie.
pub struct PageRegistry {
    pages: Mutex<HashMap<String, MountedPage>>,
    idle: Duration,
}

impl PageRegistry {
    pub fn new(idle: Duration) -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            idle,
        }
    }

    /// Look up a page and mark it as seen.
    pub async fn get(&self, key: &str) -> Option<SharedPage> {
        let mut pages = self.pages.lock().await;
        let mounted = pages.get_mut(key)?;
        mounted.last_seen = Utc::now();
        Some(mounted.page.clone())
    }

    /// Register a freshly mounted page under a new random key.
    pub async fn insert(&self, page: FeedPage) -> (String, SharedPage) {
        let key = generate_key();
        let page = Arc::new(Mutex::new(page));
        self.pages.lock().await.insert(
            key.clone(),
            MountedPage {
                page: page.clone(),
                last_seen: Utc::now(),
            },
        );
        tracing::debug!("Mounted page {}", key);
        (key, page)
    }

    /// Unmount a page, releasing its auth subscription.
    pub async fn remove(&self, key: &str) -> bool {
        let removed = self.pages.lock().await.remove(key);
        match removed {
            Some(mounted) => {
                mounted.page.lock().await.teardown();
                true
            }
            None => false,
        }
    }

    /// Unmount every page idle for longer than the configured window.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Utc::now()).await
    }

    async fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let expired: Vec<MountedPage> = {
            let mut pages = self.pages.lock().await;
            let keys: Vec<String> = pages
                .iter()
                .filter(|(_, m)| now.signed_duration_since(m.last_seen) > self.idle)
                .map(|(k, _)| k.clone())
                .collect();
            keys.iter().filter_map(|k| pages.remove(k)).collect()
        };

        for mounted in &expired {
            mounted.page.lock().await.teardown();
        }

        if !expired.is_empty() {
            tracing::info!("Unmounted {} idle pages", expired.len());
        }
        expired.len()
    }

    pub async fn len(&self) -> usize {
        self.pages.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// 32 random bytes, hex encoded. The key is the only thing tying a browser
/// to its page, so it must not be guessable.
fn generate_key() -> String {
    use rand::Rng;
    let bytes: [u8; 32] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Periodically unmount idle pages.
pub fn spawn_sweeper(registry: Arc<PageRegistry>, every: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            registry.sweep().await;
        }
    })
}
