use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::rest::RestAuthConfig;
use crate::auth::AuthMode;
use crate::config::{AuthKind, BackendKind, Config};
use crate::db;
use crate::feed::{FeedPage, LikePolicy};
use crate::pages::{PageRegistry, SharedPage};
use crate::remote::rest::{base_url, http_client, RestPostStore};
use crate::remote::sqlite::SqlitePostStore;
use crate::remote::PostStore;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn PostStore>,
    pub auth: AuthMode,
    pub pages: Arc<PageRegistry>,
}

impl AppState {
    /// Wire the configured backend: open or create the local database, or
    /// point the REST clients at the hosted service.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let (store, backend_auth): (Arc<dyn PostStore>, AuthMode) = match config.backend.kind {
            BackendKind::Local => {
                let pool = db::create_pool(&config.db_path())?;
                db::run_migrations(&pool)?;
                (Arc::new(SqlitePostStore::new(pool)), AuthMode::Local)
            }
            BackendKind::Rest => {
                let raw = config
                    .backend
                    .url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("backend.url is not set"))?;
                let base = base_url(raw)?;
                let client = http_client(
                    &config.backend.api_key,
                    Duration::from_secs(config.backend.timeout_secs),
                )?;

                let mut store =
                    RestPostStore::new(client.clone(), base.clone(), config.backend.table.clone());
                if let Some(function) = &config.backend.increment_rpc {
                    store = store.with_increment_rpc(function.clone());
                }

                let auth = AuthMode::Rest(RestAuthConfig {
                    client,
                    base,
                    redirect_url: config.redirect_url(),
                    default_provider: config.auth.default_provider.clone(),
                });
                (Arc::new(store), auth)
            }
        };

        let auth = match config.auth.kind {
            AuthKind::Backend => backend_auth,
            AuthKind::Provider => AuthMode::Provider {
                login_url: config.auth.provider_login_url.clone(),
                logout_url: config.auth.provider_logout_url.clone(),
            },
        };

        Ok(Self::new(config, store, auth))
    }

    pub fn new(config: Config, store: Arc<dyn PostStore>, auth: AuthMode) -> Self {
        let idle = chrono::Duration::minutes(config.pages.idle_minutes as i64);
        Self {
            config,
            store,
            auth,
            pages: Arc::new(PageRegistry::new(idle)),
        }
    }

    pub fn like_policy(&self) -> LikePolicy {
        LikePolicy::from_guard(self.config.feed.self_like_guard)
    }

    /// Mount a new page: open its session, then load the feed.
    pub async fn mount_page(&self) -> (String, SharedPage) {
        let session = self.auth.open_session().await;
        let page = FeedPage::mount(self.store.clone(), session, self.like_policy()).await;
        self.pages.insert(page).await
    }
}
