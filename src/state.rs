use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clients::google::GoogleOAuthClient;
use crate::clients::naver::NaverClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{SeaOrmUserService, UserService};

/// Build a shared HTTP client with reasonable defaults for API calls.
/// Reused across all HTTP-based services for connection pooling.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("Trendis/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub user_service: Arc<dyn UserService>,

    pub google: Arc<GoogleOAuthClient>,

    pub naver: Arc<NaverClient>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client = build_shared_http_client(config.server.request_timeout_seconds)?;

        let google = Arc::new(GoogleOAuthClient::with_shared_client(
            http_client.clone(),
            config.google_oauth.clone(),
        ));
        let naver = Arc::new(NaverClient::with_shared_client(
            http_client,
            config.naver.clone(),
        ));

        let user_service =
            Arc::new(SeaOrmUserService::new(store.clone())) as Arc<dyn UserService>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            user_service,
            google,
            naver,
        })
    }
}
