use crate::api::{self, AppState};
use crate::bandwidth::BandwidthHistory;
use crate::config::ServerConfig;
use crate::counters;
use crate::credential_store::CredentialStore;
use crate::error::Result;
use crate::password::CredentialHasher;
use crate::security::SecurityFeed;
use crate::user_repository::SqliteUserRepository;
use common::EventLog;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub struct NetwatchServer {
    config: Arc<ServerConfig>,
    state: AppState,
}

impl NetwatchServer {
    /// Open the user database and assemble the shared components.
    pub async fn new(config: ServerConfig) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);

        let repository = Arc::new(SqliteUserRepository::connect(&config.database_path).await?);
        let hasher = CredentialHasher::new(&config.password_hash)?;
        let credentials = Arc::new(CredentialStore::new(repository, hasher));
        info!(
            "Credential store ready with {} user(s)",
            credentials.user_count().await?
        );

        let counters = counters::provider_for(config.counter_source);
        info!("Network counter source: {:?}", config.counter_source);

        let state = AppState {
            counters: counters.clone(),
            bandwidth: BandwidthHistory::new(
                counters,
                EventLog::with_retention(config.history_retention),
            ),
            security: SecurityFeed::simulated(EventLog::with_retention(config.history_retention)),
            credentials,
        };

        Ok(Self { config, state })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cors = api::cors_layer(&self.config.cors_allowed_origins)?;
        let app = api::router(self.state, cors);

        let listener = TcpListener::bind(&self.config.listen_addr).await?;
        info!("API server listening on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("API server stopped");
        Ok(())
    }
}
