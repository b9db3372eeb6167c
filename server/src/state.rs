use std::{sync::Arc, time::Duration};

use reqwest::Client;
use sqlx::PgPool;

use super::{config::Config, database::init_postgres};

pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub http: Client,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let pool = init_postgres(&config.database_url).await;

        let http = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client");

        Arc::new(Self { config, pool, http })
    }
}
