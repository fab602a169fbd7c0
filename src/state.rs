use std::sync::Arc;

use super::{config::Config, seed, store::Store};

pub struct AppState {
    pub config: Config,
    pub store: Store,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let store = Store::connect(&config).await;
        seed::run(&store).await;

        Arc::new(Self { config, store })
    }

    #[cfg(test)]
    pub fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            config: Config {
                port: 0,
                database_url: None,
                database_name: None,
            },
            store: Store::Unconfigured,
        })
    }
}
