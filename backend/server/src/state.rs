use std::sync::Arc;

use catalog::Catalog;
use reqwest::Client;
use store::{AirtableClient, RecordStore, StoreError};

use super::config::Config;

pub struct State {
    pub config: Config,
    pub catalog: Catalog,
    pub http_client: Client,
}

impl State {
    pub fn new(config: Config) -> Result<Arc<Self>, StoreError> {
        let airtable = AirtableClient::new(&config.airtable_api_key, &config.airtable_base_id)?
            .with_api_url(&config.airtable_api_url);

        Ok(Self::with_store(config, Arc::new(airtable)))
    }

    pub fn with_store(config: Config, store: Arc<dyn RecordStore>) -> Arc<Self> {
        Arc::new(Self {
            config,
            catalog: Catalog::new(store),
            http_client: Client::new(),
        })
    }
}
