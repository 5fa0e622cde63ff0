//! # Airtable
//!
//! REST client for the hosted base.
//!
//! ## Listing
//! - `GET {api}/{base}/{table}?pageSize=100`
//! - Each page may carry an `offset` cursor; keep requesting with it until a
//!   page comes back without one
//! - Records arrive in the table's default order, which we keep
//!
//! ## Creating
//! - `POST {api}/{base}/{table}` with `{"fields": {...}}`
//!
//! Auth is a bearer token (personal access token). A missing token is a setup
//! error and is refused when the client is built, not on the first request.
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::{DEFAULT_API_URL, RawRecord, StoreError, Table};

const PAGE_SIZE: &str = "100";

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every record of `table`, all pages, in store order.
    async fn list(&self, table: Table) -> Result<Vec<RawRecord<Value>>, StoreError>;

    async fn create(&self, table: Table, fields: Value) -> Result<RawRecord<Value>, StoreError>;
}

#[derive(Deserialize)]
struct ListResponse {
    records: Vec<RawRecord<Value>>,
    offset: Option<String>,
}

#[derive(Serialize)]
struct CreateRequest {
    fields: Value,
}

#[derive(Clone)]
pub struct AirtableClient {
    http: Client,
    api_url: String,
    base_id: String,
    api_key: String,
}

impl AirtableClient {
    pub fn new(api_key: impl Into<String>, base_id: impl Into<String>) -> Result<Self, StoreError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(StoreError::ConfigurationMissing("AIRTABLE_API_KEY"));
        }

        let base_id = base_id.into();
        if base_id.trim().is_empty() {
            return Err(StoreError::ConfigurationMissing("AIRTABLE_BASE_ID"));
        }

        Ok(Self {
            http: Client::new(),
            api_url: DEFAULT_API_URL.to_string(),
            base_id,
            api_key,
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/{}/{}", self.api_url, self.base_id, table)
    }
}

#[async_trait]
impl RecordStore for AirtableClient {
    async fn list(&self, table: Table) -> Result<Vec<RawRecord<Value>>, StoreError> {
        let url = self.table_url(table);
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(&url)
                .bearer_auth(&self.api_key)
                .query(&[("pageSize", PAGE_SIZE)]);

            if let Some(cursor) = &offset {
                request = request.query(&[("offset", cursor)]);
            }

            let response = check(table, request.send().await?).await?;
            let page: ListResponse = response.json().await?;

            #[cfg(feature = "verbose")]
            tracing::info!("{table}: page of {} records", page.records.len());

            records.extend(page.records);

            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(records)
    }

    async fn create(&self, table: Table, fields: Value) -> Result<RawRecord<Value>, StoreError> {
        let response = self
            .http
            .post(self.table_url(table))
            .bearer_auth(&self.api_key)
            .json(&CreateRequest { fields })
            .send()
            .await?;

        Ok(check(table, response).await?.json().await?)
    }
}

async fn check(table: Table, response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    warn!("Airtable {table} returned {status}: {message}");

    Err(StoreError::Status {
        table,
        status: status.as_u16(),
        message,
    })
}
