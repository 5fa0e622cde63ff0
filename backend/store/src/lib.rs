//! # Record Store
//!
//! Typed access to the Airtable base backing the portfolio.
//!
//! Records are fetched raw (`RawRecord<serde_json::Value>`) through the
//! [`RecordStore`] seam and decoded into schema types by [`fetch_all`]. The
//! HTTP implementation is [`AirtableClient`]; [`MemoryStore`] holds tables
//! in-process.
use std::fmt;

use serde::de::DeserializeOwned;

pub mod error;
pub mod memory;
pub mod models;
pub mod remote;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use models::RawRecord;
pub use remote::{AirtableClient, RecordStore};

pub const DEFAULT_BASE_ID: &str = "app9WURJGgbSPdDXy";
pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    Categories,
    Courses,
    Projects,
    Tickets,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Categories => "categories",
            Table::Courses => "courses",
            Table::Projects => "projects",
            Table::Tickets => "tickets",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fetches a whole table and decodes every record's fields as `T`.
pub async fn fetch_all<T: DeserializeOwned>(
    store: &dyn RecordStore,
    table: Table,
) -> Result<Vec<RawRecord<T>>, StoreError> {
    let records = store.list(table).await?;

    #[cfg(feature = "verbose")]
    tracing::info!("Fetched {} records from {table}", records.len());

    records
        .into_iter()
        .map(|record| decode(table, record))
        .collect()
}

fn decode<T: DeserializeOwned>(
    table: Table,
    record: RawRecord<serde_json::Value>,
) -> Result<RawRecord<T>, StoreError> {
    let RawRecord { id, fields } = record;

    match serde_json::from_value(fields) {
        Ok(fields) => Ok(RawRecord { id, fields }),
        Err(source) => Err(StoreError::InvalidRecord { table, id, source }),
    }
}
