use thiserror::Error;

use crate::Table;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigurationMissing(&'static str),

    #[error("Record store request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Record store rejected request on {table} ({status}): {message}")]
    Status {
        table: Table,
        status: u16,
        message: String,
    },

    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid record {id} in {table}: {source}")]
    InvalidRecord {
        table: Table,
        id: String,
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Network or auth failures talking to the store, as opposed to bad data or setup.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Request(_) | StoreError::Status { .. } | StoreError::Unavailable(_)
        )
    }
}
