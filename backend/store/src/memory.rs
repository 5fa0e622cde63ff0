use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use serde_json::Value;

use crate::{RawRecord, RecordStore, StoreError, Table};

/// Tables held in memory, in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<Table, Vec<RawRecord<Value>>>>,
    outage: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store where every call fails as if the service were unreachable.
    pub fn unavailable() -> Self {
        Self {
            outage: Some("connection refused".to_string()),
            ..Self::default()
        }
    }

    pub fn with_table(self, table: Table, records: Vec<(&str, Value)>) -> Self {
        self.lock().insert(
            table,
            records
                .into_iter()
                .map(|(id, fields)| RawRecord {
                    id: id.to_string(),
                    fields,
                })
                .collect(),
        );
        self
    }

    pub fn records(&self, table: Table) -> Vec<RawRecord<Value>> {
        self.lock().get(&table).cloned().unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Table, Vec<RawRecord<Value>>>> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self) -> Result<(), StoreError> {
        match &self.outage {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, table: Table) -> Result<Vec<RawRecord<Value>>, StoreError> {
        self.check()?;

        Ok(self.records(table))
    }

    async fn create(&self, table: Table, fields: Value) -> Result<RawRecord<Value>, StoreError> {
        self.check()?;

        let mut tables = self.lock();
        let records = tables.entry(table).or_default();

        let record = RawRecord {
            id: format!("rec{}{:04}", table.as_str(), records.len() + 1),
            fields,
        };
        records.push(record.clone());

        Ok(record)
    }
}
