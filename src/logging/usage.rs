//! Usage audit trail
//!
//! One [`UsageRecord`] per successful gated search, carrying the token count
//! billed by the generation upstream. Records are only ever appended.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::db::schemas::{Metadata, UsageDoc, USAGE_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::types::Result;

/// Audit entry for one completed search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageRecord {
    pub uuid: String,
    pub tokens: u64,
    /// Raw JSON text produced by the generation upstream
    pub response: String,
    pub query: String,
    pub recorded_at: DateTime<Utc>,
}

impl UsageRecord {
    pub fn new(uuid: String, tokens: u64, response: String, query: String) -> Self {
        Self {
            uuid,
            tokens,
            response,
            query,
            recorded_at: Utc::now(),
        }
    }

    /// Convert to JSONL line
    pub fn to_jsonl(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<UsageRecord> for UsageDoc {
    fn from(record: UsageRecord) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            uuid: record.uuid,
            tokens: i64::try_from(record.tokens).unwrap_or(i64::MAX),
            response: record.response,
            query: record.query,
        }
    }
}

/// Append-only destination for usage records
#[async_trait]
pub trait UsageSink: Send + Sync {
    async fn record(&self, record: UsageRecord) -> Result<()>;
}

pub struct MongoUsageSink {
    collection: MongoCollection<UsageDoc>,
}

impl MongoUsageSink {
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        let collection = mongo.collection::<UsageDoc>(USAGE_COLLECTION).await?;
        Ok(Self { collection })
    }
}

#[async_trait]
impl UsageSink for MongoUsageSink {
    async fn record(&self, record: UsageRecord) -> Result<()> {
        let id = self.collection.insert_one(record.into()).await?;
        debug!(id = %id, "Usage record stored");
        Ok(())
    }
}

/// Keeps records in process memory (dev mode and tests)
#[derive(Default)]
pub struct InMemoryUsageSink {
    records: Mutex<Vec<UsageRecord>>,
}

impl InMemoryUsageSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<UsageRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl UsageSink for InMemoryUsageSink {
    async fn record(&self, record: UsageRecord) -> Result<()> {
        if let Ok(line) = record.to_jsonl() {
            debug!("usage {}", line);
        }
        self.records.lock().await.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serialization() {
        let record = UsageRecord::new(
            "user-123".to_string(),
            4096,
            r#"{"answer":"x"}"#.to_string(),
            "what happens at the end".to_string(),
        );

        let jsonl = record.to_jsonl().unwrap();
        assert!(jsonl.contains("user-123"));
        assert!(jsonl.contains("4096"));
        assert!(jsonl.contains("recorded_at"));
    }

    #[test]
    fn test_record_into_doc() {
        let record = UsageRecord::new("u1".into(), 12, "{}".into(), "q".into());
        let doc: UsageDoc = record.into();

        assert_eq!(doc.uuid, "u1");
        assert_eq!(doc.tokens, 12);
        assert_eq!(doc.query, "q");
        assert!(doc._id.is_none());
    }

    #[tokio::test]
    async fn test_in_memory_sink_appends() {
        let sink = InMemoryUsageSink::new();
        sink.record(UsageRecord::new("a".into(), 1, "{}".into(), "q1".into()))
            .await
            .unwrap();
        sink.record(UsageRecord::new("b".into(), 2, "{}".into(), "q2".into()))
            .await
            .unwrap();

        let records = sink.records().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].uuid, "a");
        assert_eq!(records[1].query, "q2");
    }
}
