//! Record sinks — where accepted records go. The pipeline only ever hands a
//! sink a record that passed validation.

use async_trait::async_trait;
use tracing::info;

use crate::errors::SinkError;
use crate::models::record::ResumeRecord;

mod airtable;

pub use airtable::AirtableSink;

/// What the sink did with the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkReceipt {
    Created(String),
    AlreadyExists(String),
}

#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn store(&self, record: &ResumeRecord) -> Result<SinkReceipt, SinkError>;
}

/// Logs the would-be payload instead of storing it. Used for `--dry-run`
/// and when the Airtable credentials are absent.
pub struct DryRunSink;

#[async_trait]
impl RecordSink for DryRunSink {
    async fn store(&self, record: &ResumeRecord) -> Result<SinkReceipt, SinkError> {
        let payload = serde_json::to_string_pretty(record).unwrap_or_default();
        info!(name = %record.name, "[dry run] would store record:\n{payload}");
        Ok(SinkReceipt::Created("dry-run".to_string()))
    }
}
