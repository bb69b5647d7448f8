//! Airtable sink — one row per accepted record in a fixed-schema table.
//!
//! Before creating a row the sink checks whether the dedupe key (the email
//! when the record has one, else the candidate name) already exists, and
//! reports `AlreadyExists` instead of inserting a duplicate.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::SinkError;
use crate::models::record::ResumeRecord;
use crate::sink::{RecordSink, SinkReceipt};

const API_BASE: &str = "https://api.airtable.com/v0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AirtableSink {
    client: Client,
    token: String,
    table_url: Url,
}

impl AirtableSink {
    pub fn new(token: String, base_id: &str, table: &str) -> Self {
        let mut table_url = Url::parse(API_BASE).expect("static base URL");
        table_url
            .path_segments_mut()
            .expect("base URL has a path")
            .push(base_id)
            .push(table);
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            token,
            table_url,
        }
    }

    /// Column mapping for the fixed Airtable schema. Skills are joined into
    /// one comma-separated cell.
    fn payload(record: &ResumeRecord) -> Value {
        json!({
            "Candidate Name": record.name,
            "Email": record.contact.email,
            "Phone": record.contact.phone,
            "Skills": record.skills.join(", "),
            "Exp Years": record.years_experience,
            "Current Location": record.location,
            "Job Role": record.job_role,
            "Source": "CV Upload",
            "Status": "New",
        })
    }

    fn dedupe_key(record: &ResumeRecord) -> (&'static str, &str) {
        if record.contact.email.is_empty() {
            ("Candidate Name", record.name.as_str())
        } else {
            ("Email", record.contact.email.as_str())
        }
    }

    fn exists_formula(key_field: &str, key: &str) -> String {
        let escaped = key.replace('\'', "\\'");
        format!("{{{key_field}}}='{escaped}'")
    }

    async fn record_exists(&self, key_field: &str, key: &str) -> Result<bool, SinkError> {
        let response = self
            .client
            .get(self.table_url.clone())
            .bearer_auth(&self.token)
            .query(&[
                ("filterByFormula", Self::exists_formula(key_field, key).as_str()),
                ("maxRecords", "1"),
            ])
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(SinkError::Unauthorized(status));
        }
        let body: Value = response.error_for_status()?.json().await?;
        let records = body
            .get("records")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0);
        Ok(records > 0)
    }
}

#[async_trait]
impl RecordSink for AirtableSink {
    async fn store(&self, record: &ResumeRecord) -> Result<SinkReceipt, SinkError> {
        let (key_field, key) = Self::dedupe_key(record);

        match self.record_exists(key_field, key).await {
            Ok(true) => {
                debug!(key, "record already exists, skipping create");
                return Ok(SinkReceipt::AlreadyExists(key.to_string()));
            }
            Ok(false) => {}
            // An unreadable index is not a reason to drop the record.
            Err(e) => warn!(key, error = %e, "existence check failed, proceeding to create"),
        }

        let response = self
            .client
            .post(self.table_url.clone())
            .bearer_auth(&self.token)
            .json(&json!({ "fields": Self::payload(record) }))
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(SinkError::Unauthorized(status));
        }
        if status == 422 {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected(body));
        }
        let body: Value = response.error_for_status()?.json().await?;
        let id = body
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        Ok(SinkReceipt::Created(id))
    }
}
