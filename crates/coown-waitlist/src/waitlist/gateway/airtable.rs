use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{execute, SubmissionError, SubmissionReceipt};
use crate::config::DEFAULT_AIRTABLE_API_BASE;
use crate::waitlist::domain::OutboundRecord;

/// Airtable table receiving one record per signup.
#[derive(Clone)]
pub struct AirtableBackend {
    api_base: String,
    api_key: String,
    base_id: String,
    table_name: String,
}

impl AirtableBackend {
    pub fn new(
        api_key: impl Into<String>,
        base_id: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        Self {
            api_base: DEFAULT_AIRTABLE_API_BASE.to_string(),
            api_key: api_key.into(),
            base_id: base_id.into(),
            table_name: table_name.into(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn records_url(&self) -> Result<Url, SubmissionError> {
        let mut url = Url::parse(&self.api_base).map_err(|err| {
            SubmissionError::Configuration(format!("invalid Airtable API base: {err}"))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                SubmissionError::Configuration("Airtable API base cannot be a base".to_string())
            })?
            .pop_if_empty()
            .push(&self.base_id)
            .push(&self.table_name);
        Ok(url)
    }

    pub(crate) async fn send(
        &self,
        client: &Client,
        record: &OutboundRecord,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let url = self.records_url()?;
        let payload = CreateRecords {
            records: [RecordFields {
                fields: AirtableFields::from(record),
            }],
        };

        let body = execute(client.post(url).bearer_auth(&self.api_key).json(&payload)).await?;

        let created: CreatedRecords = serde_json::from_str(&body).map_err(|err| {
            SubmissionError::Unknown(format!("unreadable Airtable response: {err}"))
        })?;

        Ok(SubmissionReceipt {
            record_id: created.records.into_iter().next().and_then(|record| record.id),
        })
    }
}

impl std::fmt::Debug for AirtableBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AirtableBackend")
            .field("api_base", &self.api_base)
            .field("base_id", &self.base_id)
            .field("table_name", &self.table_name)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct CreateRecords<'a> {
    records: [RecordFields<'a>; 1],
}

#[derive(Serialize)]
struct RecordFields<'a> {
    fields: AirtableFields<'a>,
}

#[derive(Serialize)]
struct AirtableFields<'a> {
    #[serde(rename = "User Type")]
    user_type: &'a str,
    #[serde(rename = "Full Name")]
    full_name: &'a str,
    #[serde(rename = "Email")]
    email: &'a str,
    #[serde(rename = "Phone")]
    phone: &'a str,
    #[serde(rename = "Submitted At")]
    submitted_at: &'a str,
    #[serde(rename = "Investment Budget", skip_serializing_if = "Option::is_none")]
    investment_budget: Option<&'a str>,
    #[serde(rename = "Agency Name", skip_serializing_if = "Option::is_none")]
    agency_name: Option<&'a str>,
    #[serde(rename = "Experience", skip_serializing_if = "Option::is_none")]
    experience: Option<&'a str>,
}

impl<'a> From<&'a OutboundRecord> for AirtableFields<'a> {
    fn from(record: &'a OutboundRecord) -> Self {
        Self {
            user_type: record.user_type,
            full_name: &record.full_name,
            email: &record.email,
            phone: &record.phone,
            submitted_at: &record.timestamp,
            investment_budget: record.investment_budget.as_deref(),
            agency_name: record.agency_name.as_deref(),
            experience: record.experience.as_deref(),
        }
    }
}

#[derive(Deserialize)]
struct CreatedRecords {
    #[serde(default)]
    records: Vec<CreatedRecord>,
}

#[derive(Deserialize)]
struct CreatedRecord {
    id: Option<String>,
}
