//! Outbound delivery of finalized waitlist entries.
//!
//! [`SubmissionGateway`] is the only boundary the wizard and the HTTP route talk to.
//! [`HttpSubmissionGateway`] implements it on top of a single configured backend and
//! performs exactly one request per call; retries are left to the user.

pub mod airtable;
pub mod apps_script;

use std::future::Future;
use std::sync::Arc;

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, warn};

use super::domain::WaitlistEntry;
use crate::config::{BackendKind, WaitlistConfig};

pub use airtable::AirtableBackend;
pub use apps_script::{AppsScriptBackend, ScriptTransport};

const USER_AGENT: &str = concat!("coown-waitlist/", env!("CARGO_PKG_VERSION"));

/// Longest slice of a failed response body kept for logs.
const ERROR_BODY_PREVIEW: usize = 256;

/// Identifier handed back by the backend on success, when it provides one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub record_id: Option<String>,
}

/// Failure returned by a gateway. Details are for logs; users see [`Self::user_message`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("waitlist backend is not configured: {0}")]
    Configuration(String),
    #[error("waitlist backend request failed: {detail}")]
    Transport { status: Option<u16>, detail: String },
    #[error("unexpected waitlist submission failure: {0}")]
    Unknown(String),
}

impl SubmissionError {
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "Server configuration error",
            Self::Transport { .. } => "Failed to join waitlist. Please try again.",
            Self::Unknown(_) => "Something went wrong. Please try again.",
        }
    }
}

/// Single chokepoint translating an entry into one external call.
pub trait SubmissionGateway: Send + Sync {
    fn submit(
        &self,
        entry: &WaitlistEntry,
    ) -> impl Future<Output = Result<SubmissionReceipt, SubmissionError>> + Send;
}

impl<G> SubmissionGateway for Arc<G>
where
    G: SubmissionGateway,
{
    async fn submit(&self, entry: &WaitlistEntry) -> Result<SubmissionReceipt, SubmissionError> {
        (**self).submit(entry).await
    }
}

/// Concrete spreadsheet service an [`HttpSubmissionGateway`] writes to.
#[derive(Debug, Clone)]
pub enum WaitlistBackend {
    Airtable(AirtableBackend),
    AppsScript(AppsScriptBackend),
}

impl WaitlistBackend {
    /// Resolves the selected backend, or `None` when its credentials are absent.
    pub fn from_config(config: &WaitlistConfig) -> Option<Self> {
        match config.backend {
            BackendKind::Airtable => {
                let settings = &config.airtable;
                let api_key = settings.api_key.clone()?;
                let base_id = settings.base_id.clone()?;
                Some(Self::Airtable(
                    AirtableBackend::new(api_key, base_id, settings.table_name.clone())
                        .with_api_base(settings.api_base.clone()),
                ))
            }
            BackendKind::GoogleSheets => {
                let settings = &config.google_script;
                let url = settings.url.clone()?;
                Some(Self::AppsScript(AppsScriptBackend::new(
                    url,
                    settings.transport,
                )))
            }
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Airtable(_) => "airtable",
            Self::AppsScript(_) => "google_sheets",
        }
    }
}

/// Gateway delivering entries over HTTP to the configured backend.
#[derive(Debug, Clone)]
pub struct HttpSubmissionGateway {
    client: Client,
    backend: Option<WaitlistBackend>,
}

impl HttpSubmissionGateway {
    pub fn new(client: Client, backend: Option<WaitlistBackend>) -> Self {
        Self { client, backend }
    }

    /// Builds the HTTP client and resolves the backend. Missing credentials are not an
    /// error here; every submission then fails with [`SubmissionError::Configuration`].
    pub fn from_config(config: &WaitlistConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;

        let backend = WaitlistBackend::from_config(config);
        if backend.is_none() {
            warn!(
                backend = ?config.backend,
                "waitlist backend credentials not configured; submissions will be rejected"
            );
        }

        Ok(Self::new(client, backend))
    }

    pub fn backend(&self) -> Option<&WaitlistBackend> {
        self.backend.as_ref()
    }
}

impl SubmissionGateway for HttpSubmissionGateway {
    async fn submit(&self, entry: &WaitlistEntry) -> Result<SubmissionReceipt, SubmissionError> {
        let Some(backend) = &self.backend else {
            error!("waitlist submission attempted without backend credentials");
            return Err(SubmissionError::Configuration(
                "no waitlist backend credentials configured".to_string(),
            ));
        };

        let record = entry.outbound_record();
        debug!(
            backend = backend.name(),
            user_type = entry.user_type().as_str(),
            "dispatching waitlist entry"
        );

        let result = match backend {
            WaitlistBackend::Airtable(airtable) => airtable.send(&self.client, &record).await,
            WaitlistBackend::AppsScript(script) => script.send(&self.client, &record).await,
        };

        match &result {
            Ok(receipt) => debug!(
                backend = backend.name(),
                record_id = receipt.record_id.as_deref().unwrap_or("-"),
                "waitlist entry accepted"
            ),
            Err(err) => error!(backend = backend.name(), error = %err, "waitlist submission failed"),
        }

        result
    }
}

/// Sends one request and returns the body of a 2xx response.
pub(crate) async fn execute(request: reqwest::RequestBuilder) -> Result<String, SubmissionError> {
    let response = request
        .send()
        .await
        .map_err(|err| SubmissionError::Transport {
            status: err.status().map(|status| status.as_u16()),
            detail: err.to_string(),
        })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| SubmissionError::Transport {
            status: Some(status.as_u16()),
            detail: format!("unable to read response body: {err}"),
        })?;

    if !status.is_success() {
        return Err(SubmissionError::Transport {
            status: Some(status.as_u16()),
            detail: format!("backend responded with {status}: {}", preview(&body)),
        });
    }

    Ok(body)
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(ERROR_BODY_PREVIEW) {
        Some((index, _)) => &body[..index],
        None => body,
    }
}
