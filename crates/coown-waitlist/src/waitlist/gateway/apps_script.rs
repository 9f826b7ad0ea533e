use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{execute, SubmissionError, SubmissionReceipt};
use crate::waitlist::domain::OutboundRecord;

/// How a record reaches the Apps Script web app. Both avoid a CORS preflight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptTransport {
    /// `GET` with every field encoded in the query string.
    Query,
    /// `POST` with a JSON body declared as `text/plain`.
    PlainTextPost,
}

impl ScriptTransport {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "query" | "get" => Some(Self::Query),
            "plain_text_post" | "post" => Some(Self::PlainTextPost),
            _ => None,
        }
    }
}

/// Google Apps Script deployment that appends rows to the waitlist sheet.
#[derive(Debug, Clone)]
pub struct AppsScriptBackend {
    url: Url,
    transport: ScriptTransport,
}

impl AppsScriptBackend {
    pub fn new(url: Url, transport: ScriptTransport) -> Self {
        Self { url, transport }
    }

    pub fn transport(&self) -> ScriptTransport {
        self.transport
    }

    pub(crate) async fn send(
        &self,
        client: &Client,
        record: &OutboundRecord,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let request = match self.transport {
            ScriptTransport::Query => client.get(self.url.clone()).query(&record.query_pairs()),
            ScriptTransport::PlainTextPost => {
                let body = serde_json::to_string(record).map_err(|err| {
                    SubmissionError::Unknown(format!("unable to encode record: {err}"))
                })?;
                client
                    .post(self.url.clone())
                    .header(CONTENT_TYPE, mime::TEXT_PLAIN.as_ref())
                    .body(body)
            }
        };

        let body = execute(request).await?;
        let reply: ScriptReply = serde_json::from_str(&body).map_err(|err| {
            SubmissionError::Unknown(format!("unreadable Apps Script response: {err}"))
        })?;

        if reply.success {
            Ok(SubmissionReceipt::default())
        } else {
            Err(SubmissionError::Transport {
                status: None,
                detail: reply
                    .error
                    .or(reply.message)
                    .unwrap_or_else(|| "script reported failure".to_string()),
            })
        }
    }
}

#[derive(Deserialize)]
struct ScriptReply {
    success: bool,
    message: Option<String>,
    error: Option<String>,
}
