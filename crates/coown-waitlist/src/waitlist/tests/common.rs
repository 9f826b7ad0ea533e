use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::Value;
use url::Url;

use crate::waitlist::countdown::{CommunityLinks, Redirector};
use crate::waitlist::domain::{UserType, WaitlistEntry};
use crate::waitlist::gateway::{SubmissionError, SubmissionGateway, SubmissionReceipt};
use crate::waitlist::wizard::{WizardField, WizardSession};

/// Gateway double returning queued outcomes and recording every entry it receives.
#[derive(Default)]
pub(super) struct ScriptedGateway {
    outcomes: Mutex<VecDeque<Result<SubmissionReceipt, SubmissionError>>>,
    calls: Mutex<Vec<WaitlistEntry>>,
}

impl ScriptedGateway {
    pub(super) fn with_outcomes(
        outcomes: impl IntoIterator<Item = Result<SubmissionReceipt, SubmissionError>>,
    ) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn accepting(record_id: &str) -> Self {
        Self::with_outcomes([Ok(receipt(record_id))])
    }

    pub(super) fn failing(error: SubmissionError) -> Self {
        Self::with_outcomes([Err(error)])
    }

    pub(super) fn calls(&self) -> Vec<WaitlistEntry> {
        self.calls.lock().expect("calls mutex").clone()
    }
}

impl SubmissionGateway for ScriptedGateway {
    async fn submit(&self, entry: &WaitlistEntry) -> Result<SubmissionReceipt, SubmissionError> {
        self.calls
            .lock()
            .expect("calls mutex")
            .push(entry.clone());
        self.outcomes
            .lock()
            .expect("outcomes mutex")
            .pop_front()
            .unwrap_or_else(|| Ok(SubmissionReceipt::default()))
    }
}

pub(super) fn receipt(record_id: &str) -> SubmissionReceipt {
    SubmissionReceipt {
        record_id: Some(record_id.to_string()),
    }
}

pub(super) fn transport_error() -> SubmissionError {
    SubmissionError::Transport {
        status: Some(502),
        detail: "bad gateway".to_string(),
    }
}

#[derive(Default)]
pub(super) struct RecordingRedirector {
    targets: Mutex<Vec<String>>,
}

impl RecordingRedirector {
    pub(super) fn targets(&self) -> Vec<String> {
        self.targets.lock().expect("redirect mutex").clone()
    }
}

impl Redirector for RecordingRedirector {
    fn redirect(&self, target: &Url) {
        self.targets
            .lock()
            .expect("redirect mutex")
            .push(target.to_string());
    }
}

pub(super) fn community_links() -> CommunityLinks {
    CommunityLinks {
        co_owner: Some(Url::parse("https://chat.example.com/coowners").expect("valid url")),
        realtor: Some(Url::parse("https://chat.example.com/realtors").expect("valid url")),
    }
}

/// Session parked on the contact step for `user_type`.
pub(super) fn session_on_details(user_type: UserType) -> WizardSession {
    let mut session = WizardSession::new();
    session.start().expect("intro starts");
    session.choose_type(user_type).expect("type chosen");
    session
}

pub(super) fn fill_contact(session: &mut WizardSession) {
    session
        .set_field(WizardField::FullName, "Ada Obi")
        .expect("name editable");
    session
        .set_field(WizardField::Email, "ada@example.com")
        .expect("email editable");
    session
        .set_field(WizardField::Phone, "+2348012345678")
        .expect("phone editable");
}

/// Co-owner session from the signup scenario, ready to submit.
pub(super) fn co_owner_ready() -> WizardSession {
    let mut session = session_on_details(UserType::CoOwner);
    fill_contact(&mut session);
    session.advance().expect("contact step complete");
    session
        .set_field(WizardField::InvestmentBudget, "10m+")
        .expect("budget editable");
    session
}

pub(super) fn realtor_ready() -> WizardSession {
    let mut session = session_on_details(UserType::Realtor);
    fill_contact(&mut session);
    session.advance().expect("contact step complete");
    session
        .set_field(WizardField::AgencyName, "Lekki Realty")
        .expect("agency editable");
    session
        .set_field(WizardField::Experience, "3-5")
        .expect("experience editable");
    session
}

/// Request observed by [`spawn_backend`].
#[derive(Debug, Clone)]
pub(super) struct CapturedRequest {
    pub(super) method: Method,
    pub(super) path: String,
    pub(super) query: Option<String>,
    pub(super) content_type: Option<String>,
    pub(super) authorization: Option<String>,
    pub(super) body: String,
}

impl CapturedRequest {
    pub(super) fn json_body(&self) -> Value {
        serde_json::from_str(&self.body).expect("json request body")
    }

    pub(super) fn query_value(&self, key: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.into_owned())
    }
}

#[derive(Clone)]
struct BackendState {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    status: StatusCode,
    body: &'static str,
}

async fn capture(
    State(state): State<BackendState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    state
        .requests
        .lock()
        .expect("requests mutex")
        .push(CapturedRequest {
            method,
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            content_type: header_value(header::CONTENT_TYPE),
            authorization: header_value(header::AUTHORIZATION),
            body,
        });

    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body,
    )
        .into_response()
}

/// Starts a spreadsheet-service stand-in that answers every request with `body`.
pub(super) async fn spawn_backend(
    status: StatusCode,
    body: &'static str,
) -> (SocketAddr, Arc<Mutex<Vec<CapturedRequest>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = BackendState {
        requests: requests.clone(),
        status,
        body,
    };
    let app = Router::new().fallback(capture).with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake backend");
    let addr = listener.local_addr().expect("fake backend address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake backend serves");
    });

    (addr, requests)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
