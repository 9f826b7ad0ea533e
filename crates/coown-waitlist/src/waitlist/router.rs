use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

use super::domain::{ContactDetails, TypeSpecificDetails, UserType, WaitlistEntry};
use super::gateway::SubmissionGateway;
use super::wizard::{is_present, WizardField};

/// JSON body accepted by the signup endpoint. Every field is optional on the wire so
/// missing values produce a 400 instead of a deserialization rejection. The body is
/// read whatever its declared content type, so `text/plain` posts are accepted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistSignupRequest {
    pub user_type: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub investment_budget: Option<String>,
    pub agency_name: Option<String>,
    pub experience: Option<String>,
}

/// Reasons a signup body cannot be turned into an entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignupRejection {
    #[error("request body is not a signup object")]
    UnreadableBody,
    #[error("missing or unknown user type")]
    UserType,
    #[error("missing required fields")]
    MissingFields(Vec<WizardField>),
}

impl WaitlistSignupRequest {
    /// Applies the same presence rules as the wizard. Fields belonging to the other
    /// audience are dropped.
    pub fn into_entry(self, submitted_at: DateTime<Utc>) -> Result<WaitlistEntry, SignupRejection> {
        let user_type = self
            .user_type
            .as_deref()
            .and_then(UserType::parse)
            .ok_or(SignupRejection::UserType)?;

        let mut missing = Vec::new();
        let mut take = |field: WizardField, value: Option<String>| match value {
            Some(value) if is_present(&value) => value,
            _ => {
                missing.push(field);
                String::new()
            }
        };

        let contact = ContactDetails {
            full_name: take(WizardField::FullName, self.full_name),
            email: take(WizardField::Email, self.email),
            phone: take(WizardField::Phone, self.phone),
        };

        let details = match user_type {
            UserType::CoOwner => TypeSpecificDetails::CoOwner {
                investment_budget: take(WizardField::InvestmentBudget, self.investment_budget),
            },
            UserType::Realtor => TypeSpecificDetails::Realtor {
                agency_name: take(WizardField::AgencyName, self.agency_name),
                experience: take(WizardField::Experience, self.experience),
            },
        };

        if !missing.is_empty() {
            return Err(SignupRejection::MissingFields(missing));
        }

        Ok(WaitlistEntry {
            contact,
            details,
            submitted_at,
        })
    }
}

/// Success body returned to the landing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

/// Router exposing the waitlist signup endpoint.
pub fn waitlist_router<G>(gateway: Arc<G>) -> Router
where
    G: SubmissionGateway + 'static,
{
    Router::new()
        .route("/api/waitlist", post(signup_handler::<G>))
        .with_state(gateway)
}

async fn signup_handler<G>(
    State(gateway): State<Arc<G>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SignupResponse>, AppError>
where
    G: SubmissionGateway + 'static,
{
    let request = body
        .ok()
        .and_then(|bytes| serde_json::from_slice::<WaitlistSignupRequest>(&bytes).ok())
        .ok_or(SignupRejection::UnreadableBody)?;
    let entry = request.into_entry(Utc::now())?;
    let receipt = gateway.submit(&entry).await?;

    Ok(Json(SignupResponse {
        success: true,
        message: "Successfully joined the waitlist".to_string(),
        record_id: receipt.record_id,
    }))
}

impl SignupRejection {
    /// Wire names of the fields that caused the rejection.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        match self {
            Self::UnreadableBody => Vec::new(),
            Self::UserType => vec!["userType"],
            Self::MissingFields(fields) => fields.iter().map(|field| wire_name(*field)).collect(),
        }
    }
}

fn wire_name(field: WizardField) -> &'static str {
    match field {
        WizardField::FullName => "fullName",
        WizardField::Email => "email",
        WizardField::Phone => "phone",
        WizardField::InvestmentBudget => "investmentBudget",
        WizardField::AgencyName => "agencyName",
        WizardField::Experience => "experience",
    }
}
