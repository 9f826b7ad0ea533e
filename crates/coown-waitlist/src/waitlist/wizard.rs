//! Multi-step signup wizard.
//!
//! A [`WizardSession`] lives for one page load. It walks
//! `Intro → ChooseType → Details → TypeSpecific → Submitting → Submitted | Failed`,
//! keeps every typed value across back/forward navigation and only builds a
//! [`WaitlistEntry`] once the required fields for the chosen audience are present.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::countdown::{CommunityLinks, RedirectCountdown, Redirector};
use super::domain::{ContactDetails, TypeSpecificDetails, UserType, WaitlistEntry};
use super::gateway::{SubmissionError, SubmissionGateway, SubmissionReceipt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Intro,
    ChooseType,
    Details,
    TypeSpecific,
    Submitting,
    Submitted,
    Failed,
}

impl WizardStep {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Intro => "Welcome",
            Self::ChooseType => "Choose your path",
            Self::Details => "Your details",
            Self::TypeSpecific => "Almost done",
            Self::Submitting => "Submitting",
            Self::Submitted => "You're on the list",
            Self::Failed => "Something went wrong",
        }
    }

    /// Position in the visible progress indicator, for the three input steps.
    pub const fn position(self) -> Option<u8> {
        match self {
            Self::ChooseType => Some(1),
            Self::Details => Some(2),
            Self::TypeSpecific | Self::Failed => Some(3),
            Self::Intro | Self::Submitting | Self::Submitted => None,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WizardField {
    FullName,
    Email,
    Phone,
    InvestmentBudget,
    AgencyName,
    Experience,
}

impl WizardField {
    pub const fn label(self) -> &'static str {
        match self {
            Self::FullName => "Full name",
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::InvestmentBudget => "Investment budget",
            Self::AgencyName => "Agency name",
            Self::Experience => "Experience",
        }
    }

    const fn is_contact(self) -> bool {
        matches!(self, Self::FullName | Self::Email | Self::Phone)
    }

    const fn applies_to(self, user_type: UserType) -> bool {
        match self {
            Self::FullName | Self::Email | Self::Phone => true,
            Self::InvestmentBudget => matches!(user_type, UserType::CoOwner),
            Self::AgencyName | Self::Experience => matches!(user_type, UserType::Realtor),
        }
    }
}

const CONTACT_FIELDS: &[WizardField] = &[
    WizardField::FullName,
    WizardField::Email,
    WizardField::Phone,
];
const CO_OWNER_FIELDS: &[WizardField] = &[WizardField::InvestmentBudget];
const REALTOR_FIELDS: &[WizardField] = &[WizardField::AgencyName, WizardField::Experience];

/// Fields required to leave the type-specific step for a given audience.
pub const fn type_specific_fields(user_type: UserType) -> &'static [WizardField] {
    match user_type {
        UserType::CoOwner => CO_OWNER_FIELDS,
        UserType::Realtor => REALTOR_FIELDS,
    }
}

/// Presence-only check shared by the wizard and the HTTP route.
pub fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Raw values typed so far. Nothing is cleared when navigating.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftFields {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub investment_budget: String,
    pub agency_name: String,
    pub experience: String,
}

impl DraftFields {
    pub fn get(&self, field: WizardField) -> &str {
        match field {
            WizardField::FullName => &self.full_name,
            WizardField::Email => &self.email,
            WizardField::Phone => &self.phone,
            WizardField::InvestmentBudget => &self.investment_budget,
            WizardField::AgencyName => &self.agency_name,
            WizardField::Experience => &self.experience,
        }
    }

    fn slot_mut(&mut self, field: WizardField) -> &mut String {
        match field {
            WizardField::FullName => &mut self.full_name,
            WizardField::Email => &mut self.email,
            WizardField::Phone => &mut self.phone,
            WizardField::InvestmentBudget => &mut self.investment_budget,
            WizardField::AgencyName => &mut self.agency_name,
            WizardField::Experience => &mut self.experience,
        }
    }

    fn missing(&self, fields: &[WizardField]) -> Vec<WizardField> {
        fields
            .iter()
            .copied()
            .filter(|field| !is_present(self.get(*field)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("missing required fields: {}", field_labels(.missing))]
    Validation { missing: Vec<WizardField> },
    #[error("cannot {action} while on step '{step}'")]
    InvalidTransition {
        step: WizardStep,
        action: &'static str,
    },
    #[error("user type already chosen as {chosen}")]
    UserTypeLocked { chosen: UserType },
    #[error("input is locked while on step '{step}'")]
    InputLocked { step: WizardStep },
    #[error("{} cannot be edited on step '{step}'", .field.label())]
    FieldNotEditable { field: WizardField, step: WizardStep },
    #[error("a submission is already in flight")]
    SubmissionInFlight,
}

fn field_labels(fields: &[WizardField]) -> String {
    fields
        .iter()
        .map(|field| field.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Per-visitor wizard state. Dropping the session cancels any pending redirect.
#[derive(Debug)]
pub struct WizardSession {
    step: WizardStep,
    user_type: Option<UserType>,
    fields: DraftFields,
    last_error: Option<String>,
    record_id: Option<String>,
    countdown: Option<RedirectCountdown>,
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardSession {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Intro,
            user_type: None,
            fields: DraftFields::default(),
            last_error: None,
            record_id: None,
            countdown: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn user_type(&self) -> Option<UserType> {
        self.user_type
    }

    pub fn fields(&self) -> &DraftFields {
        &self.fields
    }

    /// One-line message shown while in [`WizardStep::Failed`].
    pub fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    pub fn countdown(&self) -> Option<&RedirectCountdown> {
        self.countdown.as_ref()
    }

    pub fn start(&mut self) -> Result<(), WizardError> {
        self.expect_step(&[WizardStep::Intro], "start")?;
        self.step = WizardStep::ChooseType;
        Ok(())
    }

    /// Records the audience and moves to the contact step. The first choice sticks.
    pub fn choose_type(&mut self, user_type: UserType) -> Result<(), WizardError> {
        self.expect_step(&[WizardStep::ChooseType], "choose a user type")?;
        if let Some(chosen) = self.user_type {
            if chosen != user_type {
                return Err(WizardError::UserTypeLocked { chosen });
            }
        }
        self.user_type = Some(user_type);
        self.step = WizardStep::Details;
        Ok(())
    }

    pub fn set_field(
        &mut self,
        field: WizardField,
        value: impl Into<String>,
    ) -> Result<(), WizardError> {
        let editable = match self.step {
            WizardStep::Submitting | WizardStep::Submitted => {
                return Err(WizardError::InputLocked { step: self.step })
            }
            WizardStep::Details => field.is_contact(),
            WizardStep::TypeSpecific | WizardStep::Failed => {
                !field.is_contact()
                    && self
                        .user_type
                        .is_some_and(|user_type| field.applies_to(user_type))
            }
            WizardStep::Intro | WizardStep::ChooseType => false,
        };

        if !editable {
            return Err(WizardError::FieldNotEditable {
                field,
                step: self.step,
            });
        }

        *self.fields.slot_mut(field) = value.into();
        if self.step == WizardStep::Failed {
            self.step = WizardStep::TypeSpecific;
            self.last_error = None;
        }
        Ok(())
    }

    /// Required fields of the current step that are still empty.
    pub fn missing_fields(&self) -> Vec<WizardField> {
        match (self.step, self.user_type) {
            (WizardStep::Details, _) => self.fields.missing(CONTACT_FIELDS),
            (WizardStep::TypeSpecific | WizardStep::Failed, Some(user_type)) => {
                self.fields.missing(type_specific_fields(user_type))
            }
            _ => Vec::new(),
        }
    }

    pub fn can_continue(&self) -> bool {
        self.step == WizardStep::Details && self.missing_fields().is_empty()
    }

    pub fn can_submit(&self) -> bool {
        matches!(self.step, WizardStep::TypeSpecific | WizardStep::Failed)
            && self.user_type.is_some()
            && self.missing_fields().is_empty()
    }

    /// Moves from the contact step to the type-specific step.
    pub fn advance(&mut self) -> Result<(), WizardError> {
        self.expect_step(&[WizardStep::Details], "continue")?;
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(WizardError::Validation { missing });
        }
        self.step = WizardStep::TypeSpecific;
        Ok(())
    }

    pub fn go_back(&mut self) -> Result<(), WizardError> {
        self.step = match self.step {
            WizardStep::ChooseType => WizardStep::Intro,
            WizardStep::Details => WizardStep::ChooseType,
            WizardStep::TypeSpecific | WizardStep::Failed => WizardStep::Details,
            step => {
                return Err(WizardError::InvalidTransition {
                    step,
                    action: "go back",
                })
            }
        };
        self.last_error = None;
        Ok(())
    }

    /// Finalizes the entry and locks input. No network call happens here.
    pub fn begin_submission(&mut self, now: DateTime<Utc>) -> Result<WaitlistEntry, WizardError> {
        if self.step == WizardStep::Submitting {
            return Err(WizardError::SubmissionInFlight);
        }
        self.expect_step(&[WizardStep::TypeSpecific, WizardStep::Failed], "submit")?;
        let Some(user_type) = self.user_type else {
            return Err(WizardError::InvalidTransition {
                step: self.step,
                action: "submit",
            });
        };

        let mut missing = self.fields.missing(CONTACT_FIELDS);
        missing.extend(self.fields.missing(type_specific_fields(user_type)));
        if !missing.is_empty() {
            return Err(WizardError::Validation { missing });
        }

        let fields = &self.fields;
        let details = match user_type {
            UserType::CoOwner => TypeSpecificDetails::CoOwner {
                investment_budget: fields.investment_budget.clone(),
            },
            UserType::Realtor => TypeSpecificDetails::Realtor {
                agency_name: fields.agency_name.clone(),
                experience: fields.experience.clone(),
            },
        };

        let entry = WaitlistEntry {
            contact: ContactDetails {
                full_name: fields.full_name.clone(),
                email: fields.email.clone(),
                phone: fields.phone.clone(),
            },
            details,
            submitted_at: now,
        };

        self.step = WizardStep::Submitting;
        self.last_error = None;
        Ok(entry)
    }

    /// Applies the gateway outcome. Field values are kept either way.
    pub fn finish_submission(
        &mut self,
        outcome: Result<SubmissionReceipt, SubmissionError>,
    ) -> Result<WizardStep, WizardError> {
        self.expect_step(&[WizardStep::Submitting], "finish a submission")?;

        match outcome {
            Ok(receipt) => {
                info!(
                    user_type = self.user_type.map(UserType::as_str).unwrap_or("-"),
                    "waitlist signup completed"
                );
                self.record_id = receipt.record_id;
                self.step = WizardStep::Submitted;
            }
            Err(err) => {
                warn!(error = %err, "waitlist signup failed");
                self.last_error = Some(err.user_message().to_string());
                self.step = WizardStep::Failed;
            }
        }

        Ok(self.step)
    }

    /// Submits through `gateway` exactly once and returns the resulting step.
    pub async fn submit<G>(&mut self, gateway: &G) -> Result<WizardStep, WizardError>
    where
        G: SubmissionGateway,
    {
        let entry = self.begin_submission(Utc::now())?;
        let outcome = gateway.submit(&entry).await;
        self.finish_submission(outcome)
    }

    /// Starts the redirect countdown to the community link for this session's
    /// audience. Returns `false` when no link is configured for it.
    pub fn start_redirect(
        &mut self,
        links: &CommunityLinks,
        seconds: u64,
        redirector: Arc<dyn Redirector>,
    ) -> Result<bool, WizardError> {
        self.expect_step(&[WizardStep::Submitted], "start the redirect")?;
        let Some(target) = self.user_type.and_then(|user_type| links.link_for(user_type)) else {
            return Ok(false);
        };

        self.countdown = Some(RedirectCountdown::start(
            target.clone(),
            seconds,
            redirector,
        ));
        Ok(true)
    }

    /// Waits for a running countdown to finish. Returns immediately without one.
    pub async fn wait_for_redirect(&mut self) {
        if let Some(countdown) = self.countdown.as_mut() {
            countdown.wait().await;
        }
    }

    /// Cancels anything scheduled on behalf of the session.
    pub fn teardown(&mut self) {
        if let Some(mut countdown) = self.countdown.take() {
            countdown.cancel();
        }
    }

    fn expect_step(&self, allowed: &[WizardStep], action: &'static str) -> Result<(), WizardError> {
        if allowed.contains(&self.step) {
            Ok(())
        } else {
            Err(WizardError::InvalidTransition {
                step: self.step,
                action,
            })
        }
    }
}
