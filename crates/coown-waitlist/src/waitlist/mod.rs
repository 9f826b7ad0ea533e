//! Waitlist signup: the multi-step wizard, its submission gateway and the HTTP route
//! the landing page posts to.

pub mod countdown;
pub mod domain;
pub mod gateway;
pub mod router;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use countdown::{CommunityLinks, RedirectCountdown, Redirector};
pub use domain::{
    ChoiceOption, ContactDetails, OutboundRecord, TypeSpecificDetails, UserType, WaitlistEntry,
    EXPERIENCE_OPTIONS, INVESTMENT_BUDGET_OPTIONS,
};
pub use gateway::{
    AirtableBackend, AppsScriptBackend, HttpSubmissionGateway, ScriptTransport,
    SubmissionError, SubmissionGateway, SubmissionReceipt, WaitlistBackend,
};
pub use router::{waitlist_router, SignupRejection, SignupResponse, WaitlistSignupRequest};
pub use wizard::{DraftFields, WizardError, WizardField, WizardSession, WizardStep};
