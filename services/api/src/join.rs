use chrono::Utc;
use clap::Args;
use coown_waitlist::config::AppConfig;
use coown_waitlist::error::AppError;
use coown_waitlist::telemetry;
use coown_waitlist::waitlist::{
    ChoiceOption, HttpSubmissionGateway, Redirector, SubmissionGateway, UserType, WizardField,
    WizardSession, EXPERIENCE_OPTIONS, INVESTMENT_BUDGET_OPTIONS,
};
use coown_waitlist::waitlist::wizard::{is_present, type_specific_fields};
use std::sync::Arc;
use url::Url;

#[derive(Args, Debug)]
pub(crate) struct JoinArgs {
    /// Audience to sign up as (coowner or realtor)
    #[arg(long, value_parser = parse_user_type)]
    pub(crate) user_type: UserType,
    #[arg(long)]
    pub(crate) full_name: String,
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long)]
    pub(crate) phone: String,
    /// Budget range for co-owners
    #[arg(long)]
    pub(crate) investment_budget: Option<String>,
    /// Agency name for realtors
    #[arg(long)]
    pub(crate) agency_name: Option<String>,
    /// Years of experience for realtors
    #[arg(long)]
    pub(crate) experience: Option<String>,
}

impl JoinArgs {
    fn value_for(&self, field: WizardField) -> &str {
        let value = match field {
            WizardField::FullName => Some(&self.full_name),
            WizardField::Email => Some(&self.email),
            WizardField::Phone => Some(&self.phone),
            WizardField::InvestmentBudget => self.investment_budget.as_ref(),
            WizardField::AgencyName => self.agency_name.as_ref(),
            WizardField::Experience => self.experience.as_ref(),
        };
        value.map(String::as_str).unwrap_or_default()
    }
}

fn choices_for(field: WizardField) -> &'static [ChoiceOption] {
    match field {
        WizardField::InvestmentBudget => &INVESTMENT_BUDGET_OPTIONS,
        WizardField::Experience => &EXPERIENCE_OPTIONS,
        WizardField::FullName
        | WizardField::Email
        | WizardField::Phone
        | WizardField::AgencyName => &[],
    }
}

/// Renders an answer with its option label when it is one of the listed choices.
fn describe(field: WizardField, value: &str) -> String {
    choices_for(field)
        .iter()
        .find(|option| option.value == value)
        .map(|option| format!("{} ({})", option.label, option.value))
        .unwrap_or_else(|| value.to_string())
}

fn missing_hint(field: WizardField) -> String {
    let choices = choices_for(field);
    if choices.is_empty() {
        return format!("{} is required", field.label());
    }
    let values: Vec<&str> = choices.iter().map(|option| option.value).collect();
    format!("{} is required, one of: {}", field.label(), values.join(", "))
}

fn parse_user_type(raw: &str) -> Result<UserType, String> {
    UserType::parse(raw).ok_or_else(|| format!("expected 'coowner' or 'realtor', got '{raw}'"))
}

struct StdoutRedirector;

impl Redirector for StdoutRedirector {
    fn redirect(&self, target: &Url) {
        println!("Opening community chat: {target}");
    }
}

/// Drives one wizard session through every step with the supplied answers.
fn fill_session(args: &JoinArgs) -> Result<WizardSession, AppError> {
    let mut session = WizardSession::new();
    session.start()?;
    session.choose_type(args.user_type)?;

    for field in [WizardField::FullName, WizardField::Email, WizardField::Phone] {
        session.set_field(field, args.value_for(field))?;
    }
    session.advance()?;

    for field in type_specific_fields(args.user_type) {
        session.set_field(*field, args.value_for(*field))?;
    }
    Ok(session)
}

pub(crate) async fn run_join(args: JoinArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let gateway = HttpSubmissionGateway::from_config(&config.waitlist)?;
    let mut session = fill_session(&args)?;

    println!("COOWN waitlist signup");
    println!("  Joining as: {}", args.user_type.label());
    for field in type_specific_fields(args.user_type) {
        let value = session.fields().get(*field);
        if is_present(value) {
            println!("  {}: {}", field.label(), describe(*field, value));
        }
    }
    for field in session.missing_fields() {
        println!("  Missing: {}", missing_hint(field));
    }

    submit_session(&mut session, &gateway).await?;
    println!("  Status: you're on the waitlist");
    if let Some(record_id) = session.record_id() {
        println!("  Record: {record_id}");
    }

    let seconds = config.waitlist.redirect_after_secs;
    let started = session.start_redirect(
        &config.waitlist.community,
        seconds,
        Arc::new(StdoutRedirector),
    )?;
    if started {
        println!("  Redirecting to the community in {seconds} seconds");
        session.wait_for_redirect().await;
    } else {
        println!("  No community link configured for this audience");
    }

    Ok(())
}

/// Submits once. A failed submission leaves the session in `Failed` and is
/// returned as an error so the process exits non-zero.
async fn submit_session<G>(session: &mut WizardSession, gateway: &G) -> Result<(), AppError>
where
    G: SubmissionGateway,
{
    let entry = session.begin_submission(Utc::now())?;
    let outcome = gateway.submit(&entry).await;
    let failure = outcome.as_ref().err().cloned();

    let step = session.finish_submission(outcome)?;
    match failure {
        Some(err) => {
            println!("  Status: {step}");
            if let Some(message) = session.error() {
                println!("  Error: {message}");
            }
            Err(err.into())
        }
        None => Ok(()),
    }
}
