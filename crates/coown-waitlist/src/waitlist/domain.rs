use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Audience segment a visitor signs up as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserType {
    #[serde(rename = "coowner")]
    CoOwner,
    #[serde(rename = "realtor")]
    Realtor,
}

impl UserType {
    pub const fn ordered() -> [Self; 2] {
        [Self::CoOwner, Self::Realtor]
    }

    /// Human-readable label written to the backend.
    pub const fn label(self) -> &'static str {
        match self {
            Self::CoOwner => "Property Co-Owner",
            Self::Realtor => "Realtor",
        }
    }

    /// Value used on the wire and in CLI arguments.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CoOwner => "coowner",
            Self::Realtor => "realtor",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "coowner" | "co-owner" | "co_owner" => Some(Self::CoOwner),
            "realtor" => Some(Self::Realtor),
            _ => None,
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Selectable option for the fixed-choice inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChoiceOption {
    pub value: &'static str,
    pub label: &'static str,
}

pub const INVESTMENT_BUDGET_OPTIONS: [ChoiceOption; 3] = [
    ChoiceOption {
        value: "below-5m",
        label: "Below ₦5 million",
    },
    ChoiceOption {
        value: "5m-10m",
        label: "₦5 million - ₦10 million",
    },
    ChoiceOption {
        value: "10m+",
        label: "Above ₦10 million",
    },
];

pub const EXPERIENCE_OPTIONS: [ChoiceOption; 4] = [
    ChoiceOption {
        value: "0-2",
        label: "0-2 years",
    },
    ChoiceOption {
        value: "3-5",
        label: "3-5 years",
    },
    ChoiceOption {
        value: "6-10",
        label: "6-10 years",
    },
    ChoiceOption {
        value: "10+",
        label: "10+ years",
    },
];

/// Contact fields collected from every visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub full_name: String,
    pub email: String,
    pub phone: String,
}

/// Fields that only apply to one audience segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "user_type", rename_all = "snake_case")]
pub enum TypeSpecificDetails {
    #[serde(rename = "coowner")]
    CoOwner { investment_budget: String },
    Realtor {
        agency_name: String,
        experience: String,
    },
}

impl TypeSpecificDetails {
    pub const fn user_type(&self) -> UserType {
        match self {
            Self::CoOwner { .. } => UserType::CoOwner,
            Self::Realtor { .. } => UserType::Realtor,
        }
    }
}

/// Finalized signup handed to the submission gateway exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub contact: ContactDetails,
    pub details: TypeSpecificDetails,
    pub submitted_at: DateTime<Utc>,
}

impl WaitlistEntry {
    pub fn user_type(&self) -> UserType {
        self.details.user_type()
    }

    /// Flattens the entry into the column layout shared by every backend.
    pub fn outbound_record(&self) -> OutboundRecord {
        let (investment_budget, agency_name, experience) = match &self.details {
            TypeSpecificDetails::CoOwner { investment_budget } => {
                (Some(investment_budget.clone()), None, None)
            }
            TypeSpecificDetails::Realtor {
                agency_name,
                experience,
            } => (None, Some(agency_name.clone()), Some(experience.clone())),
        };

        OutboundRecord {
            timestamp: self
                .submitted_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            user_type: self.user_type().label(),
            full_name: self.contact.full_name.clone(),
            email: self.contact.email.clone(),
            phone: self.contact.phone.clone(),
            investment_budget,
            agency_name,
            experience,
        }
    }
}

/// Wire representation sent to spreadsheet backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundRecord {
    pub timestamp: String,
    pub user_type: &'static str,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investment_budget: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
}

impl OutboundRecord {
    /// Ordered key/value pairs for query-string transports.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![
            ("timestamp", self.timestamp.as_str()),
            ("userType", self.user_type),
            ("fullName", self.full_name.as_str()),
            ("email", self.email.as_str()),
            ("phone", self.phone.as_str()),
        ];
        if let Some(budget) = &self.investment_budget {
            pairs.push(("investmentBudget", budget.as_str()));
        }
        if let Some(agency) = &self.agency_name {
            pairs.push(("agencyName", agency.as_str()));
        }
        if let Some(experience) = &self.experience {
            pairs.push(("experience", experience.as_str()));
        }
        pairs
    }
}
