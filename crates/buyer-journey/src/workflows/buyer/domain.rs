use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::accounts::UserId;

/// Ordered phases a buyer moves through from first planning to key handover.
///
/// Deserialization is lenient: stored rows with an unknown phase read as `Planning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JourneyPhase {
    Planning,
    Searching,
    Viewing,
    Reserving,
    Financing,
    Legal,
    Completion,
}

impl JourneyPhase {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Planning,
            Self::Searching,
            Self::Viewing,
            Self::Reserving,
            Self::Financing,
            Self::Legal,
            Self::Completion,
        ]
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Planning => 0,
            Self::Searching => 1,
            Self::Viewing => 2,
            Self::Reserving => 3,
            Self::Financing => 4,
            Self::Legal => 5,
            Self::Completion => 6,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Planning => "Planning",
            Self::Searching => "Searching",
            Self::Viewing => "Viewing",
            Self::Reserving => "Reserving",
            Self::Financing => "Financing",
            Self::Legal => "Legal",
            Self::Completion => "Completion",
        }
    }

    /// Parse a loosely formatted phase name; anything unrecognised is treated as planning.
    pub fn from_str_lossy(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "SEARCHING" => Self::Searching,
            "VIEWING" => Self::Viewing,
            "RESERVING" => Self::Reserving,
            "FINANCING" => Self::Financing,
            "LEGAL" => Self::Legal,
            "COMPLETION" => Self::Completion,
            _ => Self::Planning,
        }
    }
}

impl<'de> Deserialize<'de> for JourneyPhase {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_str_lossy(&raw))
    }
}

/// Self-declared finances captured on the buyer profile. Amounts are whole euros.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialDetails {
    pub annual_income: Option<u32>,
    pub savings: Option<u32>,
    pub monthly_debts: Option<u32>,
    pub deposit_amount: Option<u32>,
    pub max_budget: Option<u32>,
    pub htb_amount: Option<u32>,
}

impl FinancialDetails {
    pub fn is_populated(&self) -> bool {
        [
            self.annual_income,
            self.savings,
            self.monthly_debts,
            self.deposit_amount,
            self.max_budget,
            self.htb_amount,
        ]
        .iter()
        .any(Option::is_some)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPreferences {
    #[serde(default)]
    pub preferred_areas: Vec<String>,
    #[serde(default)]
    pub property_types: Vec<String>,
    pub min_bedrooms: Option<u8>,
    pub max_bedrooms: Option<u8>,
    pub max_price: Option<u32>,
}

impl SearchPreferences {
    pub fn is_populated(&self) -> bool {
        !self.preferred_areas.is_empty()
            || !self.property_types.is_empty()
            || self.min_bedrooms.is_some()
            || self.max_bedrooms.is_some()
            || self.max_price.is_some()
    }
}

/// Government scheme participation (Help-to-Buy, first-home schemes).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernmentSchemes {
    pub first_home_buyer: Option<bool>,
    pub htb_application_status: Option<String>,
}

/// Buyer-owned profile. `current_journey_phase` is a cached copy of the journey phase and is
/// written independently of [`BuyerJourney::current_phase`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerProfile {
    pub user_id: UserId,
    pub financial_details: Option<FinancialDetails>,
    pub preferences: Option<SearchPreferences>,
    pub government_schemes: Option<GovernmentSchemes>,
    pub current_journey_phase: JourneyPhase,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BuyerProfile {
    pub fn has_financial_details(&self) -> bool {
        self.financial_details
            .as_ref()
            .is_some_and(FinancialDetails::is_populated)
    }

    pub fn has_preferences(&self) -> bool {
        self.preferences
            .as_ref()
            .is_some_and(SearchPreferences::is_populated)
    }
}

/// Append-only record of a phase the journey entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseHistoryEntry {
    pub phase: JourneyPhase,
    pub phase_start_date: DateTime<Utc>,
    pub phase_end_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffordabilityCheck {
    pub id: String,
    pub max_property_price: u32,
    pub deposit_amount: u32,
    pub max_mortgage: u32,
    pub monthly_repayment: u32,
    pub htb_amount: Option<u32>,
    pub loan_to_value: f32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MortgageApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Withdrawn,
}

impl MortgageApplicationStatus {
    pub const fn is_in_flight(self) -> bool {
        matches!(self, Self::Submitted | Self::UnderReview)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MortgageApplication {
    pub id: String,
    pub lender: String,
    pub amount: u32,
    pub status: MortgageApplicationStatus,
    pub application_date: DateTime<Utc>,
}

/// Journey aggregate. Owns its phase history, affordability checks and mortgage applications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerJourney {
    pub buyer_id: UserId,
    pub current_phase: JourneyPhase,
    pub start_date: DateTime<Utc>,
    pub target_move_in_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    #[serde(default)]
    pub phase_history: Vec<PhaseHistoryEntry>,
    #[serde(default)]
    pub affordability_checks: Vec<AffordabilityCheck>,
    #[serde(default)]
    pub mortgage_applications: Vec<MortgageApplication>,
}

impl BuyerJourney {
    /// History entry for the phase currently in progress (latest start date).
    pub fn current_phase_entry(&self) -> Option<&PhaseHistoryEntry> {
        self.phase_history
            .iter()
            .max_by_key(|entry| entry.phase_start_date)
    }

    pub fn latest_affordability_check(&self) -> Option<&AffordabilityCheck> {
        self.affordability_checks
            .iter()
            .max_by_key(|check| check.created_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MortgageStatus {
    Initial,
    ApplicationSubmitted,
    UnderReview,
    AdditionalInfoRequired,
    AipIssued,
    FormalApplication,
    SurveyOrdered,
    SurveyCompleted,
    ValuationComplete,
    Underwriting,
    OfferIssued,
    OfferAccepted,
    LegalProcess,
    FundsReleased,
    Completed,
    Rejected,
    Withdrawn,
}

impl MortgageStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Initial => "Getting Started",
            Self::ApplicationSubmitted => "Application Submitted",
            Self::UnderReview => "Under Review",
            Self::AdditionalInfoRequired => "Info Required",
            Self::AipIssued => "AIP Issued",
            Self::FormalApplication => "Formal Application",
            Self::SurveyOrdered => "Survey Ordered",
            Self::SurveyCompleted => "Survey Complete",
            Self::ValuationComplete => "Valuation Complete",
            Self::Underwriting => "Underwriting",
            Self::OfferIssued => "Offer Issued",
            Self::OfferAccepted => "Offer Accepted",
            Self::LegalProcess => "Legal Process",
            Self::FundsReleased => "Funds Released",
            Self::Completed => "Completed",
            Self::Rejected => "Rejected",
            Self::Withdrawn => "Withdrawn",
        }
    }

    /// Lender has issued a formal offer (or gone further).
    pub const fn is_approved(self) -> bool {
        matches!(
            self,
            Self::OfferIssued
                | Self::OfferAccepted
                | Self::LegalProcess
                | Self::FundsReleased
                | Self::Completed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MortgageDocument {
    pub name: String,
    pub document_type: String,
    pub upload_date: DateTime<Utc>,
}

/// Lender-side mortgage progress for a buyer (at most one per user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MortgageTracking {
    pub user_id: UserId,
    pub status: MortgageStatus,
    pub lender: Option<String>,
    pub amount: Option<u32>,
    pub aip_date: Option<DateTime<Utc>>,
    pub aip_expiry_date: Option<DateTime<Utc>>,
    pub formal_offer_date: Option<DateTime<Utc>>,
    pub offer_expiry_date: Option<DateTime<Utc>>,
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub documents: Vec<MortgageDocument>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuyerEventType {
    ProfileCreated,
    ProfileUpdated,
    PhaseChanged,
    AffordabilityCheck,
    PropertyReserved,
    MortgageApplied,
    SnagCreated,
    DocumentUploaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuyerEventCategory {
    Profile,
    Journey,
    Financial,
    Property,
    Document,
}

impl BuyerEventType {
    pub const fn category(self) -> BuyerEventCategory {
        match self {
            Self::ProfileCreated | Self::ProfileUpdated => BuyerEventCategory::Profile,
            Self::PhaseChanged => BuyerEventCategory::Journey,
            Self::AffordabilityCheck | Self::MortgageApplied => BuyerEventCategory::Financial,
            Self::PropertyReserved | Self::SnagCreated => BuyerEventCategory::Property,
            Self::DocumentUploaded => BuyerEventCategory::Document,
        }
    }
}

/// Append-only activity log entry for a buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerEvent {
    pub id: String,
    pub buyer_id: UserId,
    pub event_type: BuyerEventType,
    pub description: String,
    pub event_date: DateTime<Utc>,
}
