use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::UserId;

/// Verification status, also cached on the account record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KycStatus {
    #[default]
    NotStarted,
    Pending,
    InReview,
    Approved,
    Rejected,
    Expired,
}

impl KycStatus {
    pub const fn all() -> [Self; 6] {
        [
            Self::NotStarted,
            Self::Pending,
            Self::InReview,
            Self::Approved,
            Self::Rejected,
            Self::Expired,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::Pending => "PENDING",
            Self::InReview => "IN_REVIEW",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Expired => "EXPIRED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let wanted = value.trim();
        Self::all()
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
    }

    pub const fn awaiting_review(self) -> bool {
        matches!(self, Self::Pending | Self::InReview)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdDocumentType {
    Passport,
    DrivingLicence,
    NationalIdCard,
}

/// Applicant-entered identity details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub eircode: Option<String>,
    pub pps_number: Option<String>,
    pub id_type: Option<IdDocumentType>,
    pub id_number: Option<String>,
    pub occupation: Option<String>,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|text| !text.trim().is_empty())
}

impl PersonalInfo {
    pub fn is_complete(&self) -> bool {
        present(&self.first_name)
            && present(&self.last_name)
            && self.date_of_birth.is_some()
            && present(&self.nationality)
            && present(&self.address_line1)
            && present(&self.city)
            && present(&self.pps_number)
            && present(&self.id_number)
    }
}

/// Storage references for the uploaded verification images.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationImages {
    pub id_front: Option<String>,
    pub id_back: Option<String>,
    pub selfie: Option<String>,
    pub address_proof: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
    IdFront,
    IdBack,
    Selfie,
    AddressProof,
}

impl DocumentKind {
    pub const fn ordered() -> [Self; 4] {
        [Self::IdFront, Self::IdBack, Self::Selfie, Self::AddressProof]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::IdFront => "Identity document (front)",
            Self::IdBack => "Identity document (back)",
            Self::Selfie => "Selfie",
            Self::AddressProof => "Proof of address",
        }
    }
}

impl VerificationImages {
    pub fn reference(&self, kind: DocumentKind) -> Option<&str> {
        let slot = match kind {
            DocumentKind::IdFront => &self.id_front,
            DocumentKind::IdBack => &self.id_back,
            DocumentKind::Selfie => &self.selfie,
            DocumentKind::AddressProof => &self.address_proof,
        };
        slot.as_deref().filter(|value| !value.trim().is_empty())
    }

    pub fn has(&self, kind: DocumentKind) -> bool {
        self.reference(kind).is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceCheckType {
    Sanctions,
    PoliticallyExposed,
    AdverseMedia,
    IdentityDocument,
    AddressVerification,
}

impl ComplianceCheckType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sanctions => "Sanctions screening",
            Self::PoliticallyExposed => "PEP screening",
            Self::AdverseMedia => "Adverse media",
            Self::IdentityDocument => "Identity document",
            Self::AddressVerification => "Address verification",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceCheckStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceResult {
    Clear,
    ReviewRequired,
    Match,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceCheck {
    pub id: String,
    pub check_type: ComplianceCheckType,
    pub status: ComplianceCheckStatus,
    pub result: Option<ComplianceResult>,
    #[serde(default)]
    pub flags: Vec<String>,
    pub checked_at: Option<DateTime<Utc>>,
}

/// Append-only status transition log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationHistoryEntry {
    pub from_status: KycStatus,
    pub to_status: KycStatus,
    pub changed_by: Option<UserId>,
    pub notes: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// Verification aggregate (one per user). Owns compliance checks and history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycVerification {
    pub user_id: UserId,
    pub personal_info: PersonalInfo,
    pub images: VerificationImages,
    pub status: KycStatus,
    pub risk_score: Option<u8>,
    pub is_politically_exposed: bool,
    pub is_high_risk_country: bool,
    #[serde(default)]
    pub compliance_flags: Vec<String>,
    pub review_notes: Option<String>,
    pub reviewed_by: Option<UserId>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub compliance_checks: Vec<ComplianceCheck>,
    #[serde(default)]
    pub history: Vec<VerificationHistoryEntry>,
}

/// Reviewer decision applied atomically to the verification, the account and the history log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KycReviewDecision {
    pub status: KycStatus,
    pub review_notes: Option<String>,
    pub reviewer_id: UserId,
    pub risk_score: Option<u8>,
    pub compliance_flags: Option<Vec<String>>,
    pub decided_at: DateTime<Utc>,
}

impl KycVerification {
    /// Apply a review in place and return the history row describing the transition.
    pub fn apply_review(&mut self, decision: &KycReviewDecision) -> VerificationHistoryEntry {
        let entry = VerificationHistoryEntry {
            from_status: self.status,
            to_status: decision.status,
            changed_by: Some(decision.reviewer_id.clone()),
            notes: decision.review_notes.clone(),
            changed_at: decision.decided_at,
        };

        self.status = decision.status;
        self.review_notes = decision.review_notes.clone();
        self.reviewed_by = Some(decision.reviewer_id.clone());
        self.reviewed_at = Some(decision.decided_at);
        if let Some(score) = decision.risk_score {
            self.risk_score = Some(score);
        }
        if let Some(flags) = &decision.compliance_flags {
            self.compliance_flags = flags.clone();
        }
        self.history.push(entry.clone());

        entry
    }
}
