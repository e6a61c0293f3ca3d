//! Risk scoring, verification progress gates, and next-step guidance for KYC records.

use serde::Serialize;

use super::domain::{
    ComplianceCheckStatus, ComplianceResult, DocumentKind, KycVerification,
};

const PEP_WEIGHT: u32 = 30;
const HIGH_RISK_COUNTRY_WEIGHT: u32 = 20;
const REVIEW_REQUIRED_WEIGHT: u32 = 15;
const MAX_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Classify a 0-100 score. Exactly 50 stays MEDIUM; HIGH starts above it.
    pub const fn from_score(score: u8) -> Self {
        if score >= 70 {
            Self::Critical
        } else if score > 50 {
            Self::High
        } else if score >= 30 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    const fn recommendation(self) -> &'static str {
        match self {
            Self::Critical => "Escalate to the compliance officer before any approval",
            Self::High => "Perform enhanced due diligence before approval",
            Self::Medium => "Verify source of funds before approval",
            Self::Low => "Standard verification procedures apply",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub score: u8,
    pub level: RiskLevel,
    pub factors: Vec<String>,
    pub recommendations: Vec<String>,
}

pub fn assess_risk(verification: &KycVerification) -> RiskAssessment {
    let mut score = u32::from(verification.risk_score.unwrap_or(0));
    let mut factors = Vec::new();
    let mut recommendations = Vec::new();

    if verification.is_politically_exposed {
        score += PEP_WEIGHT;
        factors.push("Politically exposed person".to_string());
        recommendations.push("Obtain senior management sign-off for the PEP relationship".to_string());
    }
    if verification.is_high_risk_country {
        score += HIGH_RISK_COUNTRY_WEIGHT;
        factors.push("Connection to a high-risk jurisdiction".to_string());
        recommendations.push("Confirm residency history and source of funds".to_string());
    }

    let mut needs_review = false;
    for check in &verification.compliance_checks {
        if check.result == Some(ComplianceResult::ReviewRequired) {
            score += REVIEW_REQUIRED_WEIGHT;
            needs_review = true;
            factors.push(format!("{} requires review", check.check_type.label()));
        }
        factors.extend(check.flags.iter().cloned());
    }
    if needs_review {
        recommendations.push("Resolve outstanding compliance check reviews".to_string());
    }

    let score = score.min(MAX_SCORE) as u8;
    let level = RiskLevel::from_score(score);
    recommendations.insert(0, level.recommendation().to_string());

    RiskAssessment {
        score,
        level,
        factors,
        recommendations,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStep {
    PersonalInfo,
    IdentityDocuments,
    AddressProof,
    ComplianceChecks,
}

impl VerificationStep {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::PersonalInfo,
            Self::IdentityDocuments,
            Self::AddressProof,
            Self::ComplianceChecks,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::PersonalInfo => "Personal information",
            Self::IdentityDocuments => "Identity documents",
            Self::AddressProof => "Proof of address",
            Self::ComplianceChecks => "Compliance checks",
        }
    }

    fn is_complete(self, verification: &KycVerification) -> bool {
        match self {
            Self::PersonalInfo => verification.personal_info.is_complete(),
            // Passports have no back page, so only front and selfie gate this step.
            Self::IdentityDocuments => {
                verification.images.has(DocumentKind::IdFront)
                    && verification.images.has(DocumentKind::Selfie)
            }
            Self::AddressProof => verification.images.has(DocumentKind::AddressProof),
            Self::ComplianceChecks => {
                !verification.compliance_checks.is_empty()
                    && verification
                        .compliance_checks
                        .iter()
                        .all(|check| check.status == ComplianceCheckStatus::Completed)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepStatus {
    pub step: VerificationStep,
    pub label: &'static str,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationProgress {
    pub completed_steps: usize,
    pub total_steps: usize,
    pub percentage: u8,
    pub steps: Vec<StepStatus>,
}

/// Gate-by-gate progress. A missing verification reports every gate open.
pub fn verification_progress(verification: Option<&KycVerification>) -> VerificationProgress {
    let steps: Vec<StepStatus> = VerificationStep::ordered()
        .into_iter()
        .map(|step| StepStatus {
            step,
            label: step.label(),
            completed: verification.is_some_and(|record| step.is_complete(record)),
        })
        .collect();
    let completed_steps = steps.iter().filter(|status| status.completed).count();
    let total_steps = steps.len();

    VerificationProgress {
        completed_steps,
        total_steps,
        percentage: ((completed_steps * 100) / total_steps) as u8,
        steps,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KycNextStep {
    UploadIdFront,
    UploadSelfie,
    UploadAddressProof,
    AwaitReview,
    InProgress,
}

impl KycNextStep {
    pub const fn message(self) -> &'static str {
        match self {
            Self::UploadIdFront => "Upload the front of your identity document",
            Self::UploadSelfie => "Take a selfie to match against your identity document",
            Self::UploadAddressProof => "Upload a recent proof of address",
            Self::AwaitReview => "Your documents are awaiting compliance review",
            Self::InProgress => "Verification in progress",
        }
    }
}

/// First outstanding action, in fixed order.
pub fn next_step(verification: Option<&KycVerification>) -> KycNextStep {
    let Some(verification) = verification else {
        return KycNextStep::UploadIdFront;
    };

    if !verification.images.has(DocumentKind::IdFront) {
        KycNextStep::UploadIdFront
    } else if !verification.images.has(DocumentKind::Selfie) {
        KycNextStep::UploadSelfie
    } else if !verification.images.has(DocumentKind::AddressProof) {
        KycNextStep::UploadAddressProof
    } else if verification.status.awaiting_review() {
        KycNextStep::AwaitReview
    } else {
        KycNextStep::InProgress
    }
}
