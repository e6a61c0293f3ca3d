use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::assessment::{
    assess_risk, next_step, verification_progress, KycNextStep, RiskAssessment,
    VerificationProgress,
};
use super::domain::{
    ComplianceCheck, DocumentKind, KycReviewDecision, KycStatus, KycVerification,
    PersonalInfo, VerificationHistoryEntry,
};
use super::masking::masked_personal_info;
use super::repository::KycRepository;
use crate::accounts::{UserDirectory, UserId, UserSummary};
use crate::auth::Principal;
use crate::clock::Clock;
use crate::error::FieldIssue;
use crate::store::RepositoryError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationSummary {
    pub status: KycStatus,
    pub risk_score: Option<u8>,
    pub is_politically_exposed: bool,
    pub is_high_risk_country: bool,
    pub compliance_flags: Vec<String>,
    pub review_notes: Option<String>,
    pub reviewed_by: Option<UserId>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl From<&KycVerification> for VerificationSummary {
    fn from(record: &KycVerification) -> Self {
        Self {
            status: record.status,
            risk_score: record.risk_score,
            is_politically_exposed: record.is_politically_exposed,
            is_high_risk_country: record.is_high_risk_country,
            compliance_flags: record.compliance_flags.clone(),
            review_notes: record.review_notes.clone(),
            reviewed_by: record.reviewed_by.clone(),
            submitted_at: record.submitted_at,
            reviewed_at: record.reviewed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStatus {
    pub kind: DocumentKind,
    pub label: &'static str,
    pub uploaded: bool,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceCheckView {
    #[serde(flatten)]
    pub check: ComplianceCheck,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextStepView {
    pub step: KycNextStep,
    pub message: &'static str,
}

/// Enhanced status report served by `GET /api/kyc/status-enhanced/:user_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KycStatusReport {
    pub user: UserSummary,
    pub verification: Option<VerificationSummary>,
    pub documents: Vec<DocumentStatus>,
    pub form_data: Option<PersonalInfo>,
    pub compliance_checks: Vec<ComplianceCheckView>,
    pub risk_assessment: Option<RiskAssessment>,
    pub progress: VerificationProgress,
    pub next_step: NextStepView,
    pub verification_history: Vec<VerificationHistoryEntry>,
}

/// Body accepted by the review `PATCH`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycReviewRequest {
    pub status: String,
    pub review_notes: Option<String>,
    pub reviewer_id: Option<UserId>,
    pub risk_score: Option<i64>,
    pub compliance_flags: Option<Vec<String>>,
}

/// Service combining account lookups, verification storage, and the risk calculator.
pub struct KycStatusService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> KycStatusService<S>
where
    S: UserDirectory + KycRepository + 'static,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn status_report(
        &self,
        principal: &Principal,
        user_id: &UserId,
    ) -> Result<KycStatusReport, KycServiceError> {
        if !principal.can_access(user_id) {
            return Err(KycServiceError::Forbidden);
        }
        self.build_report(user_id)
    }

    fn build_report(&self, user_id: &UserId) -> Result<KycStatusReport, KycServiceError> {
        let user = self
            .store
            .user(user_id)?
            .ok_or(KycServiceError::UserNotFound)?;
        let verification = self.store.verification(user_id)?;
        let record = verification.as_ref();

        let documents = DocumentKind::ordered()
            .into_iter()
            .map(|kind| {
                let reference = record.and_then(|record| record.images.reference(kind));
                DocumentStatus {
                    kind,
                    label: kind.label(),
                    uploaded: reference.is_some(),
                    reference: reference.map(str::to_string),
                }
            })
            .collect();

        let step = next_step(record);
        Ok(KycStatusReport {
            user: user.summary(),
            verification: record.map(VerificationSummary::from),
            documents,
            form_data: record.map(|record| masked_personal_info(&record.personal_info)),
            compliance_checks: record
                .map(|record| {
                    record
                        .compliance_checks
                        .iter()
                        .map(|check| ComplianceCheckView {
                            label: check.check_type.label(),
                            check: check.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            risk_assessment: record.map(assess_risk),
            progress: verification_progress(record),
            next_step: NextStepView {
                step,
                message: step.message(),
            },
            verification_history: record
                .map(|record| record.history.clone())
                .unwrap_or_default(),
        })
    }

    /// Apply an administrator's decision and return the refreshed report.
    pub fn review(
        &self,
        principal: &Principal,
        user_id: &UserId,
        request: KycReviewRequest,
    ) -> Result<KycStatusReport, KycServiceError> {
        if !principal.is_admin() {
            return Err(KycServiceError::Forbidden);
        }

        let decision = self.decision_from(principal, request)?;
        let updated = self
            .store
            .apply_review(user_id, &decision)
            .map_err(|error| match error {
                RepositoryError::NotFound => KycServiceError::VerificationNotFound,
                other => KycServiceError::Repository(other),
            })?;
        info!(
            user_id = %user_id,
            reviewer = %decision.reviewer_id,
            status = updated.status.as_str(),
            "kyc review applied"
        );

        self.build_report(user_id)
    }

    fn decision_from(
        &self,
        principal: &Principal,
        request: KycReviewRequest,
    ) -> Result<KycReviewDecision, KycServiceError> {
        let mut issues = Vec::new();

        let status = KycStatus::parse(&request.status);
        if status.is_none() {
            let allowed: Vec<&str> = KycStatus::all().iter().map(|status| status.as_str()).collect();
            issues.push(FieldIssue::new(
                "status",
                format!("status must be one of {}", allowed.join(", ")),
            ));
        }

        let risk_score = match request.risk_score {
            None => None,
            Some(score) => match u8::try_from(score) {
                Ok(score) if score <= 100 => Some(score),
                _ => {
                    issues.push(FieldIssue::new(
                        "riskScore",
                        "riskScore must be between 0 and 100",
                    ));
                    None
                }
            },
        };

        if request
            .reviewer_id
            .as_ref()
            .is_some_and(|reviewer| !principal.owns(reviewer))
        {
            issues.push(FieldIssue::new(
                "reviewerId",
                "reviewerId must match the authenticated reviewer",
            ));
        }

        match status {
            Some(status) if issues.is_empty() => Ok(KycReviewDecision {
                status,
                review_notes: request.review_notes,
                reviewer_id: principal.user_id.clone(),
                risk_score,
                compliance_flags: request.compliance_flags,
                decided_at: self.clock.now(),
            }),
            _ => Err(KycServiceError::Validation(issues)),
        }
    }
}

/// Error raised by the KYC status service.
#[derive(Debug, thiserror::Error)]
pub enum KycServiceError {
    #[error("access to this verification is not permitted")]
    Forbidden,
    #[error("user not found")]
    UserNotFound,
    #[error("verification not found")]
    VerificationNotFound,
    #[error("invalid review request")]
    Validation(Vec<FieldIssue>),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
