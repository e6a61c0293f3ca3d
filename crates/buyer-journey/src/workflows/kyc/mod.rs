//! KYC verification status: risk scoring, progress gates, masking, and admin review.

pub mod assessment;
pub mod domain;
pub mod masking;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use assessment::{
    assess_risk, next_step, verification_progress, KycNextStep, RiskAssessment, RiskLevel,
    VerificationProgress, VerificationStep,
};
pub use domain::{KycReviewDecision, KycStatus, KycVerification};
pub use masking::mask_sensitive_data;
pub use repository::KycRepository;
pub use router::kyc_router;
pub use service::{KycReviewRequest, KycServiceError, KycStatusReport, KycStatusService};
