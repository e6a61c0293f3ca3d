use super::domain::{KycReviewDecision, KycVerification};
use crate::accounts::UserId;
use crate::store::RepositoryError;

/// Storage contract for KYC verifications.
pub trait KycRepository: Send + Sync {
    fn verification(&self, user_id: &UserId) -> Result<Option<KycVerification>, RepositoryError>;
    fn save_verification(&self, verification: KycVerification) -> Result<(), RepositoryError>;
    /// Update the verification, the account's cached status and the history log as one unit.
    fn apply_review(
        &self,
        user_id: &UserId,
        decision: &KycReviewDecision,
    ) -> Result<KycVerification, RepositoryError>;
}
