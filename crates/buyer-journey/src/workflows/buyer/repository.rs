use super::domain::{BuyerEvent, BuyerJourney, BuyerProfile, MortgageTracking};
use crate::accounts::UserId;
use crate::store::RepositoryError;

/// Storage contract for the buyer aggregate and its satellites.
///
/// Saves replace the stored value wholesale; the owning account must already exist.
pub trait BuyerRepository: Send + Sync {
    fn profile(&self, user_id: &UserId) -> Result<Option<BuyerProfile>, RepositoryError>;
    fn save_profile(&self, profile: BuyerProfile) -> Result<(), RepositoryError>;
    fn journey(&self, buyer_id: &UserId) -> Result<Option<BuyerJourney>, RepositoryError>;
    fn save_journey(&self, journey: BuyerJourney) -> Result<(), RepositoryError>;
    fn mortgage_tracking(&self, user_id: &UserId)
        -> Result<Option<MortgageTracking>, RepositoryError>;
    fn save_mortgage_tracking(&self, tracking: MortgageTracking) -> Result<(), RepositoryError>;
    fn record_event(&self, event: BuyerEvent) -> Result<BuyerEvent, RepositoryError>;
    /// Most recent events first.
    fn recent_events(
        &self,
        buyer_id: &UserId,
        limit: usize,
    ) -> Result<Vec<BuyerEvent>, RepositoryError>;
}
