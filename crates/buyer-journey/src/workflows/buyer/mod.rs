//! Buyer journey dashboard: progress scoring, forecasts, next-step guidance, and alerts.

pub mod domain;
pub mod forecast;
pub mod guidance;
pub mod progress;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    BuyerEvent, BuyerEventType, BuyerJourney, BuyerProfile, FinancialDetails, JourneyPhase,
    MortgageStatus, MortgageTracking,
};
pub use forecast::CompletionPrediction;
pub use guidance::{
    ActionItem, Alert, AlertKind, AlertSeverity, GuidanceCategory, NextStep, StepPriority,
    UpcomingMilestone,
};
pub use progress::{JourneyActivity, JourneyProgress, PreApprovalStatus};
pub use repository::BuyerRepository;
pub use router::buyer_router;
pub use service::{BuyerDashboard, BuyerProfileService, BuyerServiceError};
