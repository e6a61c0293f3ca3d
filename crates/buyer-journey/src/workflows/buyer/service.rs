use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::domain::{
    BuyerEvent, BuyerEventCategory, BuyerProfile, FinancialDetails, GovernmentSchemes,
    JourneyPhase, MortgageApplication, MortgageStatus, MortgageTracking, PhaseHistoryEntry,
    SearchPreferences,
};
use super::forecast::{estimate_completion_date, predict_completion, CompletionPrediction};
use super::guidance::{
    action_items, alerts, next_steps, upcoming_milestones, ActionItem, Alert, NextStep,
    UpcomingMilestone,
};
use super::progress::{
    activity_score, budget_summary, days_in_current_phase, journey_duration_days,
    journey_progress, pre_approval_status, profile_completion_score, reservations_summary,
    BudgetSummary, JourneyProgress, PreApprovalStatus, ReservationsSummary,
};
use super::repository::BuyerRepository;
use crate::accounts::{UserDirectory, UserId, UserSummary};
use crate::auth::Principal;
use crate::clock::{time_ago, Clock};
use crate::store::RepositoryError;
use crate::workflows::reservations::domain::Reservation;
use crate::workflows::reservations::ReservationRepository;

const TIMELINE_LIMIT: usize = 10;
const ACTIVITY_LOOKBACK: usize = 100;
const RECENT_RESERVATIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub user: UserSummary,
    pub financial_details: Option<FinancialDetails>,
    pub preferences: Option<SearchPreferences>,
    pub government_schemes: Option<GovernmentSchemes>,
    pub current_journey_phase: JourneyPhase,
    pub completion_score: u8,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyView {
    pub current_phase: JourneyPhase,
    pub start_date: DateTime<Utc>,
    pub target_move_in_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub progress: JourneyProgress,
    pub time_in_current_phase: i64,
    pub journey_duration: i64,
    pub estimated_completion: Option<DateTime<Utc>>,
    pub phase_history: Vec<PhaseHistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MortgageSummary {
    pub status: MortgageStatus,
    pub status_label: &'static str,
    pub lender: Option<String>,
    pub amount: Option<u32>,
    pub aip_expiry_date: Option<DateTime<Utc>>,
    pub offer_expiry_date: Option<DateTime<Utc>>,
    pub documents: usize,
}

impl From<&MortgageTracking> for MortgageSummary {
    fn from(tracking: &MortgageTracking) -> Self {
        Self {
            status: tracking.status,
            status_label: tracking.status.label(),
            lender: tracking.lender.clone(),
            amount: tracking.amount,
            aip_expiry_date: tracking.aip_expiry_date,
            offer_expiry_date: tracking.offer_expiry_date,
            documents: tracking.documents.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialStatus {
    pub budget: BudgetSummary,
    pub pre_approval_status: PreApprovalStatus,
    pub mortgage: Option<MortgageSummary>,
    pub affordability_checks: usize,
    pub mortgage_applications: Vec<MortgageApplication>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyActivity {
    pub summary: ReservationsSummary,
    pub recent_reservations: Vec<Reservation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerEventView {
    #[serde(flatten)]
    pub event: BuyerEvent,
    pub category: BuyerEventCategory,
    pub time_ago: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub profile_completion: u8,
    pub journey_progress: u8,
    pub days_active: i64,
    pub activity_score: u8,
    pub completion_prediction: Option<CompletionPrediction>,
}

/// Aggregated buyer dashboard returned by `GET /api/buyer/profile/:user_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerDashboard {
    pub profile: ProfileView,
    pub journey: Option<JourneyView>,
    pub financial_status: FinancialStatus,
    pub property_activity: PropertyActivity,
    pub timeline: Vec<BuyerEventView>,
    pub upcoming_milestones: Vec<UpcomingMilestone>,
    pub next_steps: Vec<NextStep>,
    pub action_items: Vec<ActionItem>,
    pub alerts: Vec<Alert>,
    pub metrics: DashboardMetrics,
}

/// Read-side facade that assembles the buyer dashboard from the account, buyer, and
/// reservation repositories.
pub struct BuyerProfileService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> BuyerProfileService<S>
where
    S: UserDirectory + BuyerRepository + ReservationRepository + 'static,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn dashboard(
        &self,
        principal: &Principal,
        user_id: &UserId,
    ) -> Result<BuyerDashboard, BuyerServiceError> {
        if !principal.can_access(user_id) {
            return Err(BuyerServiceError::Forbidden);
        }

        let user = self
            .store
            .user(user_id)?
            .ok_or(BuyerServiceError::ProfileNotFound)?;
        let profile = self
            .store
            .profile(user_id)?
            .ok_or(BuyerServiceError::ProfileNotFound)?;
        let journey = self.store.journey(user_id)?;
        let mortgage = self.store.mortgage_tracking(user_id)?;
        let reservations = self.store.reservations_for(user_id)?;
        let events = self.store.recent_events(user_id, ACTIVITY_LOOKBACK)?;
        let now = self.clock.now();

        let progress = journey_progress(journey.as_ref(), &profile, reservations.len());
        let completion_score = profile_completion_score(&user, &profile);
        let activity = activity_score(&events, now);
        let live_reservations = reservations
            .iter()
            .filter(|reservation| reservation.holds_unit(now))
            .count();

        debug!(
            user_id = %user_id,
            progress = progress.percentage,
            completion = completion_score,
            "assembled buyer dashboard"
        );

        let journey_view = journey.as_ref().map(|journey| JourneyView {
            current_phase: journey.current_phase,
            start_date: journey.start_date,
            target_move_in_date: journey.target_move_in_date,
            notes: journey.notes.clone(),
            progress: progress.clone(),
            time_in_current_phase: days_in_current_phase(journey, now),
            journey_duration: journey_duration_days(journey, now),
            estimated_completion: estimate_completion_date(Some(journey), live_reservations, now),
            phase_history: journey.phase_history.clone(),
        });

        let (affordability_checks, applications, latest_check) = match &journey {
            Some(journey) => (
                journey.affordability_checks.len(),
                journey.mortgage_applications.clone(),
                journey.latest_affordability_check().cloned(),
            ),
            None => (0, Vec::new(), None),
        };

        let financial_status = FinancialStatus {
            budget: budget_summary(&profile, latest_check.as_ref()),
            pre_approval_status: pre_approval_status(mortgage.as_ref(), &applications),
            mortgage: mortgage.as_ref().map(MortgageSummary::from),
            affordability_checks,
            mortgage_applications: applications,
        };

        let property_activity = PropertyActivity {
            summary: reservations_summary(&reservations, now),
            recent_reservations: reservations.iter().take(RECENT_RESERVATIONS).cloned().collect(),
        };

        let timeline = events
            .iter()
            .take(TIMELINE_LIMIT)
            .map(|event| BuyerEventView {
                category: event.event_type.category(),
                time_ago: time_ago(now, event.event_date),
                event: event.clone(),
            })
            .collect();

        let metrics = DashboardMetrics {
            profile_completion: completion_score,
            journey_progress: progress.percentage,
            days_active: journey_view.as_ref().map_or(0, |view| view.journey_duration),
            activity_score: activity,
            completion_prediction: predict_completion(
                journey.as_ref(),
                live_reservations,
                mortgage.as_ref(),
                now,
            ),
        };

        Ok(BuyerDashboard {
            upcoming_milestones: upcoming_milestones(
                journey.as_ref(),
                &reservations,
                mortgage.as_ref(),
                now,
            ),
            next_steps: next_steps(journey.as_ref(), &profile, mortgage.as_ref()),
            action_items: action_items(
                journey.as_ref(),
                mortgage.as_ref(),
                live_reservations,
                completion_score,
            ),
            alerts: alerts(&reservations, mortgage.as_ref(), now),
            profile: profile_view(&user.summary(), &profile, completion_score),
            journey: journey_view,
            financial_status,
            property_activity,
            timeline,
            metrics,
        })
    }
}

fn profile_view(user: &UserSummary, profile: &BuyerProfile, completion_score: u8) -> ProfileView {
    ProfileView {
        user: user.clone(),
        financial_details: profile.financial_details.clone(),
        preferences: profile.preferences.clone(),
        government_schemes: profile.government_schemes.clone(),
        current_journey_phase: profile.current_journey_phase,
        completion_score,
        updated_at: profile.updated_at,
    }
}

/// Error raised by the buyer dashboard service.
#[derive(Debug, thiserror::Error)]
pub enum BuyerServiceError {
    #[error("access to this buyer profile is not permitted")]
    Forbidden,
    #[error("buyer profile not found")]
    ProfileNotFound,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
