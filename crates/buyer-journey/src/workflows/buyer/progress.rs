use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::domain::{
    AffordabilityCheck, BuyerEvent, BuyerJourney, BuyerProfile, JourneyPhase,
    MortgageApplication, MortgageApplicationStatus, MortgageStatus, MortgageTracking,
};
use crate::accounts::User;
use crate::clock::{days_since, days_until};
use crate::workflows::reservations::domain::{Reservation, ReservationStatus};

/// Share of the progress bar driven by phase position alone.
const PHASE_WEIGHT: f64 = 70.0;
const DAYS_PER_PHASE: i64 = 30;
const ACTIVITY_WINDOW_DAYS: i64 = 30;
const POINTS_PER_ACTIVITY: u32 = 5;
const EXPIRY_WARNING_DAYS: i64 = 7;

/// Milestone activities that add fixed increments on top of the phase-based progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum JourneyActivity {
    FinancialProfile,
    AffordabilityCheck,
    Reservation,
    MortgageApplication,
}

impl JourneyActivity {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::FinancialProfile,
            Self::AffordabilityCheck,
            Self::Reservation,
            Self::MortgageApplication,
        ]
    }

    pub const fn bonus(self) -> u32 {
        match self {
            Self::FinancialProfile => 5,
            Self::AffordabilityCheck => 10,
            Self::Reservation => 15,
            Self::MortgageApplication => 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyProgress {
    pub percentage: u8,
    pub phase: JourneyPhase,
    pub phases: Vec<JourneyPhase>,
    pub current_index: usize,
    pub total_phases: usize,
    pub completed_activities: BTreeMap<JourneyActivity, bool>,
    pub estimated_days_to_completion: i64,
}

impl JourneyProgress {
    /// Progress reported for buyers that have not started a journey yet.
    pub fn not_started() -> Self {
        let phases = JourneyPhase::ordered().to_vec();
        let remaining = (phases.len() - 1) as i64;
        Self {
            percentage: 0,
            phase: JourneyPhase::Planning,
            total_phases: phases.len(),
            phases,
            current_index: 0,
            completed_activities: JourneyActivity::ordered()
                .into_iter()
                .map(|activity| (activity, false))
                .collect(),
            estimated_days_to_completion: remaining * DAYS_PER_PHASE,
        }
    }
}

/// Derive the 0-100 journey progress from the phase position and completed activities.
///
/// `reservation_count` is supplied by the caller because reservations live in their own
/// repository.
pub fn journey_progress(
    journey: Option<&BuyerJourney>,
    profile: &BuyerProfile,
    reservation_count: usize,
) -> JourneyProgress {
    let Some(journey) = journey else {
        return JourneyProgress::not_started();
    };

    let phases = JourneyPhase::ordered();
    let last_index = phases.len() - 1;
    let current_index = journey.current_phase.index();
    let base = ((current_index as f64 / last_index as f64) * PHASE_WEIGHT).round() as u32;

    let completed_activities: BTreeMap<JourneyActivity, bool> = JourneyActivity::ordered()
        .into_iter()
        .map(|activity| {
            let done = match activity {
                JourneyActivity::FinancialProfile => profile.has_financial_details(),
                JourneyActivity::AffordabilityCheck => !journey.affordability_checks.is_empty(),
                JourneyActivity::Reservation => reservation_count > 0,
                JourneyActivity::MortgageApplication => {
                    !journey.mortgage_applications.is_empty()
                }
            };
            (activity, done)
        })
        .collect();

    let bonus: u32 = completed_activities
        .iter()
        .filter(|(_, done)| **done)
        .map(|(activity, _)| activity.bonus())
        .sum();

    JourneyProgress {
        percentage: (base + bonus).min(100) as u8,
        phase: journey.current_phase,
        phases: phases.to_vec(),
        current_index,
        total_phases: phases.len(),
        completed_activities,
        estimated_days_to_completion: (last_index - current_index) as i64 * DAYS_PER_PHASE,
    }
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|text| !text.trim().is_empty())
}

/// Weighted completeness of the account and profile: basic info 30, finances 40,
/// preferences 20, government schemes 10.
pub fn profile_completion_score(user: &User, profile: &BuyerProfile) -> u8 {
    let mut score: u32 = 0;

    if filled(&user.first_name) && filled(&user.last_name) {
        score += 10;
    }
    if !user.email.trim().is_empty() {
        score += 5;
    }
    if filled(&user.phone) {
        score += 5;
    }
    if profile.current_journey_phase != JourneyPhase::Planning {
        score += 10;
    }

    if let Some(finances) = &profile.financial_details {
        let weighted = [
            (finances.annual_income, 10),
            (finances.savings, 10),
            (finances.monthly_debts, 5),
            (finances.deposit_amount, 10),
            (finances.max_budget, 5),
        ];
        score += weighted
            .iter()
            .filter(|(value, _)| value.is_some())
            .map(|(_, weight)| weight)
            .sum::<u32>();
    }

    if let Some(preferences) = &profile.preferences {
        if !preferences.preferred_areas.is_empty() {
            score += 10;
        }
        if !preferences.property_types.is_empty() {
            score += 5;
        }
        if preferences.min_bedrooms.is_some() || preferences.max_bedrooms.is_some() {
            score += 5;
        }
    }

    if let Some(schemes) = &profile.government_schemes {
        if filled(&schemes.htb_application_status) {
            score += 5;
        }
        if schemes.first_home_buyer.is_some() {
            score += 5;
        }
    }

    score.min(100) as u8
}

pub fn days_in_current_phase(journey: &BuyerJourney, now: DateTime<Utc>) -> i64 {
    journey
        .current_phase_entry()
        .map(|entry| days_since(now, entry.phase_start_date).max(0))
        .unwrap_or(0)
}

pub fn journey_duration_days(journey: &BuyerJourney, now: DateTime<Utc>) -> i64 {
    days_since(now, journey.start_date).max(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreApprovalStatus {
    NotStarted,
    Approved,
    AipObtained,
    InProgress,
    Started,
}

/// Mortgage readiness, preferring lender-side tracking over the buyer's own applications.
pub fn pre_approval_status(
    tracking: Option<&MortgageTracking>,
    applications: &[MortgageApplication],
) -> PreApprovalStatus {
    if tracking.is_none() && applications.is_empty() {
        return PreApprovalStatus::NotStarted;
    }

    let approved_application = applications
        .iter()
        .any(|application| application.status == MortgageApplicationStatus::Approved);
    if tracking.is_some_and(|tracking| tracking.status.is_approved()) || approved_application {
        return PreApprovalStatus::Approved;
    }

    if tracking.is_some_and(|tracking| {
        tracking.aip_date.is_some() || tracking.status == MortgageStatus::AipIssued
    }) {
        return PreApprovalStatus::AipObtained;
    }

    if applications
        .iter()
        .any(|application| application.status.is_in_flight())
    {
        return PreApprovalStatus::InProgress;
    }

    PreApprovalStatus::Started
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    pub max_budget: Option<u32>,
    pub deposit_amount: Option<u32>,
    pub max_mortgage: Option<u32>,
    pub monthly_repayment: Option<u32>,
    pub htb_amount: Option<u32>,
    pub loan_to_value: Option<f32>,
    pub last_checked: Option<DateTime<Utc>>,
}

/// Budget figures from the latest affordability check, falling back to self-declared finances.
pub fn budget_summary(profile: &BuyerProfile, latest: Option<&AffordabilityCheck>) -> BudgetSummary {
    let declared = profile.financial_details.as_ref();
    match latest {
        Some(check) => BudgetSummary {
            max_budget: Some(check.max_property_price),
            deposit_amount: Some(check.deposit_amount),
            max_mortgage: Some(check.max_mortgage),
            monthly_repayment: Some(check.monthly_repayment),
            htb_amount: check.htb_amount.or_else(|| declared.and_then(|d| d.htb_amount)),
            loan_to_value: Some(check.loan_to_value),
            last_checked: Some(check.created_at),
        },
        None => BudgetSummary {
            max_budget: declared.and_then(|d| d.max_budget),
            deposit_amount: declared.and_then(|d| d.deposit_amount),
            max_mortgage: None,
            monthly_repayment: None,
            htb_amount: declared.and_then(|d| d.htb_amount),
            loan_to_value: None,
            last_checked: None,
        },
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationsSummary {
    pub total: usize,
    pub pending: usize,
    pub active: usize,
    pub confirmed: usize,
    pub completed: usize,
    pub total_value: u64,
    pub expiring_soon: usize,
}

pub fn reservations_summary(reservations: &[Reservation], now: DateTime<Utc>) -> ReservationsSummary {
    let mut summary = ReservationsSummary {
        total: reservations.len(),
        ..ReservationsSummary::default()
    };

    for reservation in reservations {
        let status = reservation.effective_status(now);
        match status {
            ReservationStatus::Pending => summary.pending += 1,
            ReservationStatus::Active => summary.active += 1,
            ReservationStatus::Confirmed => summary.confirmed += 1,
            ReservationStatus::Completed => summary.completed += 1,
            ReservationStatus::Expired | ReservationStatus::Cancelled => {}
        }

        if !status.is_live() {
            continue;
        }
        summary.total_value += u64::from(reservation.total_property_price);
        let expiring = reservation.expiry_date.is_some_and(|expiry| {
            let days = days_until(now, expiry);
            days > 0 && days <= EXPIRY_WARNING_DAYS
        });
        if expiring {
            summary.expiring_soon += 1;
        }
    }

    summary
}

/// Engagement score: five points per buyer event in the trailing 30 days, capped at 100.
pub fn activity_score(events: &[BuyerEvent], now: DateTime<Utc>) -> u8 {
    let window_start = now - Duration::days(ACTIVITY_WINDOW_DAYS);
    let recent = events
        .iter()
        .filter(|event| event.event_date >= window_start && event.event_date <= now)
        .count() as u32;
    recent.saturating_mul(POINTS_PER_ACTIVITY).min(100) as u8
}
