//! Next-step suggestions, action items, upcoming milestones and time-sensitive alerts for the
//! buyer dashboard.
//!
//! Every rule reads optional data defensively: a missing input disables that rule only, and
//! the generators never fail.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{BuyerJourney, BuyerProfile, JourneyPhase, MortgageTracking};
use crate::clock::days_until;
use crate::workflows::reservations::domain::Reservation;

const RESERVATION_WARNING_DAYS: i64 = 7;
const AIP_NOTICE_DAYS: i64 = 14;
const OFFER_CRITICAL_DAYS: i64 = 7;
const PROFILE_COMPLETE_SCORE: u8 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepPriority {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextStep {
    pub title: &'static str,
    pub description: &'static str,
    pub priority: StepPriority,
    pub action: &'static str,
}

/// Suggestions in rule order; high-priority rules are declared first.
pub fn next_steps(
    journey: Option<&BuyerJourney>,
    profile: &BuyerProfile,
    mortgage: Option<&MortgageTracking>,
) -> Vec<NextStep> {
    let phase = journey
        .map(|journey| journey.current_phase)
        .unwrap_or(JourneyPhase::Planning);
    let affordability_checks = journey.map_or(0, |journey| journey.affordability_checks.len());
    let mut steps = Vec::new();

    if !profile.has_financial_details() {
        steps.push(NextStep {
            title: "Complete Financial Profile",
            description: "Add your income, savings and deposit so we can size your budget.",
            priority: StepPriority::High,
            action: "/buyer/profile/financial",
        });
    }

    if affordability_checks == 0 {
        steps.push(NextStep {
            title: "Run Affordability Check",
            description: "Find out how much you can borrow and what your repayments would be.",
            priority: StepPriority::High,
            action: "/buyer/affordability",
        });
    }

    if mortgage.is_none() && phase != JourneyPhase::Planning {
        steps.push(NextStep {
            title: "Start Mortgage Application",
            description: "Request an approval in principle from a lender.",
            priority: StepPriority::Medium,
            action: "/buyer/mortgage",
        });
    }

    if phase == JourneyPhase::Planning && profile.has_preferences() {
        steps.push(NextStep {
            title: "Start Property Search",
            description: "Browse developments that match your saved preferences.",
            priority: StepPriority::Medium,
            action: "/properties/search",
        });
    }

    steps
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuidanceCategory {
    Profile,
    Financial,
    Property,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub title: &'static str,
    pub description: &'static str,
    pub priority: StepPriority,
    pub category: GuidanceCategory,
    pub action: &'static str,
}

/// Outstanding tasks for the buyer. Phase rules only fire once a journey exists.
pub fn action_items(
    journey: Option<&BuyerJourney>,
    mortgage: Option<&MortgageTracking>,
    live_reservations: usize,
    completion_score: u8,
) -> Vec<ActionItem> {
    let phase = journey.map(|journey| journey.current_phase);
    let mut items = Vec::new();

    if completion_score < PROFILE_COMPLETE_SCORE {
        items.push(ActionItem {
            title: "Complete Your Profile",
            description: "Add missing information to improve your experience.",
            priority: StepPriority::Medium,
            category: GuidanceCategory::Profile,
            action: "complete_profile",
        });
    }

    if phase == Some(JourneyPhase::Planning) && mortgage.is_none() {
        items.push(ActionItem {
            title: "Start Mortgage Pre-approval",
            description: "Get pre-approved to strengthen your position.",
            priority: StepPriority::High,
            category: GuidanceCategory::Financial,
            action: "start_mortgage",
        });
    }

    if phase == Some(JourneyPhase::Searching) && live_reservations == 0 {
        items.push(ActionItem {
            title: "Reserve Your First Property",
            description: "Secure a property that matches your criteria.",
            priority: StepPriority::High,
            category: GuidanceCategory::Property,
            action: "make_reservation",
        });
    }

    items
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingMilestone {
    pub title: String,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: StepPriority,
    pub category: GuidanceCategory,
}

/// Phase tasks plus reservation and AIP deadlines, soonest first; undated items go last.
pub fn upcoming_milestones(
    journey: Option<&BuyerJourney>,
    reservations: &[Reservation],
    mortgage: Option<&MortgageTracking>,
    now: DateTime<Utc>,
) -> Vec<UpcomingMilestone> {
    let mut milestones = Vec::new();

    match journey.map(|journey| journey.current_phase) {
        Some(JourneyPhase::Planning) => milestones.push(UpcomingMilestone {
            title: "Complete Affordability Check".to_string(),
            due_date: None,
            priority: StepPriority::High,
            category: GuidanceCategory::Financial,
        }),
        Some(JourneyPhase::Searching) => milestones.push(UpcomingMilestone {
            title: "Schedule Property Viewings".to_string(),
            due_date: None,
            priority: StepPriority::Medium,
            category: GuidanceCategory::Property,
        }),
        _ => {}
    }

    for reservation in reservations.iter().filter(|reservation| reservation.holds_unit(now)) {
        if let Some(expiry) = reservation.expiry_date {
            milestones.push(UpcomingMilestone {
                title: format!("Reservation Expires - {}", reservation.development_name),
                due_date: Some(expiry),
                priority: StepPriority::High,
                category: GuidanceCategory::Property,
            });
        }
    }

    if let Some(expiry) = mortgage.and_then(|tracking| tracking.aip_expiry_date) {
        milestones.push(UpcomingMilestone {
            title: "AIP Expires - Renew if Needed".to_string(),
            due_date: Some(expiry),
            priority: StepPriority::Medium,
            category: GuidanceCategory::Financial,
        });
    }

    milestones.sort_by_key(|milestone| (milestone.due_date.is_none(), milestone.due_date));
    milestones
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    ReservationExpiring,
    AipExpiring,
    OfferExpiring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    pub days_remaining: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

fn within(now: DateTime<Utc>, target: Option<DateTime<Utc>>, horizon: i64) -> Option<i64> {
    let days = days_until(now, target?);
    (days > 0 && days <= horizon).then_some(days)
}

/// Time-sensitive alerts, most severe first.
pub fn alerts(
    reservations: &[Reservation],
    mortgage: Option<&MortgageTracking>,
    now: DateTime<Utc>,
) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = reservations
        .iter()
        .filter(|reservation| reservation.holds_unit(now))
        .filter_map(|reservation| {
            let days = within(now, reservation.expiry_date, RESERVATION_WARNING_DAYS)?;
            Some(Alert {
                kind: AlertKind::ReservationExpiring,
                severity: AlertSeverity::Warning,
                title: "Reservation Expiring Soon".to_string(),
                message: format!(
                    "Your reservation at {} expires in {days} days.",
                    reservation.development_name
                ),
                days_remaining: days,
                reference: Some(reservation.id.to_string()),
            })
        })
        .collect();

    if let Some(tracking) = mortgage {
        if let Some(days) = within(now, tracking.aip_expiry_date, AIP_NOTICE_DAYS) {
            alerts.push(Alert {
                kind: AlertKind::AipExpiring,
                severity: AlertSeverity::Info,
                title: "Approval in Principle Expiring".to_string(),
                message: format!("Your mortgage approval in principle expires in {days} days."),
                days_remaining: days,
                reference: tracking.lender.clone(),
            });
        }
        if let Some(days) = within(now, tracking.offer_expiry_date, OFFER_CRITICAL_DAYS) {
            alerts.push(Alert {
                kind: AlertKind::OfferExpiring,
                severity: AlertSeverity::Critical,
                title: "Mortgage Offer Expiring".to_string(),
                message: format!("Your formal mortgage offer expires in {days} days."),
                days_remaining: days,
                reference: tracking.lender.clone(),
            });
        }
    }

    alerts.sort_by_key(|alert| alert.severity);
    alerts
}
