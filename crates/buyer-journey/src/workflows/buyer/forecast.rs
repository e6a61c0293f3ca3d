//! Completion forecasts for the dashboard metrics block.
//!
//! Both estimators work from the phases still ahead of the buyer and shorten the estimate
//! when a unit is already held or the mortgage is approved.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::domain::{BuyerJourney, JourneyPhase, MortgageTracking};

const DAYS_PER_PHASE: i64 = 30;
const WEEKS_PER_PHASE: f64 = 4.0;
/// Reserved buyers move through the remaining phases in 70% of the usual time.
const RESERVED_DAY_FACTOR_PERCENT: i64 = 70;
const RESERVED_WEEK_FACTOR: f64 = 0.8;
const APPROVED_WEEK_FACTOR: f64 = 0.7;

const BASE_CONFIDENCE: u8 = 50;
const RESERVATION_CONFIDENCE: u8 = 20;
const AIP_CONFIDENCE: u8 = 15;
const APPROVAL_CONFIDENCE: u8 = 15;

fn remaining_phases(journey: &BuyerJourney) -> i64 {
    (JourneyPhase::ordered().len() - 1 - journey.current_phase.index()) as i64
}

/// Expected completion date at thirty days per remaining phase.
pub fn estimate_completion_date(
    journey: Option<&BuyerJourney>,
    live_reservations: usize,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let mut days = remaining_phases(journey?) * DAYS_PER_PHASE;
    if live_reservations > 0 {
        days = days * RESERVED_DAY_FACTOR_PERCENT / 100;
    }
    Some(now + Duration::days(days))
}

/// Confidence in the completion forecast, 0..=100.
pub fn prediction_confidence(live_reservations: usize, mortgage: Option<&MortgageTracking>) -> u8 {
    let mut confidence = BASE_CONFIDENCE;
    if live_reservations > 0 {
        confidence += RESERVATION_CONFIDENCE;
    }
    if mortgage.is_some_and(|tracking| tracking.aip_date.is_some()) {
        confidence += AIP_CONFIDENCE;
    }
    if mortgage.is_some_and(|tracking| tracking.status.is_approved()) {
        confidence += APPROVAL_CONFIDENCE;
    }
    confidence.min(100)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionPrediction {
    pub estimated_weeks: u32,
    pub estimated_completion_date: DateTime<Utc>,
    pub confidence: u8,
}

/// Week-granular forecast; `None` until the buyer has a journey.
pub fn predict_completion(
    journey: Option<&BuyerJourney>,
    live_reservations: usize,
    mortgage: Option<&MortgageTracking>,
    now: DateTime<Utc>,
) -> Option<CompletionPrediction> {
    let mut weeks = remaining_phases(journey?) as f64 * WEEKS_PER_PHASE;
    if live_reservations > 0 {
        weeks *= RESERVED_WEEK_FACTOR;
    }
    if mortgage.is_some_and(|tracking| tracking.status.is_approved()) {
        weeks *= APPROVED_WEEK_FACTOR;
    }

    let span = Duration::milliseconds((weeks * 7.0 * 86_400_000.0).round() as i64);
    Some(CompletionPrediction {
        estimated_weeks: weeks.ceil() as u32,
        estimated_completion_date: now + span,
        confidence: prediction_confidence(live_reservations, mortgage),
    })
}
