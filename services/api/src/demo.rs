use crate::infra::Platform;
use buyer_journey::accounts::{Role, User, UserDirectory, UserId};
use buyer_journey::auth::Principal;
use buyer_journey::clock::SystemClock;
use buyer_journey::config::{AuthConfig, TimelineConfig};
use buyer_journey::error::{ApiError, AppError};
use buyer_journey::workflows::buyer::domain::{
    AffordabilityCheck, BuyerEvent, BuyerEventType, BuyerJourney, BuyerProfile,
    FinancialDetails, GovernmentSchemes, JourneyPhase, MortgageApplication,
    MortgageApplicationStatus, MortgageDocument, MortgageStatus, MortgageTracking,
    PhaseHistoryEntry, SearchPreferences,
};
use buyer_journey::workflows::buyer::BuyerRepository;
use buyer_journey::workflows::kyc::domain::{
    ComplianceCheck, ComplianceCheckStatus, ComplianceCheckType, ComplianceResult,
    IdDocumentType, KycStatus, KycVerification, PersonalInfo, VerificationImages,
};
use buyer_journey::workflows::kyc::KycRepository;
use buyer_journey::workflows::reservations::{
    EventVisibility, NewReservation, NewTimelineEvent, ReservationId, TimelineEventType,
    TimelineQuery,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::Args;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub(crate) const DEMO_BUYER: &str = "buyer-demo";
pub(crate) const DEMO_AGENT: &str = "agent-demo";
pub(crate) const DEMO_ADMIN: &str = "admin-demo";

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Account viewing the demo output (buyer-demo, agent-demo or admin-demo)
    #[arg(long, default_value = DEMO_BUYER)]
    pub(crate) user: String,
}

/// Identifiers of the records created by [`seed_demo`].
#[derive(Debug, Clone)]
pub(crate) struct DemoSeed {
    pub(crate) buyer: UserId,
    pub(crate) reservation_id: ReservationId,
    /// Session token per demo account, usable as a bearer or `auth-token` cookie.
    pub(crate) sessions: Vec<(UserId, String)>,
}

impl DemoSeed {
    pub(crate) fn token_for(&self, user_id: &str) -> Option<&str> {
        self.sessions
            .iter()
            .find(|(id, _)| id.as_str() == user_id)
            .map(|(_, token)| token.as_str())
    }
}

fn account(id: &str, first: &str, last: &str, role: Role, kyc: KycStatus, now: DateTime<Utc>) -> User {
    User {
        id: UserId::new(id),
        email: format!("{id}@example.ie"),
        first_name: Some(first.to_string()),
        last_name: Some(last.to_string()),
        phone: None,
        roles: vec![role],
        kyc_status: kyc,
        created_at: now - Duration::days(75),
        last_active: Some(now - Duration::hours(2)),
    }
}

fn buyer_profile(buyer: &UserId, now: DateTime<Utc>) -> BuyerProfile {
    BuyerProfile {
        user_id: buyer.clone(),
        financial_details: Some(FinancialDetails {
            annual_income: Some(84_000),
            savings: Some(52_000),
            monthly_debts: Some(300),
            deposit_amount: Some(39_500),
            max_budget: Some(410_000),
            htb_amount: Some(30_000),
        }),
        preferences: Some(SearchPreferences {
            preferred_areas: vec!["Drogheda".to_string(), "Laytown".to_string()],
            property_types: vec!["Semi-detached".to_string()],
            min_bedrooms: Some(3),
            max_bedrooms: Some(4),
            max_price: Some(420_000),
        }),
        government_schemes: Some(GovernmentSchemes {
            first_home_buyer: Some(true),
            htb_application_status: Some("APPROVED".to_string()),
        }),
        current_journey_phase: JourneyPhase::Reserving,
        created_at: now - Duration::days(70),
        updated_at: now - Duration::days(4),
    }
}

fn buyer_journey(buyer: &UserId, now: DateTime<Utc>) -> BuyerJourney {
    let phase = |phase, started: i64, ended: Option<i64>| PhaseHistoryEntry {
        phase,
        phase_start_date: now - Duration::days(started),
        phase_end_date: ended.map(|days| now - Duration::days(days)),
        notes: None,
    };
    BuyerJourney {
        buyer_id: buyer.clone(),
        current_phase: JourneyPhase::Reserving,
        start_date: now - Duration::days(68),
        target_move_in_date: Some(now + Duration::days(150)),
        notes: Some("Prefers end-of-terrace units".to_string()),
        phase_history: vec![
            phase(JourneyPhase::Planning, 68, Some(52)),
            phase(JourneyPhase::Searching, 52, Some(30)),
            phase(JourneyPhase::Viewing, 30, Some(9)),
            phase(JourneyPhase::Reserving, 9, None),
        ],
        affordability_checks: vec![AffordabilityCheck {
            id: "aff-demo-1".to_string(),
            max_property_price: 405_000,
            deposit_amount: 39_500,
            max_mortgage: 335_500,
            monthly_repayment: 1_520,
            htb_amount: Some(30_000),
            loan_to_value: 0.9,
            created_at: now - Duration::days(40),
        }],
        mortgage_applications: vec![MortgageApplication {
            id: "mort-demo-1".to_string(),
            lender: "AIB".to_string(),
            amount: 335_000,
            status: MortgageApplicationStatus::UnderReview,
            application_date: now - Duration::days(12),
        }],
    }
}

fn mortgage_tracking(buyer: &UserId, now: DateTime<Utc>) -> MortgageTracking {
    MortgageTracking {
        user_id: buyer.clone(),
        status: MortgageStatus::AipIssued,
        lender: Some("AIB".to_string()),
        amount: Some(335_000),
        aip_date: Some(now - Duration::days(175)),
        aip_expiry_date: Some(now + Duration::days(5)),
        formal_offer_date: None,
        offer_expiry_date: None,
        completion_date: None,
        documents: vec![MortgageDocument {
            name: "Salary certificate".to_string(),
            document_type: "INCOME".to_string(),
            upload_date: now - Duration::days(20),
        }],
        updated_at: now - Duration::days(3),
    }
}

fn buyer_events(buyer: &UserId, now: DateTime<Utc>) -> Vec<BuyerEvent> {
    [
        (BuyerEventType::ProfileCreated, "Buyer profile created", 70),
        (BuyerEventType::AffordabilityCheck, "Affordability check completed", 40),
        (BuyerEventType::MortgageApplied, "Mortgage application submitted to AIB", 12),
        (BuyerEventType::PhaseChanged, "Moved to the reserving phase", 9),
    ]
    .into_iter()
    .enumerate()
    .map(|(index, (event_type, description, days_ago))| BuyerEvent {
        id: format!("bevt-demo-{}", index + 1),
        buyer_id: buyer.clone(),
        event_type,
        description: description.to_string(),
        event_date: now - Duration::days(days_ago),
    })
    .collect()
}

fn verification(buyer: &UserId, now: DateTime<Utc>) -> KycVerification {
    KycVerification {
        user_id: buyer.clone(),
        personal_info: PersonalInfo {
            first_name: Some("Aoife".to_string()),
            last_name: Some("Byrne".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 14),
            nationality: Some("Irish".to_string()),
            address_line1: Some("7 Marsh Road".to_string()),
            address_line2: None,
            city: Some("Drogheda".to_string()),
            county: Some("Louth".to_string()),
            eircode: Some("A92 X2Y3".to_string()),
            pps_number: Some("1234567TA".to_string()),
            id_type: Some(IdDocumentType::Passport),
            id_number: Some("PA4455667".to_string()),
            occupation: Some("Civil engineer".to_string()),
        },
        images: VerificationImages {
            id_front: Some("kyc/buyer-demo/passport.jpg".to_string()),
            id_back: None,
            selfie: Some("kyc/buyer-demo/selfie.jpg".to_string()),
            address_proof: None,
        },
        status: KycStatus::Pending,
        risk_score: Some(10),
        is_politically_exposed: false,
        is_high_risk_country: false,
        compliance_flags: Vec::new(),
        review_notes: None,
        reviewed_by: None,
        submitted_at: Some(now - Duration::days(6)),
        reviewed_at: None,
        compliance_checks: vec![
            ComplianceCheck {
                id: "chk-demo-1".to_string(),
                check_type: ComplianceCheckType::Sanctions,
                status: ComplianceCheckStatus::Completed,
                result: Some(ComplianceResult::Clear),
                flags: Vec::new(),
                checked_at: Some(now - Duration::days(5)),
            },
            ComplianceCheck {
                id: "chk-demo-2".to_string(),
                check_type: ComplianceCheckType::AdverseMedia,
                status: ComplianceCheckStatus::Completed,
                result: Some(ComplianceResult::ReviewRequired),
                flags: vec!["Common name matched a 2019 news article".to_string()],
                checked_at: Some(now - Duration::days(5)),
            },
        ],
        history: Vec::new(),
    }
}

/// Load one buyer with a live reservation, a pending verification and staff accounts.
pub(crate) async fn seed_demo(platform: &Platform) -> Result<DemoSeed, AppError> {
    let now = platform.clock.now();
    let store = &platform.store;
    let buyer = UserId::new(DEMO_BUYER);

    store.insert_user(account(DEMO_BUYER, "Aoife", "Byrne", Role::Buyer, KycStatus::Pending, now))?;
    store.insert_user(account(DEMO_AGENT, "Ciaran", "Walsh", Role::Agent, KycStatus::Approved, now))?;
    store.insert_user(account(DEMO_ADMIN, "Grainne", "Doyle", Role::Admin, KycStatus::Approved, now))?;

    store.save_profile(buyer_profile(&buyer, now))?;
    store.save_journey(buyer_journey(&buyer, now))?;
    store.save_mortgage_tracking(mortgage_tracking(&buyer, now))?;
    for event in buyer_events(&buyer, now) {
        store.record_event(event)?;
    }
    store.save_verification(verification(&buyer, now))?;

    let mut sessions = Vec::new();
    for id in [DEMO_BUYER, DEMO_AGENT, DEMO_ADMIN] {
        let user_id = UserId::new(id);
        let token = platform
            .sessions
            .open_session(&user_id)
            .await
            .map_err(ApiError::from)?;
        sessions.push((user_id, token));
    }

    let admin = Principal::new(UserId::new(DEMO_ADMIN), vec![Role::Admin]);
    let agent = Principal::new(UserId::new(DEMO_AGENT), vec![Role::Agent]);
    let reservation = platform
        .reservations
        .create_reservation(
            &admin,
            NewReservation {
                user_id: Some(buyer.clone()),
                unit_id: "ashfield-court-14".to_string(),
                development_name: "Ashfield Court".to_string(),
                deposit_amount: 10_000,
                total_property_price: 395_000,
                expiry_date: Some(now + Duration::days(6)),
            },
        )
        .map_err(ApiError::from)?;

    let events = [
        NewTimelineEvent::new(TimelineEventType::PaymentReceived, "Booking deposit received")
            .with_metadata("amount", json!(10_000))
            .with_metadata("paymentType", json!("DEPOSIT")),
        NewTimelineEvent::new(TimelineEventType::DocumentUploaded, "Contract pack issued")
            .with_description("Contracts sent to the buyer's solicitor")
            .with_metadata("documentType", json!("CONTRACT")),
        NewTimelineEvent::new(TimelineEventType::NoteAdded, "Buyer asked about a second parking space")
            .with_visibility(EventVisibility::Internal),
        NewTimelineEvent::new(TimelineEventType::AppointmentScheduled, "Show house walkthrough")
            .scheduled_for(now + Duration::days(3)),
    ];
    for event in events {
        platform
            .reservations
            .create_event(&agent, &reservation.id, event)
            .map_err(ApiError::from)?;
    }

    info!(
        buyer = %buyer,
        reservation_id = %reservation.id,
        "demo dataset seeded"
    );
    Ok(DemoSeed {
        buyer,
        reservation_id: reservation.id,
        sessions,
    })
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let platform = Platform::new(
        AuthConfig::default(),
        TimelineConfig::default(),
        Arc::new(SystemClock),
    );
    let seed = seed_demo(&platform).await?;

    let viewer = platform
        .store
        .user(&UserId::new(args.user.trim()))?
        .ok_or_else(|| ApiError::NotFound(format!("no demo account named '{}'", args.user)))?;
    let principal = Principal::new(viewer.id, viewer.roles);

    let dashboard = platform
        .buyer
        .dashboard(&principal, &seed.buyer)
        .map_err(ApiError::from)?;
    let kyc = platform
        .kyc
        .status_report(&principal, &seed.buyer)
        .map_err(ApiError::from)?;
    let timeline = platform
        .reservations
        .timeline(
            &principal,
            &seed.reservation_id,
            &TimelineQuery {
                include_internal: true,
                ..TimelineQuery::default()
            },
        )
        .map_err(ApiError::from)?;

    let output = json!({
        "viewer": principal.user_id,
        "buyerDashboard": dashboard,
        "kycStatus": kyc,
        "reservationTimeline": timeline,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
