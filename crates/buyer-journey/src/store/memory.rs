use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::RepositoryError;
use crate::accounts::{User, UserDirectory, UserId};
use crate::workflows::buyer::domain::{BuyerEvent, BuyerJourney, BuyerProfile, MortgageTracking};
use crate::workflows::buyer::BuyerRepository;
use crate::workflows::kyc::domain::{KycReviewDecision, KycVerification};
use crate::workflows::kyc::KycRepository;
use crate::workflows::reservations::domain::{
    Reservation, ReservationId, ReservationStatus, TimelineEvent,
};
use crate::workflows::reservations::ReservationRepository;

#[derive(Default)]
struct StoreState {
    users: HashMap<UserId, User>,
    profiles: HashMap<UserId, BuyerProfile>,
    journeys: HashMap<UserId, BuyerJourney>,
    mortgages: HashMap<UserId, MortgageTracking>,
    buyer_events: HashMap<UserId, Vec<BuyerEvent>>,
    reservations: HashMap<ReservationId, Reservation>,
    timelines: HashMap<ReservationId, Vec<TimelineEvent>>,
    verifications: HashMap<UserId, KycVerification>,
}

impl StoreState {
    fn require_user(&self, id: &UserId) -> Result<(), RepositoryError> {
        if self.users.contains_key(id) {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }
}

/// Process-local store backing every repository contract.
///
/// All aggregates sit behind one mutex, so each trait method is atomic with respect to the
/// others. Clones share the same underlying state.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl UserDirectory for InMemoryStore {
    fn user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock()?.users.get(id).cloned())
    }

    fn insert_user(&self, user: User) -> Result<User, RepositoryError> {
        let mut state = self.lock()?;
        if state.users.contains_key(&user.id) {
            return Err(RepositoryError::Conflict);
        }
        state.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }
}

impl BuyerRepository for InMemoryStore {
    fn profile(&self, user_id: &UserId) -> Result<Option<BuyerProfile>, RepositoryError> {
        Ok(self.lock()?.profiles.get(user_id).cloned())
    }

    fn save_profile(&self, profile: BuyerProfile) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state.require_user(&profile.user_id)?;
        state.profiles.insert(profile.user_id.clone(), profile);
        Ok(())
    }

    fn journey(&self, buyer_id: &UserId) -> Result<Option<BuyerJourney>, RepositoryError> {
        Ok(self.lock()?.journeys.get(buyer_id).cloned())
    }

    fn save_journey(&self, journey: BuyerJourney) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state.require_user(&journey.buyer_id)?;
        state.journeys.insert(journey.buyer_id.clone(), journey);
        Ok(())
    }

    fn mortgage_tracking(
        &self,
        user_id: &UserId,
    ) -> Result<Option<MortgageTracking>, RepositoryError> {
        Ok(self.lock()?.mortgages.get(user_id).cloned())
    }

    fn save_mortgage_tracking(&self, tracking: MortgageTracking) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state.require_user(&tracking.user_id)?;
        state.mortgages.insert(tracking.user_id.clone(), tracking);
        Ok(())
    }

    fn record_event(&self, event: BuyerEvent) -> Result<BuyerEvent, RepositoryError> {
        let mut state = self.lock()?;
        state.require_user(&event.buyer_id)?;
        let log = state.buyer_events.entry(event.buyer_id.clone()).or_default();
        if log.iter().any(|existing| existing.id == event.id) {
            return Err(RepositoryError::Conflict);
        }
        log.push(event.clone());
        Ok(event)
    }

    fn recent_events(
        &self,
        buyer_id: &UserId,
        limit: usize,
    ) -> Result<Vec<BuyerEvent>, RepositoryError> {
        let state = self.lock()?;
        let mut events = state.buyer_events.get(buyer_id).cloned().unwrap_or_default();
        events.sort_by(|a, b| b.event_date.cmp(&a.event_date));
        events.truncate(limit);
        Ok(events)
    }
}

impl ReservationRepository for InMemoryStore {
    fn reservation(&self, id: &ReservationId) -> Result<Option<Reservation>, RepositoryError> {
        Ok(self.lock()?.reservations.get(id).cloned())
    }

    fn reservations_for(&self, user_id: &UserId) -> Result<Vec<Reservation>, RepositoryError> {
        let state = self.lock()?;
        let mut reservations: Vec<Reservation> = state
            .reservations
            .values()
            .filter(|reservation| &reservation.user_id == user_id)
            .cloned()
            .collect();
        reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reservations)
    }

    fn insert_reservation(
        &self,
        reservation: Reservation,
    ) -> Result<Reservation, RepositoryError> {
        let mut state = self.lock()?;
        state.require_user(&reservation.user_id)?;

        let unit_taken = state.reservations.values().any(|existing| {
            existing.unit_id == reservation.unit_id && existing.holds_unit(reservation.created_at)
        });
        if unit_taken || state.reservations.contains_key(&reservation.id) {
            return Err(RepositoryError::Conflict);
        }

        state
            .reservations
            .insert(reservation.id.clone(), reservation.clone());
        state.timelines.entry(reservation.id.clone()).or_default();
        Ok(reservation)
    }

    fn update_status(
        &self,
        id: &ReservationId,
        status: ReservationStatus,
        at: DateTime<Utc>,
    ) -> Result<Reservation, RepositoryError> {
        let mut state = self.lock()?;
        let reservation = state
            .reservations
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        reservation.status = status;
        if status == ReservationStatus::Completed {
            reservation.completion_date.get_or_insert(at);
        }
        Ok(reservation.clone())
    }

    fn insert_event(&self, event: TimelineEvent) -> Result<TimelineEvent, RepositoryError> {
        let mut state = self.lock()?;
        if !state.reservations.contains_key(&event.reservation_id) {
            return Err(RepositoryError::NotFound);
        }

        let log = state
            .timelines
            .entry(event.reservation_id.clone())
            .or_default();
        if log.iter().any(|existing| existing.id == event.id) {
            return Err(RepositoryError::Conflict);
        }
        log.push(event.clone());
        Ok(event)
    }

    fn events(
        &self,
        reservation_id: &ReservationId,
    ) -> Result<Vec<TimelineEvent>, RepositoryError> {
        Ok(self
            .lock()?
            .timelines
            .get(reservation_id)
            .cloned()
            .unwrap_or_default())
    }
}

impl KycRepository for InMemoryStore {
    fn verification(&self, user_id: &UserId) -> Result<Option<KycVerification>, RepositoryError> {
        Ok(self.lock()?.verifications.get(user_id).cloned())
    }

    fn save_verification(&self, verification: KycVerification) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state.require_user(&verification.user_id)?;
        state
            .verifications
            .insert(verification.user_id.clone(), verification);
        Ok(())
    }

    fn apply_review(
        &self,
        user_id: &UserId,
        decision: &KycReviewDecision,
    ) -> Result<KycVerification, RepositoryError> {
        let mut state = self.lock()?;
        state.require_user(user_id)?;

        // Work on a copy so a missing verification leaves the account untouched.
        let mut verification = state
            .verifications
            .get(user_id)
            .cloned()
            .ok_or(RepositoryError::NotFound)?;
        verification.apply_review(decision);

        if let Some(user) = state.users.get_mut(user_id) {
            user.kyc_status = decision.status;
        }
        state
            .verifications
            .insert(user_id.clone(), verification.clone());

        Ok(verification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::Role;
    use crate::workflows::kyc::domain::{KycStatus, PersonalInfo, VerificationImages};
    use crate::workflows::reservations::domain::ReservationStatus;
    use chrono::{TimeZone, Utc};

    fn user(id: &str) -> User {
        User {
            id: UserId::new(id),
            email: format!("{id}@example.ie"),
            first_name: None,
            last_name: None,
            phone: None,
            roles: vec![Role::Buyer],
            kyc_status: KycStatus::InReview,
            created_at: Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap(),
            last_active: None,
        }
    }

    fn reservation(id: &str, owner: &str, unit: &str, status: ReservationStatus) -> Reservation {
        Reservation {
            id: ReservationId::new(id),
            user_id: UserId::new(owner),
            unit_id: unit.to_string(),
            development_name: "Fitzgerald Gardens".to_string(),
            status,
            deposit_amount: 5_000,
            deposit_paid: false,
            total_property_price: 395_000,
            created_at: Utc.with_ymd_and_hms(2025, 2, 2, 9, 0, 0).unwrap(),
            expiry_date: None,
            completion_date: None,
        }
    }

    fn verification(owner: &str) -> KycVerification {
        KycVerification {
            user_id: UserId::new(owner),
            personal_info: PersonalInfo::default(),
            images: VerificationImages::default(),
            status: KycStatus::InReview,
            risk_score: None,
            is_politically_exposed: false,
            is_high_risk_country: false,
            compliance_flags: Vec::new(),
            review_notes: None,
            reviewed_by: None,
            submitted_at: None,
            reviewed_at: None,
            compliance_checks: Vec::new(),
            history: Vec::new(),
        }
    }

    #[test]
    fn second_live_reservation_for_unit_conflicts() {
        let store = InMemoryStore::default();
        store.insert_user(user("a")).unwrap();
        store.insert_user(user("b")).unwrap();

        store
            .insert_reservation(reservation("r1", "a", "unit-7", ReservationStatus::Pending))
            .expect("first reservation wins");
        let second =
            store.insert_reservation(reservation("r2", "b", "unit-7", ReservationStatus::Pending));
        assert_eq!(second, Err(RepositoryError::Conflict));
    }

    #[test]
    fn released_units_can_be_reserved_again() {
        let store = InMemoryStore::default();
        store.insert_user(user("a")).unwrap();
        store
            .insert_reservation(reservation("r1", "a", "unit-7", ReservationStatus::Cancelled))
            .unwrap();
        assert!(store
            .insert_reservation(reservation("r2", "a", "unit-7", ReservationStatus::Pending))
            .is_ok());
    }

    #[test]
    fn lapsed_holds_release_the_unit() {
        let store = InMemoryStore::default();
        store.insert_user(user("a")).unwrap();
        store.insert_user(user("b")).unwrap();

        let mut first = reservation("r1", "a", "unit-7", ReservationStatus::Active);
        first.expiry_date = Some(first.created_at + chrono::Duration::days(30));
        let lapse = first.expiry_date.unwrap();
        store.insert_reservation(first).unwrap();

        let mut early = reservation("r2", "b", "unit-7", ReservationStatus::Pending);
        early.created_at = lapse - chrono::Duration::days(1);
        assert_eq!(store.insert_reservation(early), Err(RepositoryError::Conflict));

        let mut late = reservation("r3", "b", "unit-7", ReservationStatus::Pending);
        late.created_at = lapse + chrono::Duration::days(15);
        assert!(store.insert_reservation(late).is_ok());
    }

    #[test]
    fn completing_a_reservation_stamps_it_and_frees_the_unit() {
        let store = InMemoryStore::default();
        store.insert_user(user("a")).unwrap();
        store.insert_user(user("b")).unwrap();
        store
            .insert_reservation(reservation("r1", "a", "unit-7", ReservationStatus::Active))
            .unwrap();

        let closed_at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let updated = store
            .update_status(&ReservationId::new("r1"), ReservationStatus::Completed, closed_at)
            .expect("status updated");
        assert_eq!(updated.status, ReservationStatus::Completed);
        assert_eq!(updated.completion_date, Some(closed_at));
        assert!(store
            .insert_reservation(reservation("r2", "b", "unit-7", ReservationStatus::Pending))
            .is_ok());

        assert_eq!(
            store.update_status(&ReservationId::new("ghost"), ReservationStatus::Cancelled, closed_at),
            Err(RepositoryError::NotFound)
        );
    }

    #[test]
    fn concurrent_reservations_have_exactly_one_winner() {
        let store = InMemoryStore::default();
        for index in 0..8 {
            store.insert_user(user(&format!("buyer-{index}"))).unwrap();
        }

        let handles: Vec<_> = (0..8)
            .map(|index| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store.insert_reservation(reservation(
                        &format!("r{index}"),
                        &format!("buyer-{index}"),
                        "unit-42",
                        ReservationStatus::Pending,
                    ))
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread completes"))
            .filter(Result::is_ok)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn events_require_parent_reservation() {
        let store = InMemoryStore::default();
        let event = TimelineEvent {
            id: crate::workflows::reservations::domain::EventId("evt-1".to_string()),
            reservation_id: ReservationId::new("missing"),
            event_type: crate::workflows::reservations::domain::TimelineEventType::NoteAdded,
            title: "Orphan".to_string(),
            description: None,
            event_date: Utc::now(),
            scheduled_date: None,
            visibility: Default::default(),
            metadata: Default::default(),
            related_document_id: None,
            created_by: None,
        };
        assert_eq!(store.insert_event(event), Err(RepositoryError::NotFound));
    }

    #[test]
    fn review_updates_verification_account_and_history_together() {
        let store = InMemoryStore::default();
        store.insert_user(user("a")).unwrap();
        store.save_verification(verification("a")).unwrap();

        let decision = KycReviewDecision {
            status: KycStatus::Approved,
            review_notes: Some("ok".to_string()),
            reviewer_id: UserId::new("admin"),
            risk_score: Some(15),
            compliance_flags: None,
            decided_at: Utc::now(),
        };
        let updated = store
            .apply_review(&UserId::new("a"), &decision)
            .expect("review applied");

        assert_eq!(updated.status, KycStatus::Approved);
        assert_eq!(updated.history.len(), 1);
        let account = store.user(&UserId::new("a")).unwrap().unwrap();
        assert_eq!(account.kyc_status, KycStatus::Approved);
    }

    #[test]
    fn review_without_verification_leaves_account_untouched() {
        let store = InMemoryStore::default();
        store.insert_user(user("a")).unwrap();

        let decision = KycReviewDecision {
            status: KycStatus::Rejected,
            review_notes: None,
            reviewer_id: UserId::new("admin"),
            risk_score: None,
            compliance_flags: None,
            decided_at: Utc::now(),
        };
        assert_eq!(
            store.apply_review(&UserId::new("a"), &decision),
            Err(RepositoryError::NotFound)
        );
        let account = store.user(&UserId::new("a")).unwrap().unwrap();
        assert_eq!(account.kyc_status, KycStatus::InReview);
    }
}
