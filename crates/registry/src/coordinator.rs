//! Coordinator for the two-phase reservation protocol.

use std::collections::HashSet;

use common::GiftId;
use domain::{Claimant, GiftFilter, NewReservation, Reservation};
use store::{GiftStore, StoreError};

use crate::error::RegistryError;
use crate::invalidation::ProjectionInvalidator;

/// Orchestrates the dependent writes that keep a gift's reserved flag
/// consistent with the existence of a reservation row.
///
/// `reserve` flags the gift, then inserts the reservation, and
/// compensates the flag when the insert fails. `release` deletes the
/// reservation, then clears the flag. Both expose a single logical
/// operation to callers; neither holds any lock — consistency is
/// protocol-level, backed by the store's unique constraint on the
/// reservation's gift reference.
pub struct ReservationCoordinator<S, I>
where
    S: GiftStore,
    I: ProjectionInvalidator,
{
    store: S,
    invalidator: I,
}

impl<S, I> ReservationCoordinator<S, I>
where
    S: GiftStore,
    I: ProjectionInvalidator,
{
    /// Creates a new coordinator over the given store.
    pub fn new(store: S, invalidator: I) -> Self {
        Self { store, invalidator }
    }

    /// Reserves a gift for a claimant.
    ///
    /// Phases:
    /// 1. Validate the claimant locally; a rejected claimant causes
    ///    zero remote writes.
    /// 2. Set `is_reserved = true` on the gift row. Failure aborts
    ///    with no reservation created.
    /// 3. Insert the reservation row. On failure, compensate by
    ///    clearing the flag, then surface the insert error — a unique
    ///    violation means another guest won the race and maps to
    ///    [`RegistryError::ReservationConflict`]. If the compensating
    ///    write itself fails, [`RegistryError::InconsistentState`] is
    ///    surfaced and the orphaned gift is logged for reconciliation.
    #[tracing::instrument(skip(self, claimant), fields(%gift_id))]
    pub async fn reserve(
        &self,
        gift_id: GiftId,
        claimant: &Claimant,
    ) -> Result<Reservation, RegistryError> {
        metrics::counter!("reservations_attempted_total").increment(1);
        let start = std::time::Instant::now();

        claimant.validate()?;

        // Phase 1: flag update. Not conditional on the prior value, so
        // two racing callers can both get past this point; phase 2
        // decides the race.
        self.store
            .set_reserved(gift_id, true)
            .await
            .map_err(|e| map_store_error(gift_id, e))?;

        // Phase 2: record insert, guarded by the unique constraint.
        let record = NewReservation::from_claimant(gift_id, claimant);
        match self.store.insert_reservation(record).await {
            Ok(reservation) => {
                self.invalidator.invalidate_gift_lists();
                metrics::histogram!("reserve_duration_seconds")
                    .record(start.elapsed().as_secs_f64());
                tracing::info!(%gift_id, reservation_id = %reservation.id, "gift reserved");
                Ok(reservation)
            }
            Err(insert_err) => {
                let conflict = insert_err.is_unique_violation();
                if conflict {
                    metrics::counter!("reservations_conflict_total").increment(1);
                }
                let original = map_store_error(gift_id, insert_err);

                // Compensating write: clear the flag this call raised.
                match self.store.set_reserved(gift_id, false).await {
                    Ok(_) => {
                        metrics::counter!("reservations_compensated_total").increment(1);
                        tracing::info!(%gift_id, error = %original, "reservation compensated");

                        if conflict {
                            // The winner's reservation row survives; the
                            // compensation just cleared the flag it relies
                            // on. Re-align best-effort; the sweep catches
                            // anything this misses.
                            self.realign_flag(gift_id).await;
                        }
                        Err(original)
                    }
                    Err(comp_err) => {
                        metrics::counter!("reservations_compensation_failed_total").increment(1);
                        tracing::error!(
                            %gift_id,
                            insert_error = %original,
                            compensation_error = %comp_err,
                            "compensation failed; gift flagged reserved with no reservation row"
                        );
                        Err(RegistryError::InconsistentState { gift_id })
                    }
                }
            }
        }
    }

    /// Releases a reserved gift.
    ///
    /// Deletes the reservation row(s) first, then clears the flag, so
    /// no concurrent reader ever observes an available-looking gift
    /// that still has a reservation row. Deleting zero rows is
    /// success; the whole operation is idempotent and safe to retry
    /// when the flag write fails after the delete.
    #[tracing::instrument(skip(self), fields(%gift_id))]
    pub async fn release(&self, gift_id: GiftId) -> Result<(), RegistryError> {
        let deleted = self
            .store
            .delete_reservations_by_gift(gift_id)
            .await
            .map_err(|e| map_store_error(gift_id, e))?;

        self.store
            .set_reserved(gift_id, false)
            .await
            .map_err(|e| map_store_error(gift_id, e))?;

        self.invalidator.invalidate_gift_lists();
        metrics::counter!("releases_total").increment(1);
        tracing::info!(%gift_id, deleted, "gift released");
        Ok(())
    }

    /// Out-of-band sweep repairing flag drift left by partial
    /// failures: clears flags with no reservation row behind them and
    /// re-raises flags whose row survived a losing racer's
    /// compensation. Returns the number of corrected gifts.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(&self) -> Result<u64, RegistryError> {
        let gifts = self
            .store
            .list_gifts(GiftFilter::all())
            .await
            .map_err(map_unavailable)?;
        let gift_ids: Vec<GiftId> = gifts.iter().map(|gift| gift.id).collect();
        let reservations = self
            .store
            .list_reservations(&gift_ids)
            .await
            .map_err(map_unavailable)?;
        let reserved: HashSet<GiftId> = reservations.iter().map(|r| r.gift_id).collect();

        let mut corrected = 0u64;
        for gift in gifts {
            let should_be_reserved = reserved.contains(&gift.id);
            if gift.is_reserved != should_be_reserved {
                tracing::warn!(
                    gift_id = %gift.id,
                    flagged = gift.is_reserved,
                    has_reservation = should_be_reserved,
                    "reconciling drifted reserved flag"
                );
                // A gift deleted mid-sweep is fine to skip.
                match self.store.set_reserved(gift.id, should_be_reserved).await {
                    Ok(_) => corrected += 1,
                    Err(StoreError::NotFound { .. }) => {}
                    Err(e) => return Err(map_unavailable(e)),
                }
            }
        }

        if corrected > 0 {
            self.invalidator.invalidate_gift_lists();
            metrics::counter!("reconciled_gifts_total").increment(corrected);
        }
        Ok(corrected)
    }

    /// Best-effort re-raise of the flag for a gift whose reservation
    /// row is known to exist. Failure is logged, never surfaced: the
    /// caller's error is the conflict, and `reconcile` repairs later.
    async fn realign_flag(&self, gift_id: GiftId) {
        if let Err(e) = self.store.set_reserved(gift_id, true).await {
            tracing::warn!(%gift_id, error = %e, "failed to re-align flag after conflict");
        }
    }
}

/// Maps store failures into the registry taxonomy for a specific gift.
fn map_store_error(gift_id: GiftId, err: StoreError) -> RegistryError {
    match err {
        StoreError::NotFound { .. } => RegistryError::GiftNotFound(gift_id),
        StoreError::UniqueViolation { .. } => RegistryError::ReservationConflict(gift_id),
        other => RegistryError::StoreUnavailable(other.to_string()),
    }
}

fn map_unavailable(err: StoreError) -> RegistryError {
    RegistryError::StoreUnavailable(err.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    use common::ProfileId;
    use domain::{Gift, GiftCategory, NewGift, NewProfile};
    use store::InMemoryGiftStore;

    use super::*;
    use crate::invalidation::ProjectionInvalidator;

    /// Invalidator that counts how often it fires.
    #[derive(Clone, Default)]
    struct CountingInvalidator {
        count: Arc<AtomicU64>,
    }

    impl CountingInvalidator {
        fn fired(&self) -> u64 {
            self.count.load(Ordering::SeqCst)
        }
    }

    impl ProjectionInvalidator for CountingInvalidator {
        fn invalidate_gift_lists(&self) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn setup() -> (
        ReservationCoordinator<InMemoryGiftStore, CountingInvalidator>,
        InMemoryGiftStore,
        CountingInvalidator,
        Gift,
    ) {
        let store = InMemoryGiftStore::new();
        let invalidator = CountingInvalidator::default();
        let coordinator = ReservationCoordinator::new(store.clone(), invalidator.clone());

        let profile = store
            .insert_profile(
                NewProfile {
                    partner_name_1: "Ana".to_string(),
                    partner_name_2: Some("Bruno".to_string()),
                    event_name: None,
                    event_date: None,
                },
                "ana-e-bruno-test",
            )
            .await
            .unwrap();

        let gift = store
            .insert_gift(NewGift {
                profile_id: profile.id,
                name: "Stand Mixer".to_string(),
                description: None,
                image_url: None,
                purchase_link: None,
                category: GiftCategory::Appliances,
                price: None,
            })
            .await
            .unwrap();

        (coordinator, store, invalidator, gift)
    }

    fn ana() -> Claimant {
        Claimant::single("Ana", "ana@x.com")
    }

    #[tokio::test]
    async fn test_reserve_happy_path() {
        let (coordinator, store, invalidator, gift) = setup().await;

        let reservation = coordinator.reserve(gift.id, &ana()).await.unwrap();

        assert_eq!(reservation.gift_id, gift.id);
        assert_eq!(reservation.guest_name, "Ana");
        assert_eq!(reservation.guest_email, "ana@x.com");
        assert!(!reservation.is_couple);

        let gift = store.get_gift(gift.id).await.unwrap().unwrap();
        assert!(gift.is_reserved);
        assert_eq!(store.reservation_count().await, 1);
        assert_eq!(invalidator.fired(), 1);
    }

    #[tokio::test]
    async fn test_validation_rejected_before_any_write() {
        let (coordinator, store, invalidator, gift) = setup().await;
        let writes_before = store.write_count();

        let claimant = Claimant {
            guest_name: "Ana".to_string(),
            guest_email: "ana@x.com".to_string(),
            is_couple: true,
            spouse_name: Some("".to_string()),
        };
        let result = coordinator.reserve(gift.id, &claimant).await;

        assert!(matches!(result, Err(RegistryError::Validation(_))));
        assert_eq!(store.write_count(), writes_before);
        assert_eq!(store.reservation_count().await, 0);
        assert_eq!(invalidator.fired(), 0);
    }

    #[tokio::test]
    async fn test_reserve_missing_gift() {
        let (coordinator, store, _, _) = setup().await;

        let result = coordinator.reserve(GiftId::new(), &ana()).await;

        assert!(matches!(result, Err(RegistryError::GiftNotFound(_))));
        assert_eq!(store.reservation_count().await, 0);
    }

    #[tokio::test]
    async fn test_phase1_failure_creates_nothing() {
        let (coordinator, store, invalidator, gift) = setup().await;
        store.set_fail_on_flag(true);

        let result = coordinator.reserve(gift.id, &ana()).await;

        assert!(matches!(result, Err(RegistryError::StoreUnavailable(_))));
        assert_eq!(store.reservation_count().await, 0);
        let gift = store.get_gift(gift.id).await.unwrap().unwrap();
        assert!(!gift.is_reserved);
        assert_eq!(invalidator.fired(), 0);
    }

    #[tokio::test]
    async fn test_phase2_transient_failure_is_compensated() {
        let (coordinator, store, invalidator, gift) = setup().await;
        store.set_fail_on_insert_reservation(true);

        let result = coordinator.reserve(gift.id, &ana()).await;

        assert!(matches!(result, Err(RegistryError::StoreUnavailable(_))));
        // Compensation cleared the phase-1 flag
        let gift = store.get_gift(gift.id).await.unwrap().unwrap();
        assert!(!gift.is_reserved);
        assert_eq!(store.reservation_count().await, 0);
        assert_eq!(invalidator.fired(), 0);
    }

    #[tokio::test]
    async fn test_conflict_surfaces_and_winner_row_survives() {
        let (coordinator, store, _, gift) = setup().await;

        coordinator.reserve(gift.id, &ana()).await.unwrap();
        let result = coordinator
            .reserve(gift.id, &Claimant::single("Bia", "bia@x.com"))
            .await;

        assert!(matches!(result, Err(RegistryError::ReservationConflict(_))));

        let reservations = store.list_reservations(&[gift.id]).await.unwrap();
        assert_eq!(reservations.len(), 1);
        assert_eq!(reservations[0].guest_name, "Ana");

        // The losing call's compensation must not leave the winner's
        // flag cleared.
        let gift = store.get_gift(gift.id).await.unwrap().unwrap();
        assert!(gift.is_reserved);
    }

    #[tokio::test]
    async fn test_compensation_failure_surfaces_inconsistent_state() {
        let (coordinator, store, invalidator, gift) = setup().await;
        store.set_fail_on_insert_reservation(true);
        store.set_fail_on_unflag(true);

        let result = coordinator.reserve(gift.id, &ana()).await;

        match result {
            Err(RegistryError::InconsistentState { gift_id }) => assert_eq!(gift_id, gift.id),
            other => panic!("expected InconsistentState, got {other:?}"),
        }

        // Flagged reserved, no row behind it
        let flagged = store.get_gift(gift.id).await.unwrap().unwrap();
        assert!(flagged.is_reserved);
        assert_eq!(store.reservation_count().await, 0);
        assert_eq!(invalidator.fired(), 0);

        // Reconciliation repairs the orphaned flag once the store heals
        store.set_fail_on_insert_reservation(false);
        store.set_fail_on_unflag(false);
        assert_eq!(coordinator.reconcile().await.unwrap(), 1);
        let repaired = store.get_gift(gift.id).await.unwrap().unwrap();
        assert!(!repaired.is_reserved);
    }

    #[tokio::test]
    async fn test_release_happy_path() {
        let (coordinator, store, invalidator, gift) = setup().await;
        coordinator.reserve(gift.id, &ana()).await.unwrap();

        coordinator.release(gift.id).await.unwrap();

        let gift = store.get_gift(gift.id).await.unwrap().unwrap();
        assert!(!gift.is_reserved);
        assert_eq!(store.reservation_count().await, 0);
        assert_eq!(invalidator.fired(), 2);
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let (coordinator, store, _, gift) = setup().await;
        coordinator.reserve(gift.id, &ana()).await.unwrap();

        coordinator.release(gift.id).await.unwrap();
        coordinator.release(gift.id).await.unwrap();

        let gift = store.get_gift(gift.id).await.unwrap().unwrap();
        assert!(!gift.is_reserved);
        assert_eq!(store.reservation_count().await, 0);
    }

    #[tokio::test]
    async fn test_release_unreserved_gift_succeeds() {
        let (coordinator, _, _, gift) = setup().await;
        coordinator.release(gift.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_release_missing_gift() {
        let (coordinator, _, _, _) = setup().await;
        let result = coordinator.release(GiftId::new()).await;
        assert!(matches!(result, Err(RegistryError::GiftNotFound(_))));
    }

    #[tokio::test]
    async fn test_release_flag_failure_is_retryable() {
        let (coordinator, store, _, gift) = setup().await;
        coordinator.reserve(gift.id, &ana()).await.unwrap();

        // Step 1 (delete) succeeds, step 2 (unflag) fails
        store.set_fail_on_unflag(true);
        let result = coordinator.release(gift.id).await;
        assert!(matches!(result, Err(RegistryError::StoreUnavailable(_))));

        let stuck = store.get_gift(gift.id).await.unwrap().unwrap();
        assert!(stuck.is_reserved);
        assert_eq!(store.reservation_count().await, 0);

        // Retry succeeds once the store heals; both steps are idempotent
        store.set_fail_on_unflag(false);
        coordinator.release(gift.id).await.unwrap();
        let released = store.get_gift(gift.id).await.unwrap().unwrap();
        assert!(!released.is_reserved);
    }

    #[tokio::test]
    async fn test_concurrent_reserves_admit_exactly_one() {
        let (coordinator, store, _, gift) = setup().await;
        let coordinator = Arc::new(coordinator);

        let a = {
            let coordinator = coordinator.clone();
            let gift_id = gift.id;
            tokio::spawn(async move { coordinator.reserve(gift_id, &ana()).await })
        };
        let b = {
            let coordinator = coordinator.clone();
            let gift_id = gift.id;
            tokio::spawn(async move {
                coordinator
                    .reserve(gift_id, &Claimant::single("Bia", "bia@x.com"))
                    .await
            })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let winners = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(RegistryError::ReservationConflict(_))))
            .count();

        assert_eq!(winners, 1);
        assert_eq!(conflicts, 1);
        assert_eq!(store.reservation_count().await, 1);
    }

    #[tokio::test]
    async fn test_reconcile_clears_orphaned_flags() {
        let (coordinator, store, invalidator, gift) = setup().await;
        store.seed_orphaned_flag(gift.id).await.unwrap();

        let corrected = coordinator.reconcile().await.unwrap();

        assert_eq!(corrected, 1);
        let gift = store.get_gift(gift.id).await.unwrap().unwrap();
        assert!(!gift.is_reserved);
        assert_eq!(invalidator.fired(), 1);
    }

    #[tokio::test]
    async fn test_reconcile_restores_winner_flag() {
        let (coordinator, store, _, gift) = setup().await;
        coordinator.reserve(gift.id, &ana()).await.unwrap();

        // Simulate a losing racer's compensation having cleared the
        // winner's flag
        store.set_reserved(gift.id, false).await.unwrap();

        let corrected = coordinator.reconcile().await.unwrap();
        assert_eq!(corrected, 1);
        let gift = store.get_gift(gift.id).await.unwrap().unwrap();
        assert!(gift.is_reserved);
    }

    #[tokio::test]
    async fn test_reconcile_consistent_store_is_a_noop() {
        let (coordinator, _, invalidator, gift) = setup().await;
        coordinator.reserve(gift.id, &ana()).await.unwrap();

        let corrected = coordinator.reconcile().await.unwrap();
        assert_eq!(corrected, 0);
        assert_eq!(invalidator.fired(), 1);
    }
}
