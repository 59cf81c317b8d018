use async_trait::async_trait;
use common::{GiftId, ProfileId};
use domain::{
    Gift, GiftFilter, GiftUpdate, NewGift, NewProfile, NewReservation, Profile, ProfileUpdate,
    Reservation,
};

use crate::Result;

/// Core trait for gift store implementations.
///
/// Every operation is a single-row (or single-statement) atomic write
/// or a read; the store offers no transaction spanning the gift table
/// and the reservation table. All implementations must be thread-safe
/// (Send + Sync).
///
/// Required schema constraint: `reservations.gift_id` is unique, so at
/// most one reservation row can reference a gift. `insert_reservation`
/// surfaces a violation as [`StoreError::UniqueViolation`]; the
/// registry coordinator depends on that to decide reservation races.
///
/// [`StoreError::UniqueViolation`]: crate::StoreError::UniqueViolation
#[async_trait]
pub trait GiftStore: Send + Sync {
    // -- Gifts --

    /// Inserts a new gift. The store assigns the ID and timestamps;
    /// the reserved flag starts false.
    async fn insert_gift(&self, gift: NewGift) -> Result<Gift>;

    /// Loads a gift by ID. Returns None if it doesn't exist.
    async fn get_gift(&self, gift_id: GiftId) -> Result<Option<Gift>>;

    /// Applies a partial update to a gift's display fields.
    ///
    /// Fails with `NotFound` when the row is absent. The reserved flag
    /// cannot be changed through this path.
    async fn update_gift(&self, gift_id: GiftId, update: GiftUpdate) -> Result<Gift>;

    /// Deletes a gift and any reservation referencing it.
    async fn delete_gift(&self, gift_id: GiftId) -> Result<()>;

    /// Sets the `is_reserved` flag on a single gift row.
    ///
    /// This is the phase-1 write of the reservation protocol and the
    /// compensating write on phase-2 failure. Setting the flag to its
    /// current value succeeds; the store does not reject redundant
    /// assignments. Fails with `NotFound` when the row is absent.
    async fn set_reserved(&self, gift_id: GiftId, reserved: bool) -> Result<Gift>;

    /// Lists gifts matching the filter, newest first.
    async fn list_gifts(&self, filter: GiftFilter) -> Result<Vec<Gift>>;

    // -- Reservations --

    /// Inserts a reservation row referencing a gift.
    ///
    /// Guarded by the unique constraint on `gift_id`: when a row for
    /// the gift already exists the insert fails with
    /// `UniqueViolation` and no row is written.
    async fn insert_reservation(&self, reservation: NewReservation) -> Result<Reservation>;

    /// Deletes all reservation rows referencing the gift.
    ///
    /// Idempotent; returns the number of rows removed (0 or 1 under
    /// the unique constraint).
    async fn delete_reservations_by_gift(&self, gift_id: GiftId) -> Result<u64>;

    /// Lists reservations referencing any of the given gifts.
    async fn list_reservations(&self, gift_ids: &[GiftId]) -> Result<Vec<Reservation>>;

    // -- Profiles --

    /// Inserts a new profile with the given share slug.
    ///
    /// Fails with `UniqueViolation` when the slug is already taken.
    async fn insert_profile(&self, profile: NewProfile, share_slug: &str) -> Result<Profile>;

    /// Loads a profile by ID. Returns None if it doesn't exist.
    async fn get_profile(&self, profile_id: ProfileId) -> Result<Option<Profile>>;

    /// Resolves a profile by its public share slug.
    async fn get_profile_by_slug(&self, slug: &str) -> Result<Option<Profile>>;

    /// Applies a partial update to a profile. The slug is immutable.
    async fn update_profile(&self, profile_id: ProfileId, update: ProfileUpdate)
    -> Result<Profile>;
}
