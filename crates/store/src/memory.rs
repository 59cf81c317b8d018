use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::{GiftId, ProfileId, ReservationId};
use domain::{
    Gift, GiftFilter, GiftUpdate, NewGift, NewProfile, NewReservation, Profile, ProfileUpdate,
    Reservation,
};
use tokio::sync::RwLock;

use crate::{GiftStore, Result, StoreError};

#[derive(Default)]
struct Tables {
    gifts: HashMap<GiftId, Gift>,
    gift_order: Vec<GiftId>,
    reservations: HashMap<GiftId, Reservation>,
    profiles: HashMap<ProfileId, Profile>,
}

/// Which writes the store should reject, for exercising failure paths.
///
/// The flag writes are split by direction so a test can let phase 1 of
/// a reservation succeed while the compensating write fails.
#[derive(Debug, Default, Clone, Copy)]
struct Faults {
    fail_flag: bool,
    fail_unflag: bool,
    fail_insert_reservation: bool,
    fail_delete_reservations: bool,
}

/// In-memory gift store implementation for testing.
///
/// Mirrors the PostgreSQL implementation's contract, including the
/// unique reservation-per-gift constraint, and adds fault injection
/// plus a write counter so tests can observe exactly which remote
/// writes an operation attempted.
#[derive(Clone, Default)]
pub struct InMemoryGiftStore {
    tables: Arc<RwLock<Tables>>,
    faults: Arc<std::sync::RwLock<Faults>>,
    write_count: Arc<AtomicU64>,
}

impl InMemoryGiftStore {
    /// Creates a new empty in-memory gift store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures `set_reserved(_, true)` to fail.
    pub fn set_fail_on_flag(&self, fail: bool) {
        self.faults.write().unwrap_or_else(|e| e.into_inner()).fail_flag = fail;
    }

    /// Configures `set_reserved(_, false)` to fail.
    pub fn set_fail_on_unflag(&self, fail: bool) {
        self.faults.write().unwrap_or_else(|e| e.into_inner()).fail_unflag = fail;
    }

    /// Configures `insert_reservation` to fail with a transient error.
    pub fn set_fail_on_insert_reservation(&self, fail: bool) {
        self.faults.write().unwrap_or_else(|e| e.into_inner()).fail_insert_reservation = fail;
    }

    /// Configures `delete_reservations_by_gift` to fail.
    pub fn set_fail_on_delete_reservations(&self, fail: bool) {
        self.faults.write().unwrap_or_else(|e| e.into_inner()).fail_delete_reservations = fail;
    }

    /// Number of write operations attempted so far, failed ones
    /// included.
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::SeqCst)
    }

    /// Number of reservation rows currently stored.
    pub async fn reservation_count(&self) -> usize {
        self.tables.read().await.reservations.len()
    }

    /// Raises the reserved flag on a gift without writing a
    /// reservation row. Test-only hook for seeding the inconsistent
    /// state the reconciliation sweep repairs.
    pub async fn seed_orphaned_flag(&self, gift_id: GiftId) -> Result<()> {
        let mut tables = self.tables.write().await;
        let gift = tables
            .gifts
            .get_mut(&gift_id)
            .ok_or_else(|| StoreError::gift_not_found(gift_id))?;
        gift.is_reserved = true;
        Ok(())
    }

    fn faults(&self) -> Faults {
        *self.faults.read().unwrap_or_else(|e| e.into_inner())
    }

    fn record_write(&self) {
        self.write_count.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl GiftStore for InMemoryGiftStore {
    async fn insert_gift(&self, gift: NewGift) -> Result<Gift> {
        self.record_write();
        let now = Utc::now();
        let record = Gift {
            id: GiftId::new(),
            profile_id: gift.profile_id,
            name: gift.name,
            description: gift.description,
            image_url: gift.image_url,
            purchase_link: gift.purchase_link,
            category: gift.category,
            price: gift.price,
            is_reserved: false,
            created_at: now,
            updated_at: now,
        };

        let mut tables = self.tables.write().await;
        tables.gift_order.push(record.id);
        tables.gifts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_gift(&self, gift_id: GiftId) -> Result<Option<Gift>> {
        Ok(self.tables.read().await.gifts.get(&gift_id).cloned())
    }

    async fn update_gift(&self, gift_id: GiftId, update: GiftUpdate) -> Result<Gift> {
        self.record_write();
        let mut tables = self.tables.write().await;
        let gift = tables
            .gifts
            .get_mut(&gift_id)
            .ok_or_else(|| StoreError::gift_not_found(gift_id))?;

        if let Some(name) = update.name {
            gift.name = name;
        }
        if let Some(description) = update.description {
            gift.description = description;
        }
        if let Some(image_url) = update.image_url {
            gift.image_url = image_url;
        }
        if let Some(purchase_link) = update.purchase_link {
            gift.purchase_link = purchase_link;
        }
        if let Some(category) = update.category {
            gift.category = category;
        }
        if let Some(price) = update.price {
            gift.price = price;
        }
        gift.updated_at = Utc::now();

        Ok(gift.clone())
    }

    async fn delete_gift(&self, gift_id: GiftId) -> Result<()> {
        self.record_write();
        let mut tables = self.tables.write().await;
        if tables.gifts.remove(&gift_id).is_none() {
            return Err(StoreError::gift_not_found(gift_id));
        }
        tables.gift_order.retain(|id| *id != gift_id);
        tables.reservations.remove(&gift_id);
        Ok(())
    }

    async fn set_reserved(&self, gift_id: GiftId, reserved: bool) -> Result<Gift> {
        self.record_write();
        let faults = self.faults();
        if reserved && faults.fail_flag {
            return Err(StoreError::Unavailable("injected flag failure".to_string()));
        }
        if !reserved && faults.fail_unflag {
            return Err(StoreError::Unavailable(
                "injected unflag failure".to_string(),
            ));
        }

        let mut tables = self.tables.write().await;
        let gift = tables
            .gifts
            .get_mut(&gift_id)
            .ok_or_else(|| StoreError::gift_not_found(gift_id))?;
        gift.is_reserved = reserved;
        gift.updated_at = Utc::now();
        Ok(gift.clone())
    }

    async fn list_gifts(&self, filter: GiftFilter) -> Result<Vec<Gift>> {
        let tables = self.tables.read().await;
        // Insertion order reversed = newest first
        let gifts = tables
            .gift_order
            .iter()
            .rev()
            .filter_map(|id| tables.gifts.get(id))
            .filter(|gift| {
                filter
                    .profile_id
                    .is_none_or(|profile_id| gift.profile_id == profile_id)
            })
            .cloned()
            .collect();
        Ok(gifts)
    }

    async fn insert_reservation(&self, reservation: NewReservation) -> Result<Reservation> {
        self.record_write();
        if self.faults().fail_insert_reservation {
            return Err(StoreError::Unavailable(
                "injected insert failure".to_string(),
            ));
        }

        let mut tables = self.tables.write().await;
        if tables.reservations.contains_key(&reservation.gift_id) {
            return Err(StoreError::UniqueViolation {
                constraint: "reservations_gift_id_key".to_string(),
            });
        }

        let record = Reservation {
            id: ReservationId::new(),
            gift_id: reservation.gift_id,
            guest_name: reservation.guest_name,
            guest_email: reservation.guest_email,
            is_couple: reservation.is_couple,
            spouse_name: reservation.spouse_name,
            created_at: Utc::now(),
        };
        tables.reservations.insert(record.gift_id, record.clone());
        Ok(record)
    }

    async fn delete_reservations_by_gift(&self, gift_id: GiftId) -> Result<u64> {
        self.record_write();
        if self.faults().fail_delete_reservations {
            return Err(StoreError::Unavailable(
                "injected delete failure".to_string(),
            ));
        }

        let mut tables = self.tables.write().await;
        Ok(u64::from(tables.reservations.remove(&gift_id).is_some()))
    }

    async fn list_reservations(&self, gift_ids: &[GiftId]) -> Result<Vec<Reservation>> {
        let tables = self.tables.read().await;
        let reservations = gift_ids
            .iter()
            .filter_map(|id| tables.reservations.get(id))
            .cloned()
            .collect();
        Ok(reservations)
    }

    async fn insert_profile(&self, profile: NewProfile, share_slug: &str) -> Result<Profile> {
        self.record_write();
        let mut tables = self.tables.write().await;
        if tables
            .profiles
            .values()
            .any(|existing| existing.share_slug == share_slug)
        {
            return Err(StoreError::UniqueViolation {
                constraint: "profiles_share_slug_key".to_string(),
            });
        }

        let now = Utc::now();
        let record = Profile {
            id: ProfileId::new(),
            partner_name_1: profile.partner_name_1.clone(),
            partner_name_2: profile.partner_name_2.clone(),
            event_name: profile.event_name_or_default().to_string(),
            event_date: profile.event_date,
            share_slug: share_slug.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.profiles.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_profile(&self, profile_id: ProfileId) -> Result<Option<Profile>> {
        Ok(self.tables.read().await.profiles.get(&profile_id).cloned())
    }

    async fn get_profile_by_slug(&self, slug: &str) -> Result<Option<Profile>> {
        let tables = self.tables.read().await;
        Ok(tables
            .profiles
            .values()
            .find(|profile| profile.share_slug == slug)
            .cloned())
    }

    async fn update_profile(
        &self,
        profile_id: ProfileId,
        update: ProfileUpdate,
    ) -> Result<Profile> {
        self.record_write();
        let mut tables = self.tables.write().await;
        let profile = tables
            .profiles
            .get_mut(&profile_id)
            .ok_or_else(|| StoreError::profile_not_found(profile_id))?;

        if let Some(name) = update.partner_name_1 {
            profile.partner_name_1 = name;
        }
        if let Some(name) = update.partner_name_2 {
            profile.partner_name_2 = name;
        }
        if let Some(event_name) = update.event_name {
            profile.event_name = event_name;
        }
        if let Some(event_date) = update.event_date {
            profile.event_date = event_date;
        }
        profile.updated_at = Utc::now();

        Ok(profile.clone())
    }
}
