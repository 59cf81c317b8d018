//! Gift list projection: gifts joined with their reservations.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use common::ProfileId;
use domain::{Gift, GiftFilter, Reservation};
use registry::ProjectionInvalidator;
use serde::Serialize;
use store::GiftStore;

use crate::Result;

/// A gift paired with its reservation, when one exists.
///
/// Joined in memory from two store reads; the reservation is always
/// the authoritative signal, the gift's flag is display state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GiftWithReservation {
    pub gift: Gift,
    pub reservation: Option<Reservation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ScopeKey {
    Profile(ProfileId),
    Slug(String),
}

type Cache = HashMap<ScopeKey, Arc<Vec<GiftWithReservation>>>;

/// Owner- and guest-facing gift list view with a disposable cache.
///
/// Each scope (a profile or a public slug) caches its last result;
/// the cache is dropped wholesale when a coordinator mutation fires
/// [`ProjectionInvalidator::invalidate_gift_lists`]. Staleness across
/// sessions is expected and accepted; reads are retry-safe and have no
/// side effects.
pub struct GiftListView<S: GiftStore> {
    store: S,
    cache: Arc<RwLock<Cache>>,
}

impl<S: GiftStore + Clone> Clone for GiftListView<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<S: GiftStore> GiftListView<S> {
    /// Creates a view over the given store with an empty cache.
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Lists an owner's gifts with their reservations, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_profile(
        &self,
        profile_id: ProfileId,
    ) -> Result<Arc<Vec<GiftWithReservation>>> {
        let key = ScopeKey::Profile(profile_id);
        if let Some(cached) = self.cached(&key) {
            return Ok(cached);
        }

        let joined = self.fetch_and_join(GiftFilter::for_profile(profile_id)).await?;
        Ok(self.store_in_cache(key, joined))
    }

    /// Lists the gifts behind a public share slug.
    ///
    /// Returns `None` when the slug resolves to no profile.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_slug(&self, slug: &str) -> Result<Option<Arc<Vec<GiftWithReservation>>>> {
        let key = ScopeKey::Slug(slug.to_string());
        if let Some(cached) = self.cached(&key) {
            return Ok(Some(cached));
        }

        let Some(profile) = self.store.get_profile_by_slug(slug).await? else {
            return Ok(None);
        };

        let joined = self.fetch_and_join(GiftFilter::for_profile(profile.id)).await?;
        Ok(Some(self.store_in_cache(key, joined)))
    }

    /// Number of scopes currently cached.
    pub fn cached_scopes(&self) -> usize {
        self.cache.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    async fn fetch_and_join(&self, filter: GiftFilter) -> Result<Vec<GiftWithReservation>> {
        let gifts = self.store.list_gifts(filter).await?;
        let gift_ids: Vec<_> = gifts.iter().map(|gift| gift.id).collect();
        let reservations = self.store.list_reservations(&gift_ids).await?;

        let mut by_gift: HashMap<_, _> = reservations
            .into_iter()
            .map(|reservation| (reservation.gift_id, reservation))
            .collect();

        Ok(gifts
            .into_iter()
            .map(|gift| {
                let reservation = by_gift.remove(&gift.id);
                GiftWithReservation { gift, reservation }
            })
            .collect())
    }

    fn cached(&self, key: &ScopeKey) -> Option<Arc<Vec<GiftWithReservation>>> {
        self.cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn store_in_cache(
        &self,
        key: ScopeKey,
        joined: Vec<GiftWithReservation>,
    ) -> Arc<Vec<GiftWithReservation>> {
        let joined = Arc::new(joined);
        self.cache
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, joined.clone());
        joined
    }
}

impl<S: GiftStore> ProjectionInvalidator for GiftListView<S> {
    fn invalidate_gift_lists(&self) {
        self.cache
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}
