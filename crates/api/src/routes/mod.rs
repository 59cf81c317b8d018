//! Route handlers and shared application state.

pub mod gifts;
pub mod health;
pub mod metrics;
pub mod profiles;
pub mod reservations;

use projections::GiftListView;
use registry::ReservationCoordinator;
use serde::{Deserialize, Deserializer};
use store::GiftStore;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: GiftStore + Clone> {
    pub store: S,
    pub coordinator: ReservationCoordinator<S, GiftListView<S>>,
    pub gift_lists: GiftListView<S>,
}

pub(crate) fn parse_uuid(id: &str) -> Result<uuid::Uuid, ApiError> {
    uuid::Uuid::parse_str(id).map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}

/// Deserializes a field that distinguishes "absent" from "null".
///
/// Paired with `#[serde(default)]`: a missing key stays `None`, an
/// explicit `null` becomes `Some(None)` and clears the column.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
