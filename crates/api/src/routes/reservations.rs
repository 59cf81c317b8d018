//! Reservation endpoints: the guest-facing reserve/release pair plus
//! the owner's reservation list and the repair sweep.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::GiftId;
use domain::{Claimant, GiftFilter, Reservation};
use serde::{Deserialize, Serialize};
use store::GiftStore;

use crate::error::ApiError;
use crate::routes::{AppState, parse_uuid};

// -- Request types --

#[derive(Deserialize)]
pub struct ReserveRequest {
    pub guest_name: String,
    pub guest_email: String,
    #[serde(default)]
    pub is_couple: bool,
    pub spouse_name: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct ReservationResponse {
    pub id: String,
    pub gift_id: String,
    pub guest_name: String,
    pub guest_email: String,
    pub is_couple: bool,
    pub spouse_name: Option<String>,
    pub created_at: String,
}

impl From<Reservation> for ReservationResponse {
    fn from(reservation: Reservation) -> Self {
        Self {
            id: reservation.id.to_string(),
            gift_id: reservation.gift_id.to_string(),
            guest_name: reservation.guest_name,
            guest_email: reservation.guest_email,
            is_couple: reservation.is_couple,
            spouse_name: reservation.spouse_name,
            created_at: reservation.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct ReconcileResponse {
    pub repaired: u64,
}

// -- Handlers --

/// POST /gifts/:id/reserve — reserve a gift for a guest.
///
/// Returns 409 when another guest holds the gift, whether they got
/// there earlier or won a concurrent race.
#[tracing::instrument(skip(state, req))]
pub async fn reserve<S: GiftStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<ReserveRequest>,
) -> Result<(axum::http::StatusCode, Json<ReservationResponse>), ApiError> {
    let gift_id = GiftId::from_uuid(parse_uuid(&id)?);

    let claimant = Claimant {
        guest_name: req.guest_name,
        guest_email: req.guest_email,
        is_couple: req.is_couple,
        spouse_name: req.spouse_name,
    };

    let reservation = state.coordinator.reserve(gift_id, &claimant).await?;
    Ok((axum::http::StatusCode::CREATED, Json(reservation.into())))
}

/// POST /gifts/:id/release — release a reserved gift.
///
/// Idempotent: releasing an unreserved gift succeeds with no effect.
#[tracing::instrument(skip(state))]
pub async fn release<S: GiftStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, ApiError> {
    let gift_id = GiftId::from_uuid(parse_uuid(&id)?);
    state.coordinator.release(gift_id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// GET /profiles/:id/reservations — every reservation across the
/// profile's gifts.
#[tracing::instrument(skip(state))]
pub async fn list_for_profile<S: GiftStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ReservationResponse>>, ApiError> {
    let profile_id = common::ProfileId::from_uuid(parse_uuid(&id)?);

    state
        .store
        .get_profile(profile_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Profile {id} not found")))?;

    let gifts = state
        .store
        .list_gifts(GiftFilter::for_profile(profile_id))
        .await?;
    let gift_ids: Vec<GiftId> = gifts.iter().map(|gift| gift.id).collect();
    let reservations = state.store.list_reservations(&gift_ids).await?;

    Ok(Json(reservations.into_iter().map(Into::into).collect()))
}

/// POST /reconcile — sweep the store and repair flag drift.
#[tracing::instrument(skip(state))]
pub async fn reconcile<S: GiftStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<ReconcileResponse>, ApiError> {
    let repaired = state.coordinator.reconcile().await?;
    Ok(Json(ReconcileResponse { repaired }))
}
