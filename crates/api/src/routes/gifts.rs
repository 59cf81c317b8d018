//! Gift CRUD endpoints and the owner-facing gift list.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{GiftId, ProfileId};
use domain::{Gift, GiftCategory, GiftUpdate, NewGift, Price};
use projections::GiftWithReservation;
use registry::{ProjectionInvalidator, RegistryError};
use serde::{Deserialize, Serialize};
use store::GiftStore;

use crate::error::ApiError;
use crate::routes::reservations::ReservationResponse;
use crate::routes::{AppState, double_option, parse_uuid};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateGiftRequest {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub purchase_link: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
}

#[derive(Deserialize, Default)]
pub struct UpdateGiftRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub purchase_link: Option<Option<String>>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub price_cents: Option<Option<i64>>,
}

// -- Response types --

#[derive(Serialize)]
pub struct GiftResponse {
    pub id: String,
    pub profile_id: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub purchase_link: Option<String>,
    pub category: String,
    pub price_cents: Option<i64>,
    pub is_reserved: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Gift> for GiftResponse {
    fn from(gift: Gift) -> Self {
        Self {
            id: gift.id.to_string(),
            profile_id: gift.profile_id.to_string(),
            name: gift.name,
            description: gift.description,
            image_url: gift.image_url,
            purchase_link: gift.purchase_link,
            category: gift.category.as_str().to_string(),
            price_cents: gift.price.map(|p| p.cents()),
            is_reserved: gift.is_reserved,
            created_at: gift.created_at.to_rfc3339(),
            updated_at: gift.updated_at.to_rfc3339(),
        }
    }
}

/// A gift list row: the gift joined with its reservation, if any.
#[derive(Serialize)]
pub struct GiftListEntryResponse {
    pub gift: GiftResponse,
    pub reservation: Option<ReservationResponse>,
}

impl From<GiftWithReservation> for GiftListEntryResponse {
    fn from(entry: GiftWithReservation) -> Self {
        Self {
            gift: entry.gift.into(),
            reservation: entry.reservation.map(Into::into),
        }
    }
}

// -- Handlers --

/// POST /profiles/:id/gifts — add a gift to a profile's registry.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: GiftStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<CreateGiftRequest>,
) -> Result<(axum::http::StatusCode, Json<GiftResponse>), ApiError> {
    let profile_id = ProfileId::from_uuid(parse_uuid(&id)?);

    state
        .store
        .get_profile(profile_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Profile {id} not found")))?;

    let new_gift = NewGift {
        profile_id,
        name: req.name.trim().to_string(),
        description: req.description,
        image_url: req.image_url,
        purchase_link: req.purchase_link,
        category: req
            .category
            .as_deref()
            .map(GiftCategory::parse_lossy)
            .unwrap_or(GiftCategory::Other),
        price: req.price_cents.map(Price::from_cents),
    };
    new_gift.validate().map_err(RegistryError::from)?;

    let gift = state.store.insert_gift(new_gift).await?;
    state.gift_lists.invalidate_gift_lists();
    tracing::info!(gift_id = %gift.id, %profile_id, "gift created");

    Ok((axum::http::StatusCode::CREATED, Json(gift.into())))
}

/// GET /profiles/:id/gifts — the owner's gift list, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: GiftStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<GiftListEntryResponse>>, ApiError> {
    let profile_id = ProfileId::from_uuid(parse_uuid(&id)?);

    state
        .store
        .get_profile(profile_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Profile {id} not found")))?;

    let entries = state.gift_lists.list_for_profile(profile_id).await?;
    Ok(Json(entries.iter().cloned().map(Into::into).collect()))
}

/// PATCH /gifts/:id — partially update a gift's display fields.
///
/// The reserved flag is not reachable through this endpoint; it only
/// moves through the reservation protocol.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: GiftStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateGiftRequest>,
) -> Result<Json<GiftResponse>, ApiError> {
    let gift_id = GiftId::from_uuid(parse_uuid(&id)?);

    if let Some(ref name) = req.name {
        if name.trim().chars().count() < 2 {
            return Err(ApiError::BadRequest(
                "name must have at least 2 characters".to_string(),
            ));
        }
    }

    let update = GiftUpdate {
        name: req.name,
        description: req.description,
        image_url: req.image_url,
        purchase_link: req.purchase_link,
        category: req.category.as_deref().map(GiftCategory::parse_lossy),
        price: req
            .price_cents
            .map(|cents| cents.map(Price::from_cents)),
    };

    let gift = state.store.update_gift(gift_id, update).await?;
    state.gift_lists.invalidate_gift_lists();
    Ok(Json(gift.into()))
}

/// DELETE /gifts/:id — remove a gift and any reservation on it.
#[tracing::instrument(skip(state))]
pub async fn delete<S: GiftStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, ApiError> {
    let gift_id = GiftId::from_uuid(parse_uuid(&id)?);

    state
        .store
        .get_gift(gift_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Gift {id} not found")))?;

    state.store.delete_gift(gift_id).await?;
    state.gift_lists.invalidate_gift_lists();
    tracing::info!(%gift_id, "gift deleted");

    Ok(axum::http::StatusCode::NO_CONTENT)
}
