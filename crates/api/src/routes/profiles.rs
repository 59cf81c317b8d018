//! Registry profile endpoints, including the public share page.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::NaiveDate;
use common::ProfileId;
use domain::{NewProfile, Profile, ProfileUpdate, generate_share_slug};
use serde::{Deserialize, Serialize};
use store::GiftStore;

use crate::error::ApiError;
use crate::routes::gifts::GiftListEntryResponse;
use crate::routes::{AppState, double_option, parse_uuid};

/// Attempts at inserting a freshly generated slug before giving up.
/// Collisions need both identical folded names and an identical random
/// suffix, so a retry virtually always clears them.
const SLUG_ATTEMPTS: usize = 3;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateProfileRequest {
    pub partner_name_1: String,
    pub partner_name_2: Option<String>,
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
}

#[derive(Deserialize, Default)]
pub struct UpdateProfileRequest {
    pub partner_name_1: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub partner_name_2: Option<Option<String>>,
    pub event_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub event_date: Option<Option<NaiveDate>>,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub partner_name_1: String,
    pub partner_name_2: Option<String>,
    pub event_name: String,
    pub event_date: Option<NaiveDate>,
    pub share_slug: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id.to_string(),
            partner_name_1: profile.partner_name_1,
            partner_name_2: profile.partner_name_2,
            event_name: profile.event_name,
            event_date: profile.event_date,
            share_slug: profile.share_slug,
            created_at: profile.created_at.to_rfc3339(),
            updated_at: profile.updated_at.to_rfc3339(),
        }
    }
}

/// The public share page: the profile plus its full gift list.
#[derive(Serialize)]
pub struct SharePageResponse {
    pub profile: ProfileResponse,
    pub gifts: Vec<GiftListEntryResponse>,
}

// -- Handlers --

/// POST /profiles — create a registry profile with a fresh share slug.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: GiftStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateProfileRequest>,
) -> Result<(axum::http::StatusCode, Json<ProfileResponse>), ApiError> {
    if req.partner_name_1.trim().chars().count() < 2 {
        return Err(ApiError::BadRequest(
            "partner_name_1 must have at least 2 characters".to_string(),
        ));
    }

    let new_profile = NewProfile {
        partner_name_1: req.partner_name_1.trim().to_string(),
        partner_name_2: req
            .partner_name_2
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from),
        event_name: req.event_name,
        event_date: req.event_date,
    };

    // The slug carries a random suffix, so a unique violation here is
    // a rerollable accident rather than a caller error.
    let mut last_err = None;
    for _ in 0..SLUG_ATTEMPTS {
        let slug = generate_share_slug(
            &new_profile.partner_name_1,
            new_profile.partner_name_2.as_deref(),
        );
        match state.store.insert_profile(new_profile.clone(), &slug).await {
            Ok(profile) => {
                tracing::info!(profile_id = %profile.id, share_slug = %profile.share_slug, "profile created");
                return Ok((axum::http::StatusCode::CREATED, Json(profile.into())));
            }
            Err(err) if err.is_unique_violation() => {
                last_err = Some(err);
            }
            Err(err) => return Err(err.into()),
        }
    }
    Err(last_err.map(ApiError::Store).unwrap_or_else(|| {
        ApiError::Internal("slug generation exhausted retries".to_string())
    }))
}

/// GET /profiles/:id — load a profile by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S: GiftStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile_id = ProfileId::from_uuid(parse_uuid(&id)?);
    let profile = state
        .store
        .get_profile(profile_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Profile {id} not found")))?;
    Ok(Json(profile.into()))
}

/// PATCH /profiles/:id — partially update a profile's event details.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: GiftStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile_id = ProfileId::from_uuid(parse_uuid(&id)?);

    if let Some(ref name) = req.partner_name_1 {
        if name.trim().chars().count() < 2 {
            return Err(ApiError::BadRequest(
                "partner_name_1 must have at least 2 characters".to_string(),
            ));
        }
    }

    let update = ProfileUpdate {
        partner_name_1: req.partner_name_1,
        partner_name_2: req.partner_name_2,
        event_name: req.event_name,
        event_date: req.event_date,
    };

    let profile = state.store.update_profile(profile_id, update).await?;
    Ok(Json(profile.into()))
}

/// GET /registry/:slug — the guest-facing share page.
///
/// Unknown slugs are a plain 404; the response leaks nothing about
/// which slugs exist.
#[tracing::instrument(skip(state))]
pub async fn share_page<S: GiftStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(slug): Path<String>,
) -> Result<Json<SharePageResponse>, ApiError> {
    let profile = state
        .store
        .get_profile_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Registry not found".to_string()))?;

    let entries = state
        .gift_lists
        .list_for_slug(&slug)
        .await?
        .unwrap_or_default();

    Ok(Json(SharePageResponse {
        profile: profile.into(),
        gifts: entries.iter().cloned().map(Into::into).collect(),
    }))
}
