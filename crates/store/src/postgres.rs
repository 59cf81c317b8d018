use async_trait::async_trait;
use common::{GiftId, ProfileId, ReservationId};
use domain::{
    Gift, GiftCategory, GiftFilter, GiftUpdate, NewGift, NewProfile, NewReservation, Price,
    Profile, ProfileUpdate, Reservation,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{GiftStore, Result, StoreError};

/// PostgreSQL-backed gift store implementation.
#[derive(Clone)]
pub struct PostgresGiftStore {
    pool: PgPool,
}

impl PostgresGiftStore {
    /// Creates a new PostgreSQL gift store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_gift(row: &PgRow) -> Result<Gift> {
        Ok(Gift {
            id: GiftId::from_uuid(row.try_get::<Uuid, _>("id")?),
            profile_id: ProfileId::from_uuid(row.try_get::<Uuid, _>("profile_id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            image_url: row.try_get("image_url")?,
            purchase_link: row.try_get("purchase_link")?,
            category: GiftCategory::parse_lossy(row.try_get::<String, _>("category")?.as_str()),
            price: row
                .try_get::<Option<i64>, _>("price_cents")?
                .map(Price::from_cents),
            is_reserved: row.try_get("is_reserved")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_reservation(row: &PgRow) -> Result<Reservation> {
        Ok(Reservation {
            id: ReservationId::from_uuid(row.try_get::<Uuid, _>("id")?),
            gift_id: GiftId::from_uuid(row.try_get::<Uuid, _>("gift_id")?),
            guest_name: row.try_get("guest_name")?,
            guest_email: row.try_get("guest_email")?,
            is_couple: row.try_get("is_couple")?,
            spouse_name: row.try_get("spouse_name")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_profile(row: &PgRow) -> Result<Profile> {
        Ok(Profile {
            id: ProfileId::from_uuid(row.try_get::<Uuid, _>("id")?),
            partner_name_1: row.try_get("partner_name_1")?,
            partner_name_2: row.try_get("partner_name_2")?,
            event_name: row.try_get("event_name")?,
            event_date: row.try_get("event_date")?,
            share_slug: row.try_get("share_slug")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Maps a unique-violation database error to `StoreError::UniqueViolation`,
/// passing every other error through as `Database`.
fn map_insert_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::UniqueViolation {
                constraint: db_err.constraint().unwrap_or("unknown").to_string(),
            }
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl GiftStore for PostgresGiftStore {
    #[tracing::instrument(skip(self, gift), fields(profile_id = %gift.profile_id))]
    async fn insert_gift(&self, gift: NewGift) -> Result<Gift> {
        let row = sqlx::query(
            r#"
            INSERT INTO gifts (id, profile_id, name, description, image_url,
                               purchase_link, category, price_cents)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(gift.profile_id.as_uuid())
        .bind(&gift.name)
        .bind(&gift.description)
        .bind(&gift.image_url)
        .bind(&gift.purchase_link)
        .bind(gift.category.as_str())
        .bind(gift.price.map(|p| p.cents()))
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_gift(&row)
    }

    async fn get_gift(&self, gift_id: GiftId) -> Result<Option<Gift>> {
        let row = sqlx::query("SELECT * FROM gifts WHERE id = $1")
            .bind(gift_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_gift).transpose()
    }

    #[tracing::instrument(skip(self, update), fields(%gift_id))]
    async fn update_gift(&self, gift_id: GiftId, update: GiftUpdate) -> Result<Gift> {
        // Read-modify-write under a row lock; the double-Option update
        // shape doesn't map onto a static UPDATE statement.
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT * FROM gifts WHERE id = $1 FOR UPDATE")
            .bind(gift_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::gift_not_found(gift_id))?;
        let mut gift = Self::row_to_gift(&row)?;

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

        let row = sqlx::query(
            r#"
            UPDATE gifts
            SET name = $2, description = $3, image_url = $4, purchase_link = $5,
                category = $6, price_cents = $7, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(gift_id.as_uuid())
        .bind(&gift.name)
        .bind(&gift.description)
        .bind(&gift.image_url)
        .bind(&gift.purchase_link)
        .bind(gift.category.as_str())
        .bind(gift.price.map(|p| p.cents()))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Self::row_to_gift(&row)
    }

    #[tracing::instrument(skip(self), fields(%gift_id))]
    async fn delete_gift(&self, gift_id: GiftId) -> Result<()> {
        // ON DELETE CASCADE removes the dependent reservation row.
        let result = sqlx::query("DELETE FROM gifts WHERE id = $1")
            .bind(gift_id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::gift_not_found(gift_id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(%gift_id, reserved))]
    async fn set_reserved(&self, gift_id: GiftId, reserved: bool) -> Result<Gift> {
        let row = sqlx::query(
            "UPDATE gifts SET is_reserved = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(gift_id.as_uuid())
        .bind(reserved)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::gift_not_found(gift_id))?;

        Self::row_to_gift(&row)
    }

    async fn list_gifts(&self, filter: GiftFilter) -> Result<Vec<Gift>> {
        let rows = match filter.profile_id {
            Some(profile_id) => {
                sqlx::query(
                    "SELECT * FROM gifts WHERE profile_id = $1 ORDER BY created_at DESC, id",
                )
                .bind(profile_id.as_uuid())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT * FROM gifts ORDER BY created_at DESC, id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.iter().map(Self::row_to_gift).collect()
    }

    #[tracing::instrument(skip(self, reservation), fields(gift_id = %reservation.gift_id))]
    async fn insert_reservation(&self, reservation: NewReservation) -> Result<Reservation> {
        let row = sqlx::query(
            r#"
            INSERT INTO reservations (id, gift_id, guest_name, guest_email,
                                      is_couple, spouse_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(reservation.gift_id.as_uuid())
        .bind(&reservation.guest_name)
        .bind(&reservation.guest_email)
        .bind(reservation.is_couple)
        .bind(&reservation.spouse_name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Self::row_to_reservation(&row)
    }

    #[tracing::instrument(skip(self), fields(%gift_id))]
    async fn delete_reservations_by_gift(&self, gift_id: GiftId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM reservations WHERE gift_id = $1")
            .bind(gift_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_reservations(&self, gift_ids: &[GiftId]) -> Result<Vec<Reservation>> {
        if gift_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = gift_ids.iter().map(GiftId::as_uuid).collect();
        let rows = sqlx::query(
            "SELECT * FROM reservations WHERE gift_id = ANY($1) ORDER BY created_at",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_reservation).collect()
    }

    #[tracing::instrument(skip(self, profile), fields(share_slug))]
    async fn insert_profile(&self, profile: NewProfile, share_slug: &str) -> Result<Profile> {
        let row = sqlx::query(
            r#"
            INSERT INTO profiles (id, partner_name_1, partner_name_2, event_name,
                                  event_date, share_slug)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&profile.partner_name_1)
        .bind(&profile.partner_name_2)
        .bind(profile.event_name_or_default())
        .bind(profile.event_date)
        .bind(share_slug)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Self::row_to_profile(&row)
    }

    async fn get_profile(&self, profile_id: ProfileId) -> Result<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE id = $1")
            .bind(profile_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_profile).transpose()
    }

    async fn get_profile_by_slug(&self, slug: &str) -> Result<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE share_slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_profile).transpose()
    }

    #[tracing::instrument(skip(self, update), fields(%profile_id))]
    async fn update_profile(
        &self,
        profile_id: ProfileId,
        update: ProfileUpdate,
    ) -> Result<Profile> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT * FROM profiles WHERE id = $1 FOR UPDATE")
            .bind(profile_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::profile_not_found(profile_id))?;
        let mut profile = Self::row_to_profile(&row)?;

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

        let row = sqlx::query(
            r#"
            UPDATE profiles
            SET partner_name_1 = $2, partner_name_2 = $3, event_name = $4,
                event_date = $5, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(profile_id.as_uuid())
        .bind(&profile.partner_name_1)
        .bind(&profile.partner_name_2)
        .bind(&profile.event_name)
        .bind(profile.event_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Self::row_to_profile(&row)
    }
}
