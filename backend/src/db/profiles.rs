use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::stores::{ProfileStore, StoreResult};
use crate::error::StoreError;
use crate::models::{CandidateQuery, Coordinates, Gender, UserProfile, VerificationLevel};

const PROFILE_COLUMNS: &str = "id, first_name, last_name, birth_date, gender, interested_in, latitude, longitude, \
     city, country, last_active_at, verification_level, is_premium, is_active, is_banned, profile_complete, has_photos";

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: Uuid,
    first_name: Option<String>,
    last_name: Option<String>,
    birth_date: Option<NaiveDate>,
    gender: Option<String>,
    interested_in: Vec<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
    country: Option<String>,
    last_active_at: Option<DateTime<Utc>>,
    verification_level: String,
    is_premium: bool,
    is_active: bool,
    is_banned: bool,
    profile_complete: bool,
    has_photos: bool,
}

impl TryFrom<ProfileRow> for UserProfile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let gender = row
            .gender
            .as_deref()
            .map(str::parse::<Gender>)
            .transpose()
            .map_err(StoreError::CorruptRow)?;
        let interested_in = row
            .interested_in
            .iter()
            .map(|g| g.parse::<Gender>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::CorruptRow)?;
        let verification_level = row
            .verification_level
            .parse::<VerificationLevel>()
            .map_err(StoreError::CorruptRow)?;
        let location = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates { latitude, longitude }),
            _ => None,
        };

        Ok(UserProfile {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            birth_date: row.birth_date,
            gender,
            interested_in,
            location,
            city: row.city,
            country: row.country,
            last_active_at: row.last_active_at,
            verification_level,
            is_premium: row.is_premium,
            is_active: row.is_active,
            is_banned: row.is_banned,
            profile_complete: row.profile_complete,
            has_photos: row.has_photos,
        })
    }
}

fn into_profiles(rows: Vec<ProfileRow>) -> StoreResult<Vec<UserProfile>> {
    rows.into_iter().map(UserProfile::try_from).collect()
}

/// Shared discoverability predicates; placeholders start at `$first`.
/// Binds, in order: requester id, min age, max age, genders, verified only, photos only.
fn candidate_predicates(first: usize) -> String {
    let p = |offset: usize| format!("${}", first + offset);
    format!(
        "is_active = TRUE AND is_banned = FALSE \
         AND id <> {requester} \
         AND birth_date IS NOT NULL \
         AND birth_date <= CURRENT_DATE - make_interval(years => {min_age}) \
         AND birth_date > CURRENT_DATE - make_interval(years => {max_age} + 1) \
         AND (cardinality({genders}::text[]) = 0 OR gender = ANY({genders}::text[])) \
         AND ({verified} = FALSE OR verification_level <> 'none') \
         AND ({photos} = FALSE OR has_photos = TRUE)",
        requester = p(0),
        min_age = p(1),
        max_age = p(2),
        genders = p(3),
        verified = p(4),
        photos = p(5),
    )
}

fn gender_names(query: &CandidateQuery) -> Vec<String> {
    query.interested_in.iter().map(|g| g.as_str().to_string()).collect()
}

#[derive(Debug, Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<UserProfile>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", PROFILE_COLUMNS);
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserProfile::try_from).transpose()
    }

    async fn get_many(&self, ids: &[Uuid]) -> StoreResult<Vec<UserProfile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {} FROM users WHERE id = ANY($1)", PROFILE_COLUMNS);
        let rows = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;

        into_profiles(rows)
    }

    async fn by_location(
        &self,
        requester: &UserProfile,
        center: Coordinates,
        radius_km: f64,
        query: &CandidateQuery,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<UserProfile>> {
        let sql = format!(
            r#"
            SELECT {columns} FROM (
                SELECT u.*, 2 * 6371.0 * ASIN(LEAST(1.0, SQRT(
                    POWER(SIN(RADIANS(u.latitude - $1) / 2), 2)
                    + COS(RADIANS($1)) * COS(RADIANS(u.latitude))
                    * POWER(SIN(RADIANS(u.longitude - $2) / 2), 2)
                ))) AS distance_km
                FROM users u
                WHERE u.latitude IS NOT NULL AND u.longitude IS NOT NULL
                AND {predicates}
            ) nearby
            WHERE distance_km <= $3
            ORDER BY distance_km ASC, id ASC
            LIMIT $10 OFFSET $11
            "#,
            columns = PROFILE_COLUMNS,
            predicates = candidate_predicates(4),
        );

        let rows = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(center.latitude)
            .bind(center.longitude)
            .bind(radius_km)
            .bind(requester.id)
            .bind(query.min_age as i32)
            .bind(query.max_age as i32)
            .bind(gender_names(query))
            .bind(query.verified_only)
            .bind(query.with_photos_only)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        into_profiles(rows)
    }

    async fn by_preferences(
        &self,
        requester: &UserProfile,
        query: &CandidateQuery,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<UserProfile>> {
        let sql = format!(
            r#"
            SELECT {columns} FROM users
            WHERE {predicates}
            ORDER BY last_active_at DESC NULLS LAST, id ASC
            LIMIT $7 OFFSET $8
            "#,
            columns = PROFILE_COLUMNS,
            predicates = candidate_predicates(1),
        );

        let rows = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(requester.id)
            .bind(query.min_age as i32)
            .bind(query.max_age as i32)
            .bind(gender_names(query))
            .bind(query.verified_only)
            .bind(query.with_photos_only)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        into_profiles(rows)
    }

    async fn update_last_active(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("UPDATE users SET last_active_at = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
