use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::stores::{StoreResult, SwipeStore};
use crate::error::StoreError;
use crate::models::{StatsWindows, Swipe, SwipeDirection, SwipeStats};

/// PostgreSQL error codes the swipe table can raise on insert.
const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";

#[derive(Debug, FromRow)]
struct SwipeRow {
    id: Uuid,
    swiper_id: Uuid,
    swiped_id: Uuid,
    direction: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<SwipeRow> for Swipe {
    type Error = StoreError;

    fn try_from(row: SwipeRow) -> Result<Self, Self::Error> {
        Ok(Swipe {
            id: row.id,
            swiper_id: row.swiper_id,
            swiped_id: row.swiped_id,
            direction: row.direction.parse().map_err(StoreError::CorruptRow)?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct StatsRow {
    total_swipes: i64,
    likes: i64,
    passes: i64,
    super_likes: i64,
    swipes_today: i64,
    swipes_this_week: i64,
    swipes_this_month: i64,
}

fn classify_insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => return StoreError::DuplicateSwipe,
            Some(CHECK_VIOLATION) => return StoreError::SelfSwipe,
            _ => {}
        }
    }
    StoreError::Database(err)
}

#[derive(Debug, Clone)]
pub struct PgSwipeStore {
    pool: PgPool,
}

impl PgSwipeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SwipeStore for PgSwipeStore {
    async fn insert(&self, swipe: &Swipe) -> StoreResult<()> {
        if swipe.swiper_id == swipe.swiped_id {
            return Err(StoreError::SelfSwipe);
        }

        sqlx::query(
            r#"
            INSERT INTO swipes (id, swiper_id, swiped_id, direction, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(swipe.id)
        .bind(swipe.swiper_id)
        .bind(swipe.swiped_id)
        .bind(swipe.direction.as_str())
        .bind(swipe.created_at)
        .execute(&self.pool)
        .await
        .map_err(classify_insert_error)?;

        Ok(())
    }

    async fn exists(&self, swiper_id: Uuid, swiped_id: Uuid) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM swipes WHERE swiper_id = $1 AND swiped_id = $2)",
        )
        .bind(swiper_id)
        .bind(swiped_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn direction(&self, swiper_id: Uuid, swiped_id: Uuid) -> StoreResult<Option<SwipeDirection>> {
        let direction = sqlx::query_scalar::<_, String>(
            "SELECT direction FROM swipes WHERE swiper_id = $1 AND swiped_id = $2",
        )
        .bind(swiper_id)
        .bind(swiped_id)
        .fetch_optional(&self.pool)
        .await?;

        direction
            .map(|d| d.parse().map_err(StoreError::CorruptRow))
            .transpose()
    }

    async fn list(&self, user_id: Uuid, limit: usize, offset: usize) -> StoreResult<Vec<Swipe>> {
        let rows = sqlx::query_as::<_, SwipeRow>(
            r#"
            SELECT id, swiper_id, swiped_id, direction, created_at
            FROM swipes
            WHERE swiper_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Swipe::try_from).collect()
    }

    async fn swiped_ids(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT swiped_id FROM swipes WHERE swiper_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    async fn stats(&self, user_id: Uuid, windows: StatsWindows) -> StoreResult<SwipeStats> {
        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT
                COUNT(*) AS total_swipes,
                COUNT(*) FILTER (WHERE direction = 'like') AS likes,
                COUNT(*) FILTER (WHERE direction = 'pass') AS passes,
                COUNT(*) FILTER (WHERE direction = 'super_like') AS super_likes,
                COUNT(*) FILTER (WHERE created_at >= $2) AS swipes_today,
                COUNT(*) FILTER (WHERE created_at >= $3) AS swipes_this_week,
                COUNT(*) FILTER (WHERE created_at >= $4) AS swipes_this_month
            FROM swipes
            WHERE swiper_id = $1
            "#,
        )
        .bind(user_id)
        .bind(windows.day_start)
        .bind(windows.week_start)
        .bind(windows.month_start)
        .fetch_one(&self.pool)
        .await?;

        Ok(SwipeStats {
            total_swipes: row.total_swipes,
            likes: row.likes,
            passes: row.passes,
            super_likes: row.super_likes,
            swipes_today: row.swipes_today,
            swipes_this_week: row.swipes_this_week,
            swipes_this_month: row.swipes_this_month,
            like_rate: 0.0,
        }
        .with_like_rate())
    }

    async fn recent_swipers(&self, since: DateTime<Utc>, limit: usize) -> StoreResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT DISTINCT swiper_id
            FROM swipes
            WHERE created_at >= $1
            ORDER BY swiper_id
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
