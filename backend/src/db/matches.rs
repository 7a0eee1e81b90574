use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::stores::{MatchStore, StoreResult};
use crate::error::StoreError;
use crate::models::{CanonicalPair, Match, MatchInsert};

const MATCH_COLUMNS: &str = "id, user_id_1, user_id_2, created_at, is_active";

#[derive(Debug, sqlx::FromRow)]
struct MatchRow {
    id: Uuid,
    user_id_1: Uuid,
    user_id_2: Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
    is_active: bool,
}

impl From<MatchRow> for Match {
    fn from(row: MatchRow) -> Self {
        Match {
            id: row.id,
            user_id_1: row.user_id_1,
            user_id_2: row.user_id_2,
            created_at: row.created_at,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Match>> {
        let sql = format!("SELECT {} FROM matches WHERE id = $1", MATCH_COLUMNS);
        let row = sqlx::query_as::<_, MatchRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Match::from))
    }

    async fn get_pair(&self, pair: CanonicalPair) -> StoreResult<Option<Match>> {
        let sql = format!(
            "SELECT {} FROM matches WHERE user_id_1 = $1 AND user_id_2 = $2",
            MATCH_COLUMNS
        );
        let row = sqlx::query_as::<_, MatchRow>(&sql)
            .bind(pair.user_id_1)
            .bind(pair.user_id_2)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Match::from))
    }

    async fn insert_if_absent(&self, record: &Match) -> StoreResult<MatchInsert> {
        let sql = format!(
            r#"
            INSERT INTO matches (id, user_id_1, user_id_2, created_at, is_active)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id_1, user_id_2) DO NOTHING
            RETURNING {}
            "#,
            MATCH_COLUMNS
        );
        let inserted = sqlx::query_as::<_, MatchRow>(&sql)
            .bind(record.id)
            .bind(record.user_id_1)
            .bind(record.user_id_2)
            .bind(record.created_at)
            .bind(record.is_active)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = inserted {
            return Ok(MatchInsert::Inserted(row.into()));
        }

        // Lost the race: the conflicting row is committed and visible now.
        self.get_pair(record.pair())
            .await?
            .map(MatchInsert::Existing)
            .ok_or_else(|| StoreError::CorruptRow("match conflict without a stored row".to_string()))
    }

    async fn update(&self, record: &Match) -> StoreResult<()> {
        sqlx::query("UPDATE matches SET is_active = $2 WHERE id = $1")
            .bind(record.id)
            .bind(record.is_active)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list(&self, user_id: Uuid, limit: usize, offset: usize) -> StoreResult<Vec<Match>> {
        let sql = format!(
            r#"
            SELECT {} FROM matches
            WHERE (user_id_1 = $1 OR user_id_2 = $1) AND is_active = TRUE
            ORDER BY created_at DESC, id ASC
            LIMIT $2 OFFSET $3
            "#,
            MATCH_COLUMNS
        );
        let rows = sqlx::query_as::<_, MatchRow>(&sql)
            .bind(user_id)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Match::from).collect())
    }

    async fn count(&self, user_id: Uuid) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM matches WHERE (user_id_1 = $1 OR user_id_2 = $1) AND is_active = TRUE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
