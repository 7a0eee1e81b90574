use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An unordered pair of users stored as (smaller, larger).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalPair {
    pub user_id_1: Uuid,
    pub user_id_2: Uuid,
}

impl CanonicalPair {
    pub fn new(a: Uuid, b: Uuid) -> Self {
        let (smaller_id, larger_id) = if a < b { (a, b) } else { (b, a) };
        Self {
            user_id_1: smaller_id,
            user_id_2: larger_id,
        }
    }

    pub fn contains(&self, user_id: Uuid) -> bool {
        self.user_id_1 == user_id || self.user_id_2 == user_id
    }

    /// The member of the pair that is not `user_id`.
    pub fn other(&self, user_id: Uuid) -> Option<Uuid> {
        if self.user_id_1 == user_id {
            Some(self.user_id_2)
        } else if self.user_id_2 == user_id {
            Some(self.user_id_1)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    pub user_id_1: Uuid,
    pub user_id_2: Uuid,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Match {
    pub fn new(pair: CanonicalPair, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id_1: pair.user_id_1,
            user_id_2: pair.user_id_2,
            created_at,
            is_active: true,
        }
    }

    pub fn pair(&self) -> CanonicalPair {
        CanonicalPair {
            user_id_1: self.user_id_1,
            user_id_2: self.user_id_2,
        }
    }
}

/// Result of `insert-if-absent`: either our row went in or somebody else's
/// row for the same pair was already there.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchInsert {
    Inserted(Match),
    Existing(Match),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPage {
    pub matches: Vec<Match>,
    pub total: i64,
}
