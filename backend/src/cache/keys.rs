//! Cache key shapes. Every key for one user shares a prefix so a single
//! pattern delete can drop all of that user's pages.

use uuid::Uuid;

pub fn candidate_pool(user_id: Uuid, filter_fp: &str, exclusion_fp: &str, page: u32, size: u32) -> String {
    format!("discovery:candidates:{}:{}:{}:{}:{}", user_id, filter_fp, exclusion_fp, page, size)
}

pub fn candidate_pool_pattern(user_id: Uuid) -> String {
    format!("discovery:candidates:{}:*", user_id)
}

pub fn user_matches(user_id: Uuid, page: u32, size: u32) -> String {
    format!("matches:user:{}:{}:{}", user_id, page, size)
}

pub fn user_matches_pattern(user_id: Uuid) -> String {
    format!("matches:user:{}:*", user_id)
}

pub fn match_record(match_id: Uuid) -> String {
    format!("matches:id:{}", match_id)
}

pub fn swiped_set(user_id: Uuid) -> String {
    format!("swipes:swiped:{}", user_id)
}

pub fn swipe_stats(user_id: Uuid) -> String {
    format!("swipes:stats:{}", user_id)
}
