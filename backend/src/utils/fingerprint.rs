use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::models::CandidateQuery;

/// Length of the hex digests used inside cache keys.
const FINGERPRINT_HEX_LEN: usize = 16;

fn digest(bytes: &[u8]) -> String {
    let mut hex = hex::encode(Sha256::digest(bytes));
    hex.truncate(FINGERPRINT_HEX_LEN);
    hex
}

/// Deterministic digest of the resolved filter fields.
pub fn filter_fingerprint(query: &CandidateQuery) -> String {
    let interests: Vec<&str> = query.interested_in.iter().map(|g| g.as_str()).collect();
    let canonical = format!(
        "age={}-{};dist={:.3};genders={};verified={};photos={}",
        query.min_age,
        query.max_age,
        query.max_distance_km,
        interests.join(","),
        query.verified_only,
        query.with_photos_only,
    );
    digest(canonical.as_bytes())
}

/// Digest of an exclusion set; insertion order does not matter.
pub fn exclusion_fingerprint(exclusions: &BTreeSet<Uuid>) -> String {
    let mut bytes = Vec::with_capacity(exclusions.len() * 16);
    for id in exclusions {
        bytes.extend_from_slice(id.as_bytes());
    }
    digest(&bytes)
}
