use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    NonBinary,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::NonBinary => "non_binary",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "non_binary" => Ok(Gender::NonBinary),
            "other" => Ok(Gender::Other),
            other => Err(format!("unknown gender '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationLevel {
    #[default]
    None,
    Selfie,
    Document,
}

impl VerificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationLevel::None => "none",
            VerificationLevel::Selfie => "selfie",
            VerificationLevel::Document => "document",
        }
    }

    pub fn is_verified(&self) -> bool {
        !matches!(self, VerificationLevel::None)
    }
}

impl FromStr for VerificationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(VerificationLevel::None),
            "selfie" => Ok(VerificationLevel::Selfie),
            "document" => Ok(VerificationLevel::Document),
            other => Err(format!("unknown verification level '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A user profile as the discovery core sees it. Profiles are owned by the
/// profile store; nothing in this crate writes them except `last_active_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub interested_in: Vec<Gender>,
    pub location: Option<Coordinates>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub last_active_at: Option<DateTime<Utc>>,
    pub verification_level: VerificationLevel,
    pub is_premium: bool,
    pub is_active: bool,
    pub is_banned: bool,
    pub profile_complete: bool,
    pub has_photos: bool,
}

impl UserProfile {
    /// A bare active profile; used as a starting point by adapters and tests.
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            first_name: None,
            last_name: None,
            birth_date: None,
            gender: None,
            interested_in: Vec::new(),
            location: None,
            city: None,
            country: None,
            last_active_at: None,
            verification_level: VerificationLevel::None,
            is_premium: false,
            is_active: true,
            is_banned: false,
            profile_complete: false,
            has_photos: false,
        }
    }

    /// Age in whole years on `today`, or `None` without a birth date.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let birth = self.birth_date?;
        let mut years = today.year() - birth.year();
        if (today.month(), today.day()) < (birth.month(), birth.day()) {
            years -= 1;
        }
        u32::try_from(years).ok()
    }

    pub fn is_discoverable(&self) -> bool {
        self.is_active && !self.is_banned
    }

    /// Number of the five completion fields that are filled in.
    pub fn present_field_count(&self) -> usize {
        [
            self.first_name.as_deref().is_some_and(|s| !s.trim().is_empty()),
            self.last_name.as_deref().is_some_and(|s| !s.trim().is_empty()),
            self.birth_date.is_some(),
            self.gender.is_some(),
            !self.interested_in.is_empty(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }
}
