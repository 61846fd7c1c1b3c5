//! User profile entities as they appear on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub firebase_uid: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role_id: i64,
    pub is_active: bool,
    pub is_verified: bool,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-specific extension of a user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: i64,
    pub user_id: i64,
    pub preferred_payment_method: Option<String>,
    pub loyalty_points: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Professional-specific extension of a user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Professional {
    pub id: i64,
    pub user_id: i64,
    pub bio: Option<String>,
    pub specialization: Option<String>,
    pub license_number: Option<String>,
    pub years_experience: Option<i32>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which role-specific extension a profile carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileType {
    Client,
    Professional,
}

/// The role-specific extension itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileExtension {
    Client(Client),
    Professional(Professional),
}

impl ProfileExtension {
    pub fn profile_type(&self) -> ProfileType {
        match self {
            ProfileExtension::Client(_) => ProfileType::Client,
            ProfileExtension::Professional(_) => ProfileType::Professional,
        }
    }
}

/// A user together with its role-specific extension.
///
/// `profile_type` is `None` exactly when `profile` is `None`: the user has
/// a role without an extension, or the extension row is missing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFullProfile {
    pub user: User,
    pub profile: Option<ProfileExtension>,
    pub profile_type: Option<ProfileType>,
}

impl UserFullProfile {
    pub fn new(user: User, profile: Option<ProfileExtension>) -> Self {
        let profile_type = profile.as_ref().map(ProfileExtension::profile_type);
        Self {
            user,
            profile,
            profile_type,
        }
    }
}
