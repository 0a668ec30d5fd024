use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Profile, UserID};

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub email: String,
    pub created: DateTime<Utc>,
    pub profile: Profile,
    pub onboarded: bool,
}

impl User {
    pub fn new(email: String, full_name: String, profile_pic: String) -> Self {
        Self {
            email,
            created: Utc::now(),
            profile: Profile {
                full_name,
                profile_pic,
                ..Default::default()
            },
            onboarded: false,
        }
    }

    pub fn view<'a>(&'a self, id: &'a UserID) -> UserView<'a> {
        UserView {
            id,
            email: &self.email,
            full_name: &self.profile.full_name,
            bio: &self.profile.bio,
            native_language: &self.profile.native_language,
            learning_language: &self.profile.learning_language,
            location: &self.profile.location,
            profile_pic: &self.profile.profile_pic,
            is_onboarded: self.onboarded,
            created_at: self.created,
        }
    }
}

/// What clients get to see of a user. Credentials never leave the server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView<'a> {
    pub id: &'a UserID,
    pub email: &'a str,
    pub full_name: &'a str,
    pub bio: &'a str,
    pub native_language: &'a str,
    pub learning_language: &'a str,
    pub location: &'a str,
    pub profile_pic: &'a str,
    pub is_onboarded: bool,
    pub created_at: DateTime<Utc>,
}
