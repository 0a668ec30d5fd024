use std::collections::HashSet;

use serde::{Deserialize, Deserializer};

use crate::error::ValidationError;

/// Onboarding fields of a user record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub full_name: String,
    pub bio: String,
    pub native_language: String,
    pub learning_language: String,
    pub location: String,
    pub profile_pic: String,
}

impl Profile {
    pub fn is_complete(&self) -> bool {
        [
            &self.full_name,
            &self.bio,
            &self.native_language,
            &self.learning_language,
            &self.location,
            &self.profile_pic,
        ]
        .iter()
        .all(|x| !x.is_empty())
    }
}

/// Lets clients send `null` for a field they left blank.
pub(crate) fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Strips markup and returns plain text, entities decoded.
fn plain_text(html: &str) -> String {
    let cleaned = ammonia::Builder::empty()
        .clean_content_tags(HashSet::from(["script", "style"]))
        .clean(html)
        .to_string();
    html_escape::decode_html_entities(&cleaned).trim().to_string()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnboardingForm {
    #[serde(deserialize_with = "null_as_empty")]
    pub full_name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub bio: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub native_language: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub learning_language: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub location: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub profile_pic: String,
}

impl OnboardingForm {
    /// Trims every field and strips markup from the bio. Every field must be
    /// non-empty afterwards.
    pub fn validate(self) -> Result<Profile, ValidationError> {
        let profile = Profile {
            full_name: self.full_name.trim().to_string(),
            bio: plain_text(&self.bio),
            native_language: self.native_language.trim().to_string(),
            learning_language: self.learning_language.trim().to_string(),
            location: self.location.trim().to_string(),
            profile_pic: self.profile_pic.trim().to_string(),
        };
        let missing = [
            ("fullName", &profile.full_name),
            ("bio", &profile.bio),
            ("nativeLanguage", &profile.native_language),
            ("learningLanguage", &profile.learning_language),
            ("location", &profile.location),
            ("profilePic", &profile.profile_pic),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect::<Vec<_>>();
        if missing.is_empty() {
            Ok(profile)
        } else {
            Err(ValidationError::missing("All fields are required", missing))
        }
    }
}
