use log::info;

use crate::data::{Profile, User, UserID};

use super::{DbError, DB};

impl DB {
    /// Overwrites the profile and marks the user onboarded. Submitting the
    /// same profile again leaves the record exactly as it was.
    pub fn complete_onboarding(&mut self, id: &UserID, profile: Profile) -> Result<&User, DbError> {
        if !profile.is_complete() {
            return Err(DbError::IncompleteProfile(id.clone()));
        }
        let Some(user) = self.get_user(id) else {
            return Err(DbError::UnknownUser(id.clone()));
        };
        let first_time = !user.onboarded;
        let updated = User {
            profile,
            onboarded: true,
            ..user.clone()
        };
        let user = self.replace_user(id, updated)?;
        if first_time {
            info!("user {id} completed onboarding");
        }
        Ok(user)
    }
}
