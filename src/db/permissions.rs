use crate::data::UserID;

use super::DB;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

impl DB {
    /// Users may only edit their own profile.
    pub fn authorize_profile_edit(&self, actor: &UserID, target: &UserID) -> Access {
        if actor == target && self.users.contains_key(target) {
            Access::Allow
        } else {
            Access::Deny
        }
    }
}
