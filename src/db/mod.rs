use std::collections::HashMap;

use log::{info, warn};

use crate::{auth::PasswordStore, data::{User, UserID}};

use self::store::{Store, StoreError};

pub mod onboarding;
pub mod permissions;
pub mod store;

#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("No user with id {0}")]
    UnknownUser(UserID),
    #[error("Profile of {0} is incomplete")]
    IncompleteProfile(UserID),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// In-memory view of every user record, written through to the [`Store`].
pub struct DB {
    store: Store,
    users: HashMap<UserID, User>,
    credentials: HashMap<UserID, PasswordStore>,
    emails: HashMap<String, UserID>,
}

impl DB {
    pub fn load(store: Store) -> Result<Self, StoreError> {
        let users = store.load_users()?;
        let credentials = store.load_credentials()?;
        let emails = users.iter()
            .map(|(id, user)| (user.email.clone(), id.clone()))
            .collect();
        info!("loaded {} users", users.len());
        Ok(Self { store, users, credentials, emails })
    }

    pub fn get_user(&self, id: &UserID) -> Option<&User> {
        self.users.get(id)
    }

    pub fn find_by_email(&self, email: &str) -> Option<&UserID> {
        self.emails.get(email)
    }

    pub fn get_credentials(&self, id: &UserID) -> Option<&PasswordStore> {
        self.credentials.get(id)
    }

    pub fn create_new_user(&mut self, user: User, password_store: PasswordStore) -> Result<UserID, StoreError> {
        let id = self.store.gen_user_id();
        self.store.store_user(&id, &user)?;
        if let Err(e) = self.store.store_user_auth(&id, &password_store) {
            if let Err(cleanup) = self.store.delete_user(&id) {
                warn!("could not remove half-created user {id}: {cleanup}");
            }
            return Err(e);
        }
        self.emails.insert(user.email.clone(), id.clone());
        self.users.insert(id.clone(), user);
        self.credentials.insert(id.clone(), password_store);
        Ok(id)
    }

    /// Replaces a user record, persisting it before touching memory.
    fn replace_user(&mut self, id: &UserID, user: User) -> Result<&User, DbError> {
        if !self.users.contains_key(id) {
            return Err(DbError::UnknownUser(id.clone()));
        }
        self.store.store_user(id, &user)?;
        self.users.insert(id.clone(), user);
        self.users.get(id).ok_or_else(|| DbError::UnknownUser(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_users_are_found_after_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = DB::load(Store::open(dir.path()).unwrap()).unwrap();
        let user = User::new("ada@example.com".into(), "Ada".into(), "pic".into());
        let password = PasswordStore { salt: "s".into(), hashed: "h".into() };
        let id = db.create_new_user(user, password).unwrap();

        let db = DB::load(Store::open(dir.path()).unwrap()).unwrap();
        assert_eq!(db.find_by_email("ada@example.com"), Some(&id));
        assert_eq!(db.get_user(&id).unwrap().profile.full_name, "Ada");
        assert_eq!(db.get_credentials(&id).unwrap().hashed, "h");
    }

    #[test]
    fn failed_credential_write_leaves_no_user_behind() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = DB::load(Store::open(dir.path()).unwrap()).unwrap();
        let auth_dir = dir.path().join("auth");
        std::fs::remove_dir(&auth_dir).unwrap();
        std::fs::write(&auth_dir, "not a directory").unwrap();

        let user = User::new("ada@example.com".into(), "Ada".into(), "pic".into());
        let password = PasswordStore { salt: "s".into(), hashed: "h".into() };
        assert!(db.create_new_user(user, password).is_err());

        assert_eq!(db.find_by_email("ada@example.com"), None);
        assert_eq!(std::fs::read_dir(dir.path().join("users")).unwrap().count(), 0);
    }
}
