use std::{collections::HashMap, fs::{create_dir_all, read_dir, read_to_string}, io, path::{Path, PathBuf}};

use chrono::{DateTime, Utc};
use json::{object, JsonValue};
use rand::distributions::{Alphanumeric, DistString};

use crate::{auth::PasswordStore, data::{Profile, User, UserID}};

const USERS_DIR: &str = "users";
const AUTH_DIR: &str = "auth";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Malformed record {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// Directory of JSON documents, one file per record.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io { path: path.to_path_buf(), source }
}

fn malformed(path: &Path, reason: impl Into<String>) -> StoreError {
    StoreError::Malformed { path: path.to_path_buf(), reason: reason.into() }
}

fn record_id(path: &Path) -> Option<String> {
    path.file_stem().and_then(|x| x.to_str()).map(|x| x.to_string())
}

fn parse_file(path: &Path) -> Result<JsonValue, StoreError> {
    let text = read_to_string(path).map_err(io_error(path))?;
    json::parse(&text).map_err(|e| malformed(path, e.to_string()))
}

fn string_field(json: &JsonValue, path: &Path, key: &str) -> Result<String, StoreError> {
    json[key].as_str()
        .map(|x| x.to_string())
        .ok_or_else(|| malformed(path, format!("missing string field '{key}'")))
}

fn write_file(path: &Path, json: JsonValue) -> Result<(), StoreError> {
    std::fs::write(path, json.dump()).map_err(io_error(path))
}

impl Store {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self { root: root.into() };
        for dir in [store.users_path(), store.auth_path()] {
            create_dir_all(&dir).map_err(io_error(&dir))?;
        }
        Ok(store)
    }

    fn users_path(&self) -> PathBuf {
        self.root.join(USERS_DIR)
    }

    fn auth_path(&self) -> PathBuf {
        self.root.join(AUTH_DIR)
    }

    fn user_file(&self, id: &UserID) -> PathBuf {
        self.users_path().join(format!("{}.json", id.0))
    }

    fn auth_file(&self, id: &UserID) -> PathBuf {
        self.auth_path().join(format!("{}.json", id.0))
    }

    fn load_dir<T>(&self, dir: &Path, parse: impl Fn(&Path, &JsonValue) -> Result<T, StoreError>) -> Result<HashMap<UserID, T>, StoreError> {
        let mut records = HashMap::new();
        for entry in read_dir(dir).map_err(io_error(dir))? {
            let path = entry.map_err(io_error(dir))?.path();
            if path.extension().and_then(|x| x.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = record_id(&path) else {
                continue;
            };
            let json = parse_file(&path)?;
            records.insert(UserID(id), parse(&path, &json)?);
        }
        Ok(records)
    }

    pub fn load_users(&self) -> Result<HashMap<UserID, User>, StoreError> {
        self.load_dir(&self.users_path(), |path, json| {
            let created = string_field(json, path, "created")?
                .parse::<DateTime<Utc>>()
                .map_err(|e| malformed(path, e.to_string()))?;
            Ok(User {
                email: string_field(json, path, "email")?,
                created,
                profile: Profile {
                    full_name: string_field(json, path, "full-name")?,
                    bio: string_field(json, path, "bio")?,
                    native_language: string_field(json, path, "native-language")?,
                    learning_language: string_field(json, path, "learning-language")?,
                    location: string_field(json, path, "location")?,
                    profile_pic: string_field(json, path, "profile-pic")?,
                },
                onboarded: json["onboarded"].as_bool().unwrap_or(false),
            })
        })
    }

    pub fn load_credentials(&self) -> Result<HashMap<UserID, PasswordStore>, StoreError> {
        self.load_dir(&self.auth_path(), |path, json| {
            Ok(PasswordStore {
                salt: string_field(json, path, "salt")?,
                hashed: string_field(json, path, "hashed")?,
            })
        })
    }

    pub fn store_user(&self, id: &UserID, user: &User) -> Result<(), StoreError> {
        let json = object! {
            email: user.email.as_str(),
            created: user.created.to_rfc3339(),
            "full-name": user.profile.full_name.as_str(),
            bio: user.profile.bio.as_str(),
            "native-language": user.profile.native_language.as_str(),
            "learning-language": user.profile.learning_language.as_str(),
            location: user.profile.location.as_str(),
            "profile-pic": user.profile.profile_pic.as_str(),
            onboarded: user.onboarded,
        };
        write_file(&self.user_file(id), json)
    }

    pub fn store_user_auth(&self, id: &UserID, password_store: &PasswordStore) -> Result<(), StoreError> {
        let json = object! {
            salt: password_store.salt.as_str(),
            hashed: password_store.hashed.as_str(),
        };
        write_file(&self.auth_file(id), json)
    }

    pub fn delete_user(&self, id: &UserID) -> Result<(), StoreError> {
        let path = self.user_file(id);
        std::fs::remove_file(&path).map_err(io_error(&path))
    }

    pub fn gen_user_id(&self) -> UserID {
        loop {
            let id = UserID(Alphanumeric.sample_string(&mut rand::thread_rng(), 24));
            if !self.user_file(&id).exists() {
                return id;
            }
        }
    }
}
