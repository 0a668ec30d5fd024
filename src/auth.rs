use std::{collections::HashMap, future::{ready, Ready}, sync::{Mutex, OnceLock}};

use actix_web::{cookie::{self, Cookie, SameSite}, dev::Payload, web::Data, FromRequest, HttpRequest};
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use rand::{distributions::{Alphanumeric, DistString}, Rng};
use regex::Regex;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::{data::{null_as_empty, User, UserID}, db::{store::StoreError, DB}, error::{ApiError, ValidationError}};

pub const SESSION_COOKIE: &str = "session-id";
const MIN_PASSWORD_LEN: usize = 6;

/// Server-side session table.
pub struct Auth {
    sessions: HashMap<SessionID, Session>,
    ttl: Duration,
    secure_cookies: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionID(pub String);

#[derive(Debug, Clone)]
struct Session {
    user: UserID,
    expires: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PasswordStore {
    pub salt: String,
    pub hashed: String,
}

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Email already exists, please use a different one")]
    EmailTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Signup {
    #[serde(deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub password: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub full_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Login {
    #[serde(deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub password: String,
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Signup {
    fn validate(&self) -> Result<(), ValidationError> {
        let missing = [
            ("email", self.email.trim()),
            ("password", self.password.as_str()),
            ("fullName", self.full_name.trim()),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(ValidationError::missing("All fields are required", missing));
        }
        if self.password.len() < MIN_PASSWORD_LEN {
            return Err(ValidationError::new(format!("Password must be at least {MIN_PASSWORD_LEN} characters")));
        }
        if !email_regex().is_match(&normalize_email(&self.email)) {
            return Err(ValidationError::new("Invalid email format"));
        }
        Ok(())
    }
}

/// A placeholder avatar picked at signup so a fresh profile always has one.
pub fn random_avatar() -> String {
    let idx = rand::thread_rng().gen_range(1..=100);
    format!("https://avatar.iran.liara.run/public/{idx}.png")
}

fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl PasswordStore {
    pub fn secure(password: &str) -> Self {
        let salt = Alphanumeric.sample_string(&mut rand::thread_rng(), 16);
        let hashed = hash_password(password, &salt);
        Self { salt, hashed }
    }

    pub fn matches(&self, password: &str) -> bool {
        hash_password(password, &self.salt) == self.hashed
    }
}

impl Auth {
    pub fn init(ttl: Duration, secure_cookies: bool) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl,
            secure_cookies,
        }
    }

    fn gen_session_id(&self) -> SessionID {
        loop {
            let id = SessionID(Alphanumeric.sample_string(&mut rand::thread_rng(), 128));
            if !self.sessions.contains_key(&id) {
                return id;
            }
        }
    }

    fn create_session(&mut self, user: UserID) -> SessionID {
        self.purge_expired();
        let session_id = self.gen_session_id();
        let expires = Utc::now() + self.ttl;
        self.sessions.insert(session_id.clone(), Session { user, expires });
        session_id
    }

    /// Creates the account and logs it in.
    pub fn signup(&mut self, form: &Signup, db: &mut DB) -> Result<(UserID, SessionID), AuthError> {
        form.validate()?;
        let email = normalize_email(&form.email);
        if db.find_by_email(&email).is_some() {
            return Err(AuthError::EmailTaken);
        }
        let user = User::new(email, form.full_name.trim().to_string(), random_avatar());
        let id = db.create_new_user(user, PasswordStore::secure(&form.password))?;
        info!("user {id} signed up");
        Ok((id.clone(), self.create_session(id)))
    }

    pub fn login(&mut self, form: &Login, db: &DB) -> Result<(UserID, SessionID), AuthError> {
        let email = normalize_email(&form.email);
        if email.is_empty() || form.password.is_empty() {
            return Err(ValidationError::new("All fields are required").into());
        }
        let id = db.find_by_email(&email)
            .filter(|id| db.get_credentials(id).is_some_and(|c| c.matches(&form.password)));
        let Some(id) = id.cloned() else {
            warn!("failed login attempt");
            return Err(AuthError::InvalidCredentials);
        };
        info!("user {id} logged in");
        Ok((id.clone(), self.create_session(id)))
    }

    pub fn logout(&mut self, session_id: &SessionID) {
        self.sessions.remove(session_id);
    }

    pub fn get_user_for_session_id(&self, session_id: &SessionID) -> Option<&UserID> {
        self.sessions.get(session_id)
            .filter(|session| session.expires > Utc::now())
            .map(|session| &session.user)
    }

    pub fn purge_expired(&mut self) {
        let now = Utc::now();
        self.sessions.retain(|_, session| session.expires > now)
    }

    pub fn session_cookie<'a>(&self, session_id: &'a SessionID) -> Cookie<'a> {
        Cookie::build(SESSION_COOKIE, session_id.0.as_str())
            .path("/")
            .secure(self.secure_cookies)
            .same_site(SameSite::Strict)
            .http_only(true)
            .max_age(cookie::time::Duration::seconds(self.ttl.num_seconds()))
            .finish()
    }
}

pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie.make_removal();
    cookie
}

/// The authenticated caller of a request.
pub struct UserSession {
    pub user: UserID,
    pub session_id: SessionID,
}

fn resolve_session(req: &HttpRequest) -> Result<UserSession, ApiError> {
    let Some(cookie) = req.cookie(SESSION_COOKIE) else {
        return Err(ApiError::Unauthorized);
    };
    let auth = req.app_data::<Data<Mutex<Auth>>>()
        .ok_or_else(|| ApiError::internal("session lookup", "auth state not registered"))?;
    let auth = auth.lock()
        .map_err(|e| ApiError::internal("session lookup", e))?;
    let session_id = SessionID(cookie.value().to_string());
    match auth.get_user_for_session_id(&session_id) {
        Some(user) => Ok(UserSession { user: user.clone(), session_id }),
        None => Err(ApiError::Unauthorized),
    }
}

impl FromRequest for UserSession {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(resolve_session(req))
    }
}

#[cfg(test)]
mod tests {
    use crate::db::store::Store;

    use super::*;

    fn signup_form(email: &str) -> Signup {
        Signup {
            email: email.into(),
            password: "hunter22".into(),
            full_name: "Ada Lovelace".into(),
        }
    }

    fn fresh_db(dir: &std::path::Path) -> DB {
        DB::load(Store::open(dir).unwrap()).unwrap()
    }

    #[test]
    fn password_hashes_are_salted_hex() {
        let a = PasswordStore::secure("hunter22");
        let b = PasswordStore::secure("hunter22");
        assert_ne!(a.hashed, b.hashed);
        assert_eq!(a.hashed.len(), 64);
        assert!(a.matches("hunter22"));
        assert!(!a.matches("hunter23"));
    }

    #[test]
    fn signup_then_login_yields_same_user() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = fresh_db(dir.path());
        let mut auth = Auth::init(Duration::days(7), false);
        let (signed_up, _) = auth.signup(&signup_form(" Ada@Example.com "), &mut db).unwrap();
        let login = Login { email: "ada@example.com".into(), password: "hunter22".into() };
        let (logged_in, session) = auth.login(&login, &db).unwrap();
        assert_eq!(signed_up, logged_in);
        assert_eq!(auth.get_user_for_session_id(&session), Some(&signed_up));
        let user = db.get_user(&signed_up).unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert!(user.profile.profile_pic.starts_with("https://avatar.iran.liara.run/public/"));
        assert!(!user.onboarded);
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = fresh_db(dir.path());
        let mut auth = Auth::init(Duration::days(7), false);
        auth.signup(&signup_form("ada@example.com"), &mut db).unwrap();
        let err = auth.signup(&signup_form("ADA@example.com"), &mut db).unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[test]
    fn signup_validation() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = fresh_db(dir.path());
        let mut auth = Auth::init(Duration::days(7), false);

        let err = auth.signup(&Signup::default(), &mut db).unwrap_err();
        let AuthError::Validation(e) = err else { panic!("expected validation error") };
        assert_eq!(e.missing_fields, vec!["email", "password", "fullName"]);

        let short = Signup { password: "abc".into(), ..signup_form("ada@example.com") };
        assert!(matches!(auth.signup(&short, &mut db), Err(AuthError::Validation(_))));

        let bad_email = signup_form("not-an-email");
        assert!(matches!(auth.signup(&bad_email, &mut db), Err(AuthError::Validation(_))));
    }

    #[test]
    fn wrong_password_and_unknown_email_look_the_same() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = fresh_db(dir.path());
        let mut auth = Auth::init(Duration::days(7), false);
        auth.signup(&signup_form("ada@example.com"), &mut db).unwrap();

        let wrong = Login { email: "ada@example.com".into(), password: "nope-nope".into() };
        let unknown = Login { email: "bob@example.com".into(), password: "hunter22".into() };
        assert!(matches!(auth.login(&wrong, &db), Err(AuthError::InvalidCredentials)));
        assert!(matches!(auth.login(&unknown, &db), Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn expired_sessions_are_ignored_and_purged() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = fresh_db(dir.path());
        let mut auth = Auth::init(Duration::seconds(-1), false);
        let (_, session) = auth.signup(&signup_form("ada@example.com"), &mut db).unwrap();
        assert_eq!(auth.get_user_for_session_id(&session), None);
        auth.purge_expired();
        assert!(auth.sessions.is_empty());
    }

    #[test]
    fn signups_purge_expired_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = fresh_db(dir.path());
        let mut auth = Auth::init(Duration::seconds(-1), false);
        auth.signup(&signup_form("ada@example.com"), &mut db).unwrap();
        auth.signup(&signup_form("bob@example.com"), &mut db).unwrap();
        assert_eq!(auth.sessions.len(), 1);
    }

    #[test]
    fn logout_ends_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = fresh_db(dir.path());
        let mut auth = Auth::init(Duration::days(7), false);
        let (_, session) = auth.signup(&signup_form("ada@example.com"), &mut db).unwrap();
        auth.logout(&session);
        assert_eq!(auth.get_user_for_session_id(&session), None);
    }

    #[test]
    fn session_cookie_is_locked_down() {
        let auth = Auth::init(Duration::days(7), true);
        let id = SessionID("abc".into());
        let cookie = auth.session_cookie(&id);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.max_age(), Some(cookie::time::Duration::days(7)));
    }
}
