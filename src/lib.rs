use std::sync::{Arc, Mutex};

use actix_web::web::{Data, ServiceConfig};

use auth::Auth;
use db::DB;
use stream::TokenSigner;

pub mod auth;
pub mod config;
pub mod data;
pub mod db;
pub mod error;
pub mod routes;
pub mod stream;
pub mod theme;

/// Shared state handed to every worker.
#[derive(Clone)]
pub struct AppState {
    pub auth: Data<Mutex<Auth>>,
    pub db: Data<Mutex<DB>>,
    pub signer: Data<dyn TokenSigner>,
}

impl AppState {
    pub fn new(auth: Auth, db: DB, signer: Arc<dyn TokenSigner>) -> Self {
        Self {
            auth: Data::new(Mutex::new(auth)),
            db: Data::new(Mutex::new(db)),
            signer: Data::from(signer),
        }
    }

    pub fn configure(&self, cfg: &mut ServiceConfig) {
        cfg.app_data(self.auth.clone())
            .app_data(self.db.clone())
            .app_data(self.signer.clone());
        routes::configure(cfg);
    }
}
