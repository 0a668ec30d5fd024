use std::{io, sync::Arc};

use actix_web::{middleware::Logger, App, HttpServer};
use log::{error, info};

use lingo_chat::{auth::Auth, config::Config, db::{store::Store, DB}, stream::StreamClient, AppState};

fn to_io(e: impl std::fmt::Display) -> io::Error {
    error!("{e}");
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(to_io)?;
    let store = Store::open(&config.store_dir).map_err(to_io)?;
    let db = DB::load(store).map_err(to_io)?;
    let auth = Auth::init(config.session_ttl, config.secure_cookies);
    let signer = Arc::new(StreamClient::new(config.stream_api_key.clone(), config.stream_api_secret.clone()));
    let state = AppState::new(auth, db, signer);

    info!("listening on {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(|cfg| state.configure(cfg))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
