#![warn(clippy::all)]

use std::error::Error;

use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use env_logger::Env;
use log::info;

use db::{
    build_pool, establish_connection, prefetch_translations, run_migrations, SqliteBackend,
    SqliteConnectionPool, TranslationRegistry,
};

use crate::config::Config;
use crate::controllers::{not_found, routes};

/// Represents the [server data](actix_web.web.Data.html) for the application.
pub struct ServerData {
    pub db: SqliteConnectionPool,
    /// Translations known at startup; the only codes that map to tables.
    pub translations: TranslationRegistry,
}

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();

    // Set up logging
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;

    // Set up sentry
    let capture_errors = config.sentry_dsn.is_some();
    let _guard = sentry::init(config.sentry_dsn.to_owned());

    // Run DB migrations for a new SQLite database
    run_migrations(&mut establish_connection(&config.database_url)?)?;

    let pool = build_pool(&config.database_url, config.pool_size)?;
    let translations = prefetch_translations::<SqliteBackend>(&mut *pool.get()?)?;
    info!(
        "Loaded {} translations from {}",
        translations.len(),
        config.database_url
    );

    let data = web::Data::new(ServerData {
        db: pool,
        translations,
    });

    info!("Listening on {}", config.bind_address);
    HttpServer::new(move || {
        // Wire up the application
        App::new()
            .wrap(middleware::Compress::default())
            .wrap(
                sentry_actix::Sentry::builder()
                    .emit_header(true)
                    .capture_server_errors(capture_errors)
                    .finish(),
            )
            .wrap(middleware::Logger::default())
            .app_data(data.clone())
            .configure(routes::<SqliteBackend>)
            .default_service(web::route().to(not_found))
    })
    .bind(&config.bind_address)?
    .run()
    .await?;

    Ok(())
}

mod config;
mod controllers;
mod error;
mod responder;
