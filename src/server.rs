use std::sync::Arc;

use rocket::{Build, Rocket, catchers, http::Method, routes};
use rocket_cors::{AllowedOrigins, CorsOptions};

use crate::config::Settings;
use crate::db::MongoLifecycle;
use crate::errors::AppError;
use crate::handlers;

/// Assembles routes, catchers, CORS and managed state.
///
/// The MongoDB lifecycle fairing is attached by the caller so the routes can
/// be exercised without a database.
pub fn build(settings: &Settings, mongo: Arc<MongoLifecycle>) -> Result<Rocket<Build>, AppError> {
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::some_exact(settings.cors_origins.as_slice()))
        .allowed_methods(
            vec![
                Method::Get,
                Method::Post,
                Method::Patch,
                Method::Put,
                Method::Delete,
                Method::Options,
                Method::Head,
            ]
            .into_iter()
            .map(From::from)
            .collect(),
        )
        .allow_credentials(true)
        .to_cors()?;

    let figment = rocket::Config::figment().merge(("port", settings.port));

    Ok(rocket::custom(figment)
        .manage(mongo)
        .attach(cors)
        .register(
            "/",
            catchers![handlers::catch404, handlers::catch500, handlers::catch503],
        )
        .mount("/", routes![handlers::index])
        .mount("/", handlers::health::routes()))
}
