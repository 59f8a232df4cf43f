mod config;
mod error;
mod filter;
mod models;
mod payload;
mod routes;
mod schema;
mod store;


#[macro_use] extern crate rocket;

use rocket::fairing::AdHoc;
use rocket::figment::Figment;
use rocket::{Build, Rocket};

use config::AppConfig;

/// Assembles the service from a figment; tests pass their own to point the
/// store at a scratch database.
fn build(figment: Figment) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(AdHoc::config::<AppConfig>())
        .attach(store::stage())
        .mount(routes::API_PREFIX, routes::routes())
        .register(
            "/",
            catchers![
                error::not_found,
                error::unprocessable,
                error::internal_error,
                error::default_catcher
            ],
        )
}

#[rocket::main]
async fn main() -> Result<(), rocket::Error> {
    // Lets a local .env feed ROCKET_* settings; a missing file is fine.
    dotenvy::dotenv().ok();

    let _rocket = build(rocket::Config::figment()).launch().await?;

    Ok(())
}
