#[macro_use]
extern crate rocket;

use rocket::fairing::AdHoc;
use rocket::{Build, Rocket};

pub mod config;
pub mod controllers;
pub mod db;
pub mod entities;
pub mod errors;
pub mod fairings;
pub mod query;
pub mod serializers;
pub mod services;
pub mod stats;
pub mod validation;

use config::AppConfig;

/// Rocketインスタンスを構築する関数。
/// テスト時にも任意の設定 (インメモリDBなど) で利用できるように分離しています。
pub fn build_rocket(config: AppConfig) -> Rocket<Build> {
    let cors = fairings::cors::Cors::new(config.cors_allowed_origins.clone());

    rocket::build()
        // 1. DB接続とマイグレーション (Djangoの `migrate` に相当)
        // 起動時 (ignite) に実行し、DB接続をRocketの管理下に置く
        .attach(AdHoc::try_on_ignite("Database", move |rocket| async move {
            match db::set_up_db(&config).await {
                Ok(db) => Ok(rocket.manage(db)),
                Err(e) => {
                    log::error!("Failed to set up database: {}", e);
                    Err(rocket)
                }
            }
        }))
        .attach(cors)
        // 2. ルーティングの登録 (Djangoの `urls.py` に相当)
        .mount(controllers::todo::BASE_PATH, controllers::todo::routes())
        .mount("/", routes![fairings::cors::preflight])
        .register("/", errors::catchers())
}
