#[macro_use]
extern crate rocket;

use rust_todo_api::build_rocket;
use rust_todo_api::config::AppConfig;

/// アプリケーションのメインエントリーポイント。
/// Djangoの `manage.py runserver` 実行時の動きに相当します。
#[launch]
fn rocket() -> _ {
    // .env と Rocket.toml から設定を読み込む (Djangoの `settings.py` に相当)
    let config = AppConfig::load().expect("Failed to load configuration");
    build_rocket(config)
}
