use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};

use crate::config::AppConfig;

/// データベース接続をセットアップし、マイグレーションを適用します。
/// Djangoでは `settings.py` の `DATABASES` 設定と `migrate` コマンドに相当します。
pub async fn set_up_db(config: &AppConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options.sqlx_logging_level(log::LevelFilter::Debug);

    if config.is_in_memory_sqlite() {
        // インメモリDBは接続ごとに別物になるため、1本の接続を使い回す
        options.max_connections(1).min_connections(1);
    } else if let Some(max) = config.max_connections {
        options.max_connections(max);
    }

    // Database::connect は接続プールを自動的に作成します。
    let db = Database::connect(options).await?;
    log::info!("Connected to database ({:?})", db.get_database_backend());

    Migrator::up(&db, None).await?;
    log::info!("Migrations applied");

    Ok(db)
}
