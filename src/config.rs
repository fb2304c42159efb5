use anyhow::{Context, Result};
use rocket::figment::providers::Env;
use rocket::figment::Figment;
use serde::{Deserialize, Deserializer};

/// フロントエンド開発サーバのデフォルトオリジン
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// アプリケーション設定。
/// Djangoの `settings.py` (DATABASES, CORS_ALLOWED_ORIGINS) に相当します。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// 接続先DB (例: `postgres://...`, `sqlite::memory:`)
    pub database_url: String,

    /// CORSを許可するオリジン。`*` は全許可。
    /// 環境変数ではカンマ区切りで指定できます。
    #[serde(default = "default_allowed_origins", deserialize_with = "one_or_many")]
    pub cors_allowed_origins: Vec<String>,

    /// コネクションプールの最大数 (未指定時は sea-orm の既定値)
    #[serde(default)]
    pub max_connections: Option<u32>,
}

impl AppConfig {
    /// `.env` → Rocket.toml / `ROCKET_*` → 素の環境変数 の順に読み込みます。
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_figment(Self::figment())
    }

    /// Rocketの設定ソースに `DATABASE_URL` などの環境変数を重ねたもの
    pub fn figment() -> Figment {
        rocket::Config::figment().merge(Env::raw().only(&[
            "database_url",
            "cors_allowed_origins",
            "max_connections",
        ]))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        figment
            .extract::<AppConfig>()
            .context("Invalid configuration: DATABASE_URL must be set")
    }

    /// 指定したDBで他はデフォルトの設定 (テスト用)
    pub fn for_database(database_url: impl Into<String>) -> Self {
        AppConfig {
            database_url: database_url.into(),
            cors_allowed_origins: default_allowed_origins(),
            max_connections: None,
        }
    }

    /// SQLiteのインメモリDBかどうか
    pub fn is_in_memory_sqlite(&self) -> bool {
        self.database_url.starts_with("sqlite")
            && (self.database_url.contains(":memory:") || self.database_url.contains("mode=memory"))
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec![DEFAULT_ALLOWED_ORIGIN.to_string()]
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => s.split(',').map(|o| o.trim().to_string()).collect(),
        OneOrMany::Many(v) => v,
    };
    Ok(values.into_iter().filter(|o| !o.is_empty()).collect())
}
