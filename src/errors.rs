use rocket::http::Status;
use rocket::response::{self, status, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use sea_orm::DbErr;
use serde_json::{json, Value};

use crate::validation::{ValidationError, ValidationErrors};

/// アプリケーション全体で使用するエラー型。
/// DRFの例外 (ValidationError, NotFound 等) に相当し、JSONでレスポンスします。
#[derive(Debug)]
pub enum AppError {
    /// 入力値のバリデーションエラー (400 Bad Request)
    Validation(ValidationErrors),
    /// 不正なリクエスト (400 Bad Request)
    BadRequest(String),
    /// リソースが見つからない (404 Not Found)
    NotFound,
    /// データベースエラー
    Database(DbErr),
    /// 内部エラー (500 Internal Server Error)
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> Status {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => Status::BadRequest,
            AppError::NotFound => Status::NotFound,
            AppError::Database(_) | AppError::Internal(_) => Status::InternalServerError,
        }
    }

    fn body(&self) -> Value {
        match self {
            AppError::Validation(errors) => json!({
                "detail": "Validation failed",
                "errors": errors.details(),
            }),
            AppError::BadRequest(msg) => json!({ "detail": msg, "errors": [] }),
            AppError::NotFound => json!({ "detail": "Not found", "errors": [] }),
            // 内部情報はレスポンスに含めない
            AppError::Database(_) => json!({ "detail": "Database error", "errors": [] }),
            AppError::Internal(_) => json!({ "detail": "Internal server error", "errors": [] }),
        }
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status.code >= 500 {
            log::error!("{} {}: {}", request.method(), request.uri(), self);
        } else {
            log::warn!("{} {}: {}", request.method(), request.uri(), self);
        }
        status::Custom(status, Json(self.body())).respond_to(request)
    }
}

impl From<DbErr> for AppError {
    fn from(e: DbErr) -> Self {
        AppError::Database(e)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(e: ValidationErrors) -> Self {
        AppError::Validation(e)
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(e.into())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Validation(errors) => write!(f, "Validation error: {}", errors),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound => write!(f, "Not found"),
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// ルートにマッチしなかった場合や、データガードが失敗した場合のJSONレスポンス。
/// Djangoの `handler404` / `handler500` に相当。
#[catch(default)]
pub fn default_catcher(status: Status, _request: &Request<'_>) -> status::Custom<Json<Value>> {
    let detail = status.reason().unwrap_or("Unknown error");
    status::Custom(status, Json(json!({ "detail": detail, "errors": [] })))
}

pub fn catchers() -> Vec<rocket::Catcher> {
    catchers![default_catcher]
}
