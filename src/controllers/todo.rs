use chrono::Utc;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::State;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entities::priority::{Priority, PriorityChoice};
use crate::errors::AppError;
use crate::query::{parse_month, TodoQuery};
use crate::serializers::{self, apply_replace, apply_update, validate_and_parse};
use crate::services::todo_service::TodoService;
use crate::stats::{available_months, TodoStats};
use crate::validation::ValidationError;

/// APIのベースパス (Django: `BASE_API_PATH = 'api/v1/'`)
pub const BASE_PATH: &str = "/api/v1";

/// 一括操作のリクエストボディ
#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    #[serde(default)]
    pub ids: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct BulkResult {
    pub affected: u64,
}

fn location(id: i32) -> String {
    format!("{}/todos/{}", BASE_PATH, id)
}

/// リクエストボディはJSONオブジェクトのみ受け付ける
fn as_object(payload: &Value) -> Result<&Map<String, Value>, AppError> {
    payload
        .as_object()
        .ok_or_else(|| AppError::BadRequest("Request body must be a JSON object".into()))
}

fn to_json(record: &crate::entities::todo::Model) -> Json<Value> {
    Json(Value::Object(serializers::serialize(record)))
}

/// TODO一覧。
/// DRFの `ViewSet.list` に相当します。
#[get("/todos?<status>&<search>&<month>&<ordering>")]
pub async fn list_todos(
    db: &State<DatabaseConnection>,
    status: Option<&str>,
    search: Option<&str>,
    month: Option<&str>,
    ordering: Option<&str>,
) -> Result<Json<Vec<Value>>, AppError> {
    let query = TodoQuery::from_params(status, search, month, ordering)?;
    let todos = TodoService::list(db.inner(), &query).await?;

    Ok(Json(
        todos
            .iter()
            .map(|t| Value::Object(serializers::serialize(t)))
            .collect(),
    ))
}

/// TODO作成 (DRF: `ViewSet.create`)
#[post("/todos", data = "<payload>")]
pub async fn create_todo(
    db: &State<DatabaseConnection>,
    payload: Json<Value>,
) -> Result<status::Created<Json<Value>>, AppError> {
    let new_todo = validate_and_parse(as_object(&payload)?)?;
    let created = TodoService::create(db.inner(), new_todo).await?;

    Ok(status::Created::new(location(created.id)).body(to_json(&created)))
}

/// TODO詳細 (DRF: `ViewSet.retrieve`)
#[get("/todos/<id>")]
pub async fn get_todo(db: &State<DatabaseConnection>, id: i32) -> Result<Json<Value>, AppError> {
    let todo_item = TodoService::get(db.inner(), id).await?;
    Ok(to_json(&todo_item))
}

/// TODO全体更新 (DRF: `ViewSet.update`)
#[put("/todos/<id>", data = "<payload>")]
pub async fn update_todo(
    db: &State<DatabaseConnection>,
    id: i32,
    payload: Json<Value>,
) -> Result<Json<Value>, AppError> {
    let existing = TodoService::get(db.inner(), id).await?;
    let updated = apply_replace(&existing, as_object(&payload)?)?;
    let saved = TodoService::save(db.inner(), updated).await?;
    Ok(to_json(&saved))
}

/// TODO部分更新 (DRF: `ViewSet.partial_update`)
#[patch("/todos/<id>", data = "<payload>")]
pub async fn partial_update_todo(
    db: &State<DatabaseConnection>,
    id: i32,
    payload: Json<Value>,
) -> Result<Json<Value>, AppError> {
    let existing = TodoService::get(db.inner(), id).await?;
    let updated = apply_update(&existing, as_object(&payload)?)?;
    let saved = TodoService::save(db.inner(), updated).await?;
    Ok(to_json(&saved))
}

/// TODO削除 (DRF: `ViewSet.destroy`)
#[delete("/todos/<id>")]
pub async fn delete_todo(db: &State<DatabaseConnection>, id: i32) -> Result<Status, AppError> {
    TodoService::delete(db.inner(), id).await?;
    Ok(Status::NoContent)
}

/// 集計 (ダッシュボード用)
#[get("/todos/stats?<month>")]
pub async fn todo_stats(
    db: &State<DatabaseConnection>,
    month: Option<&str>,
) -> Result<Json<TodoStats>, AppError> {
    let month = parse_month(month)?;
    let todos = TodoService::find_all(db.inner()).await?;
    Ok(Json(TodoStats::compute(&todos, month, Utc::now())))
}

/// 作成月の一覧 (新しい順)
#[get("/todos/months")]
pub async fn todo_months(db: &State<DatabaseConnection>) -> Result<Json<Vec<String>>, AppError> {
    let created = TodoService::created_timestamps(db.inner()).await?;
    Ok(Json(available_months(created.iter())))
}

fn require_ids(request: &BulkRequest) -> Result<&[i32], AppError> {
    if request.ids.is_empty() {
        return Err(ValidationError::MissingField { field: "ids" }.into());
    }
    Ok(&request.ids)
}

/// 選択したTODOをまとめて完了にする
#[post("/todos/bulk/complete", data = "<request>")]
pub async fn bulk_complete(
    db: &State<DatabaseConnection>,
    request: Json<BulkRequest>,
) -> Result<Json<BulkResult>, AppError> {
    let ids = require_ids(&request)?;
    let affected = TodoService::complete_many(db.inner(), ids).await?;
    Ok(Json(BulkResult { affected }))
}

/// 選択したTODOをまとめて削除する
#[post("/todos/bulk/delete", data = "<request>")]
pub async fn bulk_delete(
    db: &State<DatabaseConnection>,
    request: Json<BulkRequest>,
) -> Result<Json<BulkResult>, AppError> {
    let ids = require_ids(&request)?;
    let affected = TodoService::delete_many(db.inner(), ids).await?;
    Ok(Json(BulkResult { affected }))
}

/// 優先度の選択肢 (Djangoの `Priority.choices`)
#[get("/priorities")]
pub fn list_priorities() -> Json<Vec<PriorityChoice>> {
    Json(Priority::choices())
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        list_todos,
        create_todo,
        get_todo,
        update_todo,
        partial_update_todo,
        delete_todo,
        todo_stats,
        todo_months,
        bulk_complete,
        bulk_delete,
        list_priorities,
    ]
}
