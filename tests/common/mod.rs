#![allow(dead_code)]

use rocket::http::{ContentType, Status};
use rocket::local::blocking::Client;
use rust_todo_api::build_rocket;
use rust_todo_api::config::AppConfig;
use serde_json::Value;

/// テスト用のクライアントを作成します。
/// クライアントごとに新しいインメモリSQLiteを使うため、テスト間でデータは共有されません。
pub fn setup() -> Client {
    let config = AppConfig::for_database("sqlite::memory:");
    Client::tracked(build_rocket(config)).expect("valid rocket instance")
}

/// JSONをPOSTしてTODOを作成し、レスポンスボディを返す
pub fn create_todo(client: &Client, body: Value) -> Value {
    let response = client
        .post("/api/v1/todos")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Created);
    response.into_json().expect("json body")
}

pub fn get_json(client: &Client, uri: &str) -> (Status, Value) {
    let response = client.get(uri.to_string()).dispatch();
    let status = response.status();
    (status, response.into_json().unwrap_or(Value::Null))
}

pub fn send_json(client: &Client, method: &str, uri: &str, body: Value) -> (Status, Value) {
    let request = match method {
        "POST" => client.post(uri.to_string()),
        "PUT" => client.put(uri.to_string()),
        "PATCH" => client.patch(uri.to_string()),
        other => panic!("unsupported method {}", other),
    };
    let response = request.header(ContentType::JSON).body(body.to_string()).dispatch();
    let status = response.status();
    (status, response.into_json().unwrap_or(Value::Null))
}

/// レスポンスのエラー一覧から (field, code) の組を取り出す
pub fn error_codes(body: &Value) -> Vec<(String, String)> {
    body["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .map(|e| {
                    (
                        e["field"].as_str().unwrap_or_default().to_string(),
                        e["code"].as_str().unwrap_or_default().to_string(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}
