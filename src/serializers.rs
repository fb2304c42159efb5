//! TODOのシリアライザ。
//! DRFの `ModelSerializer` に相当し、JSONとモデルの相互変換とバリデーションを担当します。
//! DBアクセスは行わず、`id` / `created_at` は永続化層 (`TodoService`) が設定します。

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::{Map, Value};

use crate::entities::priority::Priority;
use crate::entities::todo;
use crate::validation::{TextLengthValidation, ValidationError, ValidationErrors};

/// シリアライズ時のフィールド順 (DRFの `Meta.fields`)
pub const FIELDS: [&str; 9] = [
    "id",
    "title",
    "description",
    "category",
    "priority",
    "completed",
    "created_at",
    "updated_at",
    "due_date",
];

/// 更新時に書き込みを拒否するフィールド
pub const IMMUTABLE_FIELDS: [&str; 2] = ["id", "created_at"];

const TRUE_VALUES: [&str; 6] = ["true", "t", "yes", "y", "on", "1"];
const FALSE_VALUES: [&str; 6] = ["false", "f", "no", "n", "off", "0"];

/// 作成リクエストを検証した結果。
/// システムが割り当てるフィールド (`id` とタイムスタンプ) 以外を全て持ちます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: Priority,
    pub completed: bool,
    pub due_date: Option<DateTimeWithTimeZone>,
}

/// 作成用の入力を検証し、`NewTodo` を返します。
/// DRFの `serializer.is_valid()` + `validated_data` に相当。
/// 読み取り専用フィールドと未知のキーは無視します。
pub fn validate_and_parse(input: &Map<String, Value>) -> Result<NewTodo, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let title = collect(&mut errors, required_text(input, "title"));
    let description = collect(&mut errors, required_text(input, "description"));
    let category = collect(&mut errors, optional(input, "category", parse_text)).flatten();
    let priority = collect(&mut errors, optional(input, "priority", parse_priority)).flatten();
    let completed = collect(&mut errors, optional(input, "completed", parse_bool)).flatten();
    let due_date = collect(&mut errors, optional(input, "due_date", parse_timestamp)).flatten();

    for e in TextLengthValidation::new(title.as_deref(), category.as_deref()).check() {
        errors.push(e);
    }

    match (title, description) {
        (Some(title), Some(description)) if errors.is_empty() => Ok(NewTodo {
            title,
            description,
            category: category.unwrap_or_default(),
            priority: priority.unwrap_or_default(),
            completed: completed.unwrap_or(false),
            due_date: due_date.flatten(),
        }),
        _ => Err(errors),
    }
}

/// モデルをワイヤ表現 (JSONオブジェクト) に変換します。
/// キーは `FIELDS` の順に並びます。
pub fn serialize(record: &todo::Model) -> Map<String, Value> {
    FIELDS
        .iter()
        .map(|&field| (field.to_string(), field_value(record, field)))
        .collect()
}

fn field_value(record: &todo::Model, field: &str) -> Value {
    match field {
        "id" => Value::from(record.id),
        "title" => Value::from(record.title.clone()),
        "description" => Value::from(record.description.clone()),
        "category" => Value::from(record.category.clone()),
        "priority" => Value::from(record.priority.code()),
        "completed" => Value::from(record.completed),
        "created_at" => Value::from(format_timestamp(&record.created_at)),
        "updated_at" => Value::from(format_timestamp(&record.updated_at)),
        "due_date" => record
            .due_date
            .as_ref()
            .map(|d| Value::from(format_timestamp(d)))
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// 部分更新 (PATCH)。現在時刻で `updated_at` を更新します。
pub fn apply_update(
    existing: &todo::Model,
    partial: &Map<String, Value>,
) -> Result<todo::Model, ValidationErrors> {
    apply_update_at(existing, partial, Utc::now())
}

/// 部分更新の本体。入力に含まれるフィールドだけを検証・置換します。
/// `existing` は変更せず、新しいモデルを返します。
pub fn apply_update_at(
    existing: &todo::Model,
    partial: &Map<String, Value>,
    now: DateTime<Utc>,
) -> Result<todo::Model, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    for field in IMMUTABLE_FIELDS {
        if partial.contains_key(field) {
            errors.push(ValidationError::ImmutableFieldOverride { field });
        }
    }

    let mut updated = existing.clone();

    if partial.contains_key("title") {
        if let Some(title) = collect(&mut errors, required_text(partial, "title")) {
            updated.title = title;
        }
    }
    if partial.contains_key("description") {
        if let Some(description) = collect(&mut errors, required_text(partial, "description")) {
            updated.description = description;
        }
    }
    if let Some(category) = collect(&mut errors, optional(partial, "category", parse_text)).flatten() {
        updated.category = category;
    }
    if let Some(priority) = collect(&mut errors, optional(partial, "priority", parse_priority)).flatten() {
        updated.priority = priority;
    }
    if let Some(completed) = collect(&mut errors, optional(partial, "completed", parse_bool)).flatten() {
        updated.completed = completed;
    }
    if let Some(due_date) = collect(&mut errors, optional(partial, "due_date", parse_timestamp)).flatten() {
        updated.due_date = due_date;
    }

    let title = partial.contains_key("title").then_some(updated.title.as_str());
    let category = partial.contains_key("category").then_some(updated.category.as_str());
    for e in TextLengthValidation::new(title, category).check() {
        errors.push(e);
    }

    errors.into_result()?;
    updated.updated_at = next_updated_at(&existing.updated_at, now);
    Ok(updated)
}

/// 全体更新 (PUT)。作成時と同じく `title` / `description` を必須とします。
pub fn apply_replace(
    existing: &todo::Model,
    input: &Map<String, Value>,
) -> Result<todo::Model, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    for field in ["title", "description"] {
        if !input.contains_key(field) {
            errors.push(ValidationError::MissingField { field });
        }
    }

    match apply_update(existing, input) {
        Ok(updated) if errors.is_empty() => Ok(updated),
        Ok(_) => Err(errors),
        Err(more) => {
            for e in more {
                errors.push(e);
            }
            Err(errors)
        }
    }
}

/// タイムスタンプの正規表現 (UTC, マイクロ秒, `Z` 付き)
pub fn format_timestamp(ts: &DateTimeWithTimeZone) -> String {
    ts.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// ISO 8601 形式の文字列をパースし、UTC に揃えて返します。
/// オフセットが無い場合は UTC とみなし、日付のみの場合は 00:00 UTC とします。
/// SQLite では日時が文字列として保存・比較されるため、オフセットは残しません。
pub fn parse_timestamp_str(raw: &str) -> Option<DateTimeWithTimeZone> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).fixed_offset());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// `updated_at` は常に前回値より大きくなるようにする
fn next_updated_at(previous: &DateTimeWithTimeZone, now: DateTime<Utc>) -> DateTimeWithTimeZone {
    let now: DateTimeWithTimeZone = now.into();
    if now > *previous {
        now
    } else {
        *previous + Duration::microseconds(1)
    }
}

fn collect<T>(errors: &mut ValidationErrors, result: Result<T, ValidationError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

/// キーが無ければ `Ok(None)`、あればパーサを適用する
fn optional<T>(
    input: &Map<String, Value>,
    field: &'static str,
    parse: fn(&'static str, &Value) -> Result<T, ValidationError>,
) -> Result<Option<T>, ValidationError> {
    input.get(field).map(|v| parse(field, v)).transpose()
}

/// 必須テキスト。キー無し・null・空白のみは `MissingField`。
fn required_text(input: &Map<String, Value>, field: &'static str) -> Result<String, ValidationError> {
    match input.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField { field }),
        Some(value) => {
            let text = parse_text(field, value)?;
            if text.trim().is_empty() {
                Err(ValidationError::MissingField { field })
            } else {
                Ok(text)
            }
        }
    }
}

/// DRFの `CharField` と同様、数値は文字列として受け付ける
fn parse_text(field: &'static str, value: &Value) -> Result<String, ValidationError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(ValidationError::TypeMismatch {
            field,
            expected: "string",
        }),
    }
}

fn parse_priority(field: &'static str, value: &Value) -> Result<Priority, ValidationError> {
    match value {
        Value::String(code) => Priority::from_code(code).ok_or_else(|| ValidationError::InvalidEnumValue {
            field,
            value: code.clone(),
        }),
        Value::Number(_) | Value::Bool(_) => Err(ValidationError::InvalidEnumValue {
            field,
            value: value.to_string(),
        }),
        _ => Err(ValidationError::TypeMismatch {
            field,
            expected: "priority code",
        }),
    }
}

fn parse_bool(field: &'static str, value: &Value) -> Result<bool, ValidationError> {
    let mismatch = ValidationError::TypeMismatch {
        field,
        expected: "boolean",
    };
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Ok(true),
            Some(0) => Ok(false),
            _ => Err(mismatch),
        },
        Value::String(s) => {
            let s = s.trim().to_ascii_lowercase();
            if TRUE_VALUES.contains(&s.as_str()) {
                Ok(true)
            } else if FALSE_VALUES.contains(&s.as_str()) {
                Ok(false)
            } else {
                Err(mismatch)
            }
        }
        _ => Err(mismatch),
    }
}

/// null と空文字は「期限なし」
fn parse_timestamp(
    field: &'static str,
    value: &Value,
) -> Result<Option<DateTimeWithTimeZone>, ValidationError> {
    let mismatch = ValidationError::TypeMismatch {
        field,
        expected: "ISO 8601 timestamp",
    };
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => parse_timestamp_str(s).map(Some).ok_or(mismatch),
        _ => Err(mismatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    fn ts(y: i32, m: u32, d: u32) -> DateTimeWithTimeZone {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap().into()
    }

    fn existing() -> todo::Model {
        todo::Model {
            id: 1,
            title: "A".into(),
            description: "desc".into(),
            category: "".into(),
            priority: Priority::Low,
            completed: false,
            created_at: ts(2024, 1, 1),
            updated_at: ts(2024, 1, 1),
            due_date: None,
        }
    }

    fn persist(new: NewTodo) -> todo::Model {
        todo::Model {
            id: 7,
            title: new.title,
            description: new.description,
            category: new.category,
            priority: new.priority,
            completed: new.completed,
            created_at: ts(2024, 5, 1),
            updated_at: ts(2024, 5, 1),
            due_date: new.due_date,
        }
    }

    #[test]
    fn test_example_defaults_applied() {
        let input = object(json!({"title": "Buy milk", "description": "2%", "priority": "HI"}));
        let parsed = validate_and_parse(&input).unwrap();
        assert_eq!(parsed.title, "Buy milk");
        assert_eq!(parsed.priority, Priority::High);
        assert!(!parsed.completed);
        assert_eq!(parsed.category, "");
        assert_eq!(parsed.due_date, None);
    }

    #[test]
    fn test_example_blank_title_is_missing() {
        let input = object(json!({"title": "", "description": "x"}));
        let errors = validate_and_parse(&input).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.for_field("title"),
            Some(&ValidationError::MissingField { field: "title" })
        );
    }

    #[test]
    fn test_example_unknown_priority_rejected() {
        let input = object(json!({"title": "Pay bill", "description": "rent", "priority": "ZZ"}));
        let errors = validate_and_parse(&input).unwrap_err();
        assert_eq!(
            errors.for_field("priority"),
            Some(&ValidationError::InvalidEnumValue {
                field: "priority",
                value: "ZZ".into()
            })
        );
    }

    #[test]
    fn test_example_partial_update_completed() {
        let before = existing();
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
        let updated = apply_update_at(&before, &object(json!({"completed": true})), now).unwrap();

        assert!(updated.completed);
        assert!(updated.updated_at > before.updated_at);
        assert_eq!(updated.id, before.id);
        assert_eq!(updated.title, before.title);
        assert_eq!(updated.description, before.description);
        assert_eq!(updated.created_at, before.created_at);
        assert_eq!(updated.priority, before.priority);
    }

    #[test]
    fn test_missing_required_fields_reported_together() {
        let errors = validate_and_parse(&Map::new()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.for_field("title").is_some());
        assert!(errors.for_field("description").is_some());
    }

    #[test]
    fn test_whitespace_only_description_is_missing() {
        let input = object(json!({"title": "t", "description": "   "}));
        let errors = validate_and_parse(&input).unwrap_err();
        assert_eq!(
            errors.for_field("description"),
            Some(&ValidationError::MissingField { field: "description" })
        );
    }

    #[test]
    fn test_null_title_is_missing() {
        let input = object(json!({"title": null, "description": "x"}));
        let errors = validate_and_parse(&input).unwrap_err();
        assert_eq!(errors.for_field("title").unwrap().code(), "missing_field");
    }

    #[test]
    fn test_priority_is_case_sensitive() {
        let input = object(json!({"title": "t", "description": "d", "priority": "hi"}));
        let errors = validate_and_parse(&input).unwrap_err();
        assert_eq!(errors.for_field("priority").unwrap().code(), "invalid_enum_value");
    }

    #[test]
    fn test_every_priority_code_accepted() {
        for (code, expected) in [
            ("HI", Priority::High),
            ("LO", Priority::Low),
            ("ME", Priority::Medium),
            ("UR", Priority::Urgent),
        ] {
            let input = object(json!({"title": "t", "description": "d", "priority": code}));
            assert_eq!(validate_and_parse(&input).unwrap().priority, expected);
        }
    }

    #[test]
    fn test_title_length_limit() {
        let input = object(json!({"title": "a".repeat(201), "description": "d"}));
        let errors = validate_and_parse(&input).unwrap_err();
        assert_eq!(
            errors.for_field("title"),
            Some(&ValidationError::LengthExceeded { field: "title", max: 200 })
        );

        let input = object(json!({"title": "a".repeat(200), "description": "d"}));
        assert!(validate_and_parse(&input).is_ok());
    }

    #[test]
    fn test_category_length_limit() {
        let input = object(json!({"title": "t", "description": "d", "category": "c".repeat(201)}));
        let errors = validate_and_parse(&input).unwrap_err();
        assert_eq!(errors.for_field("category").unwrap().code(), "length_exceeded");
    }

    #[test]
    fn test_description_is_unbounded() {
        let input = object(json!({"title": "t", "description": "d".repeat(10_000)}));
        assert!(validate_and_parse(&input).is_ok());
    }

    #[test]
    fn test_completed_coercion() {
        for (raw, expected) in [
            (json!(true), true),
            (json!("true"), true),
            (json!("1"), true),
            (json!(1), true),
            (json!("off"), false),
            (json!(0), false),
            (json!("False"), false),
        ] {
            let input = object(json!({"title": "t", "description": "d", "completed": raw}));
            assert_eq!(validate_and_parse(&input).unwrap().completed, expected);
        }
    }

    #[test]
    fn test_completed_type_mismatch() {
        for raw in [json!("maybe"), json!(2), json!(null), json!([true])] {
            let input = object(json!({"title": "t", "description": "d", "completed": raw}));
            let errors = validate_and_parse(&input).unwrap_err();
            assert_eq!(errors.for_field("completed").unwrap().code(), "type_mismatch");
        }
    }

    #[test]
    fn test_due_date_parsing() {
        let input = object(json!({"title": "t", "description": "d", "due_date": "2025-03-01T09:30:00+09:00"}));
        let parsed = validate_and_parse(&input).unwrap();
        let due = parsed.due_date.unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 0, 30, 0).unwrap();
        assert_eq!(due.with_timezone(&Utc), expected);
        // オフセット付きの入力も UTC で保持する
        assert_eq!(due.offset().local_minus_utc(), 0);
        assert_eq!(due.to_rfc3339(), "2025-03-01T00:30:00+00:00");

        let input = object(json!({"title": "t", "description": "d", "due_date": "2025-03-01"}));
        let parsed = validate_and_parse(&input).unwrap();
        assert_eq!(parsed.due_date.unwrap(), ts(2025, 3, 1));

        let input = object(json!({"title": "t", "description": "d", "due_date": null}));
        assert_eq!(validate_and_parse(&input).unwrap().due_date, None);
    }

    #[test]
    fn test_due_date_unparsable() {
        let input = object(json!({"title": "t", "description": "d", "due_date": "next tuesday"}));
        let errors = validate_and_parse(&input).unwrap_err();
        assert_eq!(
            errors.for_field("due_date"),
            Some(&ValidationError::TypeMismatch {
                field: "due_date",
                expected: "ISO 8601 timestamp"
            })
        );
    }

    #[test]
    fn test_read_only_fields_ignored_on_create() {
        let input = object(json!({
            "id": 99,
            "title": "t",
            "description": "d",
            "created_at": "2000-01-01T00:00:00Z",
            "unknown": "ignored"
        }));
        assert!(validate_and_parse(&input).is_ok());
    }

    #[test]
    fn test_serialize_field_order_and_format() {
        let mut record = existing();
        record.priority = Priority::Urgent;
        record.due_date = Some(ts(2024, 12, 31));
        let map = serialize(&record);

        let keys: Vec<&str> = map.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, FIELDS.to_vec());
        assert_eq!(map["priority"], json!("UR"));
        assert_eq!(map["created_at"], json!("2024-01-01T00:00:00.000000Z"));
        assert_eq!(map["due_date"], json!("2024-12-31T00:00:00.000000Z"));
    }

    #[test]
    fn test_serialize_null_due_date() {
        let map = serialize(&existing());
        assert_eq!(map["due_date"], Value::Null);
        assert_eq!(map["completed"], json!(false));
    }

    #[test]
    fn test_round_trip_user_fields() {
        let input = object(json!({
            "title": "Write report",
            "description": "quarterly numbers",
            "category": "work",
            "priority": "ME",
            "completed": true,
            "due_date": "2025-06-30T17:00:00Z"
        }));
        let record = persist(validate_and_parse(&input).unwrap());
        let output = serialize(&record);

        for field in ["title", "description", "category", "priority", "completed"] {
            assert_eq!(output[field], input[field], "field {}", field);
        }
        let due = parse_timestamp_str(output["due_date"].as_str().unwrap()).unwrap();
        assert_eq!(Some(due), parse_timestamp_str("2025-06-30T17:00:00Z"));
    }

    #[test]
    fn test_update_rejects_immutable_fields() {
        let before = existing();
        let input = object(json!({"id": 5, "created_at": "2020-01-01T00:00:00Z", "title": "B"}));
        let errors = apply_update(&before, &input).unwrap_err();
        assert_eq!(
            errors.for_field("id"),
            Some(&ValidationError::ImmutableFieldOverride { field: "id" })
        );
        assert_eq!(
            errors.for_field("created_at"),
            Some(&ValidationError::ImmutableFieldOverride { field: "created_at" })
        );
        assert_eq!(before, existing());
    }

    #[test]
    fn test_update_ignores_updated_at_input() {
        let before = existing();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let input = object(json!({"updated_at": "1999-01-01T00:00:00Z"}));
        let updated = apply_update_at(&before, &input, now).unwrap();
        assert_eq!(updated.updated_at, DateTimeWithTimeZone::from(now));
    }

    #[test]
    fn test_update_is_idempotent_in_field_values() {
        let before = existing();
        let input = object(json!({"title": "New", "priority": "UR", "category": "home"}));
        let first = apply_update(&before, &input).unwrap();
        let second = apply_update(&first, &input).unwrap();

        assert_eq!(first.title, second.title);
        assert_eq!(first.priority, second.priority);
        assert_eq!(first.category, second.category);
        assert_eq!(first.completed, second.completed);
        assert!(second.updated_at > first.updated_at);
    }

    #[test]
    fn test_update_keeps_updated_at_monotonic() {
        let before = existing();
        // 時計が巻き戻っても updated_at は前回値より大きい
        let stale_now = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let updated = apply_update_at(&before, &object(json!({"completed": true})), stale_now).unwrap();
        assert!(updated.updated_at > before.updated_at);
        assert!(updated.created_at <= updated.updated_at);
    }

    #[test]
    fn test_update_revalidates_present_fields() {
        let before = existing();
        let input = object(json!({"title": "", "priority": "XX"}));
        let errors = apply_update(&before, &input).unwrap_err();
        assert_eq!(errors.for_field("title").unwrap().code(), "missing_field");
        assert_eq!(errors.for_field("priority").unwrap().code(), "invalid_enum_value");
    }

    #[test]
    fn test_update_clears_due_date_with_null() {
        let mut before = existing();
        before.due_date = Some(ts(2024, 6, 1));
        let updated = apply_update(&before, &object(json!({"due_date": null}))).unwrap();
        assert_eq!(updated.due_date, None);
    }

    #[test]
    fn test_replace_requires_title_and_description() {
        let before = existing();
        let errors = apply_replace(&before, &object(json!({"completed": true}))).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.code() == "missing_field"));

        let updated = apply_replace(&before, &object(json!({"title": "B", "description": "x"}))).unwrap();
        assert_eq!(updated.title, "B");
    }
}
