use serde::Serialize;
use validator::Validate;

/// タイトルの最大文字数 (Djangoの `CharField(max_length=200)`)
pub const TITLE_MAX_LENGTH: u64 = 200;
/// カテゴリの最大文字数
pub const CATEGORY_MAX_LENGTH: u64 = 200;

/// フィールド単位のバリデーションエラー。
/// DRFの `serializers.ValidationError` の各エントリに相当します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 必須フィールドが無い、または空
    MissingField { field: &'static str },
    /// 選択肢に無い値
    InvalidEnumValue { field: &'static str, value: String },
    /// 最大長超過
    LengthExceeded { field: &'static str, max: u64 },
    /// 型が変換できない
    TypeMismatch { field: &'static str, expected: &'static str },
    /// 変更不可フィールドへの書き込み
    ImmutableFieldOverride { field: &'static str },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::InvalidEnumValue { field, .. }
            | ValidationError::LengthExceeded { field, .. }
            | ValidationError::TypeMismatch { field, .. }
            | ValidationError::ImmutableFieldOverride { field } => field,
        }
    }

    /// 機械可読なエラーコード
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingField { .. } => "missing_field",
            ValidationError::InvalidEnumValue { .. } => "invalid_enum_value",
            ValidationError::LengthExceeded { .. } => "length_exceeded",
            ValidationError::TypeMismatch { .. } => "type_mismatch",
            ValidationError::ImmutableFieldOverride { .. } => "immutable_field_override",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingField { field } => {
                write!(f, "{}: This field is required.", field)
            }
            ValidationError::InvalidEnumValue { field, value } => {
                write!(f, "{}: \"{}\" is not a valid choice.", field, value)
            }
            ValidationError::LengthExceeded { field, max } => {
                write!(f, "{}: Ensure this field has no more than {} characters.", field, max)
            }
            ValidationError::TypeMismatch { field, expected } => {
                write!(f, "{}: Expected {}.", field, expected)
            }
            ValidationError::ImmutableFieldOverride { field } => {
                write!(f, "{}: This field cannot be modified.", field)
            }
        }
    }
}

/// 1リクエスト分のバリデーションエラーをまとめたもの。
/// 途中で打ち切らず、全フィールドのエラーを収集します。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// 指定フィールドのエラーを取得
    pub fn for_field(&self, field: &str) -> Option<&ValidationError> {
        self.0.iter().find(|e| e.field() == field)
    }

    /// エラーが1件も無ければ `Ok(())`
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// レスポンスボディ用の表現
    pub fn details(&self) -> Vec<FieldErrorDetail> {
        self.0
            .iter()
            .map(|e| FieldErrorDetail {
                field: e.field(),
                code: e.code(),
                message: e.to_string(),
            })
            .collect()
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(e: ValidationError) -> Self {
        ValidationErrors(vec![e])
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, Clone, Serialize)]
pub struct FieldErrorDetail {
    pub field: &'static str,
    pub code: &'static str,
    pub message: String,
}

/// 文字数制限のバリデーション。
/// Djangoの `max_length` チェックに相当。`None` のフィールドは検証対象外。
#[derive(Debug, Validate)]
pub struct TextLengthValidation {
    #[validate(length(max = 200))]
    pub title: Option<String>,

    #[validate(length(max = 200))]
    pub category: Option<String>,
}

impl TextLengthValidation {
    pub fn new(title: Option<&str>, category: Option<&str>) -> Self {
        Self {
            title: title.map(|t| t.to_string()),
            category: category.map(|c| c.to_string()),
        }
    }

    /// バリデーションを実行し、超過したフィールドを `LengthExceeded` として返す
    pub fn check(&self) -> Vec<ValidationError> {
        let errors = match self.validate() {
            Ok(_) => return Vec::new(),
            Err(errors) => errors,
        };
        let field_errors = errors.field_errors();

        [("title", TITLE_MAX_LENGTH), ("category", CATEGORY_MAX_LENGTH)]
            .into_iter()
            .filter(|(field, _)| field_errors.contains_key(*field))
            .map(|(field, max)| ValidationError::LengthExceeded { field, max })
            .collect()
    }
}
