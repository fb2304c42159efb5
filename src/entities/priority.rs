use sea_orm::entity::prelude::*;
use sea_orm::Iterable;
use serde::{Deserialize, Serialize};

/// TODOの優先度。
/// Djangoの `models.TextChoices` に相当し、DBには2文字のコードで保存されます。
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(2))")]
pub enum Priority {
    #[sea_orm(string_value = "HI")]
    #[serde(rename = "HI")]
    High,
    #[default]
    #[sea_orm(string_value = "LO")]
    #[serde(rename = "LO")]
    Low,
    #[sea_orm(string_value = "ME")]
    #[serde(rename = "ME")]
    Medium,
    #[sea_orm(string_value = "UR")]
    #[serde(rename = "UR")]
    Urgent,
}

/// `GET /api/v1/priorities` が返す選択肢 (Djangoの `Priority.choices`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityChoice {
    pub code: &'static str,
    pub label: &'static str,
}

impl Priority {
    /// コードから優先度を取得します。大文字小文字は区別します。
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "HI" => Some(Priority::High),
            "LO" => Some(Priority::Low),
            "ME" => Some(Priority::Medium),
            "UR" => Some(Priority::Urgent),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Priority::High => "HI",
            Priority::Low => "LO",
            Priority::Medium => "ME",
            Priority::Urgent => "UR",
        }
    }

    /// 表示用ラベル (Djangoの `get_priority_display()`)
    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::Urgent => "URGENT",
        }
    }

    /// 並び替え用の重み。大きいほど緊急。
    pub fn rank(self) -> u8 {
        match self {
            Priority::Urgent => 4,
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn choices() -> Vec<PriorityChoice> {
        Priority::iter()
            .map(|p| PriorityChoice {
                code: p.code(),
                label: p.label(),
            })
            .collect()
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
