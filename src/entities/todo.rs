use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::priority::Priority;

/// TODOモデル。
/// Djangoの `models.Model` に相当します。
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "todo")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// TODOのタイトル (必須、最大200文字)
    pub title: String,

    /// 詳細な説明 (必須、長さ制限なし)
    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// カテゴリ (任意、最大200文字、未指定時は空文字)
    pub category: String,

    /// 優先度 (HI / LO / ME / UR)
    pub priority: Priority,

    /// 完了状態
    pub completed: bool,

    /// 作成日時 (作成時に一度だけ設定)
    pub created_at: DateTimeWithTimeZone,

    /// 更新日時 (更新のたびに再設定)
    pub updated_at: DateTimeWithTimeZone,

    /// 期限 (任意)
    pub due_date: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Djangoの `__str__` に相当
impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}
