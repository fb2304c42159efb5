use chrono::Utc;
use sea_orm::prelude::{DateTimeWithTimeZone, Expr};
use sea_orm::sea_query::{CaseStatement, Func, LikeExpr, SimpleExpr};
use sea_orm::*;

use crate::entities::priority::Priority;
use crate::entities::{prelude::*, todo};
use crate::errors::AppError;
use crate::query::{OrderField, StatusFilter, TodoQuery, LIKE_ESCAPE};
use crate::serializers::NewTodo;

/// `CASE priority WHEN 'UR' THEN 4 ... END` (Django: `Case(When(...))`)
fn priority_rank() -> SimpleExpr {
    Priority::iter()
        .fold(CaseStatement::new(), |case, p| {
            case.case(todo::Column::Priority.eq(p), i32::from(p.rank()))
        })
        .finally(0)
        .into()
}

/// TODO関連の永続化処理を集約するサービス。
/// Djangoの Manager やカスタム QuerySet メソッドに相当します。
/// `id` とタイムスタンプの割り当てはここで行います。
pub struct TodoService;

impl TodoService {
    /// 条件付き一覧 (Django: Todo.objects.filter(...).order_by(...))
    pub async fn list(db: &DatabaseConnection, query: &TodoQuery) -> Result<Vec<todo::Model>, AppError> {
        let mut select = Todo::find();

        select = match query.status {
            StatusFilter::All => select,
            StatusFilter::Active => select.filter(todo::Column::Completed.eq(false)),
            StatusFilter::Completed => select.filter(todo::Column::Completed.eq(true)),
        };

        // SQLite の lower() は ASCII しか小文字化しないため、非ASCIIの検索語は取得後に絞り込む
        let search_in_sql = query.search.as_deref().map_or(true, str::is_ascii);
        if let Some(pattern) = query.search_pattern().filter(|_| search_in_sql) {
            let like = |column: todo::Column| {
                Expr::expr(Func::lower(Expr::col(column)))
                    .like(LikeExpr::new(pattern.as_str()).escape(LIKE_ESCAPE))
            };
            select = select.filter(
                Condition::any()
                    .add(like(todo::Column::Title))
                    .add(like(todo::Column::Description)),
            );
        }

        if let Some(month) = query.month {
            let (start, end) = month.range();
            let start: DateTimeWithTimeZone = start.into();
            let end: DateTimeWithTimeZone = end.into();
            select = select
                .filter(todo::Column::CreatedAt.gte(start))
                .filter(todo::Column::CreatedAt.lt(end));
        }

        let order = if query.ordering.descending {
            Order::Desc
        } else {
            Order::Asc
        };
        let key: SimpleExpr = match query.ordering.field {
            OrderField::Title => Expr::col(todo::Column::Title).into(),
            OrderField::CreatedAt => Expr::col(todo::Column::CreatedAt).into(),
            OrderField::UpdatedAt => Expr::col(todo::Column::UpdatedAt).into(),
            OrderField::DueDate => Expr::col(todo::Column::DueDate).into(),
            // 優先度はコード順ではなく重み順
            OrderField::Priority => priority_rank(),
        };
        let mut todos = select
            .order_by(key, order.clone())
            .order_by(todo::Column::Id, order)
            .all(db)
            .await?;

        if !search_in_sql {
            todos.retain(|t| query.matches_search(&t.title, &t.description));
        }

        Ok(todos)
    }

    /// 全件取得 (Django: Todo.objects.all())
    pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<todo::Model>, AppError> {
        Todo::find()
            .order_by_asc(todo::Column::Id)
            .all(db)
            .await
            .map_err(AppError::Database)
    }

    /// IDで検索 (Django: Todo.objects.filter(pk=id).first())
    pub async fn find_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<todo::Model>, AppError> {
        Todo::find_by_id(id).one(db).await.map_err(AppError::Database)
    }

    /// IDで取得。存在しなければ 404 (Django: get_object_or_404)
    pub async fn get(db: &DatabaseConnection, id: i32) -> Result<todo::Model, AppError> {
        Self::find_by_id(db, id).await?.ok_or(AppError::NotFound)
    }

    /// 作成日時の一覧 (月リスト用)
    pub async fn created_timestamps(db: &DatabaseConnection) -> Result<Vec<DateTimeWithTimeZone>, AppError> {
        Todo::find()
            .select_only()
            .column(todo::Column::CreatedAt)
            .into_tuple::<DateTimeWithTimeZone>()
            .all(db)
            .await
            .map_err(AppError::Database)
    }

    /// 作成 (Django: Todo.objects.create())
    /// `created_at` と `updated_at` は同じ現在時刻で初期化します。
    pub async fn create(db: &DatabaseConnection, new: NewTodo) -> Result<todo::Model, AppError> {
        let now: DateTimeWithTimeZone = Utc::now().into();

        let active_model = todo::ActiveModel {
            title: Set(new.title),
            description: Set(new.description),
            category: Set(new.category),
            priority: Set(new.priority),
            completed: Set(new.completed),
            created_at: Set(now),
            updated_at: Set(now),
            due_date: Set(new.due_date),
            ..Default::default()
        };

        let created = active_model.insert(db).await?;
        log::info!("Created todo #{} \"{}\"", created.id, created);
        Ok(created)
    }

    /// シリアライザで検証済みのモデルを保存します。`id` と `created_at` は書き換えません。
    pub async fn save(db: &DatabaseConnection, updated: todo::Model) -> Result<todo::Model, AppError> {
        let active_model = todo::ActiveModel {
            id: Unchanged(updated.id),
            title: Set(updated.title),
            description: Set(updated.description),
            category: Set(updated.category),
            priority: Set(updated.priority),
            completed: Set(updated.completed),
            created_at: Unchanged(updated.created_at),
            updated_at: Set(updated.updated_at),
            due_date: Set(updated.due_date),
        };

        let saved = active_model.update(db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => AppError::NotFound,
            other => AppError::Database(other),
        })?;
        log::info!("Updated todo #{}", saved.id);
        Ok(saved)
    }

    /// 削除。物理削除のみで、履歴は残しません。
    pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<(), AppError> {
        let result = Todo::delete_by_id(id).exec(db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        log::info!("Deleted todo #{}", id);
        Ok(())
    }

    /// 一括完了。対象の `updated_at` も更新します。
    pub async fn complete_many(db: &DatabaseConnection, ids: &[i32]) -> Result<u64, AppError> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let result = Todo::update_many()
            .col_expr(todo::Column::Completed, Expr::value(true))
            .col_expr(todo::Column::UpdatedAt, Expr::value(now))
            .filter(todo::Column::Id.is_in(ids.to_vec()))
            .exec(db)
            .await?;
        log::info!("Bulk-completed {} todo(s)", result.rows_affected);
        Ok(result.rows_affected)
    }

    /// 一括削除
    pub async fn delete_many(db: &DatabaseConnection, ids: &[i32]) -> Result<u64, AppError> {
        let result = Todo::delete_many()
            .filter(todo::Column::Id.is_in(ids.to_vec()))
            .exec(db)
            .await?;
        log::info!("Bulk-deleted {} todo(s)", result.rows_affected);
        Ok(result.rows_affected)
    }
}
