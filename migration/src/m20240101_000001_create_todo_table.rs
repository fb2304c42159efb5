use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // TODOテーブルを作成
        // Djangoの models.py で Todo クラスを定義するのに相当
        // created_at / updated_at はアプリ側で明示的に設定するため DEFAULT は付けない
        manager
            .create_table(
                Table::create()
                    .table(Todo::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Todo::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Todo::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Todo::Description).text().not_null())
                    .col(
                        ColumnDef::new(Todo::Category)
                            .string_len(200)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Todo::Priority)
                            .string_len(2)
                            .not_null()
                            .default("LO"),
                    )
                    .col(ColumnDef::new(Todo::Completed).boolean().not_null().default(false))
                    .col(ColumnDef::new(Todo::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Todo::UpdatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Todo::DueDate).timestamp_with_time_zone().null())
                    .to_owned(),
            )
            .await?;

        // 一覧画面の既定ソート (created_at 降順) 用
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx-todo-created_at")
                    .table(Todo::Table)
                    .col(Todo::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Todo::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Todo {
    Table,
    Id,
    Title,
    Description,
    Category,
    Priority,
    Completed,
    CreatedAt,
    UpdatedAt,
    DueDate,
}
