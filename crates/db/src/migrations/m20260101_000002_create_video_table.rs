//! Create video table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Video::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Video::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Video::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Video::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Video::Description).text().null())
                    .col(ColumnDef::new(Video::VideoUrl).string_len(2048).not_null())
                    .col(ColumnDef::new(Video::ThumbnailUrl).string_len(2048).null())
                    .col(ColumnDef::new(Video::Duration).integer().not_null())
                    .col(
                        ColumnDef::new(Video::ViewCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Video::CommentCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Video::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Video::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Video::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_video_user")
                            .from(Video::Table, Video::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (status, created_at) for the default listing
        manager
            .create_index(
                Index::create()
                    .name("idx_video_status_created_at")
                    .table(Video::Table)
                    .col(Video::Status)
                    .col(Video::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_video_user_id")
                    .table(Video::Table)
                    .col(Video::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Video::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Video {
    Table,
    Id,
    UserId,
    Title,
    Description,
    VideoUrl,
    ThumbnailUrl,
    Duration,
    ViewCount,
    CommentCount,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
