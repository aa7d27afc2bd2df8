use sea_orm_migration::prelude::*;

use super::m20250610_093045_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Followers::Table)
                    .if_not_exists()
                    // The user doing the following
                    .col(ColumnDef::new(Followers::FollowerId).unsigned().not_null())
                    // The user being followed
                    .col(
                        ColumnDef::new(Followers::FollowingId)
                            .unsigned()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Followers::CreatedAt).timestamp().not_null())
                    // One edge per (follower, followee) pair
                    .primary_key(
                        Index::create()
                            .col(Followers::FollowerId)
                            .col(Followers::FollowingId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Followers::Table, Followers::FollowerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Followers::Table, Followers::FollowingId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Followers::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Followers {
    Table,
    FollowerId,
    FollowingId,
    CreatedAt,
}
