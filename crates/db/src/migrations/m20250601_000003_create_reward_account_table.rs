//! Create reward account table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RewardAccount::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RewardAccount::UserId)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RewardAccount::Points)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RewardAccount::SpamCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RewardAccount::Contributions)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RewardAccount::Frozen)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(RewardAccount::FreezeUntil).date())
                    .col(
                        ColumnDef::new(RewardAccount::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reward_account_user")
                            .from(RewardAccount::Table, RewardAccount::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RewardAccount::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum RewardAccount {
    Table,
    UserId,
    Points,
    SpamCount,
    Contributions,
    Frozen,
    FreezeUntil,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
