use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// No foreign key to users: ledger rows must outlive whatever happens to the
// account row.
#[derive(DeriveIden)]
enum BannedUsers {
    Table,
    UserId,
    Email,
    BannedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BannedUsers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BannedUsers::UserId)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BannedUsers::Email).string_len(255).not_null())
                    .col(
                        ColumnDef::new(BannedUsers::BannedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_banned_users_email")
                    .table(BannedUsers::Table)
                    .col(BannedUsers::Email)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BannedUsers::Table).to_owned())
            .await
    }
}
