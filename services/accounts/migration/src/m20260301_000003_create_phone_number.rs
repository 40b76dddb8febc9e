use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PhoneNumber::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PhoneNumber::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PhoneNumber::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PhoneNumber::LastModifiedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PhoneNumber::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(PhoneNumber::AccountId).uuid().not_null())
                    .col(ColumnDef::new(PhoneNumber::Number).string_len(32).not_null())
                    .col(
                        ColumnDef::new(PhoneNumber::Confirmed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_phone_number_account")
                            .from(PhoneNumber::Table, PhoneNumber::AccountId)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(PhoneNumber::Table)
                    .col(PhoneNumber::AccountId)
                    .name("idx_phone_number_account_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PhoneNumber::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PhoneNumber {
    Table,
    Id,
    CreatedAt,
    LastModifiedAt,
    DeletedAt,
    AccountId,
    Number,
    Confirmed,
}

#[derive(DeriveIden)]
enum Account {
    Table,
    Id,
}
