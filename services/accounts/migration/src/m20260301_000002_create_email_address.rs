use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EmailAddress::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailAddress::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EmailAddress::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(EmailAddress::LastModifiedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(EmailAddress::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(EmailAddress::AccountId).uuid().not_null())
                    .col(ColumnDef::new(EmailAddress::Address).string().not_null())
                    .col(
                        ColumnDef::new(EmailAddress::Confirmed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(EmailAddress::IsPrimary)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_email_address_account")
                            .from(EmailAddress::Table, EmailAddress::AccountId)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(EmailAddress::Table)
                    .col(EmailAddress::AccountId)
                    .name("idx_email_address_account_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EmailAddress::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum EmailAddress {
    Table,
    Id,
    CreatedAt,
    LastModifiedAt,
    DeletedAt,
    AccountId,
    Address,
    Confirmed,
    IsPrimary,
}

#[derive(DeriveIden)]
enum Account {
    Table,
    Id,
}
