use sea_orm_migration::prelude::*;

// The account table is created before email_address, so the pointer to the
// primary row gets its constraint afterwards.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_account_primary_email_address")
                    .from(Account::Table, Account::PrimaryEmailAddressId)
                    .to(EmailAddress::Table, EmailAddress::Id)
                    .on_delete(ForeignKeyAction::SetNull)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_foreign_key(
                ForeignKey::drop()
                    .table(Account::Table)
                    .name("fk_account_primary_email_address")
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Account {
    Table,
    PrimaryEmailAddressId,
}

#[derive(DeriveIden)]
enum EmailAddress {
    Table,
    Id,
}
