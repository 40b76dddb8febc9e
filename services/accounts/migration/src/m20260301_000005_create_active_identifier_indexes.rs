use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

// Partial indexes: uniqueness only applies to rows that are not soft-deleted.
// Index names are matched by the service when mapping constraint violations.
const UP: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_email_address_active_address \
     ON email_address (address) WHERE deleted_at IS NULL",
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_phone_number_active_number \
     ON phone_number (number) WHERE deleted_at IS NULL",
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_email_address_active_primary \
     ON email_address (account_id) WHERE is_primary AND deleted_at IS NULL",
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_account_active_username \
     ON account (username) WHERE deleted_at IS NULL AND username IS NOT NULL",
];

const DOWN: &[&str] = &[
    "DROP INDEX IF EXISTS uq_account_active_username",
    "DROP INDEX IF EXISTS uq_email_address_active_primary",
    "DROP INDEX IF EXISTS uq_phone_number_active_number",
    "DROP INDEX IF EXISTS uq_email_address_active_address",
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        for sql in UP {
            db.execute_unprepared(sql).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        for sql in DOWN {
            db.execute_unprepared(sql).await?;
        }
        Ok(())
    }
}
