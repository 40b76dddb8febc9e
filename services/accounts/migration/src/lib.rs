use sea_orm_migration::prelude::*;

mod m20260301_000001_create_account;
mod m20260301_000002_create_email_address;
mod m20260301_000003_create_phone_number;
mod m20260301_000004_add_account_primary_email_fk;
mod m20260301_000005_create_active_identifier_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_account::Migration),
            Box::new(m20260301_000002_create_email_address::Migration),
            Box::new(m20260301_000003_create_phone_number::Migration),
            Box::new(m20260301_000004_add_account_primary_email_fk::Migration),
            Box::new(m20260301_000005_create_active_identifier_indexes::Migration),
        ]
    }
}
