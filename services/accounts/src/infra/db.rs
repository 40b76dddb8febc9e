use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, IsolationLevel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Select, SqlErr, TransactionTrait, sea_query::Order,
};

use tessera_accounts_schema::{account, email_address, phone_number};
use tessera_domain::id::{AccountId, EmailAddressId, PhoneNumberId};
use tessera_domain::pagination::{CursorRequest, Sort, SortField};

use crate::domain::repository::{
    AccountOps, EmailOps, PhoneOps, Transaction, TransactionCoordinator,
};
use crate::domain::types::{Account, EmailAddress, PhoneNumber};
use crate::error::AccountsServiceError;

// ── Coordinator ─────────────────────────────────────────────────────────────

/// Opens `SERIALIZABLE` Postgres transactions from a connection pool.
#[derive(Clone)]
pub struct DbCoordinator {
    pub db: DatabaseConnection,
}

impl TransactionCoordinator for DbCoordinator {
    type Tx = DbTransaction;

    async fn begin(&self) -> Result<DbTransaction, AccountsServiceError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await
            .context("begin transaction")?;
        Ok(DbTransaction { txn })
    }
}

pub struct DbTransaction {
    txn: DatabaseTransaction,
}

impl Transaction for DbTransaction {
    async fn commit(self) -> Result<(), AccountsServiceError> {
        self.txn
            .commit()
            .await
            .map_err(|e| write_error(e, "commit transaction"))
    }

    async fn rollback(self) -> Result<(), AccountsServiceError> {
        self.txn.rollback().await.context("rollback transaction")?;
        Ok(())
    }
}

// ── Error mapping ───────────────────────────────────────────────────────────

// Names created by the active-identifier index migration.
const ADDRESS_INDEX: &str = "uq_email_address_active_address";
const NUMBER_INDEX: &str = "uq_phone_number_active_number";
const PRIMARY_INDEX: &str = "uq_email_address_active_primary";
const USERNAME_INDEX: &str = "uq_account_active_username";

/// Map a unique violation to the domain error for the index it names.
fn unique_violation_error(detail: &str) -> Option<AccountsServiceError> {
    if detail.contains(ADDRESS_INDEX) || detail.contains(NUMBER_INDEX) {
        return Some(AccountsServiceError::AlreadyRegisteredByDifferentAccount);
    }
    if detail.contains(USERNAME_INDEX) {
        return Some(AccountsServiceError::UsernameAlreadyTaken);
    }
    // The losing writer of the primary-email race.
    if detail.contains(PRIMARY_INDEX) {
        return Some(AccountsServiceError::ConcurrentModification);
    }
    None
}

/// Translate constraint violations and serialization failures into domain
/// errors; everything else is internal.
fn write_error(err: DbErr, context: &'static str) -> AccountsServiceError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        if let Some(mapped) = unique_violation_error(&detail) {
            return mapped;
        }
    }
    // SQLSTATE 40001
    if err.to_string().contains("could not serialize access") {
        return AccountsServiceError::ConcurrentModification;
    }
    AccountsServiceError::Internal(anyhow::Error::new(err).context(context))
}

// ── Pagination ──────────────────────────────────────────────────────────────

trait CursorColumns: EntityTrait {
    fn id_column() -> Self::Column;
    fn sort_column(field: SortField) -> Self::Column;
}

impl CursorColumns for account::Entity {
    fn id_column() -> Self::Column {
        account::Column::Id
    }

    fn sort_column(field: SortField) -> Self::Column {
        match field {
            SortField::Id => account::Column::Id,
            SortField::CreatedAt => account::Column::CreatedAt,
            SortField::LastModifiedAt => account::Column::LastModifiedAt,
        }
    }
}

impl CursorColumns for email_address::Entity {
    fn id_column() -> Self::Column {
        email_address::Column::Id
    }

    fn sort_column(field: SortField) -> Self::Column {
        match field {
            SortField::Id => email_address::Column::Id,
            SortField::CreatedAt => email_address::Column::CreatedAt,
            SortField::LastModifiedAt => email_address::Column::LastModifiedAt,
        }
    }
}

impl CursorColumns for phone_number::Entity {
    fn id_column() -> Self::Column {
        phone_number::Column::Id
    }

    fn sort_column(field: SortField) -> Self::Column {
        match field {
            SortField::Id => phone_number::Column::Id,
            SortField::CreatedAt => phone_number::Column::CreatedAt,
            SortField::LastModifiedAt => phone_number::Column::LastModifiedAt,
        }
    }
}

/// `WHERE id > cursor ORDER BY <clauses> LIMIT count` on a normalized request.
fn paginate<E: CursorColumns>(mut query: Select<E>, request: &CursorRequest) -> Select<E> {
    if let Some(cursor) = request.cursor {
        query = query.filter(E::id_column().gt(cursor));
    }
    for clause in &request.sort_clauses {
        let order = match clause.sort {
            Sort::Asc => Order::Asc,
            Sort::Desc => Order::Desc,
        };
        query = query.order_by(E::sort_column(clause.field), order);
    }
    query.limit(u64::from(request.count))
}

// ── Accounts ────────────────────────────────────────────────────────────────

impl AccountOps for DbTransaction {
    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, AccountsServiceError> {
        let model = account::Entity::find_by_id(id.0)
            .filter(account::Column::DeletedAt.is_null())
            .one(&self.txn)
            .await
            .context("find account by id")?;
        Ok(model.map(account_from_model))
    }

    async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, AccountsServiceError> {
        let model = account::Entity::find()
            .filter(account::Column::Username.eq(username))
            .filter(account::Column::DeletedAt.is_null())
            .one(&self.txn)
            .await
            .context("find account by username")?;
        Ok(model.map(account_from_model))
    }

    async fn insert_account(&self, a: &Account) -> Result<(), AccountsServiceError> {
        account::ActiveModel {
            id: Set(a.id.0),
            created_at: Set(a.created_at),
            last_modified_at: Set(a.last_modified_at),
            deleted_at: Set(a.deleted_at),
            username: Set(a.username.clone()),
            current_password_id: Set(a.current_password_id.clone()),
            primary_email_address_id: Set(a.primary_email_address_id.map(|id| id.0)),
        }
        .insert(&self.txn)
        .await
        .map_err(|e| write_error(e, "insert account"))?;
        Ok(())
    }

    async fn update_account(&self, a: &Account) -> Result<(), AccountsServiceError> {
        account::ActiveModel {
            id: Set(a.id.0),
            last_modified_at: Set(a.last_modified_at),
            username: Set(a.username.clone()),
            current_password_id: Set(a.current_password_id.clone()),
            primary_email_address_id: Set(a.primary_email_address_id.map(|id| id.0)),
            ..Default::default()
        }
        .update(&self.txn)
        .await
        .map_err(|e| write_error(e, "update account"))?;
        Ok(())
    }

    async fn list_accounts(
        &self,
        request: &CursorRequest,
    ) -> Result<Vec<Account>, AccountsServiceError> {
        let query = account::Entity::find().filter(account::Column::DeletedAt.is_null());
        let models = paginate(query, request)
            .all(&self.txn)
            .await
            .context("list accounts")?;
        Ok(models.into_iter().map(account_from_model).collect())
    }
}

fn account_from_model(model: account::Model) -> Account {
    Account {
        id: AccountId(model.id),
        created_at: model.created_at,
        last_modified_at: model.last_modified_at,
        deleted_at: model.deleted_at,
        username: model.username,
        current_password_id: model.current_password_id,
        primary_email_address_id: model.primary_email_address_id.map(EmailAddressId),
    }
}

// ── Email addresses ─────────────────────────────────────────────────────────

impl EmailOps for DbTransaction {
    async fn find_email_address(
        &self,
        id: EmailAddressId,
    ) -> Result<Option<EmailAddress>, AccountsServiceError> {
        let model = email_address::Entity::find_by_id(id.0)
            .filter(email_address::Column::DeletedAt.is_null())
            .one(&self.txn)
            .await
            .context("find email address by id")?;
        Ok(model.map(email_from_model))
    }

    async fn find_email_address_by_address(
        &self,
        address: &str,
    ) -> Result<Option<EmailAddress>, AccountsServiceError> {
        let model = email_address::Entity::find()
            .filter(email_address::Column::Address.eq(address))
            .filter(email_address::Column::DeletedAt.is_null())
            .one(&self.txn)
            .await
            .context("find email address by address")?;
        Ok(model.map(email_from_model))
    }

    async fn count_email_addresses_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<u64, AccountsServiceError> {
        let count = email_address::Entity::find()
            .filter(email_address::Column::AccountId.eq(account_id.0))
            .filter(email_address::Column::DeletedAt.is_null())
            .count(&self.txn)
            .await
            .context("count email addresses for account")?;
        Ok(count)
    }

    async fn insert_email_address(&self, e: &EmailAddress) -> Result<(), AccountsServiceError> {
        email_address::ActiveModel {
            id: Set(e.id.0),
            created_at: Set(e.created_at),
            last_modified_at: Set(e.last_modified_at),
            deleted_at: Set(e.deleted_at),
            account_id: Set(e.account_id.0),
            address: Set(e.address.clone()),
            confirmed: Set(e.confirmed),
            is_primary: Set(e.primary),
        }
        .insert(&self.txn)
        .await
        .map_err(|err| write_error(err, "insert email address"))?;
        Ok(())
    }

    async fn mark_email_address_confirmed(
        &self,
        id: EmailAddressId,
        at: DateTime<Utc>,
    ) -> Result<(), AccountsServiceError> {
        email_address::ActiveModel {
            id: Set(id.0),
            confirmed: Set(true),
            last_modified_at: Set(at),
            ..Default::default()
        }
        .update(&self.txn)
        .await
        .map_err(|e| write_error(e, "confirm email address"))?;
        Ok(())
    }

    async fn set_email_address_primary(
        &self,
        id: EmailAddressId,
        primary: bool,
        at: DateTime<Utc>,
    ) -> Result<(), AccountsServiceError> {
        email_address::ActiveModel {
            id: Set(id.0),
            is_primary: Set(primary),
            last_modified_at: Set(at),
            ..Default::default()
        }
        .update(&self.txn)
        .await
        .map_err(|e| write_error(e, "set email address primary"))?;
        Ok(())
    }

    async fn soft_delete_email_address(
        &self,
        id: EmailAddressId,
        at: DateTime<Utc>,
    ) -> Result<(), AccountsServiceError> {
        email_address::ActiveModel {
            id: Set(id.0),
            deleted_at: Set(Some(at)),
            last_modified_at: Set(at),
            ..Default::default()
        }
        .update(&self.txn)
        .await
        .map_err(|e| write_error(e, "delete email address"))?;
        Ok(())
    }

    async fn list_email_addresses(
        &self,
        request: &CursorRequest,
    ) -> Result<Vec<EmailAddress>, AccountsServiceError> {
        let query =
            email_address::Entity::find().filter(email_address::Column::DeletedAt.is_null());
        let models = paginate(query, request)
            .all(&self.txn)
            .await
            .context("list email addresses")?;
        Ok(models.into_iter().map(email_from_model).collect())
    }

    async fn list_confirmed_email_addresses_for_account(
        &self,
        account_id: AccountId,
        request: &CursorRequest,
    ) -> Result<Vec<EmailAddress>, AccountsServiceError> {
        let query = email_address::Entity::find()
            .filter(email_address::Column::AccountId.eq(account_id.0))
            .filter(email_address::Column::Confirmed.eq(true))
            .filter(email_address::Column::DeletedAt.is_null());
        let models = paginate(query, request)
            .all(&self.txn)
            .await
            .context("list confirmed email addresses for account")?;
        Ok(models.into_iter().map(email_from_model).collect())
    }

    async fn list_email_addresses_for_account(
        &self,
        account_id: AccountId,
        limit: u64,
    ) -> Result<Vec<EmailAddress>, AccountsServiceError> {
        let models = email_address::Entity::find()
            .filter(email_address::Column::AccountId.eq(account_id.0))
            .filter(email_address::Column::DeletedAt.is_null())
            .order_by_asc(email_address::Column::Id)
            .limit(limit)
            .all(&self.txn)
            .await
            .context("list email addresses for account")?;
        Ok(models.into_iter().map(email_from_model).collect())
    }
}

fn email_from_model(model: email_address::Model) -> EmailAddress {
    EmailAddress {
        id: EmailAddressId(model.id),
        created_at: model.created_at,
        last_modified_at: model.last_modified_at,
        deleted_at: model.deleted_at,
        confirmed: model.confirmed,
        primary: model.is_primary,
        address: model.address,
        account_id: AccountId(model.account_id),
    }
}

// ── Phone numbers ───────────────────────────────────────────────────────────

impl PhoneOps for DbTransaction {
    async fn find_phone_number(
        &self,
        id: PhoneNumberId,
    ) -> Result<Option<PhoneNumber>, AccountsServiceError> {
        let model = phone_number::Entity::find_by_id(id.0)
            .filter(phone_number::Column::DeletedAt.is_null())
            .one(&self.txn)
            .await
            .context("find phone number by id")?;
        Ok(model.map(phone_from_model))
    }

    async fn find_phone_number_by_number(
        &self,
        number: &str,
    ) -> Result<Option<PhoneNumber>, AccountsServiceError> {
        let model = phone_number::Entity::find()
            .filter(phone_number::Column::Number.eq(number))
            .filter(phone_number::Column::DeletedAt.is_null())
            .one(&self.txn)
            .await
            .context("find phone number by number")?;
        Ok(model.map(phone_from_model))
    }

    async fn insert_phone_number(&self, p: &PhoneNumber) -> Result<(), AccountsServiceError> {
        phone_number::ActiveModel {
            id: Set(p.id.0),
            created_at: Set(p.created_at),
            last_modified_at: Set(p.last_modified_at),
            deleted_at: Set(p.deleted_at),
            account_id: Set(p.account_id.0),
            number: Set(p.number.clone()),
            confirmed: Set(p.confirmed),
        }
        .insert(&self.txn)
        .await
        .map_err(|e| write_error(e, "insert phone number"))?;
        Ok(())
    }

    async fn mark_phone_number_confirmed(
        &self,
        id: PhoneNumberId,
        at: DateTime<Utc>,
    ) -> Result<(), AccountsServiceError> {
        phone_number::ActiveModel {
            id: Set(id.0),
            confirmed: Set(true),
            last_modified_at: Set(at),
            ..Default::default()
        }
        .update(&self.txn)
        .await
        .map_err(|e| write_error(e, "confirm phone number"))?;
        Ok(())
    }

    async fn soft_delete_phone_number(
        &self,
        id: PhoneNumberId,
        at: DateTime<Utc>,
    ) -> Result<(), AccountsServiceError> {
        phone_number::ActiveModel {
            id: Set(id.0),
            deleted_at: Set(Some(at)),
            last_modified_at: Set(at),
            ..Default::default()
        }
        .update(&self.txn)
        .await
        .map_err(|e| write_error(e, "delete phone number"))?;
        Ok(())
    }

    async fn list_phone_numbers(
        &self,
        request: &CursorRequest,
    ) -> Result<Vec<PhoneNumber>, AccountsServiceError> {
        let query = phone_number::Entity::find().filter(phone_number::Column::DeletedAt.is_null());
        let models = paginate(query, request)
            .all(&self.txn)
            .await
            .context("list phone numbers")?;
        Ok(models.into_iter().map(phone_from_model).collect())
    }

    async fn list_confirmed_phone_numbers_for_account(
        &self,
        account_id: AccountId,
        request: &CursorRequest,
    ) -> Result<Vec<PhoneNumber>, AccountsServiceError> {
        let query = phone_number::Entity::find()
            .filter(phone_number::Column::AccountId.eq(account_id.0))
            .filter(phone_number::Column::Confirmed.eq(true))
            .filter(phone_number::Column::DeletedAt.is_null());
        let models = paginate(query, request)
            .all(&self.txn)
            .await
            .context("list confirmed phone numbers for account")?;
        Ok(models.into_iter().map(phone_from_model).collect())
    }

    async fn list_phone_numbers_for_account(
        &self,
        account_id: AccountId,
        limit: u64,
    ) -> Result<Vec<PhoneNumber>, AccountsServiceError> {
        let models = phone_number::Entity::find()
            .filter(phone_number::Column::AccountId.eq(account_id.0))
            .filter(phone_number::Column::DeletedAt.is_null())
            .order_by_asc(phone_number::Column::Id)
            .limit(limit)
            .all(&self.txn)
            .await
            .context("list phone numbers for account")?;
        Ok(models.into_iter().map(phone_from_model).collect())
    }
}

fn phone_from_model(model: phone_number::Model) -> PhoneNumber {
    PhoneNumber {
        id: PhoneNumberId(model.id),
        created_at: model.created_at,
        last_modified_at: model.last_modified_at,
        deleted_at: model.deleted_at,
        confirmed: model.confirmed,
        number: model.number,
        account_id: AccountId(model.account_id),
    }
}
