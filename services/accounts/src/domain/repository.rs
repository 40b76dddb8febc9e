//! Data-access boundary for the identifier registry.
//!
//! Every registry operation runs against a [`Transaction`] handle obtained from a
//! [`TransactionCoordinator`]. The handle exposes three narrow capability traits
//! so that reads and writes across accounts, email addresses and phone numbers
//! commit or roll back together.
//!
//! Lookups by ID or value only return rows whose `deleted_at` is unset.

use std::future::Future;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

use tessera_domain::id::{AccountId, EmailAddressId, PhoneNumberId};
use tessera_domain::pagination::CursorRequest;

use crate::domain::types::{Account, EmailAddress, PhoneNumber};
use crate::error::AccountsServiceError;

type Result<T> = std::result::Result<T, AccountsServiceError>;

pub trait AccountOps: Send + Sync {
    fn find_account(&self, id: AccountId) -> impl Future<Output = Result<Option<Account>>> + Send;

    fn find_account_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<Account>>> + Send;

    fn insert_account(&self, account: &Account) -> impl Future<Output = Result<()>> + Send;

    /// Persist the mutable columns: username, current password, primary
    /// email pointer and `last_modified_at`.
    fn update_account(&self, account: &Account) -> impl Future<Output = Result<()>> + Send;

    /// `request` must already be normalized.
    fn list_accounts(
        &self,
        request: &CursorRequest,
    ) -> impl Future<Output = Result<Vec<Account>>> + Send;
}

pub trait EmailOps: Send + Sync {
    fn find_email_address(
        &self,
        id: EmailAddressId,
    ) -> impl Future<Output = Result<Option<EmailAddress>>> + Send;

    fn find_email_address_by_address(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Option<EmailAddress>>> + Send;

    fn count_email_addresses_for_account(
        &self,
        account_id: AccountId,
    ) -> impl Future<Output = Result<u64>> + Send;

    fn insert_email_address(
        &self,
        email: &EmailAddress,
    ) -> impl Future<Output = Result<()>> + Send;

    fn mark_email_address_confirmed(
        &self,
        id: EmailAddressId,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;

    fn set_email_address_primary(
        &self,
        id: EmailAddressId,
        primary: bool,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;

    fn soft_delete_email_address(
        &self,
        id: EmailAddressId,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;

    fn list_email_addresses(
        &self,
        request: &CursorRequest,
    ) -> impl Future<Output = Result<Vec<EmailAddress>>> + Send;

    fn list_confirmed_email_addresses_for_account(
        &self,
        account_id: AccountId,
        request: &CursorRequest,
    ) -> impl Future<Output = Result<Vec<EmailAddress>>> + Send;

    /// Active rows of one account in ID order, at most `limit`.
    fn list_email_addresses_for_account(
        &self,
        account_id: AccountId,
        limit: u64,
    ) -> impl Future<Output = Result<Vec<EmailAddress>>> + Send;
}

pub trait PhoneOps: Send + Sync {
    fn find_phone_number(
        &self,
        id: PhoneNumberId,
    ) -> impl Future<Output = Result<Option<PhoneNumber>>> + Send;

    fn find_phone_number_by_number(
        &self,
        number: &str,
    ) -> impl Future<Output = Result<Option<PhoneNumber>>> + Send;

    fn insert_phone_number(&self, phone: &PhoneNumber)
    -> impl Future<Output = Result<()>> + Send;

    fn mark_phone_number_confirmed(
        &self,
        id: PhoneNumberId,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;

    fn soft_delete_phone_number(
        &self,
        id: PhoneNumberId,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;

    fn list_phone_numbers(
        &self,
        request: &CursorRequest,
    ) -> impl Future<Output = Result<Vec<PhoneNumber>>> + Send;

    fn list_confirmed_phone_numbers_for_account(
        &self,
        account_id: AccountId,
        request: &CursorRequest,
    ) -> impl Future<Output = Result<Vec<PhoneNumber>>> + Send;

    fn list_phone_numbers_for_account(
        &self,
        account_id: AccountId,
        limit: u64,
    ) -> impl Future<Output = Result<Vec<PhoneNumber>>> + Send;
}

/// One open unit of work. Dropping it without calling [`Transaction::commit`]
/// discards its writes.
pub trait Transaction: AccountOps + EmailOps + PhoneOps + Sized {
    fn commit(self) -> impl Future<Output = Result<()>> + Send;

    fn rollback(self) -> impl Future<Output = Result<()>> + Send;
}

/// Opens transactions against the backing store.
pub trait TransactionCoordinator: Send + Sync {
    type Tx: Transaction;

    fn begin(&self) -> impl Future<Output = Result<Self::Tx>> + Send;

    /// Run `work` in a fresh transaction.
    ///
    /// Commits when `work` returns `Ok` and rolls back when it returns `Err`.
    /// If the returned future is dropped or `work` panics, the transaction
    /// handle is dropped without commit.
    fn run_in_transaction<T, F>(&self, work: F) -> impl Future<Output = Result<T>> + Send
    where
        T: Send,
        F: for<'t> FnOnce(&'t Self::Tx) -> BoxFuture<'t, Result<T>> + Send,
    {
        async move {
            let tx = self.begin().await?;
            let outcome = work(&tx).await;
            match outcome {
                Ok(value) => {
                    tx.commit().await?;
                    Ok(value)
                }
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        tracing::warn!(error = %rollback_err, "rollback failed");
                    }
                    Err(err)
                }
            }
        }
    }
}
