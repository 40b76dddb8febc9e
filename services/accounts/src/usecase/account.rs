use chrono::Utc;
use tracing::info;

use tessera_domain::id::AccountId;
use tessera_domain::pagination::{CursorPage, CursorRequest};

use crate::domain::repository::{AccountOps, EmailOps, PhoneOps, TransactionCoordinator};
use crate::domain::types::{
    ACCOUNT_IDENTIFIER_CAP, Account, AccountLookup, AccountView, EmailAddress, PhoneNumber,
    normalize_email_address, normalize_phone_number, validate_username,
};
use crate::error::AccountsServiceError;
use crate::usecase::{Registry, require_cursor_request};

// ── CreateAccount ───────────────────────────────────────────────────────────

pub struct CreateAccountInput {
    pub username: Option<String>,
    pub email_address: String,
    pub phone_number: Option<String>,
}

impl<C: TransactionCoordinator> Registry<C> {
    /// Create an account with its primary email address and an optional phone
    /// number. Every identifier must be unclaimed by any active row.
    pub async fn create_account(
        &self,
        input: CreateAccountInput,
    ) -> Result<AccountId, AccountsServiceError> {
        let username = input
            .username
            .as_deref()
            .map(validate_username)
            .transpose()?;
        let address = normalize_email_address(&input.email_address)?;
        let number = input
            .phone_number
            .as_deref()
            .map(normalize_phone_number)
            .transpose()?;

        let account_id = self
            .coordinator
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    if let Some(name) = &username {
                        if tx.find_account_by_username(name).await?.is_some() {
                            return Err(AccountsServiceError::UsernameAlreadyTaken);
                        }
                    }
                    if tx.find_email_address_by_address(&address).await?.is_some() {
                        return Err(AccountsServiceError::AlreadyRegisteredByDifferentAccount);
                    }
                    if let Some(number) = &number {
                        if tx.find_phone_number_by_number(number).await?.is_some() {
                            return Err(AccountsServiceError::AlreadyRegisteredByDifferentAccount);
                        }
                    }

                    let now = Utc::now();
                    let mut account = Account::new(username, now);
                    tx.insert_account(&account).await?;

                    let email = EmailAddress::new(account.id, address, true, now);
                    tx.insert_email_address(&email).await?;
                    account.primary_email_address_id = Some(email.id);
                    tx.update_account(&account).await?;

                    if let Some(number) = number {
                        tx.insert_phone_number(&PhoneNumber::new(account.id, number, now))
                            .await?;
                    }
                    Ok(account.id)
                })
            })
            .await?;

        info!(%account_id, "account created");
        Ok(account_id)
    }

    // ── GetAccount ──────────────────────────────────────────────────────────

    /// Resolve an account from one of its identifiers and return it with all
    /// of its active identifiers, unmasked and capped per kind.
    pub async fn get_account(
        &self,
        lookup: AccountLookup,
    ) -> Result<AccountView, AccountsServiceError> {
        self.coordinator
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    let account_id = match lookup {
                        AccountLookup::EmailAddress(id) => {
                            tx.find_email_address(id)
                                .await?
                                .ok_or(AccountsServiceError::EmailAddressNotFound)?
                                .account_id
                        }
                        AccountLookup::PhoneNumber(id) => {
                            tx.find_phone_number(id)
                                .await?
                                .ok_or(AccountsServiceError::PhoneNumberNotFound)?
                                .account_id
                        }
                    };
                    let account = tx
                        .find_account(account_id)
                        .await?
                        .ok_or(AccountsServiceError::AccountNotFound)?;
                    let email_addresses = tx
                        .list_email_addresses_for_account(account_id, ACCOUNT_IDENTIFIER_CAP)
                        .await?;
                    let phone_numbers = tx
                        .list_phone_numbers_for_account(account_id, ACCOUNT_IDENTIFIER_CAP)
                        .await?;
                    Ok(AccountView {
                        account,
                        email_addresses,
                        phone_numbers,
                    })
                })
            })
            .await
    }

    // ── GetAccounts ─────────────────────────────────────────────────────────

    pub async fn get_accounts(
        &self,
        request: Option<CursorRequest>,
    ) -> Result<CursorPage<Account>, AccountsServiceError> {
        let request = require_cursor_request(request)?;
        self.coordinator
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    let rows = tx.list_accounts(&request).await?;
                    Ok(CursorPage::new(&request, rows))
                })
            })
            .await
    }

    // ── UpdateUsername ──────────────────────────────────────────────────────

    pub async fn update_username(
        &self,
        account_id: AccountId,
        username: &str,
    ) -> Result<(), AccountsServiceError> {
        let username = validate_username(username)?;
        self.coordinator
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    let mut account = tx
                        .find_account(account_id)
                        .await?
                        .ok_or(AccountsServiceError::AccountNotFound)?;
                    if let Some(holder) = tx.find_account_by_username(&username).await? {
                        if holder.id != account_id {
                            return Err(AccountsServiceError::UsernameAlreadyTaken);
                        }
                        return Ok(());
                    }
                    account.username = Some(username);
                    account.last_modified_at = Utc::now();
                    tx.update_account(&account).await
                })
            })
            .await
    }

    // ── SetCurrentPassword ──────────────────────────────────────────────────

    /// Point the account at its current password record. The password itself
    /// lives elsewhere; only its identifier is stored here.
    pub async fn set_current_password(
        &self,
        account_id: AccountId,
        current_password_id: &str,
    ) -> Result<(), AccountsServiceError> {
        let current_password_id = current_password_id.trim().to_owned();
        if current_password_id.is_empty() {
            return Err(AccountsServiceError::InvalidInput(
                "current password id must not be empty".into(),
            ));
        }
        self.coordinator
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    let mut account = tx
                        .find_account(account_id)
                        .await?
                        .ok_or(AccountsServiceError::AccountNotFound)?;
                    account.current_password_id = Some(current_password_id);
                    account.last_modified_at = Utc::now();
                    tx.update_account(&account).await
                })
            })
            .await
    }
}
