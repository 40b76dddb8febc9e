use chrono::Utc;
use tracing::info;

use tessera_domain::id::{AccountId, EmailAddressId};
use tessera_domain::pagination::{CursorPage, CursorRequest};

use crate::domain::repository::{AccountOps, EmailOps, TransactionCoordinator};
use crate::domain::types::{EmailAddress, normalize_email_address};
use crate::error::AccountsServiceError;
use crate::usecase::{Registry, require_cursor_request};

impl<C: TransactionCoordinator> Registry<C> {
    // ── RegisterEmailAddress ────────────────────────────────────────────────

    /// Claim `address` for `account_id`.
    ///
    /// Registering an address the account already holds returns the existing
    /// row. The account's first active address becomes its primary.
    pub async fn register_email_address(
        &self,
        account_id: AccountId,
        address: &str,
    ) -> Result<EmailAddress, AccountsServiceError> {
        let address = normalize_email_address(address)?;
        let email = self
            .coordinator
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    let mut account = tx
                        .find_account(account_id)
                        .await?
                        .ok_or(AccountsServiceError::AccountNotFound)?;

                    if let Some(existing) = tx.find_email_address_by_address(&address).await? {
                        if existing.account_id != account_id {
                            return Err(AccountsServiceError::AlreadyRegisteredByDifferentAccount);
                        }
                        return Ok(existing);
                    }

                    let now = Utc::now();
                    let primary = tx.count_email_addresses_for_account(account_id).await? == 0;
                    let email = EmailAddress::new(account_id, address, primary, now);
                    tx.insert_email_address(&email).await?;

                    if primary {
                        account.primary_email_address_id = Some(email.id);
                        account.last_modified_at = now;
                        tx.update_account(&account).await?;
                    }
                    Ok(email)
                })
            })
            .await?;

        info!(%account_id, email_address_id = %email.id, primary = email.primary, "email address registered");
        Ok(email)
    }

    // ── ConfirmEmailAddress ─────────────────────────────────────────────────

    /// Mark an address confirmed. Returns `false` when it already was.
    pub async fn confirm_email_address(
        &self,
        id: EmailAddressId,
    ) -> Result<bool, AccountsServiceError> {
        self.coordinator
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    let email = tx
                        .find_email_address(id)
                        .await?
                        .ok_or(AccountsServiceError::EmailAddressNotFound)?;
                    if email.confirmed {
                        return Ok(false);
                    }
                    tx.mark_email_address_confirmed(id, Utc::now()).await?;
                    Ok(true)
                })
            })
            .await
    }

    // ── UnregisterEmailAddress ──────────────────────────────────────────────

    /// Soft-delete an address. The primary address is refused before
    /// ownership is considered.
    pub async fn unregister_email_address(
        &self,
        requester: AccountId,
        id: EmailAddressId,
    ) -> Result<(), AccountsServiceError> {
        self.coordinator
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    let email = tx
                        .find_email_address(id)
                        .await?
                        .ok_or(AccountsServiceError::EmailAddressNotFound)?;
                    if email.primary {
                        return Err(AccountsServiceError::CannotUnregisterPrimary);
                    }
                    if email.account_id != requester {
                        return Err(AccountsServiceError::Unowned);
                    }
                    tx.soft_delete_email_address(id, Utc::now()).await
                })
            })
            .await
    }

    // ── SetPrimaryEmailAddress ──────────────────────────────────────────────

    /// Move the primary flag to a confirmed address owned by `account_id`.
    pub async fn set_primary_email_address(
        &self,
        account_id: AccountId,
        id: EmailAddressId,
    ) -> Result<(), AccountsServiceError> {
        self.coordinator
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    let mut account = tx
                        .find_account(account_id)
                        .await?
                        .ok_or(AccountsServiceError::AccountNotFound)?;
                    let email = tx
                        .find_email_address(id)
                        .await?
                        .ok_or(AccountsServiceError::EmailAddressNotFound)?;
                    if email.account_id != account_id {
                        return Err(AccountsServiceError::Unowned);
                    }
                    if !email.confirmed {
                        return Err(AccountsServiceError::EmailAddressNotConfirmed);
                    }
                    if email.primary {
                        return Ok(());
                    }

                    let now = Utc::now();
                    // Demote first; the store allows one primary row per account.
                    if let Some(previous) = account.primary_email_address_id {
                        tx.set_email_address_primary(previous, false, now).await?;
                    }
                    tx.set_email_address_primary(id, true, now).await?;
                    account.primary_email_address_id = Some(id);
                    account.last_modified_at = now;
                    tx.update_account(&account).await
                })
            })
            .await
    }

    // ── GetEmailAddress ─────────────────────────────────────────────────────

    pub async fn get_email_address(
        &self,
        requester: AccountId,
        id: EmailAddressId,
    ) -> Result<EmailAddress, AccountsServiceError> {
        self.coordinator
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    let email = tx
                        .find_email_address(id)
                        .await?
                        .ok_or(AccountsServiceError::EmailAddressNotFound)?;
                    if email.account_id != requester {
                        return Err(AccountsServiceError::Unowned);
                    }
                    Ok(email)
                })
            })
            .await
    }

    // ── GetEmailAddresses ───────────────────────────────────────────────────

    /// System-wide listing, masked.
    pub async fn get_email_addresses(
        &self,
        request: Option<CursorRequest>,
    ) -> Result<CursorPage<EmailAddress>, AccountsServiceError> {
        let request = require_cursor_request(request)?;
        let page = self
            .coordinator
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    let rows = tx.list_email_addresses(&request).await?;
                    Ok(CursorPage::new(&request, rows))
                })
            })
            .await?;
        Ok(page.map(EmailAddress::masked))
    }

    // ── GetEmailAddressesForAccount ─────────────────────────────────────────

    /// Confirmed addresses of one account, masked.
    pub async fn get_email_addresses_for_account(
        &self,
        account_id: AccountId,
        request: CursorRequest,
    ) -> Result<CursorPage<EmailAddress>, AccountsServiceError> {
        let request = request.normalized();
        let page = self
            .coordinator
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    let rows = tx
                        .list_confirmed_email_addresses_for_account(account_id, &request)
                        .await?;
                    Ok(CursorPage::new(&request, rows))
                })
            })
            .await?;
        Ok(page.map(EmailAddress::masked))
    }
}
