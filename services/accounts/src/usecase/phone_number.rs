use chrono::Utc;
use tracing::info;

use tessera_domain::id::{AccountId, PhoneNumberId};
use tessera_domain::pagination::{CursorPage, CursorRequest};

use crate::domain::repository::{AccountOps, PhoneOps, TransactionCoordinator};
use crate::domain::types::{PhoneNumber, normalize_phone_number};
use crate::error::AccountsServiceError;
use crate::usecase::{Registry, require_cursor_request};

impl<C: TransactionCoordinator> Registry<C> {
    // ── RegisterPhoneNumber ─────────────────────────────────────────────────

    pub async fn register_phone_number(
        &self,
        account_id: AccountId,
        number: &str,
    ) -> Result<PhoneNumber, AccountsServiceError> {
        let number = normalize_phone_number(number)?;
        let phone = self
            .coordinator
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    tx.find_account(account_id)
                        .await?
                        .ok_or(AccountsServiceError::AccountNotFound)?;

                    if let Some(existing) = tx.find_phone_number_by_number(&number).await? {
                        if existing.account_id != account_id {
                            return Err(AccountsServiceError::AlreadyRegisteredByDifferentAccount);
                        }
                        return Ok(existing);
                    }

                    let phone = PhoneNumber::new(account_id, number, Utc::now());
                    tx.insert_phone_number(&phone).await?;
                    Ok(phone)
                })
            })
            .await?;

        info!(%account_id, phone_number_id = %phone.id, "phone number registered");
        Ok(phone)
    }

    // ── ConfirmPhoneNumber ──────────────────────────────────────────────────

    /// Mark a number confirmed. Returns `false` when it already was.
    pub async fn confirm_phone_number(
        &self,
        id: PhoneNumberId,
    ) -> Result<bool, AccountsServiceError> {
        self.coordinator
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    let phone = tx
                        .find_phone_number(id)
                        .await?
                        .ok_or(AccountsServiceError::PhoneNumberNotFound)?;
                    if phone.confirmed {
                        return Ok(false);
                    }
                    tx.mark_phone_number_confirmed(id, Utc::now()).await?;
                    Ok(true)
                })
            })
            .await
    }

    // ── UnregisterPhoneNumber ───────────────────────────────────────────────

    pub async fn unregister_phone_number(
        &self,
        requester: AccountId,
        id: PhoneNumberId,
    ) -> Result<(), AccountsServiceError> {
        self.coordinator
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    let phone = tx
                        .find_phone_number(id)
                        .await?
                        .ok_or(AccountsServiceError::PhoneNumberNotFound)?;
                    if phone.account_id != requester {
                        return Err(AccountsServiceError::Unowned);
                    }
                    tx.soft_delete_phone_number(id, Utc::now()).await
                })
            })
            .await
    }

    // ── GetPhoneNumber ──────────────────────────────────────────────────────

    pub async fn get_phone_number(
        &self,
        requester: AccountId,
        id: PhoneNumberId,
    ) -> Result<PhoneNumber, AccountsServiceError> {
        self.coordinator
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    let phone = tx
                        .find_phone_number(id)
                        .await?
                        .ok_or(AccountsServiceError::PhoneNumberNotFound)?;
                    if phone.account_id != requester {
                        return Err(AccountsServiceError::Unowned);
                    }
                    Ok(phone)
                })
            })
            .await
    }

    // ── GetPhoneNumbers ─────────────────────────────────────────────────────

    pub async fn get_phone_numbers(
        &self,
        request: Option<CursorRequest>,
    ) -> Result<CursorPage<PhoneNumber>, AccountsServiceError> {
        let request = require_cursor_request(request)?;
        let page = self
            .coordinator
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    let rows = tx.list_phone_numbers(&request).await?;
                    Ok(CursorPage::new(&request, rows))
                })
            })
            .await?;
        Ok(page.map(PhoneNumber::masked))
    }

    // ── GetPhoneNumbersForAccount ───────────────────────────────────────────

    pub async fn get_phone_numbers_for_account(
        &self,
        account_id: AccountId,
        request: CursorRequest,
    ) -> Result<CursorPage<PhoneNumber>, AccountsServiceError> {
        let request = request.normalized();
        let page = self
            .coordinator
            .run_in_transaction(move |tx| {
                Box::pin(async move {
                    let rows = tx
                        .list_confirmed_phone_numbers_for_account(account_id, &request)
                        .await?;
                    Ok(CursorPage::new(&request, rows))
                })
            })
            .await?;
        Ok(page.map(PhoneNumber::masked))
    }
}
