//! The identifier registry: every account, email address and phone number
//! operation, each run as a single transaction.

pub mod account;
pub mod email_address;
pub mod phone_number;

use tessera_domain::pagination::CursorRequest;

use crate::domain::repository::TransactionCoordinator;
use crate::error::AccountsServiceError;

pub struct Registry<C> {
    pub coordinator: C,
}

impl<C: TransactionCoordinator> Registry<C> {
    pub fn new(coordinator: C) -> Self {
        Self { coordinator }
    }
}

/// System-wide listings require an explicit request.
fn require_cursor_request(
    request: Option<CursorRequest>,
) -> Result<CursorRequest, AccountsServiceError> {
    request
        .map(CursorRequest::normalized)
        .ok_or(AccountsServiceError::NilCursorRequest)
}
