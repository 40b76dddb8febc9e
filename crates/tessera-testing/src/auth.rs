//! Identity header injection for integration tests.
//!
//! Services sit behind a gateway that injects `x-tessera-account-id` and
//! `x-tessera-account-role`. Tests inject them directly.

use axum::http::{HeaderName, HeaderValue};
use tessera_auth_types::identity::{ACCOUNT_ID_HEADER, ACCOUNT_ROLE_HEADER, PRIVILEGED_ROLE};
use uuid::Uuid;

/// Configurable identity injected into test requests.
pub struct MockAuth {
    pub account_id: Uuid,
    pub account_role: u8,
}

impl MockAuth {
    pub fn new(account_id: Uuid, account_role: u8) -> Self {
        Self {
            account_id,
            account_role,
        }
    }

    /// An ordinary account holder.
    pub fn member(account_id: Uuid) -> Self {
        Self::new(account_id, 0)
    }

    /// An operator allowed to call system-wide listings.
    pub fn operator() -> Self {
        Self::new(Uuid::new_v4(), PRIVILEGED_ROLE)
    }

    /// Header pairs as the gateway would inject them.
    pub fn header_pairs(&self) -> [(HeaderName, HeaderValue); 2] {
        [
            (
                HeaderName::from_static(ACCOUNT_ID_HEADER),
                HeaderValue::from_str(&self.account_id.to_string()).unwrap(),
            ),
            (
                HeaderName::from_static(ACCOUNT_ROLE_HEADER),
                HeaderValue::from(u16::from(self.account_role)),
            ),
        ]
    }
}
