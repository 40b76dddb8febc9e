//! Asynchronous confirmation of email addresses and phone numbers.
//!
//! Each broker message carries the identifier to confirm. A message is taken
//! to a terminal [`Outcome`] exactly once; failures are reported, not retried.

use std::sync::Arc;

use prost::Message as _;
use uuid::Uuid;

use tessera_domain::id::{EmailAddressId, PhoneNumberId};
use tessera_proto::account::{ConfirmEmailAddressRequest, ConfirmPhoneNumberRequest};

use crate::domain::repository::TransactionCoordinator;
use crate::error::AccountsServiceError;
use crate::usecase::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationTopic {
    EmailAddress,
    PhoneNumber,
}

impl ConfirmationTopic {
    pub const ALL: [Self; 2] = [Self::EmailAddress, Self::PhoneNumber];

    pub fn name(self) -> &'static str {
        match self {
            Self::EmailAddress => "confirm-email-address-request",
            Self::PhoneNumber => "confirm-phone-number-request",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfirmationError {
    #[error("malformed payload: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("malformed identifier: {0}")]
    InvalidId(#[from] uuid::Error),
    #[error(transparent)]
    Registry(#[from] AccountsServiceError),
}

#[derive(Debug)]
pub enum Outcome {
    /// The identifier is confirmed; `changed` is false when it already was.
    Applied { changed: bool },
    Failed(ConfirmationError),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

pub struct ConfirmationConsumer<C> {
    pub registry: Arc<Registry<C>>,
}

impl<C: TransactionCoordinator> ConfirmationConsumer<C> {
    pub fn new(registry: Arc<Registry<C>>) -> Self {
        Self { registry }
    }

    pub async fn process(&self, topic: ConfirmationTopic, payload: &[u8]) -> Outcome {
        let result = match topic {
            ConfirmationTopic::EmailAddress => self.confirm_email_address(payload).await,
            ConfirmationTopic::PhoneNumber => self.confirm_phone_number(payload).await,
        };
        match result {
            Ok(changed) => Outcome::Applied { changed },
            Err(err) => Outcome::Failed(err),
        }
    }

    async fn confirm_email_address(&self, payload: &[u8]) -> Result<bool, ConfirmationError> {
        let request = ConfirmEmailAddressRequest::decode(payload)?;
        let id = EmailAddressId(Uuid::parse_str(&request.email_address_id)?);
        Ok(self.registry.confirm_email_address(id).await?)
    }

    async fn confirm_phone_number(&self, payload: &[u8]) -> Result<bool, ConfirmationError> {
        let request = ConfirmPhoneNumberRequest::decode(payload)?;
        let id = PhoneNumberId(Uuid::parse_str(&request.phone_number_id)?);
        Ok(self.registry.confirm_phone_number(id).await?)
    }
}
