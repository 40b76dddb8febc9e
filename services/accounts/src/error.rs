use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Accounts service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum AccountsServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error("account not found")]
    AccountNotFound,
    #[error("email address not found")]
    EmailAddressNotFound,
    #[error("phone number not found")]
    PhoneNumberNotFound,
    #[error("identifier is owned by a different account")]
    Unowned,
    #[error("forbidden")]
    Forbidden,
    #[error("already registered by a different account")]
    AlreadyRegisteredByDifferentAccount,
    #[error("username already taken")]
    UsernameAlreadyTaken,
    #[error("cannot unregister the primary email address")]
    CannotUnregisterPrimary,
    #[error("email address not confirmed")]
    EmailAddressNotConfirmed,
    #[error("concurrent modification")]
    ConcurrentModification,
    #[error("cursor request is required")]
    NilCursorRequest,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AccountsServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InvalidFormat(_) => "INVALID_FORMAT",
            Self::AccountNotFound => "ACCOUNT_NOT_FOUND",
            Self::EmailAddressNotFound => "EMAIL_ADDRESS_NOT_FOUND",
            Self::PhoneNumberNotFound => "PHONE_NUMBER_NOT_FOUND",
            Self::Unowned => "UNOWNED",
            Self::Forbidden => "FORBIDDEN",
            Self::AlreadyRegisteredByDifferentAccount => "ALREADY_REGISTERED_BY_DIFFERENT_ACCOUNT",
            Self::UsernameAlreadyTaken => "USERNAME_ALREADY_TAKEN",
            Self::CannotUnregisterPrimary => "CANNOT_UNREGISTER_PRIMARY",
            Self::EmailAddressNotConfirmed => "EMAIL_ADDRESS_NOT_CONFIRMED",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::NilCursorRequest => "NIL_CURSOR_REQUEST",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for AccountsServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidInput(_) | Self::InvalidFormat(_) | Self::NilCursorRequest => {
                StatusCode::BAD_REQUEST
            }
            Self::AccountNotFound | Self::EmailAddressNotFound | Self::PhoneNumberNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::Unowned | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::AlreadyRegisteredByDifferentAccount
            | Self::UsernameAlreadyTaken
            | Self::CannotUnregisterPrimary
            | Self::EmailAddressNotConfirmed
            | Self::ConcurrentModification => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if let Self::Internal(ref e) = self {
            tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

impl From<AccountsServiceError> for tonic::Status {
    fn from(err: AccountsServiceError) -> Self {
        let message = err.to_string();
        match err {
            AccountsServiceError::InvalidInput(_)
            | AccountsServiceError::InvalidFormat(_)
            | AccountsServiceError::NilCursorRequest => tonic::Status::invalid_argument(message),
            AccountsServiceError::AccountNotFound
            | AccountsServiceError::EmailAddressNotFound
            | AccountsServiceError::PhoneNumberNotFound => tonic::Status::not_found(message),
            AccountsServiceError::Unowned | AccountsServiceError::Forbidden => {
                tonic::Status::permission_denied(message)
            }
            AccountsServiceError::AlreadyRegisteredByDifferentAccount
            | AccountsServiceError::UsernameAlreadyTaken => tonic::Status::already_exists(message),
            AccountsServiceError::CannotUnregisterPrimary
            | AccountsServiceError::EmailAddressNotConfirmed => {
                tonic::Status::failed_precondition(message)
            }
            AccountsServiceError::ConcurrentModification => tonic::Status::aborted(message),
            AccountsServiceError::Internal(e) => {
                tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
                tonic::Status::internal(message)
            }
        }
    }
}
