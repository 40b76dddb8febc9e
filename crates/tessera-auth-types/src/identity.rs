//! Gateway-injected identity headers extractor.

use axum::extract::FromRequestParts;
use http::StatusCode;
use http::request::Parts;
use uuid::Uuid;

pub const ACCOUNT_ID_HEADER: &str = "x-tessera-account-id";
pub const ACCOUNT_ROLE_HEADER: &str = "x-tessera-account-role";

/// Lowest role allowed to call system-wide listings.
pub const PRIVILEGED_ROLE: u8 = 2;

/// Account identity injected by the gateway via `x-tessera-account-id` and
/// `x-tessera-account-role`.
///
/// Returns 401 if either header is absent or malformed. Role checks are left
/// to handlers.
#[derive(Debug, Clone)]
pub struct IdentityHeaders {
    pub account_id: Uuid,
    pub account_role: u8,
}

impl IdentityHeaders {
    pub fn is_privileged(&self) -> bool {
        self.account_role >= PRIVILEGED_ROLE
    }
}

impl<S> FromRequestParts<S> for IdentityHeaders
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    // axum-core 0.5 declares `fn -> impl Future + Send`; read the headers up
    // front and return a 'static future.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let account_id = parts
            .headers
            .get(ACCOUNT_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<Uuid>().ok());

        let account_role = parts
            .headers
            .get(ACCOUNT_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u8>().ok());

        async move {
            let account_id = account_id.ok_or(StatusCode::UNAUTHORIZED)?;
            let account_role = account_role.ok_or(StatusCode::UNAUTHORIZED)?;
            Ok(Self {
                account_id,
                account_role,
            })
        }
    }
}
