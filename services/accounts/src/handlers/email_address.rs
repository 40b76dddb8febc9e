use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tessera_auth_types::identity::IdentityHeaders;
use tessera_domain::id::{AccountId, EmailAddressId};

use crate::domain::repository::TransactionCoordinator;
use crate::domain::types::EmailAddress;
use crate::error::AccountsServiceError;
use crate::handlers::query::{PageResponse, cursor_request};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EmailAddressResponse {
    pub id: String,
    pub account_id: String,
    pub address: String,
    pub confirmed: bool,
    pub primary: bool,
    #[serde(serialize_with = "tessera_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "tessera_core::serde::to_rfc3339_ms")]
    pub last_modified_at: chrono::DateTime<chrono::Utc>,
}

impl From<EmailAddress> for EmailAddressResponse {
    fn from(e: EmailAddress) -> Self {
        Self {
            id: e.id.to_string(),
            account_id: e.account_id.to_string(),
            address: e.address,
            confirmed: e.confirmed,
            primary: e.primary,
            created_at: e.created_at,
            last_modified_at: e.last_modified_at,
        }
    }
}

// ── POST /accounts/@me/email-addresses ───────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterEmailAddressRequest {
    pub address: String,
}

pub async fn register_email_address<C: TransactionCoordinator + 'static>(
    identity: IdentityHeaders,
    State(state): State<AppState<C>>,
    Json(body): Json<RegisterEmailAddressRequest>,
) -> Result<(StatusCode, Json<EmailAddressResponse>), AccountsServiceError> {
    let email = state
        .registry
        .register_email_address(AccountId(identity.account_id), &body.address)
        .await?;
    Ok((StatusCode::CREATED, Json(email.into())))
}

// ── GET /accounts/@me/email-addresses/{id} ───────────────────────────────────

pub async fn get_email_address<C: TransactionCoordinator + 'static>(
    identity: IdentityHeaders,
    State(state): State<AppState<C>>,
    Path(id): Path<Uuid>,
) -> Result<Json<EmailAddressResponse>, AccountsServiceError> {
    let email = state
        .registry
        .get_email_address(AccountId(identity.account_id), EmailAddressId(id))
        .await?;
    Ok(Json(email.into()))
}

// ── DELETE /accounts/@me/email-addresses/{id} ────────────────────────────────

pub async fn unregister_email_address<C: TransactionCoordinator + 'static>(
    identity: IdentityHeaders,
    State(state): State<AppState<C>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AccountsServiceError> {
    state
        .registry
        .unregister_email_address(AccountId(identity.account_id), EmailAddressId(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── GET /accounts/{id}/email-addresses ───────────────────────────────────────

pub async fn get_email_addresses_for_account<C: TransactionCoordinator + 'static>(
    _identity: IdentityHeaders,
    State(state): State<AppState<C>>,
    Path(account_id): Path<Uuid>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<PageResponse<EmailAddressResponse>>, AccountsServiceError> {
    let request = cursor_request(raw_query.as_deref())?;
    let page = state
        .registry
        .get_email_addresses_for_account(AccountId(account_id), request)
        .await?;
    Ok(Json(PageResponse::from_page(page)))
}

// ── GET /email-addresses ─────────────────────────────────────────────────────

pub async fn get_email_addresses<C: TransactionCoordinator + 'static>(
    identity: IdentityHeaders,
    State(state): State<AppState<C>>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<PageResponse<EmailAddressResponse>>, AccountsServiceError> {
    if !identity.is_privileged() {
        return Err(AccountsServiceError::Forbidden);
    }
    let request = cursor_request(raw_query.as_deref())?;
    let page = state.registry.get_email_addresses(Some(request)).await?;
    Ok(Json(PageResponse::from_page(page)))
}
