use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tessera_auth_types::identity::IdentityHeaders;
use tessera_domain::id::{AccountId, PhoneNumberId};

use crate::domain::repository::TransactionCoordinator;
use crate::domain::types::PhoneNumber;
use crate::error::AccountsServiceError;
use crate::handlers::query::{PageResponse, cursor_request};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PhoneNumberResponse {
    pub id: String,
    pub account_id: String,
    pub number: String,
    pub confirmed: bool,
    #[serde(serialize_with = "tessera_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "tessera_core::serde::to_rfc3339_ms")]
    pub last_modified_at: chrono::DateTime<chrono::Utc>,
}

impl From<PhoneNumber> for PhoneNumberResponse {
    fn from(p: PhoneNumber) -> Self {
        Self {
            id: p.id.to_string(),
            account_id: p.account_id.to_string(),
            number: p.number,
            confirmed: p.confirmed,
            created_at: p.created_at,
            last_modified_at: p.last_modified_at,
        }
    }
}

// ── POST /accounts/@me/phone-numbers ─────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterPhoneNumberRequest {
    pub number: String,
}

pub async fn register_phone_number<C: TransactionCoordinator + 'static>(
    identity: IdentityHeaders,
    State(state): State<AppState<C>>,
    Json(body): Json<RegisterPhoneNumberRequest>,
) -> Result<(StatusCode, Json<PhoneNumberResponse>), AccountsServiceError> {
    let phone = state
        .registry
        .register_phone_number(AccountId(identity.account_id), &body.number)
        .await?;
    Ok((StatusCode::CREATED, Json(phone.into())))
}

// ── GET /accounts/@me/phone-numbers/{id} ─────────────────────────────────────

pub async fn get_phone_number<C: TransactionCoordinator + 'static>(
    identity: IdentityHeaders,
    State(state): State<AppState<C>>,
    Path(id): Path<Uuid>,
) -> Result<Json<PhoneNumberResponse>, AccountsServiceError> {
    let phone = state
        .registry
        .get_phone_number(AccountId(identity.account_id), PhoneNumberId(id))
        .await?;
    Ok(Json(phone.into()))
}

// ── DELETE /accounts/@me/phone-numbers/{id} ──────────────────────────────────

pub async fn unregister_phone_number<C: TransactionCoordinator + 'static>(
    identity: IdentityHeaders,
    State(state): State<AppState<C>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AccountsServiceError> {
    state
        .registry
        .unregister_phone_number(AccountId(identity.account_id), PhoneNumberId(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── GET /accounts/{id}/phone-numbers ─────────────────────────────────────────

pub async fn get_phone_numbers_for_account<C: TransactionCoordinator + 'static>(
    _identity: IdentityHeaders,
    State(state): State<AppState<C>>,
    Path(account_id): Path<Uuid>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<PageResponse<PhoneNumberResponse>>, AccountsServiceError> {
    let request = cursor_request(raw_query.as_deref())?;
    let page = state
        .registry
        .get_phone_numbers_for_account(AccountId(account_id), request)
        .await?;
    Ok(Json(PageResponse::from_page(page)))
}

// ── GET /phone-numbers ───────────────────────────────────────────────────────

pub async fn get_phone_numbers<C: TransactionCoordinator + 'static>(
    identity: IdentityHeaders,
    State(state): State<AppState<C>>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<PageResponse<PhoneNumberResponse>>, AccountsServiceError> {
    if !identity.is_privileged() {
        return Err(AccountsServiceError::Forbidden);
    }
    let request = cursor_request(raw_query.as_deref())?;
    let page = state.registry.get_phone_numbers(Some(request)).await?;
    Ok(Json(PageResponse::from_page(page)))
}
