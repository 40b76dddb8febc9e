use axum::{
    Json,
    extract::{Query, RawQuery, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tessera_auth_types::identity::IdentityHeaders;
use tessera_domain::id::{AccountId, EmailAddressId, PhoneNumberId};

use crate::domain::repository::TransactionCoordinator;
use crate::domain::types::{Account, AccountLookup, AccountView};
use crate::error::AccountsServiceError;
use crate::handlers::email_address::EmailAddressResponse;
use crate::handlers::phone_number::PhoneNumberResponse;
use crate::handlers::query::{PageResponse, cursor_request};
use crate::state::AppState;
use crate::usecase::account::CreateAccountInput;

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub username: Option<String>,
    pub primary_email_address_id: Option<String>,
    #[serde(serialize_with = "tessera_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "tessera_core::serde::to_rfc3339_ms")]
    pub last_modified_at: chrono::DateTime<chrono::Utc>,
}

impl From<Account> for AccountResponse {
    fn from(a: Account) -> Self {
        Self {
            id: a.id.to_string(),
            username: a.username,
            primary_email_address_id: a.primary_email_address_id.map(|id| id.to_string()),
            created_at: a.created_at,
            last_modified_at: a.last_modified_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AccountViewResponse {
    pub account: AccountResponse,
    pub email_addresses: Vec<EmailAddressResponse>,
    pub phone_numbers: Vec<PhoneNumberResponse>,
}

impl From<AccountView> for AccountViewResponse {
    fn from(view: AccountView) -> Self {
        Self {
            account: view.account.into(),
            email_addresses: view.email_addresses.into_iter().map(Into::into).collect(),
            phone_numbers: view.phone_numbers.into_iter().map(Into::into).collect(),
        }
    }
}

// ── POST /accounts ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateAccountRequest {
    pub username: Option<String>,
    pub email_address: String,
    pub phone_number: Option<String>,
}

#[derive(Serialize)]
pub struct CreateAccountResponse {
    pub account_id: String,
}

pub async fn create_account<C: TransactionCoordinator + 'static>(
    State(state): State<AppState<C>>,
    Json(body): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<CreateAccountResponse>), AccountsServiceError> {
    let account_id = state
        .registry
        .create_account(CreateAccountInput {
            username: body.username,
            email_address: body.email_address,
            phone_number: body.phone_number,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateAccountResponse {
            account_id: account_id.to_string(),
        }),
    ))
}

// ── GET /accounts ────────────────────────────────────────────────────────────

pub async fn get_accounts<C: TransactionCoordinator + 'static>(
    identity: IdentityHeaders,
    State(state): State<AppState<C>>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<PageResponse<AccountResponse>>, AccountsServiceError> {
    if !identity.is_privileged() {
        return Err(AccountsServiceError::Forbidden);
    }
    let request = cursor_request(raw_query.as_deref())?;
    let page = state.registry.get_accounts(Some(request)).await?;
    Ok(Json(PageResponse::from_page(page)))
}

// ── GET /accounts/lookup ─────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LookupQuery {
    pub email_address_id: Option<Uuid>,
    pub phone_number_id: Option<Uuid>,
}

pub async fn lookup_account<C: TransactionCoordinator + 'static>(
    identity: IdentityHeaders,
    State(state): State<AppState<C>>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<AccountViewResponse>, AccountsServiceError> {
    if !identity.is_privileged() {
        return Err(AccountsServiceError::Forbidden);
    }
    let lookup = match (query.email_address_id, query.phone_number_id) {
        (Some(id), None) => AccountLookup::EmailAddress(EmailAddressId(id)),
        (None, Some(id)) => AccountLookup::PhoneNumber(PhoneNumberId(id)),
        _ => {
            return Err(AccountsServiceError::InvalidInput(
                "exactly one of email-address-id or phone-number-id is required".into(),
            ));
        }
    };
    let view = state.registry.get_account(lookup).await?;
    Ok(Json(view.into()))
}

// ── PATCH /accounts/@me ──────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateMeRequest {
    pub username: String,
}

pub async fn update_me<C: TransactionCoordinator + 'static>(
    identity: IdentityHeaders,
    State(state): State<AppState<C>>,
    Json(body): Json<UpdateMeRequest>,
) -> Result<StatusCode, AccountsServiceError> {
    state
        .registry
        .update_username(AccountId(identity.account_id), &body.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── PUT /accounts/@me/primary-email-address ──────────────────────────────────

#[derive(Deserialize)]
pub struct SetPrimaryEmailAddressRequest {
    pub email_address_id: Uuid,
}

pub async fn set_primary_email_address<C: TransactionCoordinator + 'static>(
    identity: IdentityHeaders,
    State(state): State<AppState<C>>,
    Json(body): Json<SetPrimaryEmailAddressRequest>,
) -> Result<StatusCode, AccountsServiceError> {
    state
        .registry
        .set_primary_email_address(
            AccountId(identity.account_id),
            EmailAddressId(body.email_address_id),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
