use tonic::{Request, Response, Status};
use uuid::Uuid;

use tessera_auth_types::identity::ACCOUNT_ID_HEADER;
use tessera_domain::id::{AccountId, EmailAddressId, PhoneNumberId};
use tessera_domain::pagination::{CursorPage, CursorRequest, SortClause};
use tessera_proto::account::{
    self as proto, AccountPage, ConfirmEmailAddressRequest, ConfirmPhoneNumberRequest,
    CreateAccountRequest, CreateAccountResponse, Empty, EmailAddressPage, GetAccountRequest,
    GetEmailAddressRequest, GetPhoneNumberRequest, ListForAccountRequest, ListRequest,
    PhoneNumberPage, RegisterEmailAddressRequest, RegisterPhoneNumberRequest,
    SetCurrentPasswordRequest, SetPrimaryEmailAddressRequest, UnregisterEmailAddressRequest,
    UnregisterPhoneNumberRequest, UpdateUsernameRequest, account_service_server::AccountService,
    get_account_request::Identifier,
};

use crate::domain::repository::TransactionCoordinator;
use crate::domain::types::{Account, AccountLookup, AccountView, EmailAddress, PhoneNumber};
use crate::state::AppState;
use crate::usecase::account::CreateAccountInput;

pub struct AccountsGrpcServer<C> {
    pub state: AppState<C>,
}

impl<C> Clone for AccountsGrpcServer<C> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

fn parse_uuid(field: &str, value: &str) -> Result<Uuid, Status> {
    value
        .parse::<Uuid>()
        .map_err(|_| Status::invalid_argument(format!("invalid {field}")))
}

/// The calling account, taken from request metadata.
fn requester<T>(request: &Request<T>) -> Result<AccountId, Status> {
    let value = request
        .metadata()
        .get(ACCOUNT_ID_HEADER)
        .ok_or_else(|| Status::unauthenticated("missing account id"))?
        .to_str()
        .map_err(|_| Status::unauthenticated("invalid account id"))?;
    value
        .parse::<Uuid>()
        .map(AccountId)
        .map_err(|_| Status::unauthenticated("invalid account id"))
}

// ── Conversions ─────────────────────────────────────────────────────────────

fn cursor_request(page: proto::CursorRequest) -> Result<CursorRequest, Status> {
    let cursor = if page.cursor.is_empty() {
        None
    } else {
        Some(parse_uuid("cursor", &page.cursor)?)
    };
    let sort_clauses = page
        .sort
        .iter()
        .map(|s| s.parse::<SortClause>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| Status::invalid_argument(e.to_string()))?;
    Ok(CursorRequest {
        cursor,
        count: page.count,
        sort_clauses,
    })
}

fn cursor_string(cursor: Option<Uuid>) -> String {
    cursor.map(|c| c.to_string()).unwrap_or_default()
}

fn account_to_proto(a: Account) -> proto::Account {
    proto::Account {
        id: a.id.to_string(),
        username: a.username,
        primary_email_address_id: a.primary_email_address_id.map(|id| id.to_string()),
        created_at: tessera_core::serde::format_rfc3339_ms(&a.created_at),
        last_modified_at: tessera_core::serde::format_rfc3339_ms(&a.last_modified_at),
    }
}

fn email_to_proto(e: EmailAddress) -> proto::EmailAddress {
    proto::EmailAddress {
        id: e.id.to_string(),
        account_id: e.account_id.to_string(),
        address: e.address,
        confirmed: e.confirmed,
        primary: e.primary,
        created_at: tessera_core::serde::format_rfc3339_ms(&e.created_at),
        last_modified_at: tessera_core::serde::format_rfc3339_ms(&e.last_modified_at),
    }
}

fn phone_to_proto(p: PhoneNumber) -> proto::PhoneNumber {
    proto::PhoneNumber {
        id: p.id.to_string(),
        account_id: p.account_id.to_string(),
        number: p.number,
        confirmed: p.confirmed,
        created_at: tessera_core::serde::format_rfc3339_ms(&p.created_at),
        last_modified_at: tessera_core::serde::format_rfc3339_ms(&p.last_modified_at),
    }
}

fn view_to_proto(view: AccountView) -> proto::AccountView {
    proto::AccountView {
        account: Some(account_to_proto(view.account)),
        email_addresses: view.email_addresses.into_iter().map(email_to_proto).collect(),
        phone_numbers: view.phone_numbers.into_iter().map(phone_to_proto).collect(),
    }
}

fn email_page(page: CursorPage<EmailAddress>) -> EmailAddressPage {
    EmailAddressPage {
        previous_cursor: cursor_string(page.previous_cursor),
        next_cursor: cursor_string(page.next_cursor),
        items: page.items.into_iter().map(email_to_proto).collect(),
    }
}

fn phone_page(page: CursorPage<PhoneNumber>) -> PhoneNumberPage {
    PhoneNumberPage {
        previous_cursor: cursor_string(page.previous_cursor),
        next_cursor: cursor_string(page.next_cursor),
        items: page.items.into_iter().map(phone_to_proto).collect(),
    }
}

/// A missing page on an account-scoped listing means the first page.
fn page_or_default(page: Option<proto::CursorRequest>) -> Result<CursorRequest, Status> {
    page.map(cursor_request)
        .transpose()
        .map(Option::unwrap_or_default)
}

#[tonic::async_trait]
impl<C: TransactionCoordinator + 'static> AccountService for AccountsGrpcServer<C> {
    // ── Account ──────────────────────────────────────────────────────────────

    async fn create_account(
        &self,
        request: Request<CreateAccountRequest>,
    ) -> Result<Response<CreateAccountResponse>, Status> {
        let req = request.into_inner();
        let account_id = self
            .state
            .registry
            .create_account(CreateAccountInput {
                username: req.username,
                email_address: req.email_address,
                phone_number: req.phone_number,
            })
            .await?;
        Ok(Response::new(CreateAccountResponse {
            account_id: account_id.to_string(),
        }))
    }

    async fn get_account(
        &self,
        request: Request<GetAccountRequest>,
    ) -> Result<Response<proto::AccountView>, Status> {
        let lookup = match request.into_inner().identifier {
            Some(Identifier::EmailAddressId(id)) => {
                AccountLookup::EmailAddress(EmailAddressId(parse_uuid("email_address_id", &id)?))
            }
            Some(Identifier::PhoneNumberId(id)) => {
                AccountLookup::PhoneNumber(PhoneNumberId(parse_uuid("phone_number_id", &id)?))
            }
            None => return Err(Status::invalid_argument("identifier is required")),
        };
        let view = self.state.registry.get_account(lookup).await?;
        Ok(Response::new(view_to_proto(view)))
    }

    async fn get_accounts(
        &self,
        request: Request<ListRequest>,
    ) -> Result<Response<AccountPage>, Status> {
        let page = request
            .into_inner()
            .page
            .map(cursor_request)
            .transpose()?;
        let page = self.state.registry.get_accounts(page).await?;
        Ok(Response::new(AccountPage {
            previous_cursor: cursor_string(page.previous_cursor),
            next_cursor: cursor_string(page.next_cursor),
            items: page.items.into_iter().map(account_to_proto).collect(),
        }))
    }

    async fn update_username(
        &self,
        request: Request<UpdateUsernameRequest>,
    ) -> Result<Response<Empty>, Status> {
        let account_id = requester(&request)?;
        let req = request.into_inner();
        self.state
            .registry
            .update_username(account_id, &req.username)
            .await?;
        Ok(Response::new(Empty {}))
    }

    async fn set_current_password(
        &self,
        request: Request<SetCurrentPasswordRequest>,
    ) -> Result<Response<Empty>, Status> {
        let account_id = requester(&request)?;
        let req = request.into_inner();
        self.state
            .registry
            .set_current_password(account_id, &req.current_password_id)
            .await?;
        Ok(Response::new(Empty {}))
    }

    async fn set_primary_email_address(
        &self,
        request: Request<SetPrimaryEmailAddressRequest>,
    ) -> Result<Response<Empty>, Status> {
        let account_id = requester(&request)?;
        let id = parse_uuid("email_address_id", &request.get_ref().email_address_id)?;
        self.state
            .registry
            .set_primary_email_address(account_id, EmailAddressId(id))
            .await?;
        Ok(Response::new(Empty {}))
    }

    // ── Email address ────────────────────────────────────────────────────────

    async fn register_email_address(
        &self,
        request: Request<RegisterEmailAddressRequest>,
    ) -> Result<Response<proto::EmailAddress>, Status> {
        let account_id = requester(&request)?;
        let req = request.into_inner();
        let email = self
            .state
            .registry
            .register_email_address(account_id, &req.address)
            .await?;
        Ok(Response::new(email_to_proto(email)))
    }

    async fn confirm_email_address(
        &self,
        request: Request<ConfirmEmailAddressRequest>,
    ) -> Result<Response<Empty>, Status> {
        let id = parse_uuid("email_address_id", &request.get_ref().email_address_id)?;
        self.state
            .registry
            .confirm_email_address(EmailAddressId(id))
            .await?;
        Ok(Response::new(Empty {}))
    }

    async fn unregister_email_address(
        &self,
        request: Request<UnregisterEmailAddressRequest>,
    ) -> Result<Response<Empty>, Status> {
        let account_id = requester(&request)?;
        let id = parse_uuid("email_address_id", &request.get_ref().email_address_id)?;
        self.state
            .registry
            .unregister_email_address(account_id, EmailAddressId(id))
            .await?;
        Ok(Response::new(Empty {}))
    }

    async fn get_email_address(
        &self,
        request: Request<GetEmailAddressRequest>,
    ) -> Result<Response<proto::EmailAddress>, Status> {
        let account_id = requester(&request)?;
        let id = parse_uuid("email_address_id", &request.get_ref().email_address_id)?;
        let email = self
            .state
            .registry
            .get_email_address(account_id, EmailAddressId(id))
            .await?;
        Ok(Response::new(email_to_proto(email)))
    }

    async fn get_email_addresses(
        &self,
        request: Request<ListRequest>,
    ) -> Result<Response<EmailAddressPage>, Status> {
        let page = request
            .into_inner()
            .page
            .map(cursor_request)
            .transpose()?;
        let page = self.state.registry.get_email_addresses(page).await?;
        Ok(Response::new(email_page(page)))
    }

    async fn get_email_addresses_for_account(
        &self,
        request: Request<ListForAccountRequest>,
    ) -> Result<Response<EmailAddressPage>, Status> {
        let req = request.into_inner();
        let account_id = AccountId(parse_uuid("account_id", &req.account_id)?);
        let page = page_or_default(req.page)?;
        let page = self
            .state
            .registry
            .get_email_addresses_for_account(account_id, page)
            .await?;
        Ok(Response::new(email_page(page)))
    }

    // ── Phone number ─────────────────────────────────────────────────────────

    async fn register_phone_number(
        &self,
        request: Request<RegisterPhoneNumberRequest>,
    ) -> Result<Response<proto::PhoneNumber>, Status> {
        let account_id = requester(&request)?;
        let req = request.into_inner();
        let phone = self
            .state
            .registry
            .register_phone_number(account_id, &req.number)
            .await?;
        Ok(Response::new(phone_to_proto(phone)))
    }

    async fn confirm_phone_number(
        &self,
        request: Request<ConfirmPhoneNumberRequest>,
    ) -> Result<Response<Empty>, Status> {
        let id = parse_uuid("phone_number_id", &request.get_ref().phone_number_id)?;
        self.state
            .registry
            .confirm_phone_number(PhoneNumberId(id))
            .await?;
        Ok(Response::new(Empty {}))
    }

    async fn unregister_phone_number(
        &self,
        request: Request<UnregisterPhoneNumberRequest>,
    ) -> Result<Response<Empty>, Status> {
        let account_id = requester(&request)?;
        let id = parse_uuid("phone_number_id", &request.get_ref().phone_number_id)?;
        self.state
            .registry
            .unregister_phone_number(account_id, PhoneNumberId(id))
            .await?;
        Ok(Response::new(Empty {}))
    }

    async fn get_phone_number(
        &self,
        request: Request<GetPhoneNumberRequest>,
    ) -> Result<Response<proto::PhoneNumber>, Status> {
        let account_id = requester(&request)?;
        let id = parse_uuid("phone_number_id", &request.get_ref().phone_number_id)?;
        let phone = self
            .state
            .registry
            .get_phone_number(account_id, PhoneNumberId(id))
            .await?;
        Ok(Response::new(phone_to_proto(phone)))
    }

    async fn get_phone_numbers(
        &self,
        request: Request<ListRequest>,
    ) -> Result<Response<PhoneNumberPage>, Status> {
        let page = request
            .into_inner()
            .page
            .map(cursor_request)
            .transpose()?;
        let page = self.state.registry.get_phone_numbers(page).await?;
        Ok(Response::new(phone_page(page)))
    }

    async fn get_phone_numbers_for_account(
        &self,
        request: Request<ListForAccountRequest>,
    ) -> Result<Response<PhoneNumberPage>, Status> {
        let req = request.into_inner();
        let account_id = AccountId(parse_uuid("account_id", &req.account_id)?);
        let page = page_or_default(req.page)?;
        let page = self
            .state
            .registry
            .get_phone_numbers_for_account(account_id, page)
            .await?;
        Ok(Response::new(phone_page(page)))
    }
}
