use tonic::{Code, Request};

use tessera_accounts::grpc_server::AccountsGrpcServer;
use tessera_auth_types::identity::ACCOUNT_ID_HEADER;
use tessera_domain::id::AccountId;
use tessera_proto::account::{
    ConfirmEmailAddressRequest, CreateAccountRequest, CursorRequest, GetAccountRequest,
    ListForAccountRequest, ListRequest, RegisterEmailAddressRequest,
    UnregisterEmailAddressRequest, account_service_server::AccountService,
    get_account_request::Identifier,
};

use crate::helpers::{MemoryCoordinator, app_state, registry};

fn grpc_server() -> AccountsGrpcServer<MemoryCoordinator> {
    AccountsGrpcServer {
        state: app_state(&registry()),
    }
}

fn as_account<T>(message: T, account_id: &str) -> Request<T> {
    let mut request = Request::new(message);
    request
        .metadata_mut()
        .insert(ACCOUNT_ID_HEADER, account_id.parse().unwrap());
    request
}

async fn create(server: &AccountsGrpcServer<MemoryCoordinator>, address: &str) -> String {
    server
        .create_account(Request::new(CreateAccountRequest {
            username: None,
            email_address: address.to_owned(),
            phone_number: None,
        }))
        .await
        .unwrap()
        .into_inner()
        .account_id
}

#[tokio::test]
async fn should_create_and_resolve_account_over_grpc() {
    let server = grpc_server();
    let account_id = create(&server, "ray@example.com").await;

    let email = server
        .register_email_address(as_account(
            RegisterEmailAddressRequest {
                address: "ray.alt@example.com".into(),
            },
            &account_id,
        ))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(email.account_id, account_id);
    assert!(!email.primary);

    let view = server
        .get_account(Request::new(GetAccountRequest {
            identifier: Some(Identifier::EmailAddressId(email.id)),
        }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(view.account.unwrap().id, account_id);
    assert_eq!(view.email_addresses.len(), 2);
}

#[tokio::test]
async fn should_require_identifier_on_lookup() {
    let server = grpc_server();
    let status = server
        .get_account(Request::new(GetAccountRequest { identifier: None }))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn should_reject_missing_page_on_system_listing() {
    let server = grpc_server();
    let status = server
        .get_accounts(Request::new(ListRequest { page: None }))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn should_page_with_empty_cursor_strings() {
    let server = grpc_server();
    create(&server, "sue@example.com").await;

    let page = server
        .get_email_addresses(Request::new(ListRequest {
            page: Some(CursorRequest::default()),
        }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.previous_cursor, "");
    assert_eq!(page.next_cursor, page.items[0].id);
    assert_ne!(page.items[0].address, "sue@example.com");
}

#[tokio::test]
async fn should_map_primary_unregister_to_failed_precondition() {
    let server = grpc_server();
    let account_id = create(&server, "tom@example.com").await;
    let page = server
        .get_email_addresses(Request::new(ListRequest {
            page: Some(CursorRequest::default()),
        }))
        .await
        .unwrap()
        .into_inner();
    let primary_id = page.items[0].id.clone();

    let status = server
        .unregister_email_address(as_account(
            UnregisterEmailAddressRequest {
                email_address_id: primary_id,
            },
            &account_id,
        ))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::FailedPrecondition);
}

#[tokio::test]
async fn should_confirm_and_list_for_account() {
    let server = grpc_server();
    let account_id = create(&server, "una@example.com").await;
    let page = server
        .get_email_addresses(Request::new(ListRequest {
            page: Some(CursorRequest::default()),
        }))
        .await
        .unwrap()
        .into_inner();

    server
        .confirm_email_address(Request::new(ConfirmEmailAddressRequest {
            email_address_id: page.items[0].id.clone(),
        }))
        .await
        .unwrap();

    let listed = server
        .get_email_addresses_for_account(Request::new(ListForAccountRequest {
            account_id: account_id.clone(),
            page: None,
        }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(listed.items.len(), 1);
    assert!(listed.items[0].confirmed);
}

#[tokio::test]
async fn should_reject_owner_call_without_metadata() {
    let server = grpc_server();
    let status = server
        .register_email_address(Request::new(RegisterEmailAddressRequest {
            address: "nobody@example.com".into(),
        }))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);
}

#[tokio::test]
async fn should_map_claimed_address_to_already_exists() {
    let server = grpc_server();
    create(&server, "val@example.com").await;

    let status = server
        .create_account(Request::new(CreateAccountRequest {
            username: None,
            email_address: "val@example.com".into(),
            phone_number: None,
        }))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::AlreadyExists);
}

#[tokio::test]
async fn should_map_unknown_requester_to_not_found() {
    let server = grpc_server();
    let status = server
        .register_email_address(as_account(
            RegisterEmailAddressRequest {
                address: "wren@example.com".into(),
            },
            &AccountId::generate().to_string(),
        ))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);
}
