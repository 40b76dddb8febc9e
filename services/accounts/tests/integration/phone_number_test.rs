use tessera_accounts::error::AccountsServiceError;
use tessera_domain::id::PhoneNumberId;
use tessera_domain::pagination::CursorRequest;

use crate::helpers::{create_account, registry};

#[tokio::test]
async fn should_register_phone_number_in_e164_form() {
    let registry = registry();
    let account_id = create_account(&registry, "ana@example.com").await;

    let phone = registry
        .register_phone_number(account_id, "(555) 010-2030")
        .await
        .unwrap();
    assert_eq!(phone.number, "+15550102030");
    assert_eq!(phone.account_id, account_id);
    assert!(!phone.confirmed);
}

#[tokio::test]
async fn should_return_existing_row_for_same_number_in_other_format() {
    let registry = registry();
    let account_id = create_account(&registry, "ben@example.com").await;
    let first = registry
        .register_phone_number(account_id, "+1 555 010 2031")
        .await
        .unwrap();

    let again = registry
        .register_phone_number(account_id, "555.010.2031")
        .await
        .unwrap();
    assert_eq!(again.id, first.id);
    assert_eq!(registry.coordinator.snapshot().await.phone_numbers.len(), 1);
}

#[tokio::test]
async fn should_reject_number_claimed_by_another_account() {
    let registry = registry();
    let owner = create_account(&registry, "cat@example.com").await;
    registry
        .register_phone_number(owner, "+15550102032")
        .await
        .unwrap();
    let other = create_account(&registry, "dan@example.com").await;

    let result = registry.register_phone_number(other, "+15550102032").await;
    assert!(matches!(
        result,
        Err(AccountsServiceError::AlreadyRegisteredByDifferentAccount)
    ));
}

#[tokio::test]
async fn should_reject_unparseable_number() {
    let registry = registry();
    let account_id = create_account(&registry, "eve@example.com").await;
    let result = registry
        .register_phone_number(account_id, "call me maybe")
        .await;
    assert!(matches!(result, Err(AccountsServiceError::InvalidFormat(_))));
}

#[tokio::test]
async fn should_confirm_number_once() {
    let registry = registry();
    let account_id = create_account(&registry, "fay@example.com").await;
    let phone = registry
        .register_phone_number(account_id, "+15550102033")
        .await
        .unwrap();

    assert!(registry.confirm_phone_number(phone.id).await.unwrap());
    assert!(!registry.confirm_phone_number(phone.id).await.unwrap());
    let state = registry.coordinator.snapshot().await;
    assert!(state.phone_numbers[&phone.id.0].confirmed);
}

#[tokio::test]
async fn should_report_missing_number_on_confirm() {
    let registry = registry();
    let result = registry
        .confirm_phone_number(PhoneNumberId::generate())
        .await;
    assert!(matches!(result, Err(AccountsServiceError::PhoneNumberNotFound)));
}

#[tokio::test]
async fn should_unregister_own_number_only() {
    let registry = registry();
    let owner = create_account(&registry, "gus@example.com").await;
    let phone = registry
        .register_phone_number(owner, "+15550102034")
        .await
        .unwrap();
    let stranger = create_account(&registry, "hal@example.com").await;

    let result = registry.unregister_phone_number(stranger, phone.id).await;
    assert!(matches!(result, Err(AccountsServiceError::Unowned)));

    registry
        .unregister_phone_number(owner, phone.id)
        .await
        .unwrap();
    let result = registry.get_phone_number(owner, phone.id).await;
    assert!(matches!(result, Err(AccountsServiceError::PhoneNumberNotFound)));
}

#[tokio::test]
async fn should_mask_listed_numbers() {
    let registry = registry();
    let account_id = create_account(&registry, "ida@example.com").await;
    let phone = registry
        .register_phone_number(account_id, "+15550102035")
        .await
        .unwrap();
    registry.confirm_phone_number(phone.id).await.unwrap();

    let page = registry
        .get_phone_numbers_for_account(account_id, CursorRequest::default())
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert!(page.items[0].number.ends_with("35"));
    assert_ne!(page.items[0].number, "+15550102035");

    let page = registry
        .get_phone_numbers(Some(CursorRequest::default()))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_ne!(page.items[0].number, "+15550102035");
}

#[tokio::test]
async fn should_exclude_unconfirmed_numbers_from_account_listing() {
    let registry = registry();
    let account_id = create_account(&registry, "jon@example.com").await;
    registry
        .register_phone_number(account_id, "+15550102036")
        .await
        .unwrap();

    let page = registry
        .get_phone_numbers_for_account(account_id, CursorRequest::default())
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.next_cursor, None);
}

#[tokio::test]
async fn should_require_cursor_request_for_system_listing() {
    let registry = registry();
    let result = registry.get_phone_numbers(None).await;
    assert!(matches!(result, Err(AccountsServiceError::NilCursorRequest)));
}
