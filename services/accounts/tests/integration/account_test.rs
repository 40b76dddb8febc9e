use tessera_accounts::domain::types::{ACCOUNT_IDENTIFIER_CAP, AccountLookup};
use tessera_accounts::error::AccountsServiceError;
use tessera_accounts::usecase::account::CreateAccountInput;
use tessera_domain::id::{AccountId, EmailAddressId, PhoneNumberId};
use tessera_domain::pagination::CursorRequest;

use crate::helpers::{account_input, create_account, primary_email_id, registry};

// ── CreateAccount ────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_account_with_primary_email_and_phone() {
    let registry = registry();
    let account_id = registry
        .create_account(CreateAccountInput {
            username: Some("bob".into()),
            email_address: " Bob@Example.com ".into(),
            phone_number: Some("(555) 123-4567".into()),
        })
        .await
        .unwrap();

    let primary = primary_email_id(&registry, account_id).await;
    let view = registry
        .get_account(AccountLookup::EmailAddress(primary))
        .await
        .unwrap();

    assert_eq!(view.account.id, account_id);
    assert_eq!(view.account.username.as_deref(), Some("bob"));
    assert_eq!(view.email_addresses.len(), 1);
    assert_eq!(view.email_addresses[0].address, "bob@example.com");
    assert!(view.email_addresses[0].primary);
    assert!(!view.email_addresses[0].confirmed);
    assert_eq!(view.phone_numbers.len(), 1);
    assert_eq!(view.phone_numbers[0].number, "+15551234567");
}

#[tokio::test]
async fn should_reject_create_when_email_address_is_claimed() {
    let registry = registry();
    create_account(&registry, "taken@example.com").await;

    let result = registry
        .create_account(account_input(Some("carol"), "TAKEN@example.com"))
        .await;
    assert!(
        matches!(result, Err(AccountsServiceError::AlreadyRegisteredByDifferentAccount)),
        "expected AlreadyRegisteredByDifferentAccount, got {result:?}"
    );
    assert_eq!(registry.coordinator.snapshot().await.accounts.len(), 1);
}

#[tokio::test]
async fn should_reject_create_when_phone_number_is_claimed() {
    let registry = registry();
    registry
        .create_account(CreateAccountInput {
            username: None,
            email_address: "first@example.com".into(),
            phone_number: Some("+15551234567".into()),
        })
        .await
        .unwrap();

    let result = registry
        .create_account(CreateAccountInput {
            username: None,
            email_address: "second@example.com".into(),
            phone_number: Some("555-123-4567".into()),
        })
        .await;
    assert!(matches!(
        result,
        Err(AccountsServiceError::AlreadyRegisteredByDifferentAccount)
    ));
    let state = registry.coordinator.snapshot().await;
    assert_eq!(state.accounts.len(), 1);
    assert!(state.active_email("second@example.com").is_none());
}

#[tokio::test]
async fn should_reject_create_when_username_is_taken() {
    let registry = registry();
    registry
        .create_account(account_input(Some("bob"), "bob@example.com"))
        .await
        .unwrap();

    let result = registry
        .create_account(account_input(Some("bob"), "robert@example.com"))
        .await;
    assert!(matches!(result, Err(AccountsServiceError::UsernameAlreadyTaken)));
}

#[tokio::test]
async fn should_reject_create_with_invalid_email_address() {
    let registry = registry();
    let result = registry
        .create_account(account_input(None, "not-an-email"))
        .await;
    assert!(matches!(result, Err(AccountsServiceError::InvalidFormat(_))));
    assert!(registry.coordinator.snapshot().await.accounts.is_empty());
}

#[tokio::test]
async fn should_reject_create_with_short_username() {
    let registry = registry();
    let result = registry
        .create_account(account_input(Some("ab"), "ab@example.com"))
        .await;
    assert!(matches!(result, Err(AccountsServiceError::InvalidInput(_))));
}

// ── GetAccount ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_look_up_account_by_phone_number() {
    let registry = registry();
    let account_id = create_account(&registry, "dana@example.com").await;
    let phone = registry
        .register_phone_number(account_id, "+1 555 987 6543")
        .await
        .unwrap();

    let view = registry
        .get_account(AccountLookup::PhoneNumber(phone.id))
        .await
        .unwrap();
    assert_eq!(view.account.id, account_id);
    assert_eq!(view.email_addresses[0].address, "dana@example.com");
}

#[tokio::test]
async fn should_report_unknown_lookup_identifier() {
    let registry = registry();
    let result = registry
        .get_account(AccountLookup::EmailAddress(EmailAddressId::generate()))
        .await;
    assert!(matches!(result, Err(AccountsServiceError::EmailAddressNotFound)));

    let result = registry
        .get_account(AccountLookup::PhoneNumber(PhoneNumberId::generate()))
        .await;
    assert!(matches!(result, Err(AccountsServiceError::PhoneNumberNotFound)));
}

#[tokio::test]
async fn should_cap_identifiers_in_account_view() {
    let registry = registry();
    let account_id = create_account(&registry, "many@example.com").await;
    for i in 0..25 {
        registry
            .register_email_address(account_id, &format!("alias{i}@example.com"))
            .await
            .unwrap();
    }

    let primary = primary_email_id(&registry, account_id).await;
    let view = registry
        .get_account(AccountLookup::EmailAddress(primary))
        .await
        .unwrap();
    assert_eq!(view.email_addresses.len() as u64, ACCOUNT_IDENTIFIER_CAP);
}

// ── GetAccounts ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_require_cursor_request_for_account_listing() {
    let registry = registry();
    let result = registry.get_accounts(None).await;
    assert!(matches!(result, Err(AccountsServiceError::NilCursorRequest)));
}

#[tokio::test]
async fn should_list_accounts_with_default_page_size() {
    let registry = registry();
    for i in 0..7 {
        create_account(&registry, &format!("user{i}@example.com")).await;
    }

    let page = registry
        .get_accounts(Some(CursorRequest::default()))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 5);
    assert_eq!(page.next_cursor, page.items.last().map(|a| a.id.0));
}

// ── UpdateUsername ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_update_username() {
    let registry = registry();
    let account_id = create_account(&registry, "erin@example.com").await;

    registry.update_username(account_id, "  erin  ").await.unwrap();

    let state = registry.coordinator.snapshot().await;
    assert_eq!(state.accounts[&account_id.0].username.as_deref(), Some("erin"));
}

#[tokio::test]
async fn should_accept_username_already_held_by_same_account() {
    let registry = registry();
    let account_id = registry
        .create_account(account_input(Some("frank"), "frank@example.com"))
        .await
        .unwrap();
    let before = registry.coordinator.snapshot().await.accounts[&account_id.0].clone();

    registry.update_username(account_id, "frank").await.unwrap();

    let after = registry.coordinator.snapshot().await.accounts[&account_id.0].clone();
    assert_eq!(before, after);
}

#[tokio::test]
async fn should_reject_username_held_by_another_account() {
    let registry = registry();
    registry
        .create_account(account_input(Some("grace"), "grace@example.com"))
        .await
        .unwrap();
    let other = create_account(&registry, "heidi@example.com").await;

    let result = registry.update_username(other, "grace").await;
    assert!(matches!(result, Err(AccountsServiceError::UsernameAlreadyTaken)));
}

#[tokio::test]
async fn should_report_missing_account_on_username_update() {
    let registry = registry();
    let result = registry
        .update_username(AccountId::generate(), "nobody")
        .await;
    assert!(matches!(result, Err(AccountsServiceError::AccountNotFound)));
}

// ── SetCurrentPassword ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_set_current_password() {
    let registry = registry();
    let account_id = create_account(&registry, "ivan@example.com").await;

    registry
        .set_current_password(account_id, "pw-0001")
        .await
        .unwrap();

    let state = registry.coordinator.snapshot().await;
    assert_eq!(
        state.accounts[&account_id.0].current_password_id.as_deref(),
        Some("pw-0001")
    );
}

#[tokio::test]
async fn should_reject_empty_current_password() {
    let registry = registry();
    let account_id = create_account(&registry, "judy@example.com").await;

    let result = registry.set_current_password(account_id, "   ").await;
    assert!(matches!(result, Err(AccountsServiceError::InvalidInput(_))));
}
