use chrono::{DateTime, Utc};
use phonenumber::{Mode, country};
use uuid::Uuid;
use validator::ValidateEmail;

use tessera_domain::id::{AccountId, EmailAddressId, PhoneNumberId};
use tessera_domain::masking::{mask_email, mask_phone_number};
use tessera_domain::pagination::CursorKey;

use crate::error::AccountsServiceError;

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 25;

/// Upper bound on identifiers of each kind returned with an account view.
pub const ACCOUNT_IDENTIFIER_CAP: u64 = 20;

// ── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub username: Option<String>,
    pub current_password_id: Option<String>,
    pub primary_email_address_id: Option<EmailAddressId>,
}

impl Account {
    pub fn new(username: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: AccountId::generate(),
            created_at: now,
            last_modified_at: now,
            deleted_at: None,
            username,
            current_password_id: None,
            primary_email_address_id: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress {
    pub id: EmailAddressId,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub confirmed: bool,
    pub primary: bool,
    /// Normalized (trimmed, lower-cased) address.
    pub address: String,
    pub account_id: AccountId,
}

impl EmailAddress {
    pub fn new(account_id: AccountId, address: String, primary: bool, now: DateTime<Utc>) -> Self {
        Self {
            id: EmailAddressId::generate(),
            created_at: now,
            last_modified_at: now,
            deleted_at: None,
            confirmed: false,
            primary,
            address,
            account_id,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    pub fn masked(self) -> Self {
        Self {
            address: mask_email(&self.address),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber {
    pub id: PhoneNumberId,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub confirmed: bool,
    /// E.164 form.
    pub number: String,
    pub account_id: AccountId,
}

impl PhoneNumber {
    pub fn new(account_id: AccountId, number: String, now: DateTime<Utc>) -> Self {
        Self {
            id: PhoneNumberId::generate(),
            created_at: now,
            last_modified_at: now,
            deleted_at: None,
            confirmed: false,
            number,
            account_id,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    pub fn masked(self) -> Self {
        Self {
            number: mask_phone_number(&self.number),
            ..self
        }
    }
}

impl CursorKey for Account {
    fn cursor_key(&self) -> Uuid {
        self.id.0
    }
}

impl CursorKey for EmailAddress {
    fn cursor_key(&self) -> Uuid {
        self.id.0
    }
}

impl CursorKey for PhoneNumber {
    fn cursor_key(&self) -> Uuid {
        self.id.0
    }
}

/// An account together with its active identifiers, unmasked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountView {
    pub account: Account,
    pub email_addresses: Vec<EmailAddress>,
    pub phone_numbers: Vec<PhoneNumber>,
}

/// How an account is located for [`AccountView`] lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountLookup {
    EmailAddress(EmailAddressId),
    PhoneNumber(PhoneNumberId),
}

// ── Validation ──────────────────────────────────────────────────────────────

/// Trim a username and check its length in characters.
pub fn validate_username(username: &str) -> Result<String, AccountsServiceError> {
    let username = username.trim();
    let len = username.chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len) {
        return Err(AccountsServiceError::InvalidInput(format!(
            "username must be between {MIN_USERNAME_LENGTH} and {MAX_USERNAME_LENGTH} characters"
        )));
    }
    Ok(username.to_owned())
}

pub fn normalize_email_address(address: &str) -> Result<String, AccountsServiceError> {
    let normalized = address.trim().to_lowercase();
    if !normalized.validate_email() {
        return Err(AccountsServiceError::InvalidFormat(format!(
            "not an email address: {address}"
        )));
    }
    Ok(normalized)
}

/// Parse against the US numbering plan unless the number carries a `+` prefix.
/// Returns the E.164 form.
pub fn normalize_phone_number(number: &str) -> Result<String, AccountsServiceError> {
    let parsed = phonenumber::parse(Some(country::Id::US), number.trim()).map_err(|e| {
        AccountsServiceError::InvalidFormat(format!("not a phone number: {number} ({e})"))
    })?;
    Ok(parsed.format().mode(Mode::E164).to_string())
}
