use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use tessera_accounts::domain::repository::{
    AccountOps, EmailOps, PhoneOps, Transaction, TransactionCoordinator,
};
use tessera_accounts::domain::types::{Account, EmailAddress, PhoneNumber};
use tessera_accounts::error::AccountsServiceError;
use tessera_accounts::state::AppState;
use tessera_accounts::usecase::Registry;
use tessera_accounts::usecase::account::CreateAccountInput;
use tessera_domain::id::{AccountId, EmailAddressId, PhoneNumberId};
use tessera_domain::pagination::{CursorRequest, Sort, SortField};

type Result<T> = std::result::Result<T, AccountsServiceError>;

// ── MemoryState ──────────────────────────────────────────────────────────────

/// Rows keyed by ID, soft-deleted rows included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryState {
    pub accounts: BTreeMap<Uuid, Account>,
    pub email_addresses: BTreeMap<Uuid, EmailAddress>,
    pub phone_numbers: BTreeMap<Uuid, PhoneNumber>,
}

impl MemoryState {
    pub fn active_email(&self, address: &str) -> Option<&EmailAddress> {
        self.email_addresses
            .values()
            .find(|e| e.is_active() && e.address == address)
    }

    pub fn active_primary(&self, account_id: AccountId) -> Option<&EmailAddress> {
        self.email_addresses
            .values()
            .find(|e| e.is_active() && e.primary && e.account_id == account_id)
    }

    pub fn active_phone(&self, number: &str) -> Option<&PhoneNumber> {
        self.phone_numbers
            .values()
            .find(|p| p.is_active() && p.number == number)
    }
}

// ── MemoryCoordinator ────────────────────────────────────────────────────────

/// Serializes transactions behind one lock and enforces the same uniqueness
/// rules as the partial unique indexes.
#[derive(Clone, Default)]
pub struct MemoryCoordinator {
    shared: Arc<tokio::sync::Mutex<MemoryState>>,
}

impl MemoryCoordinator {
    pub async fn snapshot(&self) -> MemoryState {
        self.shared.lock().await.clone()
    }

    /// Insert rows directly, bypassing the registry.
    pub async fn seed(&self, f: impl FnOnce(&mut MemoryState)) {
        f(&mut *self.shared.lock().await);
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: Mutex<MemoryState>,
}

impl MemoryTx {
    fn read<T>(&self, f: impl FnOnce(&MemoryState) -> T) -> T {
        f(&self.working.lock().unwrap())
    }

    fn write<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> T {
        f(&mut self.working.lock().unwrap())
    }
}

impl TransactionCoordinator for MemoryCoordinator {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx> {
        let guard = Arc::clone(&self.shared).lock_owned().await;
        let working = Mutex::new(guard.clone());
        Ok(MemoryTx { guard, working })
    }
}

impl Transaction for MemoryTx {
    async fn commit(self) -> Result<()> {
        let mut guard = self.guard;
        *guard = self.working.into_inner().unwrap();
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

// ── Ordering ─────────────────────────────────────────────────────────────────

trait Row: Clone {
    fn id(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;
    fn last_modified_at(&self) -> DateTime<Utc>;
}

impl Row for Account {
    fn id(&self) -> Uuid {
        self.id.0
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn last_modified_at(&self) -> DateTime<Utc> {
        self.last_modified_at
    }
}

impl Row for EmailAddress {
    fn id(&self) -> Uuid {
        self.id.0
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn last_modified_at(&self) -> DateTime<Utc> {
        self.last_modified_at
    }
}

impl Row for PhoneNumber {
    fn id(&self) -> Uuid {
        self.id.0
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn last_modified_at(&self) -> DateTime<Utc> {
        self.last_modified_at
    }
}

fn paginate<'a, T: Row + 'a>(
    rows: impl Iterator<Item = &'a T>,
    request: &CursorRequest,
) -> Vec<T> {
    let mut rows: Vec<T> = rows
        .filter(|r| request.cursor.is_none_or(|c| r.id() > c))
        .cloned()
        .collect();
    rows.sort_by(|a, b| {
        request
            .sort_clauses
            .iter()
            .map(|clause| {
                let ord = match clause.field {
                    SortField::Id => a.id().cmp(&b.id()),
                    SortField::CreatedAt => a.created_at().cmp(&b.created_at()),
                    SortField::LastModifiedAt => a.last_modified_at().cmp(&b.last_modified_at()),
                };
                match clause.sort {
                    Sort::Asc => ord,
                    Sort::Desc => ord.reverse(),
                }
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
    rows.truncate(request.count as usize);
    rows
}

// ── Accounts ─────────────────────────────────────────────────────────────────

impl AccountOps for MemoryTx {
    async fn find_account(&self, id: AccountId) -> Result<Option<Account>> {
        Ok(self.read(|s| {
            s.accounts
                .get(&id.0)
                .filter(|a| a.is_active())
                .cloned()
        }))
    }

    async fn find_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        Ok(self.read(|s| {
            s.accounts
                .values()
                .find(|a| a.is_active() && a.username.as_deref() == Some(username))
                .cloned()
        }))
    }

    async fn insert_account(&self, account: &Account) -> Result<()> {
        self.write(|s| {
            s.accounts.insert(account.id.0, account.clone());
        });
        Ok(())
    }

    async fn update_account(&self, account: &Account) -> Result<()> {
        self.write(|s| {
            let taken = account.username.as_deref().is_some_and(|name| {
                s.accounts.values().any(|a| {
                    a.id != account.id && a.is_active() && a.username.as_deref() == Some(name)
                })
            });
            if taken {
                return Err(AccountsServiceError::UsernameAlreadyTaken);
            }
            let row = s
                .accounts
                .get_mut(&account.id.0)
                .ok_or(AccountsServiceError::AccountNotFound)?;
            row.username = account.username.clone();
            row.current_password_id = account.current_password_id.clone();
            row.primary_email_address_id = account.primary_email_address_id;
            row.last_modified_at = account.last_modified_at;
            Ok(())
        })
    }

    async fn list_accounts(&self, request: &CursorRequest) -> Result<Vec<Account>> {
        Ok(self.read(|s| {
            paginate(
                s.accounts.values().filter(|a| a.is_active()),
                request,
            )
        }))
    }
}

// ── Email addresses ──────────────────────────────────────────────────────────

impl EmailOps for MemoryTx {
    async fn find_email_address(&self, id: EmailAddressId) -> Result<Option<EmailAddress>> {
        Ok(self.read(|s| {
            s.email_addresses
                .get(&id.0)
                .filter(|e| e.is_active())
                .cloned()
        }))
    }

    async fn find_email_address_by_address(&self, address: &str) -> Result<Option<EmailAddress>> {
        Ok(self.read(|s| s.active_email(address).cloned()))
    }

    async fn count_email_addresses_for_account(&self, account_id: AccountId) -> Result<u64> {
        Ok(self.read(|s| {
            s.email_addresses
                .values()
                .filter(|e| e.is_active() && e.account_id == account_id)
                .count() as u64
        }))
    }

    async fn insert_email_address(&self, email: &EmailAddress) -> Result<()> {
        self.write(|s| {
            if s.active_email(&email.address).is_some() {
                return Err(AccountsServiceError::AlreadyRegisteredByDifferentAccount);
            }
            if email.primary && s.active_primary(email.account_id).is_some() {
                return Err(AccountsServiceError::ConcurrentModification);
            }
            s.email_addresses.insert(email.id.0, email.clone());
            Ok(())
        })
    }

    async fn mark_email_address_confirmed(
        &self,
        id: EmailAddressId,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.write(|s| {
            if let Some(e) = s.email_addresses.get_mut(&id.0) {
                e.confirmed = true;
                e.last_modified_at = at;
            }
        });
        Ok(())
    }

    async fn set_email_address_primary(
        &self,
        id: EmailAddressId,
        primary: bool,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.write(|s| {
            let account_id = match s.email_addresses.get(&id.0) {
                Some(e) => e.account_id,
                None => return Ok(()),
            };
            let clash = primary
                && s.active_primary(account_id)
                    .is_some_and(|current| current.id != id);
            if clash {
                return Err(AccountsServiceError::ConcurrentModification);
            }
            if let Some(e) = s.email_addresses.get_mut(&id.0) {
                e.primary = primary;
                e.last_modified_at = at;
            }
            Ok(())
        })
    }

    async fn soft_delete_email_address(&self, id: EmailAddressId, at: DateTime<Utc>) -> Result<()> {
        self.write(|s| {
            if let Some(e) = s.email_addresses.get_mut(&id.0) {
                e.deleted_at = Some(at);
                e.last_modified_at = at;
            }
        });
        Ok(())
    }

    async fn list_email_addresses(&self, request: &CursorRequest) -> Result<Vec<EmailAddress>> {
        Ok(self.read(|s| {
            paginate(
                s.email_addresses.values().filter(|e| e.is_active()),
                request,
            )
        }))
    }

    async fn list_confirmed_email_addresses_for_account(
        &self,
        account_id: AccountId,
        request: &CursorRequest,
    ) -> Result<Vec<EmailAddress>> {
        Ok(self.read(|s| {
            paginate(
                s.email_addresses.values().filter(|e| {
                    e.is_active() && e.confirmed && e.account_id == account_id
                }),
                request,
            )
        }))
    }

    async fn list_email_addresses_for_account(
        &self,
        account_id: AccountId,
        limit: u64,
    ) -> Result<Vec<EmailAddress>> {
        Ok(self.read(|s| {
            s.email_addresses
                .values()
                .filter(|e| e.is_active() && e.account_id == account_id)
                .take(limit as usize)
                .cloned()
                .collect()
        }))
    }
}

// ── Phone numbers ────────────────────────────────────────────────────────────

impl PhoneOps for MemoryTx {
    async fn find_phone_number(&self, id: PhoneNumberId) -> Result<Option<PhoneNumber>> {
        Ok(self.read(|s| {
            s.phone_numbers
                .get(&id.0)
                .filter(|p| p.is_active())
                .cloned()
        }))
    }

    async fn find_phone_number_by_number(&self, number: &str) -> Result<Option<PhoneNumber>> {
        Ok(self.read(|s| s.active_phone(number).cloned()))
    }

    async fn insert_phone_number(&self, phone: &PhoneNumber) -> Result<()> {
        self.write(|s| {
            if s.active_phone(&phone.number).is_some() {
                return Err(AccountsServiceError::AlreadyRegisteredByDifferentAccount);
            }
            s.phone_numbers.insert(phone.id.0, phone.clone());
            Ok(())
        })
    }

    async fn mark_phone_number_confirmed(
        &self,
        id: PhoneNumberId,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.write(|s| {
            if let Some(p) = s.phone_numbers.get_mut(&id.0) {
                p.confirmed = true;
                p.last_modified_at = at;
            }
        });
        Ok(())
    }

    async fn soft_delete_phone_number(&self, id: PhoneNumberId, at: DateTime<Utc>) -> Result<()> {
        self.write(|s| {
            if let Some(p) = s.phone_numbers.get_mut(&id.0) {
                p.deleted_at = Some(at);
                p.last_modified_at = at;
            }
        });
        Ok(())
    }

    async fn list_phone_numbers(&self, request: &CursorRequest) -> Result<Vec<PhoneNumber>> {
        Ok(self.read(|s| {
            paginate(
                s.phone_numbers.values().filter(|p| p.is_active()),
                request,
            )
        }))
    }

    async fn list_confirmed_phone_numbers_for_account(
        &self,
        account_id: AccountId,
        request: &CursorRequest,
    ) -> Result<Vec<PhoneNumber>> {
        Ok(self.read(|s| {
            paginate(
                s.phone_numbers.values().filter(|p| {
                    p.is_active() && p.confirmed && p.account_id == account_id
                }),
                request,
            )
        }))
    }

    async fn list_phone_numbers_for_account(
        &self,
        account_id: AccountId,
        limit: u64,
    ) -> Result<Vec<PhoneNumber>> {
        Ok(self.read(|s| {
            s.phone_numbers
                .values()
                .filter(|p| p.is_active() && p.account_id == account_id)
                .take(limit as usize)
                .cloned()
                .collect()
        }))
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn registry() -> Arc<Registry<MemoryCoordinator>> {
    Arc::new(Registry::new(MemoryCoordinator::default()))
}

pub fn app_state(registry: &Arc<Registry<MemoryCoordinator>>) -> AppState<MemoryCoordinator> {
    AppState::new(Arc::clone(registry))
}

pub fn account_input(username: Option<&str>, email_address: &str) -> CreateAccountInput {
    CreateAccountInput {
        username: username.map(str::to_owned),
        email_address: email_address.to_owned(),
        phone_number: None,
    }
}

/// Create an account holding `email_address` as its primary address.
pub async fn create_account(
    registry: &Registry<MemoryCoordinator>,
    email_address: &str,
) -> AccountId {
    registry
        .create_account(account_input(None, email_address))
        .await
        .unwrap()
}

/// The account's current primary email address ID.
pub async fn primary_email_id(
    registry: &Registry<MemoryCoordinator>,
    account_id: AccountId,
) -> EmailAddressId {
    let state = registry.coordinator.snapshot().await;
    state.accounts[&account_id.0]
        .primary_email_address_id
        .unwrap()
}
