use async_trait::async_trait;

use crate::application::AppError;
use crate::domain::{Account, AccountId, BalanceUpdate, Cents};

/// Durable lookup and update of account balances, one record per id.
///
/// Any persistence backend satisfying these semantics can sit behind the
/// transfer service: SQLite, an in-memory map, or something external.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Create an account with an opening balance. The store assigns the id.
    async fn create(&self, name: &str, balance: Cents) -> Result<Account, AppError>;

    /// Fetch one account, or `AccountNotFound`.
    async fn get(&self, id: AccountId) -> Result<Account, AppError>;

    /// All accounts, ordered by id.
    async fn list(&self) -> Result<Vec<Account>, AppError>;

    /// Replace the stored balance of a single account.
    async fn update_balance(&self, id: AccountId, balance: Cents) -> Result<(), AppError>;

    /// Replace several balances as one all-or-nothing unit.
    ///
    /// If any id is missing the call fails with `AccountNotFound` and no
    /// balance is changed.
    async fn apply_balances(&self, updates: &[BalanceUpdate]) -> Result<(), AppError>;
}
