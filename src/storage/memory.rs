use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::application::AppError;
use crate::domain::{Account, AccountId, BalanceUpdate, Cents};

use super::AccountStore;

/// In-process account store. Every mutation happens under one write lock,
/// so a batch is never observed half-applied.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    accounts: BTreeMap<AccountId, Account>,
    last_id: AccountId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of every balance held in the store.
    pub async fn total_balance(&self) -> i128 {
        let state = self.state.read().await;
        state
            .accounts
            .values()
            .map(|account| i128::from(account.balance))
            .sum()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create(&self, name: &str, balance: Cents) -> Result<Account, AppError> {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let account = Account {
            id: state.last_id,
            name: name.to_string(),
            balance,
        };
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get(&self, id: AccountId) -> Result<Account, AppError> {
        self.state
            .read()
            .await
            .accounts
            .get(&id)
            .cloned()
            .ok_or(AppError::AccountNotFound(id))
    }

    async fn list(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.state.read().await.accounts.values().cloned().collect())
    }

    async fn update_balance(&self, id: AccountId, balance: Cents) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        let account = state
            .accounts
            .get_mut(&id)
            .ok_or(AppError::AccountNotFound(id))?;
        account.balance = balance;
        Ok(())
    }

    async fn apply_balances(&self, updates: &[BalanceUpdate]) -> Result<(), AppError> {
        let mut state = self.state.write().await;

        // Check every target before writing any of them
        if let Some(missing) = updates
            .iter()
            .find(|update| !state.accounts.contains_key(&update.id))
        {
            return Err(AppError::AccountNotFound(missing.id));
        }

        for update in updates {
            if let Some(account) = state.accounts.get_mut(&update.id) {
                account.balance = update.balance;
            }
        }
        Ok(())
    }
}
