use std::sync::Arc;

use crate::domain::{
    Account, AccountId, Cents, RequestError, TransferReceipt, TransferRequest,
};
use crate::storage::AccountStore;

use super::locks::AccountLocks;
use super::params::{parse_amount, parse_id};
use super::{AppError, ServiceConfig};

/// Moves money between accounts of an [`AccountStore`] as one atomic unit.
///
/// Concurrent transfers that share an account are serialized through
/// per-account locks taken in ascending id order; the two balance writes go
/// to the store as a single all-or-nothing batch. Cloning is cheap and
/// clones share both the store and the lock table.
pub struct TransferService<S> {
    store: Arc<S>,
    locks: Arc<AccountLocks>,
    config: ServiceConfig,
}

impl<S> Clone for TransferService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            locks: Arc::clone(&self.locks),
            config: self.config,
        }
    }
}

impl<S: AccountStore> TransferService<S> {
    /// Create a transfer service owning the given store.
    pub fn new(store: S, config: ServiceConfig) -> Self {
        Self::with_shared_store(Arc::new(store), config)
    }

    /// Create a transfer service over a store that is also used elsewhere.
    ///
    /// Only transfers issued through this service (and its clones) are
    /// serialized against each other.
    pub fn with_shared_store(store: Arc<S>, config: ServiceConfig) -> Self {
        Self {
            store,
            locks: Arc::new(AccountLocks::new()),
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // ========================
    // Account operations
    // ========================

    /// Open an account with an opening balance.
    pub async fn open_account(&self, name: &str, balance: Cents) -> Result<Account, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::invalid("account name must not be empty"));
        }
        self.store.create(name, balance).await
    }

    pub async fn get_account(&self, id: AccountId) -> Result<Account, AppError> {
        self.store.get(id).await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        self.store.list().await
    }

    // ========================
    // Transfer operations
    // ========================

    /// Move `amount` cents from `from` to `to`.
    ///
    /// On any error the store is left exactly as it was before the call.
    pub async fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Cents,
    ) -> Result<TransferReceipt, AppError> {
        let request = TransferRequest::new(from, to, amount);
        request.validate().map_err(|e| match e {
            RequestError::SameAccount => {
                AppError::invalid("source and destination accounts must differ")
            }
            RequestError::NonPositiveAmount => {
                AppError::invalid(format!("amount must be positive, got {}", amount))
            }
        })?;

        let (low, high) = request.lock_order();
        let _guard = self
            .locks
            .lock_pair_within(low, high, self.config.lock_timeout)
            .await?;

        let source = self.store.get(from).await?;
        let target = self.store.get(to).await?;

        let (debit, credit) = request
            .apply(&source, &target)
            .ok_or_else(|| AppError::invalid("transfer would overflow an account balance"))?;

        if !self.config.overdraft.permits(debit.balance) {
            return Err(AppError::InsufficientFunds {
                account_id: from,
                balance: source.balance,
                required: amount,
            });
        }

        self.store.apply_balances(&[debit, credit]).await?;

        Ok(TransferReceipt {
            from,
            to,
            from_name: source.name,
            to_name: target.name,
            amount,
            from_balance: debit.balance,
            to_balance: credit.balance,
        })
    }

    /// Transfer using raw string parameters as a dispatch layer delivers them.
    pub async fn transfer_params(
        &self,
        from: &str,
        to: &str,
        amount: &str,
    ) -> Result<TransferReceipt, AppError> {
        let from = parse_id("from", from)?;
        let to = parse_id("to", to)?;
        let amount = parse_amount("amount", amount)?;
        self.transfer(from, to, amount).await
    }
}
