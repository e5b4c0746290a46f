use serde::{Deserialize, Serialize};

use super::{Account, AccountId, BalanceUpdate, Cents};

/// A request to move `amount` cents from one account to another.
/// Constructed per call and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Cents,
}

/// Why a transfer request is rejected before any account is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    SameAccount,
    NonPositiveAmount,
}

impl TransferRequest {
    pub fn new(from: AccountId, to: AccountId, amount: Cents) -> Self {
        Self { from, to, amount }
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        if self.from == self.to {
            return Err(RequestError::SameAccount);
        }
        if self.amount <= 0 {
            return Err(RequestError::NonPositiveAmount);
        }
        Ok(())
    }

    /// Both ids, lowest first. Locks must be taken in this order.
    pub fn lock_order(&self) -> (AccountId, AccountId) {
        if self.from < self.to {
            (self.from, self.to)
        } else {
            (self.to, self.from)
        }
    }

    /// Compute the post-transfer balances of `from` and `to`.
    /// Returns `None` if either side would overflow.
    pub fn apply(&self, from: &Account, to: &Account) -> Option<(BalanceUpdate, BalanceUpdate)> {
        let debited = from.balance.checked_sub(self.amount)?;
        let credited = to.balance.checked_add(self.amount)?;
        Some((
            BalanceUpdate::new(from.id, debited),
            BalanceUpdate::new(to.id, credited),
        ))
    }
}

/// What the service does when a debit would leave the source below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverdraftPolicy {
    /// Negative balances are allowed; no sufficiency check is made.
    #[default]
    Allow,
    /// A debit that would take the balance below zero is rejected.
    Reject,
}

impl OverdraftPolicy {
    /// Returns true if `resulting` is an acceptable balance for the source account.
    pub fn permits(&self, resulting: Cents) -> bool {
        match self {
            OverdraftPolicy::Allow => true,
            OverdraftPolicy::Reject => resulting >= 0,
        }
    }
}

/// Outcome of a committed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    pub from: AccountId,
    pub to: AccountId,
    pub from_name: String,
    pub to_name: String,
    pub amount: Cents,
    pub from_balance: Cents,
    pub to_balance: Cents,
}
