use serde::{Deserialize, Serialize};

use super::Cents;

/// Store-assigned account identifier.
pub type AccountId = i64;

/// A balance-holding record. Balances are signed: nothing in the model
/// forbids an account from going below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub balance: Cents,
}

/// A replacement balance for one account, applied as part of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceUpdate {
    pub id: AccountId,
    pub balance: Cents,
}

impl BalanceUpdate {
    pub fn new(id: AccountId, balance: Cents) -> Self {
        Self { id, balance }
    }
}
