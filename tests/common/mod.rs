// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use std::time::Duration;
use teller::application::{RecordsService, ServiceConfig, TransferService};
use teller::domain::{Account, Cents};
use teller::storage::{AccountStore, MemoryStore, Repository};
use tempfile::TempDir;

/// Helper to create a migrated repository in a temporary directory
pub async fn test_repo() -> Result<(Repository, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let repo = Repository::init_path(db_path.to_str().unwrap(), Duration::from_secs(10)).await?;
    Ok((repo, temp_dir))
}

/// Helper to create a transfer service over a temporary SQLite database
pub async fn test_service(config: ServiceConfig) -> Result<(TransferService<Repository>, TempDir)> {
    let (repo, temp_dir) = test_repo().await?;
    Ok((TransferService::new(repo, config), temp_dir))
}

/// Helper to create a records service over a temporary SQLite database
pub async fn test_records() -> Result<(RecordsService, TempDir)> {
    let (repo, temp_dir) = test_repo().await?;
    Ok((RecordsService::new(repo), temp_dir))
}

pub fn memory_service(config: ServiceConfig) -> TransferService<MemoryStore> {
    TransferService::new(MemoryStore::new(), config)
}

/// Test fixture: the two seeded accounts from the transfer demo
pub struct StandardAccounts;

impl StandardAccounts {
    /// Account 1 with 1000.00 and account 2 with 500.00
    pub async fn create_pair<S: AccountStore>(
        service: &TransferService<S>,
    ) -> Result<(Account, Account)> {
        let first = service.open_account("Akshat", 100000).await?;
        let second = service.open_account("Riya", 50000).await?;
        Ok((first, second))
    }

    /// `count` accounts, each opened with `balance`
    pub async fn create_many<S: AccountStore>(
        service: &TransferService<S>,
        count: usize,
        balance: Cents,
    ) -> Result<Vec<Account>> {
        let mut accounts = Vec::with_capacity(count);
        for i in 0..count {
            accounts.push(service.open_account(&format!("acct-{}", i), balance).await?);
        }
        Ok(accounts)
    }
}

/// Sum of all balances, widened so overflow cannot mask a lost update
pub async fn total_balance<S: AccountStore>(service: &TransferService<S>) -> Result<i128> {
    Ok(service
        .list_accounts()
        .await?
        .iter()
        .map(|account| i128::from(account.balance))
        .sum())
}

pub async fn balance_of<S: AccountStore>(service: &TransferService<S>, id: i64) -> Result<Cents> {
    Ok(service.get_account(id).await?.balance)
}
