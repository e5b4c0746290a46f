mod common;

use anyhow::Result;
use common::{StandardAccounts, balance_of, memory_service, test_service, total_balance};
use teller::application::{AppError, ServiceConfig};
use teller::domain::{BalanceUpdate, OverdraftPolicy};
use teller::storage::AccountStore;

#[tokio::test]
async fn test_transfer_moves_amount() -> Result<()> {
    let (service, _temp) = test_service(ServiceConfig::default()).await?;
    let (from, to) = StandardAccounts::create_pair(&service).await?;
    assert_eq!((from.id, to.id), (1, 2));

    let receipt = service.transfer(1, 2, 50000).await?;

    assert_eq!(balance_of(&service, 1).await?, 50000);
    assert_eq!(balance_of(&service, 2).await?, 100000);
    assert_eq!(receipt.from_balance, 50000);
    assert_eq!(receipt.to_balance, 100000);
    assert_eq!(receipt.from_name, "Akshat");
    assert_eq!(receipt.to_name, "Riya");

    Ok(())
}

#[tokio::test]
async fn test_transfer_conserves_sum() -> Result<()> {
    let (service, _temp) = test_service(ServiceConfig::default()).await?;
    StandardAccounts::create_pair(&service).await?;
    let before = total_balance(&service).await?;

    for (from, to, amount) in [(1, 2, 1), (2, 1, 12345), (1, 2, 99999), (2, 1, 7)] {
        service.transfer(from, to, amount).await?;
    }

    assert_eq!(total_balance(&service).await?, before);
    Ok(())
}

#[tokio::test]
async fn test_transfer_rejects_non_positive_amount() -> Result<()> {
    let (service, _temp) = test_service(ServiceConfig::default()).await?;
    StandardAccounts::create_pair(&service).await?;

    for amount in [-500, 0] {
        let err = service.transfer(1, 2, amount).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)), "{:?}", err);
    }

    assert_eq!(balance_of(&service, 1).await?, 100000);
    assert_eq!(balance_of(&service, 2).await?, 50000);
    Ok(())
}

#[tokio::test]
async fn test_transfer_rejects_same_account() -> Result<()> {
    let (service, _temp) = test_service(ServiceConfig::default()).await?;
    StandardAccounts::create_pair(&service).await?;

    let err = service.transfer(1, 1, 100).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));
    assert_eq!(balance_of(&service, 1).await?, 100000);
    Ok(())
}

#[tokio::test]
async fn test_transfer_to_missing_account() -> Result<()> {
    let (service, _temp) = test_service(ServiceConfig::default()).await?;
    StandardAccounts::create_pair(&service).await?;

    let err = service.transfer(1, 3, 10000).await.unwrap_err();
    assert!(matches!(err, AppError::AccountNotFound(3)));
    assert_eq!(balance_of(&service, 1).await?, 100000);

    let err = service.transfer(3, 2, 10000).await.unwrap_err();
    assert!(matches!(err, AppError::AccountNotFound(3)));
    assert_eq!(balance_of(&service, 2).await?, 50000);
    Ok(())
}

#[tokio::test]
async fn test_transfer_may_overdraw_by_default() -> Result<()> {
    let (service, _temp) = test_service(ServiceConfig::default()).await?;
    StandardAccounts::create_pair(&service).await?;

    service.transfer(2, 1, 80000).await?;

    assert_eq!(balance_of(&service, 2).await?, -30000);
    assert_eq!(balance_of(&service, 1).await?, 180000);
    Ok(())
}

#[tokio::test]
async fn test_reject_overdraft_policy() -> Result<()> {
    let config = ServiceConfig::default().with_overdraft(OverdraftPolicy::Reject);
    let (service, _temp) = test_service(config).await?;
    StandardAccounts::create_pair(&service).await?;

    let err = service.transfer(2, 1, 50001).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::InsufficientFunds {
            account_id: 2,
            balance: 50000,
            required: 50001
        }
    ));
    assert_eq!(balance_of(&service, 1).await?, 100000);
    assert_eq!(balance_of(&service, 2).await?, 50000);

    // Draining to exactly zero is allowed
    service.transfer(2, 1, 50000).await?;
    assert_eq!(balance_of(&service, 2).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_transfer_overflow_is_rejected() -> Result<()> {
    let (service, _temp) = test_service(ServiceConfig::default()).await?;
    service.open_account("Full", i64::MAX).await?;
    service.open_account("Donor", 100).await?;

    let err = service.transfer(2, 1, 1).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));
    assert_eq!(balance_of(&service, 1).await?, i64::MAX);
    assert_eq!(balance_of(&service, 2).await?, 100);
    Ok(())
}

#[tokio::test]
async fn test_transfer_params_parse_strings() -> Result<()> {
    let (service, _temp) = test_service(ServiceConfig::default()).await?;
    StandardAccounts::create_pair(&service).await?;

    service.transfer_params("1", "2", "500").await?;
    assert_eq!(balance_of(&service, 1).await?, 50000);
    assert_eq!(balance_of(&service, 2).await?, 100000);

    let err = service.transfer_params("1", "2", "-5").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));

    let err = service
        .transfer_params("1; DROP TABLE accounts", "2", "1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));

    assert_eq!(service.list_accounts().await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_open_account_requires_name() -> Result<()> {
    let (service, _temp) = test_service(ServiceConfig::default()).await?;
    let err = service.open_account("   ", 0).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));
    assert!(service.list_accounts().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_sqlite_update_balance() -> Result<()> {
    let (service, _temp) = test_service(ServiceConfig::default()).await?;
    StandardAccounts::create_pair(&service).await?;

    service.store().update_balance(2, 123).await?;
    assert_eq!(balance_of(&service, 2).await?, 123);
    assert_eq!(balance_of(&service, 1).await?, 100000);

    let err = service.store().update_balance(9, 1).await.unwrap_err();
    assert!(matches!(err, AppError::AccountNotFound(9)));
    Ok(())
}

#[tokio::test]
async fn test_sqlite_apply_balances_rolls_back() -> Result<()> {
    let (service, _temp) = test_service(ServiceConfig::default()).await?;
    StandardAccounts::create_pair(&service).await?;

    let err = service
        .store()
        .apply_balances(&[BalanceUpdate::new(1, 0), BalanceUpdate::new(7, 100000)])
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::AccountNotFound(7)));
    assert_eq!(balance_of(&service, 1).await?, 100000);
    Ok(())
}

#[tokio::test]
async fn test_memory_store_matches_sqlite_semantics() -> Result<()> {
    let service = memory_service(ServiceConfig::default());
    StandardAccounts::create_pair(&service).await?;

    service.transfer(1, 2, 50000).await?;
    assert_eq!(balance_of(&service, 1).await?, 50000);
    assert_eq!(balance_of(&service, 2).await?, 100000);

    let err = service.transfer(1, 3, 10000).await.unwrap_err();
    assert!(matches!(err, AppError::AccountNotFound(3)));
    assert_eq!(balance_of(&service, 1).await?, 50000);
    Ok(())
}
