use thiserror::Error;

use crate::domain::{AccountId, Cents, EmployeeId, StudentId};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Employee not found: {0}")]
    EmployeeNotFound(EmployeeId),

    #[error("Student not found: {0}")]
    StudentNotFound(StudentId),

    #[error("Insufficient funds in account {account_id}: balance {balance}, required {required}")]
    InsufficientFunds {
        account_id: AccountId,
        balance: Cents,
        required: Cents,
    },

    #[error("Conflict or timeout: {0}")]
    ConflictOrTimeout(String),

    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Store unavailable: {0:#}")]
    StoreUnavailable(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidArgument(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::AccountNotFound(_)
                | AppError::EmployeeNotFound(_)
                | AppError::StudentNotFound(_)
        )
    }

    /// Classify a sqlx failure. Lock contention and pool exhaustion are
    /// conflicts; everything else means the store cannot serve the request.
    pub fn from_sqlx(err: sqlx::Error, context: &'static str) -> Self {
        let conflict = match &err {
            sqlx::Error::PoolTimedOut => Some("connection pool timed out".to_string()),
            sqlx::Error::Database(db) if is_busy_code(db.code().as_deref()) => {
                Some(db.message().to_string())
            }
            _ => None,
        };

        match conflict {
            Some(reason) => AppError::ConflictOrTimeout(format!("{}: {}", context, reason)),
            None => AppError::StoreUnavailable(anyhow::Error::new(err).context(context)),
        }
    }
}

/// SQLITE_BUSY (5) and SQLITE_LOCKED (6), including their extended codes.
fn is_busy_code(code: Option<&str>) -> bool {
    code.and_then(|c| c.parse::<i32>().ok())
        .map(|c| matches!(c & 0xff, 5 | 6))
        .unwrap_or(false)
}
