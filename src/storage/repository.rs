use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::time::Duration;

use crate::application::AppError;
use crate::domain::{
    Account, AccountId, AttendanceEntry, AttendanceStatus, BalanceUpdate, Cents, Employee,
    EmployeeId, Student, StudentId,
};

use super::{AccountStore, MIGRATION_001_INITIAL, StoreContext};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed store for accounts and the record tables.
///
/// Every statement binds its inputs; no caller-supplied text is ever
/// spliced into SQL.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL.
    ///
    /// `busy_timeout` bounds how long a writer waits on another connection's
    /// lock before the statement fails with SQLITE_BUSY.
    pub async fn connect(database_url: &str, busy_timeout: Duration) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        tracing::debug!(database_url, "Connected to database");
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        tracing::debug!("Migrations applied");
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(database_url: &str, busy_timeout: Duration) -> Result<Self> {
        let repo = Self::connect(database_url, busy_timeout).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Create (if missing) and migrate the database file at `path`.
    pub async fn init_path(path: &str, busy_timeout: Duration) -> Result<Self> {
        Self::init(&format!("sqlite:{}?mode=rwc", path), busy_timeout).await
    }

    /// Open an existing database file at `path`.
    pub async fn connect_path(path: &str, busy_timeout: Duration) -> Result<Self> {
        Self::connect(&format!("sqlite:{}", path), busy_timeout).await
    }

    // ========================
    // Employee operations
    // ========================

    /// Insert an employee under a caller-chosen id.
    pub async fn save_employee(&self, employee: &Employee) -> Result<(), AppError> {
        let result = sqlx::query("INSERT INTO employees (id, name, salary_cents) VALUES (?, ?, ?)")
            .bind(employee.id)
            .bind(&employee.name)
            .bind(employee.salary)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(AppError::invalid(
                format!("employee {} already exists", employee.id),
            )),
            Err(err) => Err(AppError::from_sqlx(err, "Failed to save employee")),
        }
    }

    pub async fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>, AppError> {
        let row = sqlx::query("SELECT id, name, salary_cents FROM employees WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .store_context("Failed to fetch employee")?;

        Ok(row.as_ref().map(Self::row_to_employee))
    }

    pub async fn list_employees(&self) -> Result<Vec<Employee>, AppError> {
        let rows = sqlx::query("SELECT id, name, salary_cents FROM employees ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .store_context("Failed to list employees")?;

        Ok(rows.iter().map(Self::row_to_employee).collect())
    }

    fn row_to_employee(row: &SqliteRow) -> Employee {
        Employee {
            id: row.get("id"),
            name: row.get("name"),
            salary: row.get("salary_cents"),
        }
    }

    // ========================
    // Attendance operations
    // ========================

    /// Record an attendance mark and return it with its assigned id.
    pub async fn save_attendance(
        &self,
        student_id: StudentId,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<AttendanceEntry, AppError> {
        let row = sqlx::query(
            r#"
            INSERT INTO attendance (student_id, date, status)
            VALUES (?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(student_id)
        .bind(date.format(DATE_FORMAT).to_string())
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await
        .store_context("Failed to record attendance")?;

        Ok(AttendanceEntry {
            id: row.get("id"),
            student_id,
            date,
            status,
        })
    }

    /// List attendance marks, optionally for one student, ordered by date.
    pub async fn list_attendance(
        &self,
        student_id: Option<StudentId>,
    ) -> Result<Vec<AttendanceEntry>, AppError> {
        let rows = match student_id {
            Some(id) => sqlx::query(
                "SELECT id, student_id, date, status FROM attendance WHERE student_id = ? ORDER BY date, id",
            )
            .bind(id)
            .fetch_all(&self.pool)
            .await,
            None => sqlx::query(
                "SELECT id, student_id, date, status FROM attendance ORDER BY date, id",
            )
            .fetch_all(&self.pool)
            .await,
        }
        .store_context("Failed to list attendance")?;

        let entries = rows
            .iter()
            .map(Self::row_to_attendance)
            .collect::<Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn row_to_attendance(row: &SqliteRow) -> Result<AttendanceEntry> {
        let date_str: String = row.get("date");
        let status_str: String = row.get("status");

        Ok(AttendanceEntry {
            id: row.get("id"),
            student_id: row.get("student_id"),
            date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
                .with_context(|| format!("Invalid attendance date: {}", date_str))?,
            status: status_str
                .parse()
                .map_err(|e: String| anyhow::anyhow!("Invalid attendance status: {}", e))?,
        })
    }

    // ========================
    // Student operations
    // ========================

    pub async fn save_student(&self, name: &str, email: &str) -> Result<Student, AppError> {
        let row = sqlx::query("INSERT INTO students (name, email) VALUES (?, ?) RETURNING id")
            .bind(name)
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .store_context("Failed to save student")?;

        Ok(Student {
            id: row.get("id"),
            name: name.to_string(),
            email: email.to_string(),
        })
    }

    pub async fn get_student(&self, id: StudentId) -> Result<Option<Student>, AppError> {
        let row = sqlx::query("SELECT id, name, email FROM students WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .store_context("Failed to fetch student")?;

        Ok(row.as_ref().map(Self::row_to_student))
    }

    pub async fn list_students(&self) -> Result<Vec<Student>, AppError> {
        let rows = sqlx::query("SELECT id, name, email FROM students ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .store_context("Failed to list students")?;

        Ok(rows.iter().map(Self::row_to_student).collect())
    }

    /// Update a student's email. Returns false if no such student exists.
    pub async fn update_student_email(&self, id: StudentId, email: &str) -> Result<bool, AppError> {
        let affected = sqlx::query("UPDATE students SET email = ? WHERE id = ?")
            .bind(email)
            .bind(id)
            .execute(&self.pool)
            .await
            .store_context("Failed to update student")?
            .rows_affected();

        Ok(affected > 0)
    }

    /// Delete a student. Returns false if no such student exists.
    pub async fn delete_student(&self, id: StudentId) -> Result<bool, AppError> {
        let affected = sqlx::query("DELETE FROM students WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .store_context("Failed to delete student")?
            .rows_affected();

        Ok(affected > 0)
    }

    fn row_to_student(row: &SqliteRow) -> Student {
        Student {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
        }
    }

    fn row_to_account(row: &SqliteRow) -> Account {
        Account {
            id: row.get("id"),
            name: row.get("name"),
            balance: row.get("balance_cents"),
        }
    }
}

#[async_trait]
impl AccountStore for Repository {
    async fn create(&self, name: &str, balance: Cents) -> Result<Account, AppError> {
        let row = sqlx::query("INSERT INTO accounts (name, balance_cents) VALUES (?, ?) RETURNING id")
            .bind(name)
            .bind(balance)
            .fetch_one(&self.pool)
            .await
            .store_context("Failed to create account")?;

        Ok(Account {
            id: row.get("id"),
            name: name.to_string(),
            balance,
        })
    }

    async fn get(&self, id: AccountId) -> Result<Account, AppError> {
        let row = sqlx::query("SELECT id, name, balance_cents FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .store_context("Failed to fetch account")?;

        row.as_ref()
            .map(Self::row_to_account)
            .ok_or(AppError::AccountNotFound(id))
    }

    async fn list(&self) -> Result<Vec<Account>, AppError> {
        let rows = sqlx::query("SELECT id, name, balance_cents FROM accounts ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .store_context("Failed to list accounts")?;

        Ok(rows.iter().map(Self::row_to_account).collect())
    }

    async fn update_balance(&self, id: AccountId, balance: Cents) -> Result<(), AppError> {
        let affected = sqlx::query("UPDATE accounts SET balance_cents = ? WHERE id = ?")
            .bind(balance)
            .bind(id)
            .execute(&self.pool)
            .await
            .store_context("Failed to update balance")?
            .rows_affected();

        if affected == 0 {
            return Err(AppError::AccountNotFound(id));
        }
        Ok(())
    }

    async fn apply_balances(&self, updates: &[BalanceUpdate]) -> Result<(), AppError> {
        // Dropping `tx` without commit rolls back, which also covers cancellation
        let mut tx = self
            .pool
            .begin()
            .await
            .store_context("Failed to begin transaction")?;

        for update in updates {
            let affected = sqlx::query("UPDATE accounts SET balance_cents = ? WHERE id = ?")
                .bind(update.balance)
                .bind(update.id)
                .execute(&mut *tx)
                .await
                .store_context("Failed to update balance")?
                .rows_affected();

            if affected == 0 {
                tx.rollback()
                    .await
                    .store_context("Failed to roll back transaction")?;
                tracing::debug!(account_id = update.id, "Rolled back balance batch");
                return Err(AppError::AccountNotFound(update.id));
            }
        }

        tx.commit()
            .await
            .store_context("Failed to commit transaction")?;
        tracing::debug!(accounts = updates.len(), "Committed balance batch");
        Ok(())
    }
}
