use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::time::Duration;

use crate::application::params::{parse_amount, parse_id};
use crate::application::{AppError, Credentials, RecordsService, ServiceConfig, TransferService};
use crate::domain::{OverdraftPolicy, format_cents};
use crate::storage::Repository;

/// Teller - account transfers and record keeping
#[derive(Parser)]
#[command(name = "teller")]
#[command(about = "Atomic account transfers and parameterized record keeping over SQLite")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "TELLER_DATABASE", default_value = "teller.db", global = true)]
    pub database: String,

    /// How long a transfer waits for its account locks, in milliseconds
    #[arg(long, env = "TELLER_LOCK_TIMEOUT_MS", default_value_t = 5000, global = true)]
    pub lock_timeout_ms: u64,

    /// Reject transfers that would take the source account below zero
    #[arg(long, env = "TELLER_REJECT_OVERDRAFT", global = true)]
    pub reject_overdraft: bool,

    /// Username accepted by `login`
    #[arg(long, env = "TELLER_ADMIN_USER", default_value = "admin", hide_env_values = true)]
    pub admin_user: String,

    /// Password accepted by `login`
    #[arg(long, env = "TELLER_ADMIN_PASSWORD", default_value = "1234", hide_env_values = true)]
    pub admin_password: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Move money from one account to another
    Transfer {
        /// Amount to transfer (e.g., "500.00" or "500")
        amount: String,

        /// Source account id
        #[arg(long)]
        from: String,

        /// Destination account id
        #[arg(long)]
        to: String,
    },

    /// Check a username and password
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },

    /// Employee directory commands
    #[command(subcommand)]
    Employee(EmployeeCommands),

    /// Attendance log commands
    #[command(subcommand)]
    Attendance(AttendanceCommands),

    /// Student registry commands
    #[command(subcommand)]
    Student(StudentCommands),

    /// Export data to CSV or JSON
    Export {
        /// What to export: accounts, employees, attendance, students
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format: csv, json (default: csv)
        #[arg(short, long)]
        format: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open a new account
    Create {
        /// Display name
        name: String,

        /// Opening balance (e.g., "1000.00")
        #[arg(short, long, default_value = "0")]
        balance: String,
    },

    /// List all accounts with their balances
    List,

    /// Show one account
    Show {
        /// Account id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum EmployeeCommands {
    /// Add an employee
    Add {
        /// Employee id (must be unique)
        id: i64,

        /// Employee name
        name: String,

        /// Salary (e.g., "4200.00")
        #[arg(short, long)]
        salary: String,
    },

    /// Find an employee by id, or list all
    Find {
        /// Employee id (omit to list everyone)
        #[arg(long)]
        empid: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AttendanceCommands {
    /// Record attendance for a student
    Record {
        #[arg(long)]
        student_id: String,

        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// present, absent or late
        #[arg(long)]
        status: String,
    },

    /// List attendance marks
    List {
        /// Only this student
        #[arg(long)]
        student_id: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum StudentCommands {
    /// Register a student
    Add {
        name: String,

        #[arg(short, long)]
        email: String,
    },

    /// List registered students
    List,

    /// Change a student's email
    Update {
        id: i64,

        #[arg(short, long)]
        email: String,
    },

    /// Remove a student
    Delete { id: i64 },
}

impl Cli {
    fn service_config(&self) -> ServiceConfig {
        let overdraft = if self.reject_overdraft {
            OverdraftPolicy::Reject
        } else {
            OverdraftPolicy::Allow
        };

        ServiceConfig::default()
            .with_lock_timeout(Duration::from_millis(self.lock_timeout_ms))
            .with_overdraft(overdraft)
    }

    pub async fn run(self) -> Result<()> {
        crate::logging::init_cli_logger(self.verbose);
        let config = self.service_config();

        match self.command {
            Commands::Init => {
                Repository::init_path(&self.database, config.busy_timeout).await?;
                tracing::info!(database = %self.database, "Database initialized");
                println!("Database initialized: {}", self.database);
            }

            Commands::Login { username, password } => {
                let credentials = Credentials::new(self.admin_user, self.admin_password);
                credentials
                    .verify(&username, &password)
                    .map_err(|e| rejected(e, "Login"))?;
                println!("Welcome, {}!", username);
            }

            Commands::Account(account_cmd) => {
                let (transfers, _) = open_services(&self.database, config).await?;
                run_account_command(&transfers, account_cmd).await?;
            }

            Commands::Transfer { amount, from, to } => {
                let (transfers, _) = open_services(&self.database, config).await?;
                let receipt = transfers
                    .transfer_params(&from, &to, &amount)
                    .await
                    .map_err(|e| rejected(e, "Transfer"))?;

                tracing::info!(
                    from = receipt.from,
                    to = receipt.to,
                    amount = receipt.amount,
                    "Transfer committed"
                );
                println!(
                    "Transferred {} from {} to {}",
                    format_cents(receipt.amount),
                    receipt.from_name,
                    receipt.to_name
                );
                println!(
                    "  {:<20} {:>12}",
                    receipt.from_name,
                    format_cents(receipt.from_balance)
                );
                println!(
                    "  {:<20} {:>12}",
                    receipt.to_name,
                    format_cents(receipt.to_balance)
                );
            }

            Commands::Employee(employee_cmd) => {
                let (_, records) = open_services(&self.database, config).await?;
                run_employee_command(&records, employee_cmd).await?;
            }

            Commands::Attendance(attendance_cmd) => {
                let (_, records) = open_services(&self.database, config).await?;
                run_attendance_command(&records, attendance_cmd).await?;
            }

            Commands::Student(student_cmd) => {
                let (_, records) = open_services(&self.database, config).await?;
                run_student_command(&records, student_cmd).await?;
            }

            Commands::Export {
                export_type,
                output,
                format,
            } => {
                let (transfers, records) = open_services(&self.database, config).await?;
                run_export_command(
                    &transfers,
                    &records,
                    &export_type,
                    output.as_deref(),
                    format.as_deref(),
                )
                .await?;
            }
        }

        Ok(())
    }
}

/// Build both services over one shared connection pool.
async fn open_services(
    database: &str,
    config: ServiceConfig,
) -> Result<(TransferService<Repository>, RecordsService)> {
    let repo = Repository::connect_path(database, config.busy_timeout)
        .await
        .with_context(|| format!("Failed to open database '{}' (run `teller init` first)", database))?;

    let transfers = TransferService::new(repo.clone(), config);
    let records = RecordsService::new(repo);
    Ok((transfers, records))
}

fn rejected(err: AppError, operation: &str) -> anyhow::Error {
    tracing::warn!(error = %err, "{} rejected", operation);
    err.into()
}

async fn run_account_command(
    service: &TransferService<Repository>,
    cmd: AccountCommands,
) -> Result<()> {
    match cmd {
        AccountCommands::Create { name, balance } => {
            let balance = parse_amount("balance", &balance)?;
            let account = service.open_account(&name, balance).await?;
            tracing::info!(id = account.id, "Account opened");
            println!(
                "Created account {}: {} ({})",
                account.id,
                account.name,
                format_cents(account.balance)
            );
        }

        AccountCommands::List => {
            let accounts = service.list_accounts().await?;
            if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!("{:>6} {:<20} {:>12}", "ID", "NAME", "BALANCE");
                println!("{}", "-".repeat(40));
                for account in accounts {
                    println!(
                        "{:>6} {:<20} {:>12}",
                        account.id,
                        truncate(&account.name, 20),
                        format_cents(account.balance)
                    );
                }
            }
        }

        AccountCommands::Show { id } => {
            let id = parse_id("id", &id)?;
            let account = service.get_account(id).await?;
            println!("Account: {}", account.name);
            println!("  ID:      {}", account.id);
            println!("  Balance: {}", format_cents(account.balance));
        }
    }
    Ok(())
}

async fn run_employee_command(service: &RecordsService, cmd: EmployeeCommands) -> Result<()> {
    match cmd {
        EmployeeCommands::Add { id, name, salary } => {
            let salary = parse_amount("salary", &salary)?;
            let employee = service.add_employee(id, &name, salary).await?;
            println!("Added employee {}: {}", employee.id, employee.name);
        }

        EmployeeCommands::Find { empid } => {
            let employees = service
                .find_employees(empid.as_deref())
                .await
                .map_err(|e| rejected(e, "Employee lookup"))?;

            println!("{:>6} {:<24} {:>12}", "ID", "NAME", "SALARY");
            println!("{}", "-".repeat(44));
            if employees.is_empty() {
                println!("No records found!");
            }
            for employee in employees {
                println!(
                    "{:>6} {:<24} {:>12}",
                    employee.id,
                    truncate(&employee.name, 24),
                    format_cents(employee.salary)
                );
            }
        }
    }
    Ok(())
}

async fn run_attendance_command(service: &RecordsService, cmd: AttendanceCommands) -> Result<()> {
    match cmd {
        AttendanceCommands::Record {
            student_id,
            date,
            status,
        } => {
            let entry = service
                .record_attendance(&student_id, &date, &status)
                .await
                .map_err(|e| rejected(e, "Attendance"))?;
            println!(
                "Attendance recorded: student {} {} on {}",
                entry.student_id,
                entry.status,
                entry.date.format("%Y-%m-%d")
            );
        }

        AttendanceCommands::List { student_id } => {
            let entries = service.list_attendance(student_id).await?;
            if entries.is_empty() {
                println!("No attendance recorded.");
            } else {
                println!("{:<12} {:>10} {:<8}", "DATE", "STUDENT", "STATUS");
                println!("{}", "-".repeat(32));
                for entry in entries {
                    println!(
                        "{:<12} {:>10} {:<8}",
                        entry.date.format("%Y-%m-%d").to_string(),
                        entry.student_id,
                        entry.status
                    );
                }
            }
        }
    }
    Ok(())
}

async fn run_student_command(service: &RecordsService, cmd: StudentCommands) -> Result<()> {
    match cmd {
        StudentCommands::Add { name, email } => {
            let student = service.add_student(&name, &email).await?;
            println!(
                "Inserted student: {} | {} | {}",
                student.id, student.name, student.email
            );
        }

        StudentCommands::List => {
            let students = service.list_students().await?;
            if students.is_empty() {
                println!("No students found.");
            } else {
                println!("{:>6} {:<24} {:<30}", "ID", "NAME", "EMAIL");
                println!("{}", "-".repeat(62));
                for student in students {
                    println!(
                        "{:>6} {:<24} {:<30}",
                        student.id,
                        truncate(&student.name, 24),
                        truncate(&student.email, 30)
                    );
                }
            }
        }

        StudentCommands::Update { id, email } => {
            let student = service.update_student_email(id, &email).await?;
            println!(
                "Updated student: {} | {} | {}",
                student.id, student.name, student.email
            );
        }

        StudentCommands::Delete { id } => {
            let student = service.delete_student(id).await?;
            println!("Deleted student: {} ({})", student.id, student.name);
        }
    }
    Ok(())
}

async fn run_export_command(
    transfers: &TransferService<Repository>,
    records: &RecordsService,
    export_type: &str,
    output: Option<&str>,
    format: Option<&str>,
) -> Result<()> {
    use crate::io::{ExportFormat, ExportKind, Exporter};
    use std::fs::File;
    use std::io::{Write, stdout};

    let kind: ExportKind = export_type.parse()?;
    let format = format
        .map(str::parse::<ExportFormat>)
        .transpose()?
        .unwrap_or_default();

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    let count = Exporter::new(transfers, records)
        .export(kind, format, writer)
        .await?;

    if output.is_some() {
        eprintln!("Exported {} {}", count, export_type);
    }
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Alice", 20), "Alice");
        assert_eq!(truncate("Bartholomew Fitzgerald", 10), "Barthol...");
        assert_eq!(truncate("Zoë Zoë Zoë", 6), "Zoë...");
    }

    #[test]
    fn test_transfer_args() {
        let cli = Cli::try_parse_from([
            "teller", "--reject-overdraft", "transfer", "500", "--from", "1", "--to", "2",
        ])
        .unwrap();

        assert_eq!(cli.service_config().overdraft, OverdraftPolicy::Reject);
        match cli.command {
            Commands::Transfer { amount, from, to } => {
                assert_eq!((amount.as_str(), from.as_str(), to.as_str()), ("500", "1", "2"));
            }
            _ => panic!("expected transfer command"),
        }
    }

    #[test]
    fn test_lock_timeout_flag() {
        let cli = Cli::try_parse_from(["teller", "--lock-timeout-ms", "250", "account", "list"])
            .unwrap();
        assert_eq!(cli.service_config().lock_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
