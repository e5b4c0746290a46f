use anyhow::{Result, bail};
use serde::Serialize;
use std::io::Write;

use crate::application::{RecordsService, TransferService};
use crate::domain::format_cents;
use crate::storage::Repository;

/// What an export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Accounts,
    Employees,
    Attendance,
    Students,
}

impl std::str::FromStr for ExportKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "accounts" => Ok(ExportKind::Accounts),
            "employees" => Ok(ExportKind::Employees),
            "attendance" => Ok(ExportKind::Attendance),
            "students" => Ok(ExportKind::Students),
            _ => bail!(
                "Invalid export type '{}'. Valid types: accounts, employees, attendance, students",
                s
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => bail!("Invalid export format '{}'. Valid formats: csv, json", s),
        }
    }
}

/// Exporter for writing accounts and records to CSV or JSON
pub struct Exporter<'a> {
    transfers: &'a TransferService<Repository>,
    records: &'a RecordsService,
}

impl<'a> Exporter<'a> {
    pub fn new(transfers: &'a TransferService<Repository>, records: &'a RecordsService) -> Self {
        Self { transfers, records }
    }

    /// Export one kind of record and return how many were written.
    pub async fn export<W: Write>(
        &self,
        kind: ExportKind,
        format: ExportFormat,
        writer: W,
    ) -> Result<usize> {
        match kind {
            ExportKind::Accounts => {
                let accounts = self.transfers.list_accounts().await?;
                match format {
                    ExportFormat::Json => write_json(writer, &accounts),
                    ExportFormat::Csv => write_csv(
                        writer,
                        &["id", "name", "balance"],
                        accounts.iter().map(|a| {
                            vec![a.id.to_string(), a.name.clone(), format_cents(a.balance)]
                        }),
                    ),
                }
            }
            ExportKind::Employees => {
                let employees = self.records.find_employees(None).await?;
                match format {
                    ExportFormat::Json => write_json(writer, &employees),
                    ExportFormat::Csv => write_csv(
                        writer,
                        &["id", "name", "salary"],
                        employees.iter().map(|e| {
                            vec![e.id.to_string(), e.name.clone(), format_cents(e.salary)]
                        }),
                    ),
                }
            }
            ExportKind::Attendance => {
                let entries = self.records.list_attendance(None).await?;
                match format {
                    ExportFormat::Json => write_json(writer, &entries),
                    ExportFormat::Csv => write_csv(
                        writer,
                        &["id", "student_id", "date", "status"],
                        entries.iter().map(|e| {
                            vec![
                                e.id.to_string(),
                                e.student_id.to_string(),
                                e.date.format("%Y-%m-%d").to_string(),
                                e.status.as_str().to_string(),
                            ]
                        }),
                    ),
                }
            }
            ExportKind::Students => {
                let students = self.records.list_students().await?;
                match format {
                    ExportFormat::Json => write_json(writer, &students),
                    ExportFormat::Csv => write_csv(
                        writer,
                        &["id", "name", "email"],
                        students
                            .iter()
                            .map(|s| vec![s.id.to_string(), s.name.clone(), s.email.clone()]),
                    ),
                }
            }
        }
    }
}

fn write_csv<W: Write>(
    writer: W,
    header: &[&str],
    rows: impl Iterator<Item = Vec<String>>,
) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(header)?;

    let mut count = 0;
    for row in rows {
        csv_writer.write_record(&row)?;
        count += 1;
    }

    csv_writer.flush()?;
    Ok(count)
}

fn write_json<W: Write, T: Serialize>(mut writer: W, items: &[T]) -> Result<usize> {
    let json = serde_json::to_string_pretty(items)?;
    writer.write_all(json.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(items.len())
}
