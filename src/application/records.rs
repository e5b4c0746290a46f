use crate::domain::{
    AttendanceEntry, Cents, Employee, EmployeeId, Student, StudentId, is_plausible_email,
};
use crate::storage::Repository;

use super::AppError;
use super::params::{parse_date, parse_id, parse_status};

/// Employee directory, attendance log and student registry.
pub struct RecordsService {
    repo: Repository,
}

impl RecordsService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    // ========================
    // Employee operations
    // ========================

    pub async fn add_employee(
        &self,
        id: EmployeeId,
        name: &str,
        salary: Cents,
    ) -> Result<Employee, AppError> {
        let name = require_name(name)?;
        let employee = Employee {
            id,
            name: name.to_string(),
            salary,
        };
        self.repo.save_employee(&employee).await?;
        Ok(employee)
    }

    /// Look up employees by the raw `empid` parameter.
    ///
    /// A missing or blank parameter lists everyone. Otherwise the value must be
    /// an integer id; the result is that employee, or empty if there is none.
    pub async fn find_employees(&self, empid: Option<&str>) -> Result<Vec<Employee>, AppError> {
        match empid.map(str::trim).filter(|s| !s.is_empty()) {
            None => self.repo.list_employees().await,
            Some(raw) => {
                let id = parse_id("empid", raw)?;
                Ok(self.repo.get_employee(id).await?.into_iter().collect())
            }
        }
    }

    // ========================
    // Attendance operations
    // ========================

    /// Record attendance from raw `studentId`, `date` and `status` parameters.
    pub async fn record_attendance(
        &self,
        student_id: &str,
        date: &str,
        status: &str,
    ) -> Result<AttendanceEntry, AppError> {
        let student_id = parse_id("studentId", student_id)?;
        let date = parse_date("date", date)?;
        let status = parse_status(status)?;
        self.repo.save_attendance(student_id, date, status).await
    }

    pub async fn list_attendance(
        &self,
        student_id: Option<StudentId>,
    ) -> Result<Vec<AttendanceEntry>, AppError> {
        self.repo.list_attendance(student_id).await
    }

    // ========================
    // Student operations
    // ========================

    pub async fn add_student(&self, name: &str, email: &str) -> Result<Student, AppError> {
        let name = require_name(name)?;
        let email = require_email(email)?;
        self.repo.save_student(name, email).await
    }

    pub async fn list_students(&self) -> Result<Vec<Student>, AppError> {
        self.repo.list_students().await
    }

    pub async fn update_student_email(
        &self,
        id: StudentId,
        email: &str,
    ) -> Result<Student, AppError> {
        let email = require_email(email)?;
        if !self.repo.update_student_email(id, email).await? {
            return Err(AppError::StudentNotFound(id));
        }
        self.repo
            .get_student(id)
            .await?
            .ok_or(AppError::StudentNotFound(id))
    }

    /// Delete a student and return the record as it was.
    pub async fn delete_student(&self, id: StudentId) -> Result<Student, AppError> {
        let student = self
            .repo
            .get_student(id)
            .await?
            .ok_or(AppError::StudentNotFound(id))?;

        if !self.repo.delete_student(id).await? {
            return Err(AppError::StudentNotFound(id));
        }
        Ok(student)
    }
}

fn require_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::invalid("name must not be empty"));
    }
    Ok(name)
}

fn require_email(email: &str) -> Result<&str, AppError> {
    let email = email.trim();
    if !is_plausible_email(email) {
        return Err(AppError::invalid(format!("'{}' is not a valid email", email)));
    }
    Ok(email)
}
