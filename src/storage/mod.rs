mod memory;
mod repository;
mod store;

pub use memory::*;
pub use repository::*;
pub use store::*;

use crate::application::AppError;

/// SQL migration for initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Attach a context message to a sqlx failure while classifying it into an `AppError`.
pub(crate) trait StoreContext<T> {
    fn store_context(self, context: &'static str) -> Result<T, AppError>;
}

impl<T> StoreContext<T> for Result<T, sqlx::Error> {
    fn store_context(self, context: &'static str) -> Result<T, AppError> {
        self.map_err(|err| AppError::from_sqlx(err, context))
    }
}
