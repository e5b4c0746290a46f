// Application layer - use cases and orchestration over the storage layer.
// Services are constructed directly by the caller; nothing here is wired
// implicitly.

mod auth;
mod config;
pub mod error;
mod locks;
pub mod params;
mod records;
mod service;

pub use auth::*;
pub use config::*;
pub use error::*;
pub use locks::*;
pub use records::*;
pub use service::*;
