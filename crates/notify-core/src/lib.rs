//! # notify-core
//!
//! Core crate for the campus notification client. Contains configuration
//! schemas, the unified error system, notification domain types and the
//! traits describing external collaborators (REST history API).
//!
//! This crate has **no** internal dependencies on other workspace crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
