//! Common utilities and shared types for foodify.
//!
//! This crate provides foundational components used across all foodify crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Export**: CSV and JSON rendering of report rows
//! - **ID Generation**: ULID-based identifiers and session tokens via [`IdGenerator`]
//! - **Storage**: Uploaded file lookup and removal
//!
//! # Example
//!
//! ```no_run
//! use foodify_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id = IdGenerator::new().generate();
//!     println!("Serving {} with new id {}", config.server.url, id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod id;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use export::{ExportFormat, Row};
pub use id::IdGenerator;
pub use storage::{LocalStorage, StorageBackend};
