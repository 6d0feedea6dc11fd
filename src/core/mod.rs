/// Core Module for HRDesk
///
/// Shared infrastructure: error handling and the database layer
/// (schema registry, statement building, execution).

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{HrdeskError, Result};
