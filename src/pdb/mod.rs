//! Core Palm database container module

pub mod codec;
pub mod database;
pub mod format;
pub mod layout;
pub mod types;
mod utils;

pub use database::Database;
pub use types::error::{PdbError, Result};
