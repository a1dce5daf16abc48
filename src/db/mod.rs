//! Database module
//!
//! This module handles all database operations using SQLx with SQLite.

mod engine;
pub mod tables;

pub use engine::DbEngine;
pub use tables::*;

/// Table operations surface raw sqlx errors so uniqueness conflicts can be told apart
pub type DbResult<T> = Result<T, sqlx::Error>;
