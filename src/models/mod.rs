//! Core data models for the audiobook catalog.
//!
//! Each entity maps to one table via `sqlx::FromRow` and serializes as JSON
//! with the column names as keys.

pub mod book;
pub mod chapter;
pub mod suggestion;
