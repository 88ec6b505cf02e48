//! Doctor Connect Core: shared domain types, error taxonomy, and
//! repository trait definitions.

pub mod error;
pub mod models;
pub mod repository;
