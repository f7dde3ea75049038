//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the engine and an external
//! system (a database driver, the completion-token store). Implementations
//! live in `src/adapters/`.

pub mod database;
pub mod tokens;

#[cfg(test)]
pub(crate) mod fakes;

pub use database::{Connection, Connector};
pub use tokens::TokenStore;
