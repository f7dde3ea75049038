//! Live adapters for real external interactions.
//!
//! The database adapters drive sqlx on a private current-thread tokio
//! runtime so that every port call stays a blocking round trip. The S3
//! token store does the same around `object_store`.

pub mod mysql;
pub mod postgres;
pub mod s3;
pub mod tokens;

pub use mysql::LiveMySqlConnector;
pub use postgres::LivePostgresConnector;
pub use s3::S3TokenStore;
pub use tokens::{LiveTokenStore, LocalTokenStore};
