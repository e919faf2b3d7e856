//! Convenience re-exports for common usage.
//!
//! This module provides a single import for the most commonly used items
//! from the reinhardt-fixtures crate.
//!
//! # Example
//!
//! ```ignore
//! use reinhardt_fixtures::prelude::*;
//!
//! // Now you have access to:
//! // - The load_fixtures entry point
//! // - Dialect helpers
//! // - Connection traits and bundled adapters
//! // - Error types
//! ```

// Error types
pub use crate::error::{FixtureError, FixtureResult};

// Entry point and safety guard controls
pub use crate::guard::{set_database_name_pattern, skip_database_name_check};
pub use crate::loader::load_fixtures;

// Fixture and value types
pub use crate::fixture::{FixtureFile, FixtureFormat};
pub use crate::value::{FixtureValue, Row};

// Connection seam
pub use crate::connection::{FixtureConnection, FixtureTransaction, TransactionWork};

// Dialect helpers
pub use crate::dialect::{
	Dialect, MySqlDialect, OracleDialect, ParamStyle, PostgresDialect, SqlServerDialect,
	SqliteDialect,
};

// Bundled sqlx adapters when their engine feature is enabled
#[cfg(feature = "mysql")]
pub use crate::drivers::MySqlFixtureConnection;
#[cfg(feature = "postgres")]
pub use crate::drivers::PgFixtureConnection;
#[cfg(feature = "sqlite")]
pub use crate::drivers::SqliteFixtureConnection;
