//! Test database fixture loading for the Reinhardt framework.
//!
//! This crate reloads a test database from declarative data files before each
//! test run:
//!
//! - **Declarative Fixtures**: One YAML or JSON file per table, named after it
//! - **Atomic Reload**: Every table is cleared and repopulated in a single
//!   transaction, with referential integrity suspended so file order never
//!   matters
//! - **Dialect Helpers**: MySQL, SQLite, PostgreSQL, SQL Server, and Oracle
//!   strategies for placeholders, identifier quoting, and constraint toggles
//! - **Safety Guard**: Refuses to touch a database whose name does not look
//!   like a test database
//!
//! # Features
//!
//! - `sqlite` - sqlx SQLite connection adapter (enabled by default)
//! - `mysql` - sqlx MySQL connection adapter
//! - `postgres` - sqlx PostgreSQL connection adapter
//!
//! Dialect helpers are always available; the feature flags only gate the
//! bundled sqlx adapters. Any database reachable through a custom
//! [`FixtureConnection`](connection::FixtureConnection) implementation works
//! without them.
//!
//! # Quick Start
//!
//! Create one fixture file per table (`tests/fixtures/users.yml`):
//!
//! ```yaml
//! - id: 1
//!   name: Ada
//!   email: ada@example.com
//! - id: 2
//!   name: Grace
//!   email: grace@example.com
//! ```
//!
//! Reload the database before each test:
//!
//! ```ignore
//! use reinhardt_fixtures::prelude::*;
//!
//! let conn = SqliteFixtureConnection::connect("sqlite:target/app_test.db").await?;
//! load_fixtures("tests/fixtures", &conn, &SqliteDialect).await?;
//! ```
//!
//! Every load wipes the fixture tables first, so the database always ends up
//! in exactly the state the files describe. Because that is destructive, the
//! load refuses to run unless the database name matches a test pattern; see
//! [`guard`] for tuning the check.
//!
//! # Architecture
//!
//! - [`load_fixtures`](loader::load_fixtures) - The entry point: guard,
//!   discover, then reload inside a transaction
//! - [`Dialect`](dialect::Dialect) - Engine-specific SQL strategy, one
//!   implementation per supported engine
//! - [`FixtureConnection`](connection::FixtureConnection) /
//!   [`FixtureTransaction`](connection::FixtureTransaction) - The database
//!   access seam the loader drives
//! - [`FixtureFile`](fixture::FixtureFile) - One discovered data file, parsed
//!   eagerly and bound to one table
//! - [`FixtureValue`](value::FixtureValue) - Typed scalars with date and time
//!   recognition for string values

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod connection;
pub mod dialect;
pub mod drivers;
pub mod error;
pub mod fixture;
pub mod guard;
pub mod loader;
pub mod prelude;
pub mod value;

// Re-export commonly used types at crate root
pub use connection::{FixtureConnection, FixtureTransaction, TransactionWork};
pub use dialect::{Dialect, ParamStyle};
pub use error::{FixtureError, FixtureResult};
pub use fixture::{FixtureFile, FixtureFormat};
pub use guard::{set_database_name_pattern, skip_database_name_check};
pub use loader::load_fixtures;
pub use value::{FixtureValue, Row};
