//! sqlx-backed implementations of the connection traits.
//!
//! Each adapter lives behind its engine's feature flag and pairs with the
//! matching [`Dialect`](crate::dialect::Dialect). The adapters translate
//! [`FixtureValue`](crate::value::FixtureValue) parameters into sqlx binds
//! and sqlx rows back into [`Row`](crate::value::Row) maps.

#[cfg(feature = "mysql")]
mod mysql;
#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "mysql")]
pub use mysql::{MySqlFixtureConnection, MySqlFixtureTransaction};
#[cfg(feature = "postgres")]
pub use postgres::{PgFixtureConnection, PgFixtureTransaction};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteFixtureConnection, SqliteFixtureTransaction};
