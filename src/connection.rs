//! Connection abstraction the loader executes against.
//!
//! The engine does not open connections itself; the caller hands it an object
//! implementing [`FixtureConnection`] and the engine drives every statement of
//! one load through it. Adapters for the bundled sqlx drivers live in
//! [`crate::drivers`]; anything else (a test double, another driver) only has
//! to implement these traits.

use async_trait::async_trait;

use crate::error::FixtureResult;
use crate::value::{FixtureValue, Row};

/// Open database connection executing statements in autocommit mode.
///
/// Placeholders in the SQL handed to a connection follow the parameter style
/// of the dialect in use; an implementation must accept that style natively or
/// translate it for its driver.
///
/// Integrity toggles are session scoped on most engines, so an implementation
/// backed by a pool must resolve every call to the same underlying session
/// (the bundled adapters document a max-one-connection pool for this reason).
#[async_trait]
pub trait FixtureConnection: Send + Sync {
	/// Executes a statement outside any transaction, returning affected rows.
	async fn execute(&self, sql: &str, params: &[FixtureValue]) -> FixtureResult<u64>;

	/// Runs a query expected to yield at most one row.
	async fn fetch_optional(
		&self,
		sql: &str,
		params: &[FixtureValue],
	) -> FixtureResult<Option<Row>>;

	/// Runs a query returning all result rows.
	async fn fetch_all(&self, sql: &str, params: &[FixtureValue]) -> FixtureResult<Vec<Row>>;

	/// Opens a transaction on this connection.
	async fn begin(&self) -> FixtureResult<Box<dyn FixtureTransaction>>;
}

/// In-progress transaction created by [`FixtureConnection::begin`].
#[async_trait]
pub trait FixtureTransaction: Send {
	/// Executes a statement inside the transaction, returning affected rows.
	async fn execute(&mut self, sql: &str, params: &[FixtureValue]) -> FixtureResult<u64>;

	/// Runs a query inside the transaction, expected to yield at most one row.
	async fn fetch_optional(
		&mut self,
		sql: &str,
		params: &[FixtureValue],
	) -> FixtureResult<Option<Row>>;

	/// Commits the transaction, consuming it.
	async fn commit(self: Box<Self>) -> FixtureResult<()>;

	/// Rolls the transaction back, consuming it.
	async fn rollback(self: Box<Self>) -> FixtureResult<()>;
}

/// Unit of work run inside a transaction opened by a dialect.
///
/// The loader's whole-directory body and each table's insert body are both
/// expressed as implementations of this trait, so dialects can bracket either
/// with their own statements.
#[async_trait]
pub trait TransactionWork: Send + Sync {
	/// Runs the work against the given transaction.
	async fn run(&self, tx: &mut dyn FixtureTransaction) -> FixtureResult<()>;
}
