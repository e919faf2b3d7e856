//! Per-engine SQL strategy objects.
//!
//! A [`Dialect`] captures everything about a database engine the loader has
//! to care about: placeholder style, identifier quoting, name introspection
//! and the statements that suspend and restore referential integrity around
//! a load. The loader holds exactly one dialect for the duration of a call
//! and never branches on the engine itself.

use async_trait::async_trait;
use tracing::warn;

use crate::connection::{FixtureConnection, FixtureTransaction, TransactionWork};
use crate::error::FixtureResult;

mod mssql;
mod mysql;
mod oracle;
mod postgres;
mod sqlite;

pub use mssql::SqlServerDialect;
pub use mysql::MySqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

/// Parameter placeholder family a dialect binds with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStyle {
	/// `?` positional placeholders.
	Question,

	/// `$1`, `$2`, ... numbered placeholders.
	DollarNumbered,

	/// `:1`, `:2`, ... numbered placeholders.
	ColonNumbered,
}

/// Engine-specific behavior the loader delegates to.
///
/// Implementations are stateless; the caller picks the one matching the
/// target engine and passes it to [`crate::load_fixtures`]. There is no
/// auto-detection.
#[async_trait]
pub trait Dialect: Send + Sync {
	/// Placeholder family used in generated statements.
	fn param_style(&self) -> ParamStyle;

	/// Wraps a raw identifier in the dialect's delimiter.
	///
	/// Idempotent: an identifier that is already validly quoted is returned
	/// unchanged. Delimiters embedded in a raw identifier are escaped by
	/// doubling.
	fn quote_identifier(&self, name: &str) -> String;

	/// Resolves the name of the connected database.
	///
	/// Returns an empty string when the name cannot be determined; the
	/// safety guard rejects empty names.
	async fn database_name(&self, conn: &dyn FixtureConnection) -> String;

	/// Enumerates the tables whose constraints are toggled individually.
	///
	/// Only dialects that suspend integrity per table implement this; the
	/// default returns no tables.
	async fn tables(&self, conn: &dyn FixtureConnection) -> FixtureResult<Vec<String>> {
		let _ = conn;
		Ok(Vec::new())
	}

	/// Reports whether a table has an identity column.
	///
	/// Only meaningful for engines that gate explicit identity inserts;
	/// the default is `false`.
	async fn table_has_identity_column(
		&self,
		tx: &mut dyn FixtureTransaction,
		table: &str,
	) -> bool {
		let _ = (tx, table);
		false
	}

	/// Brackets a table's inserts with whatever the engine needs for
	/// explicit identity values.
	///
	/// Dialects with an identity toggle enable it before running `work` and
	/// guarantee the disabling statement runs on every exit path, logging
	/// (not returning) a failure to reset. The default just runs `work`.
	async fn while_inserting(
		&self,
		tx: &mut dyn FixtureTransaction,
		table: &str,
		work: &dyn TransactionWork,
	) -> FixtureResult<()> {
		let _ = table;
		work.run(tx).await
	}

	/// Runs `work` in a transaction with referential integrity suspended.
	///
	/// Disabling statements are issued in autocommit mode before the
	/// transaction opens and the restoring statements after it commits or
	/// rolls back; restoration always runs, even when disabling failed
	/// partway, and restoration errors are logged, never returned.
	async fn with_integrity_suspended(
		&self,
		conn: &dyn FixtureConnection,
		work: &dyn TransactionWork,
	) -> FixtureResult<()>;
}

/// Quotes `name` with the given delimiters unless it already is quoted.
///
/// Embedded closing delimiters are escaped by doubling, so a name can never
/// break out of its quotes.
pub(crate) fn quote_identifier_with(name: &str, open: char, close: char) -> String {
	if is_quoted(name, open, close) {
		return name.to_string();
	}
	let escaped = name.replace(close, &format!("{close}{close}"));
	format!("{open}{escaped}{close}")
}

/// True when `name` is a validly quoted identifier: wrapped in the
/// delimiters with every interior closing delimiter doubled.
pub(crate) fn is_quoted(name: &str, open: char, close: char) -> bool {
	let Some(inner) = name
		.strip_prefix(open)
		.and_then(|rest| rest.strip_suffix(close))
	else {
		return false;
	};
	let mut chars = inner.chars();
	while let Some(c) = chars.next() {
		if c == close && chars.next() != Some(close) {
			return false;
		}
	}
	true
}

/// Opens a transaction, runs `work` and commits, rolling back on failure.
///
/// The work's error wins over a rollback failure; the latter is only
/// logged.
pub(crate) async fn run_in_transaction(
	conn: &dyn FixtureConnection,
	work: &dyn TransactionWork,
) -> FixtureResult<()> {
	let mut tx = conn.begin().await?;
	match work.run(tx.as_mut()).await {
		Ok(()) => tx.commit().await,
		Err(error) => {
			if let Err(rollback_error) = tx.rollback().await {
				warn!(error = %rollback_error, "rollback failed after load error");
			}
			Err(error)
		}
	}
}
