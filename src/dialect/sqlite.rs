//! SQLite dialect implementation.

use async_trait::async_trait;
use tracing::warn;

use super::{Dialect, ParamStyle, quote_identifier_with, run_in_transaction};
use crate::connection::{FixtureConnection, TransactionWork};
use crate::error::FixtureResult;

/// SQLite dialect.
///
/// Binds with `?` and quotes with double quotes. Integrity is suspended
/// with `defer_foreign_keys`, which postpones enforcement to commit time
/// and clears itself when the transaction ends, so the session's
/// `foreign_keys` setting is never clobbered. Requires SQLite 3.8 or later.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

#[async_trait]
impl Dialect for SqliteDialect {
	fn param_style(&self) -> ParamStyle {
		ParamStyle::Question
	}

	fn quote_identifier(&self, name: &str) -> String {
		quote_identifier_with(name, '"', '"')
	}

	/// Resolves to the path of the main database file; in-memory databases
	/// have no path and resolve to an empty name, which the safety guard
	/// rejects unless the check is skipped.
	async fn database_name(&self, conn: &dyn FixtureConnection) -> String {
		let sql = "SELECT file AS database_name FROM pragma_database_list WHERE name = 'main'";
		match conn.fetch_optional(sql, &[]).await {
			Ok(Some(row)) => row.get_string("database_name").unwrap_or_default(),
			_ => String::new(),
		}
	}

	async fn with_integrity_suspended(
		&self,
		conn: &dyn FixtureConnection,
		work: &dyn TransactionWork,
	) -> FixtureResult<()> {
		let mut result = conn
			.execute("PRAGMA defer_foreign_keys = ON", &[])
			.await
			.map(|_| ());
		if result.is_ok() {
			result = run_in_transaction(conn, work).await;
		}
		if let Err(error) = conn.execute("PRAGMA defer_foreign_keys = OFF", &[]).await {
			warn!(error = %error, "failed to reset defer_foreign_keys");
		}
		result
	}
}
