//! PostgreSQL dialect implementation.

use async_trait::async_trait;
use tracing::warn;

use super::{Dialect, ParamStyle, quote_identifier_with, run_in_transaction};
use crate::connection::{FixtureConnection, TransactionWork};
use crate::error::FixtureResult;

/// PostgreSQL dialect.
///
/// Binds with `$1, $2, ...` and quotes with double quotes. Integrity is
/// suspended by disabling all triggers, including the internal foreign key
/// enforcement triggers, on every table in the `public` schema, one
/// `ALTER TABLE` per table. Disabling triggers requires a role that owns
/// the tables or superuser rights, which a test database user normally has.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

#[async_trait]
impl Dialect for PostgresDialect {
	fn param_style(&self) -> ParamStyle {
		ParamStyle::DollarNumbered
	}

	fn quote_identifier(&self, name: &str) -> String {
		quote_identifier_with(name, '"', '"')
	}

	async fn database_name(&self, conn: &dyn FixtureConnection) -> String {
		match conn
			.fetch_optional("SELECT current_database()::text AS database_name", &[])
			.await
		{
			Ok(Some(row)) => row.get_string("database_name").unwrap_or_default(),
			_ => String::new(),
		}
	}

	async fn tables(&self, conn: &dyn FixtureConnection) -> FixtureResult<Vec<String>> {
		let sql = "SELECT table_name::text AS table_name FROM information_schema.tables \
		           WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
		           ORDER BY table_name";
		let rows = conn.fetch_all(sql, &[]).await?;
		Ok(rows
			.iter()
			.filter_map(|row| row.get_string("table_name"))
			.collect())
	}

	async fn with_integrity_suspended(
		&self,
		conn: &dyn FixtureConnection,
		work: &dyn TransactionWork,
	) -> FixtureResult<()> {
		let tables = self.tables(conn).await?;

		let mut result = Ok(());
		for table in &tables {
			let sql = format!(
				"ALTER TABLE {} DISABLE TRIGGER ALL",
				self.quote_identifier(table)
			);
			if let Err(error) = conn.execute(&sql, &[]).await {
				result = Err(error);
				break;
			}
		}

		if result.is_ok() {
			result = run_in_transaction(conn, work).await;
		}

		for table in &tables {
			let sql = format!(
				"ALTER TABLE {} ENABLE TRIGGER ALL",
				self.quote_identifier(table)
			);
			if let Err(error) = conn.execute(&sql, &[]).await {
				warn!(table = table.as_str(), error = %error, "failed to re-enable triggers");
			}
		}

		result
	}
}
