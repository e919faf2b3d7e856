//! Microsoft SQL Server dialect implementation.

use async_trait::async_trait;
use tracing::warn;

use super::{Dialect, ParamStyle, quote_identifier_with, run_in_transaction};
use crate::connection::{FixtureConnection, FixtureTransaction, TransactionWork};
use crate::error::FixtureResult;
use crate::value::FixtureValue;

/// Microsoft SQL Server dialect, for SQL Server 2008 or later.
///
/// Binds with `?`, quotes with brackets and suspends integrity by issuing
/// `NOCHECK CONSTRAINT ALL` against every base table, one `ALTER TABLE`
/// per table. Tables with an identity column get `IDENTITY_INSERT` turned
/// on around their inserts so fixtures can declare explicit key values.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

#[async_trait]
impl Dialect for SqlServerDialect {
	fn param_style(&self) -> ParamStyle {
		ParamStyle::Question
	}

	fn quote_identifier(&self, name: &str) -> String {
		quote_identifier_with(name, '[', ']')
	}

	async fn database_name(&self, conn: &dyn FixtureConnection) -> String {
		match conn
			.fetch_optional("SELECT DB_NAME() AS database_name", &[])
			.await
		{
			Ok(Some(row)) => row.get_string("database_name").unwrap_or_default(),
			_ => String::new(),
		}
	}

	async fn tables(&self, conn: &dyn FixtureConnection) -> FixtureResult<Vec<String>> {
		let sql = "SELECT table_name AS table_name FROM information_schema.tables \
		           WHERE table_type = 'BASE TABLE' ORDER BY table_name";
		let rows = conn.fetch_all(sql, &[]).await?;
		Ok(rows
			.iter()
			.filter_map(|row| row.get_string("table_name"))
			.collect())
	}

	async fn table_has_identity_column(
		&self,
		tx: &mut dyn FixtureTransaction,
		table: &str,
	) -> bool {
		let sql = "SELECT COUNT(*) AS identity_columns FROM sys.identity_columns \
		           WHERE OBJECT_NAME(object_id) = ?";
		matches!(
			tx.fetch_optional(sql, &[FixtureValue::from(table)]).await,
			Ok(Some(row)) if row.get_i64("identity_columns").unwrap_or(0) > 0
		)
	}

	async fn while_inserting(
		&self,
		tx: &mut dyn FixtureTransaction,
		table: &str,
		work: &dyn TransactionWork,
	) -> FixtureResult<()> {
		if !self.table_has_identity_column(tx, table).await {
			return work.run(tx).await;
		}

		let quoted = self.quote_identifier(table);
		let result = match tx
			.execute(&format!("SET IDENTITY_INSERT {quoted} ON"), &[])
			.await
		{
			Ok(_) => work.run(tx).await,
			Err(error) => Err(error),
		};
		if let Err(error) = tx
			.execute(&format!("SET IDENTITY_INSERT {quoted} OFF"), &[])
			.await
		{
			warn!(table, error = %error, "failed to reset IDENTITY_INSERT");
		}
		result
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
				"ALTER TABLE {} NOCHECK CONSTRAINT ALL",
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
				"ALTER TABLE {} WITH CHECK CHECK CONSTRAINT ALL",
				self.quote_identifier(table)
			);
			if let Err(error) = conn.execute(&sql, &[]).await {
				warn!(table = table.as_str(), error = %error, "failed to re-check constraints");
			}
		}

		result
	}
}
