//! Oracle dialect implementation.

use async_trait::async_trait;
use tracing::warn;

use super::{Dialect, ParamStyle, is_quoted, quote_identifier_with, run_in_transaction};
use crate::connection::{FixtureConnection, TransactionWork};
use crate::error::FixtureResult;

/// Oracle dialect.
///
/// Binds with `:1, :2, ...`; date and time values are wrapped in `to_date`
/// with the matching format mask. Unquoted identifiers are upper-cased
/// before quoting, which is how the data dictionary stores them, so
/// fixture files can name tables in lower case. Integrity is suspended by
/// disabling every enabled referential constraint owned by the current
/// user.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDialect;

impl OracleDialect {
	/// Lists the enabled foreign key constraints of the current schema as
	/// `(table, constraint)` pairs.
	async fn enabled_referential_constraints(
		&self,
		conn: &dyn FixtureConnection,
	) -> FixtureResult<Vec<(String, String)>> {
		let sql = "SELECT table_name AS \"table_name\", constraint_name AS \"constraint_name\" \
		           FROM user_constraints \
		           WHERE constraint_type = 'R' AND status = 'ENABLED' \
		           ORDER BY table_name, constraint_name";
		let rows = conn.fetch_all(sql, &[]).await?;
		Ok(rows
			.iter()
			.filter_map(|row| {
				Some((
					row.get_string("table_name")?,
					row.get_string("constraint_name")?,
				))
			})
			.collect())
	}
}

#[async_trait]
impl Dialect for OracleDialect {
	fn param_style(&self) -> ParamStyle {
		ParamStyle::ColonNumbered
	}

	fn quote_identifier(&self, name: &str) -> String {
		if is_quoted(name, '"', '"') {
			name.to_string()
		} else {
			quote_identifier_with(&name.to_uppercase(), '"', '"')
		}
	}

	async fn database_name(&self, conn: &dyn FixtureConnection) -> String {
		match conn
			.fetch_optional("SELECT user AS \"database_name\" FROM dual", &[])
			.await
		{
			Ok(Some(row)) => row.get_string("database_name").unwrap_or_default(),
			_ => String::new(),
		}
	}

	async fn with_integrity_suspended(
		&self,
		conn: &dyn FixtureConnection,
		work: &dyn TransactionWork,
	) -> FixtureResult<()> {
		let constraints = self.enabled_referential_constraints(conn).await?;

		let mut result = Ok(());
		for (table, constraint) in &constraints {
			let sql = format!(
				"ALTER TABLE {} DISABLE CONSTRAINT {}",
				self.quote_identifier(table),
				self.quote_identifier(constraint)
			);
			if let Err(error) = conn.execute(&sql, &[]).await {
				result = Err(error);
				break;
			}
		}

		if result.is_ok() {
			result = run_in_transaction(conn, work).await;
		}

		for (table, constraint) in &constraints {
			let sql = format!(
				"ALTER TABLE {} ENABLE CONSTRAINT {}",
				self.quote_identifier(table),
				self.quote_identifier(constraint)
			);
			if let Err(error) = conn.execute(&sql, &[]).await {
				warn!(
					table = table.as_str(),
					constraint = constraint.as_str(),
					error = %error,
					"failed to re-enable constraint"
				);
			}
		}

		result
	}
}
