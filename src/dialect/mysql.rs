//! MySQL dialect implementation.

use async_trait::async_trait;
use tracing::warn;

use super::{Dialect, ParamStyle, quote_identifier_with, run_in_transaction};
use crate::connection::{FixtureConnection, TransactionWork};
use crate::error::FixtureResult;

/// MySQL and MariaDB dialect.
///
/// Binds with `?`, quotes with backticks and suspends integrity by turning
/// the session's `FOREIGN_KEY_CHECKS` off for the duration of the load.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

#[async_trait]
impl Dialect for MySqlDialect {
	fn param_style(&self) -> ParamStyle {
		ParamStyle::Question
	}

	fn quote_identifier(&self, name: &str) -> String {
		quote_identifier_with(name, '`', '`')
	}

	async fn database_name(&self, conn: &dyn FixtureConnection) -> String {
		match conn
			.fetch_optional("SELECT DATABASE() AS database_name", &[])
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
		let mut result = conn
			.execute("SET FOREIGN_KEY_CHECKS = 0", &[])
			.await
			.map(|_| ());
		if result.is_ok() {
			result = run_in_transaction(conn, work).await;
		}
		if let Err(error) = conn.execute("SET FOREIGN_KEY_CHECKS = 1", &[]).await {
			warn!(error = %error, "failed to re-enable foreign key checks");
		}
		result
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_param_style() {
		assert_eq!(MySqlDialect.param_style(), ParamStyle::Question);
	}

	#[rstest]
	fn test_quote_identifier() {
		assert_eq!(MySqlDialect.quote_identifier("users"), "`users`");
		assert_eq!(MySqlDialect.quote_identifier("`users`"), "`users`");
	}
}
