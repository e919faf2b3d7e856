//! SQLite driver adapter.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as SqlxRow, Sqlite, Transaction};

use crate::connection::{FixtureConnection, FixtureTransaction};
use crate::error::{FixtureError, FixtureResult};
use crate::value::{FixtureValue, Row};

/// SQLite-backed fixture connection.
///
/// Integrity toggles are session scoped, so the pool must hold exactly one
/// connection for the load to observe its own toggles; [`connect`] sets
/// this up. An in-memory database also lives and dies with its single
/// connection but resolves to an empty database name, so the safety guard
/// rejects it unless the check is skipped.
///
/// [`connect`]: SqliteFixtureConnection::connect
pub struct SqliteFixtureConnection {
	pool: Arc<SqlitePool>,
}

impl SqliteFixtureConnection {
	/// Wraps an existing pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self {
			pool: Arc::new(pool),
		}
	}

	/// Connects to a SQLite database with a single-connection pool.
	pub async fn connect(url: &str) -> FixtureResult<Self> {
		let pool = SqlitePoolOptions::new()
			.max_connections(1)
			.connect(url)
			.await?;
		Ok(Self::new(pool))
	}

	/// Returns the underlying pool.
	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}
}

fn bind_value<'q>(
	query: sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
	value: &'q FixtureValue,
) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
	match value {
		FixtureValue::Null => query.bind(None::<i32>),
		FixtureValue::Bool(b) => query.bind(b),
		FixtureValue::Int(i) => query.bind(i),
		FixtureValue::Float(f) => query.bind(f),
		FixtureValue::String(s) => query.bind(s),
		FixtureValue::Date(d) => query.bind(d),
		FixtureValue::Time(t) => query.bind(t),
		FixtureValue::DateTime(dt) => query.bind(dt),
	}
}

fn convert_row(sqlite_row: SqliteRow) -> Row {
	let mut row = Row::new();
	for column in sqlite_row.columns() {
		let name = column.name();
		let value = if let Ok(Some(i)) = sqlite_row.try_get::<Option<i64>, _>(name) {
			FixtureValue::Int(i)
		} else if let Ok(Some(f)) = sqlite_row.try_get::<Option<f64>, _>(name) {
			FixtureValue::Float(f)
		} else if let Ok(Some(s)) = sqlite_row.try_get::<Option<String>, _>(name) {
			FixtureValue::String(s)
		} else {
			FixtureValue::Null
		};
		row.insert(name.to_string(), value);
	}
	row
}

#[async_trait]
impl FixtureConnection for SqliteFixtureConnection {
	async fn execute(&self, sql: &str, params: &[FixtureValue]) -> FixtureResult<u64> {
		let mut query = sqlx::query(sql);
		for param in params {
			query = bind_value(query, param);
		}
		let result = query.execute(self.pool.as_ref()).await?;
		Ok(result.rows_affected())
	}

	async fn fetch_optional(
		&self,
		sql: &str,
		params: &[FixtureValue],
	) -> FixtureResult<Option<Row>> {
		let mut query = sqlx::query(sql);
		for param in params {
			query = bind_value(query, param);
		}
		let row = query.fetch_optional(self.pool.as_ref()).await?;
		Ok(row.map(convert_row))
	}

	async fn fetch_all(&self, sql: &str, params: &[FixtureValue]) -> FixtureResult<Vec<Row>> {
		let mut query = sqlx::query(sql);
		for param in params {
			query = bind_value(query, param);
		}
		let rows = query.fetch_all(self.pool.as_ref()).await?;
		Ok(rows.into_iter().map(convert_row).collect())
	}

	async fn begin(&self) -> FixtureResult<Box<dyn FixtureTransaction>> {
		let tx = self.pool.begin().await?;
		Ok(Box::new(SqliteFixtureTransaction { tx: Some(tx) }))
	}
}

/// SQLite-backed fixture transaction.
pub struct SqliteFixtureTransaction {
	tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteFixtureTransaction {
	fn live(&mut self) -> FixtureResult<&mut Transaction<'static, Sqlite>> {
		self.tx
			.as_mut()
			.ok_or_else(|| FixtureError::Transaction("Transaction already consumed".to_string()))
	}
}

#[async_trait]
impl FixtureTransaction for SqliteFixtureTransaction {
	async fn execute(&mut self, sql: &str, params: &[FixtureValue]) -> FixtureResult<u64> {
		let tx = self.live()?;
		let mut query = sqlx::query(sql);
		for param in params {
			query = bind_value(query, param);
		}
		let result = query.execute(&mut **tx).await?;
		Ok(result.rows_affected())
	}

	async fn fetch_optional(
		&mut self,
		sql: &str,
		params: &[FixtureValue],
	) -> FixtureResult<Option<Row>> {
		let tx = self.live()?;
		let mut query = sqlx::query(sql);
		for param in params {
			query = bind_value(query, param);
		}
		let row = query.fetch_optional(&mut **tx).await?;
		Ok(row.map(convert_row))
	}

	async fn commit(mut self: Box<Self>) -> FixtureResult<()> {
		let tx = self
			.tx
			.take()
			.ok_or_else(|| FixtureError::Transaction("Transaction already consumed".to_string()))?;
		tx.commit().await?;
		Ok(())
	}

	async fn rollback(mut self: Box<Self>) -> FixtureResult<()> {
		let tx = self
			.tx
			.take()
			.ok_or_else(|| FixtureError::Transaction("Transaction already consumed".to_string()))?;
		tx.rollback().await?;
		Ok(())
	}
}
