//! MySQL driver adapter.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, MySql, Row as SqlxRow, Transaction};

use crate::connection::{FixtureConnection, FixtureTransaction};
use crate::error::{FixtureError, FixtureResult};
use crate::value::{FixtureValue, Row};

/// MySQL-backed fixture connection.
///
/// `FOREIGN_KEY_CHECKS` is a session variable, so the pool must hold exactly
/// one connection for the suspension to cover the load transaction;
/// [`connect`] sets this up.
///
/// [`connect`]: MySqlFixtureConnection::connect
pub struct MySqlFixtureConnection {
	pool: Arc<MySqlPool>,
}

impl MySqlFixtureConnection {
	/// Wraps an existing pool.
	pub fn new(pool: MySqlPool) -> Self {
		Self {
			pool: Arc::new(pool),
		}
	}

	/// Connects to a MySQL database with a single-connection pool.
	pub async fn connect(url: &str) -> FixtureResult<Self> {
		let pool = MySqlPoolOptions::new()
			.max_connections(1)
			.connect(url)
			.await?;
		Ok(Self::new(pool))
	}

	/// Returns the underlying pool.
	pub fn pool(&self) -> &MySqlPool {
		&self.pool
	}
}

fn bind_value<'q>(
	query: sqlx::query::Query<'q, MySql, sqlx::mysql::MySqlArguments>,
	value: &'q FixtureValue,
) -> sqlx::query::Query<'q, MySql, sqlx::mysql::MySqlArguments> {
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

fn convert_row(mysql_row: MySqlRow) -> Row {
	let mut row = Row::new();
	for column in mysql_row.columns() {
		let name = column.name();
		let value = if let Ok(Some(i)) = mysql_row.try_get::<Option<i64>, _>(name) {
			FixtureValue::Int(i)
		} else if let Ok(Some(f)) = mysql_row.try_get::<Option<f64>, _>(name) {
			FixtureValue::Float(f)
		} else if let Ok(Some(s)) = mysql_row.try_get::<Option<String>, _>(name) {
			FixtureValue::String(s)
		} else {
			FixtureValue::Null
		};
		row.insert(name.to_string(), value);
	}
	row
}

#[async_trait]
impl FixtureConnection for MySqlFixtureConnection {
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
		Ok(Box::new(MySqlFixtureTransaction { tx: Some(tx) }))
	}
}

/// MySQL-backed fixture transaction.
pub struct MySqlFixtureTransaction {
	tx: Option<Transaction<'static, MySql>>,
}

impl MySqlFixtureTransaction {
	fn live(&mut self) -> FixtureResult<&mut Transaction<'static, MySql>> {
		self.tx
			.as_mut()
			.ok_or_else(|| FixtureError::Transaction("Transaction already consumed".to_string()))
	}
}

#[async_trait]
impl FixtureTransaction for MySqlFixtureTransaction {
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
