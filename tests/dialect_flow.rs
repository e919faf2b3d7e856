//! Statement-order tests for the dialect helpers.
//!
//! A scripted connection records every statement the loader issues, so these
//! tests pin down the bracketing each engine needs: integrity toggles outside
//! the transaction, purge and insert order inside it, and restoration after
//! both success and failure.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use reinhardt_fixtures::prelude::*;
use tempfile::TempDir;

const POSTS_YML: &str = "- id: 1\n  user_id: 1\n  title: First\n";
const USERS_YML: &str = "- id: 1\n  name: Ada\n";

fn write_fixture_dir(files: &[(&str, &str)]) -> TempDir {
	let dir = tempfile::tempdir().expect("Failed to create temp dir");
	for (name, content) in files {
		std::fs::write(dir.path().join(name), content).expect("Failed to write fixture");
	}
	dir
}

fn scripted_failure(sql: &str) -> FixtureError {
	FixtureError::driver(std::io::Error::other(format!("scripted failure: {}", sql)))
}

/// What the scripted connection should answer and where it should fail.
#[derive(Default)]
struct MockScript {
	database_name: String,
	tables: Vec<String>,
	identity_tables: Vec<String>,
	constraints: Vec<(String, String)>,
	fail_execute_containing: Option<String>,
	fail_tx_execute_containing: Option<String>,
	fail_fetch_all_containing: Option<String>,
}

/// Connection double that logs every call instead of talking to a database.
struct ScriptedConnection {
	script: Arc<MockScript>,
	log: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConnection {
	fn new(script: MockScript) -> Self {
		Self {
			script: Arc::new(script),
			log: Arc::new(Mutex::new(Vec::new())),
		}
	}

	fn log(&self) -> Vec<String> {
		self.log.lock().clone()
	}

	/// The log without metadata queries, leaving only state-changing calls.
	fn writes(&self) -> Vec<String> {
		self.log()
			.into_iter()
			.filter(|entry| !entry.starts_with("conn fetch:") && !entry.starts_with("tx fetch:"))
			.collect()
	}
}

#[async_trait]
impl FixtureConnection for ScriptedConnection {
	async fn execute(&self, sql: &str, _params: &[FixtureValue]) -> FixtureResult<u64> {
		self.log.lock().push(format!("conn: {}", sql));
		if let Some(fragment) = &self.script.fail_execute_containing {
			if sql.contains(fragment.as_str()) {
				return Err(scripted_failure(sql));
			}
		}
		Ok(1)
	}

	async fn fetch_optional(
		&self,
		sql: &str,
		_params: &[FixtureValue],
	) -> FixtureResult<Option<Row>> {
		self.log.lock().push(format!("conn fetch: {}", sql));
		if sql.contains("database_name") {
			let mut row = Row::new();
			row.insert(
				"database_name".to_string(),
				FixtureValue::from(self.script.database_name.as_str()),
			);
			return Ok(Some(row));
		}
		Ok(None)
	}

	async fn fetch_all(&self, sql: &str, _params: &[FixtureValue]) -> FixtureResult<Vec<Row>> {
		self.log.lock().push(format!("conn fetch: {}", sql));
		if let Some(fragment) = &self.script.fail_fetch_all_containing {
			if sql.contains(fragment.as_str()) {
				return Err(scripted_failure(sql));
			}
		}
		if sql.contains("user_constraints") {
			return Ok(self
				.script
				.constraints
				.iter()
				.map(|(table, constraint)| {
					let mut row = Row::new();
					row.insert("table_name".to_string(), FixtureValue::from(table.as_str()));
					row.insert(
						"constraint_name".to_string(),
						FixtureValue::from(constraint.as_str()),
					);
					row
				})
				.collect());
		}
		if sql.contains("information_schema.tables") {
			return Ok(self
				.script
				.tables
				.iter()
				.map(|table| {
					let mut row = Row::new();
					row.insert("table_name".to_string(), FixtureValue::from(table.as_str()));
					row
				})
				.collect());
		}
		Ok(Vec::new())
	}

	async fn begin(&self) -> FixtureResult<Box<dyn FixtureTransaction>> {
		self.log.lock().push("begin".to_string());
		Ok(Box::new(ScriptedTransaction {
			script: Arc::clone(&self.script),
			log: Arc::clone(&self.log),
		}))
	}
}

struct ScriptedTransaction {
	script: Arc<MockScript>,
	log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl FixtureTransaction for ScriptedTransaction {
	async fn execute(&mut self, sql: &str, _params: &[FixtureValue]) -> FixtureResult<u64> {
		self.log.lock().push(format!("tx: {}", sql));
		if let Some(fragment) = &self.script.fail_tx_execute_containing {
			if sql.contains(fragment.as_str()) {
				return Err(scripted_failure(sql));
			}
		}
		Ok(1)
	}

	async fn fetch_optional(
		&mut self,
		sql: &str,
		params: &[FixtureValue],
	) -> FixtureResult<Option<Row>> {
		self.log.lock().push(format!("tx fetch: {}", sql));
		if sql.contains("identity_columns") {
			let table = match params.first() {
				Some(FixtureValue::String(name)) => name.clone(),
				_ => String::new(),
			};
			let count = i64::from(self.script.identity_tables.contains(&table));
			let mut row = Row::new();
			row.insert("identity_columns".to_string(), FixtureValue::Int(count));
			return Ok(Some(row));
		}
		Ok(None)
	}

	async fn commit(self: Box<Self>) -> FixtureResult<()> {
		self.log.lock().push("commit".to_string());
		Ok(())
	}

	async fn rollback(self: Box<Self>) -> FixtureResult<()> {
		self.log.lock().push("rollback".to_string());
		Ok(())
	}
}

#[tokio::test]
async fn test_mysql_brackets_load_with_session_toggles() {
	let dir = write_fixture_dir(&[("posts.yml", POSTS_YML), ("users.yml", USERS_YML)]);
	let conn = ScriptedConnection::new(MockScript {
		database_name: "app_test".to_string(),
		..MockScript::default()
	});

	load_fixtures(dir.path(), &conn, &MySqlDialect)
		.await
		.expect("Failed to load");

	assert_eq!(conn.log(), [
		"conn fetch: SELECT DATABASE() AS database_name",
		"conn: SET FOREIGN_KEY_CHECKS = 0",
		"begin",
		"tx: DELETE FROM `posts`",
		"tx: INSERT INTO `posts` (`id`, `user_id`, `title`) VALUES (?, ?, ?)",
		"tx: DELETE FROM `users`",
		"tx: INSERT INTO `users` (`id`, `name`) VALUES (?, ?)",
		"commit",
		"conn: SET FOREIGN_KEY_CHECKS = 1",
	]);
}

#[tokio::test]
async fn test_mysql_restores_checks_when_disable_fails() {
	let dir = write_fixture_dir(&[("users.yml", USERS_YML)]);
	let conn = ScriptedConnection::new(MockScript {
		database_name: "app_test".to_string(),
		fail_execute_containing: Some("FOREIGN_KEY_CHECKS = 0".to_string()),
		..MockScript::default()
	});

	let result = load_fixtures(dir.path(), &conn, &MySqlDialect).await;

	assert!(matches!(result, Err(FixtureError::Driver(_))));
	assert_eq!(conn.log(), [
		"conn fetch: SELECT DATABASE() AS database_name",
		"conn: SET FOREIGN_KEY_CHECKS = 0",
		"conn: SET FOREIGN_KEY_CHECKS = 1",
	]);
}

#[tokio::test]
async fn test_mysql_failed_insert_rolls_back_then_restores() {
	let dir = write_fixture_dir(&[("posts.yml", POSTS_YML), ("users.yml", USERS_YML)]);
	let conn = ScriptedConnection::new(MockScript {
		database_name: "app_test".to_string(),
		fail_tx_execute_containing: Some("INSERT INTO `users`".to_string()),
		..MockScript::default()
	});

	let result = load_fixtures(dir.path(), &conn, &MySqlDialect).await;

	assert!(matches!(result, Err(FixtureError::Driver(_))));
	assert_eq!(conn.log(), [
		"conn fetch: SELECT DATABASE() AS database_name",
		"conn: SET FOREIGN_KEY_CHECKS = 0",
		"begin",
		"tx: DELETE FROM `posts`",
		"tx: INSERT INTO `posts` (`id`, `user_id`, `title`) VALUES (?, ?, ?)",
		"tx: DELETE FROM `users`",
		"tx: INSERT INTO `users` (`id`, `name`) VALUES (?, ?)",
		"rollback",
		"conn: SET FOREIGN_KEY_CHECKS = 1",
	]);
}

#[tokio::test]
async fn test_sqlite_defers_foreign_keys_for_the_load() {
	let dir = write_fixture_dir(&[("posts.yml", POSTS_YML), ("users.yml", USERS_YML)]);
	let conn = ScriptedConnection::new(MockScript {
		database_name: "scratch_test.db".to_string(),
		..MockScript::default()
	});

	load_fixtures(dir.path(), &conn, &SqliteDialect)
		.await
		.expect("Failed to load");

	assert_eq!(conn.log(), [
		"conn fetch: SELECT file AS database_name FROM pragma_database_list WHERE name = 'main'",
		"conn: PRAGMA defer_foreign_keys = ON",
		"begin",
		"tx: DELETE FROM \"posts\"",
		"tx: INSERT INTO \"posts\" (\"id\", \"user_id\", \"title\") VALUES (?, ?, ?)",
		"tx: DELETE FROM \"users\"",
		"tx: INSERT INTO \"users\" (\"id\", \"name\") VALUES (?, ?)",
		"commit",
		"conn: PRAGMA defer_foreign_keys = OFF",
	]);
}

#[tokio::test]
async fn test_guard_rejects_before_any_write() {
	let dir = write_fixture_dir(&[("users.yml", USERS_YML)]);
	let conn = ScriptedConnection::new(MockScript {
		database_name: "production".to_string(),
		..MockScript::default()
	});

	let result = load_fixtures(dir.path(), &conn, &MySqlDialect).await;

	match result {
		Err(FixtureError::UnsafeDatabase(name)) => assert_eq!(name, "production"),
		other => panic!("expected the safety guard to reject, got {:?}", other),
	}
	assert_eq!(conn.log(), ["conn fetch: SELECT DATABASE() AS database_name"]);
}

#[tokio::test]
async fn test_postgres_toggles_triggers_per_table() {
	let dir = write_fixture_dir(&[("posts.yml", POSTS_YML), ("users.yml", USERS_YML)]);
	let conn = ScriptedConnection::new(MockScript {
		database_name: "app_test".to_string(),
		tables: vec!["posts".to_string(), "users".to_string()],
		..MockScript::default()
	});

	load_fixtures(dir.path(), &conn, &PostgresDialect)
		.await
		.expect("Failed to load");

	assert_eq!(conn.writes(), [
		"conn: ALTER TABLE \"posts\" DISABLE TRIGGER ALL",
		"conn: ALTER TABLE \"users\" DISABLE TRIGGER ALL",
		"begin",
		"tx: DELETE FROM \"posts\"",
		"tx: INSERT INTO \"posts\" (\"id\", \"user_id\", \"title\") VALUES ($1, $2, $3)",
		"tx: DELETE FROM \"users\"",
		"tx: INSERT INTO \"users\" (\"id\", \"name\") VALUES ($1, $2)",
		"commit",
		"conn: ALTER TABLE \"posts\" ENABLE TRIGGER ALL",
		"conn: ALTER TABLE \"users\" ENABLE TRIGGER ALL",
	]);
}

#[tokio::test]
async fn test_postgres_reenables_triggers_when_disable_fails() {
	let dir = write_fixture_dir(&[("users.yml", USERS_YML)]);
	let conn = ScriptedConnection::new(MockScript {
		database_name: "app_test".to_string(),
		tables: vec!["posts".to_string(), "users".to_string()],
		fail_execute_containing: Some("DISABLE TRIGGER".to_string()),
		..MockScript::default()
	});

	let result = load_fixtures(dir.path(), &conn, &PostgresDialect).await;

	assert!(matches!(result, Err(FixtureError::Driver(_))));
	// The first disable fails, no transaction is opened, and every table is
	// still re-enabled afterwards.
	assert_eq!(conn.writes(), [
		"conn: ALTER TABLE \"posts\" DISABLE TRIGGER ALL",
		"conn: ALTER TABLE \"posts\" ENABLE TRIGGER ALL",
		"conn: ALTER TABLE \"users\" ENABLE TRIGGER ALL",
	]);
}

#[tokio::test]
async fn test_postgres_table_listing_failure_aborts_before_any_toggle() {
	let dir = write_fixture_dir(&[("users.yml", USERS_YML)]);
	let conn = ScriptedConnection::new(MockScript {
		database_name: "app_test".to_string(),
		tables: vec!["users".to_string()],
		fail_fetch_all_containing: Some("information_schema.tables".to_string()),
		..MockScript::default()
	});

	let result = load_fixtures(dir.path(), &conn, &PostgresDialect).await;

	// Nothing was disabled, so there is nothing to restore and no
	// transaction to roll back.
	assert!(matches!(result, Err(FixtureError::Driver(_))));
	assert_eq!(conn.writes(), Vec::<String>::new());
}

#[tokio::test]
async fn test_sqlserver_wraps_identity_tables() {
	let dir = write_fixture_dir(&[("posts.yml", POSTS_YML), ("users.yml", USERS_YML)]);
	let conn = ScriptedConnection::new(MockScript {
		database_name: "app_test".to_string(),
		tables: vec!["posts".to_string(), "users".to_string()],
		identity_tables: vec!["users".to_string()],
		..MockScript::default()
	});

	load_fixtures(dir.path(), &conn, &SqlServerDialect)
		.await
		.expect("Failed to load");

	assert_eq!(conn.writes(), [
		"conn: ALTER TABLE [posts] NOCHECK CONSTRAINT ALL",
		"conn: ALTER TABLE [users] NOCHECK CONSTRAINT ALL",
		"begin",
		"tx: DELETE FROM [posts]",
		"tx: INSERT INTO [posts] ([id], [user_id], [title]) VALUES (?, ?, ?)",
		"tx: DELETE FROM [users]",
		"tx: SET IDENTITY_INSERT [users] ON",
		"tx: INSERT INTO [users] ([id], [name]) VALUES (?, ?)",
		"tx: SET IDENTITY_INSERT [users] OFF",
		"commit",
		"conn: ALTER TABLE [posts] WITH CHECK CHECK CONSTRAINT ALL",
		"conn: ALTER TABLE [users] WITH CHECK CHECK CONSTRAINT ALL",
	]);
}

#[tokio::test]
async fn test_sqlserver_table_listing_aliases_the_name_column() {
	let dir = write_fixture_dir(&[("users.yml", USERS_YML)]);
	let conn = ScriptedConnection::new(MockScript {
		database_name: "app_test".to_string(),
		tables: vec!["users".to_string()],
		..MockScript::default()
	});

	load_fixtures(dir.path(), &conn, &SqlServerDialect)
		.await
		.expect("Failed to load");

	// The alias keeps the lookup key fixed whatever case the catalog
	// reports the column in.
	let tables_query = "conn fetch: SELECT table_name AS table_name \
	                    FROM information_schema.tables WHERE table_type = 'BASE TABLE' \
	                    ORDER BY table_name";
	assert!(conn.log().iter().any(|entry| entry == tables_query));
}

#[tokio::test]
async fn test_sqlserver_resets_identity_insert_after_failure() {
	let dir = write_fixture_dir(&[("posts.yml", POSTS_YML), ("users.yml", USERS_YML)]);
	let conn = ScriptedConnection::new(MockScript {
		database_name: "app_test".to_string(),
		tables: vec!["posts".to_string(), "users".to_string()],
		identity_tables: vec!["users".to_string()],
		fail_tx_execute_containing: Some("INSERT INTO [users]".to_string()),
		..MockScript::default()
	});

	let result = load_fixtures(dir.path(), &conn, &SqlServerDialect).await;

	assert!(matches!(result, Err(FixtureError::Driver(_))));
	assert_eq!(conn.writes(), [
		"conn: ALTER TABLE [posts] NOCHECK CONSTRAINT ALL",
		"conn: ALTER TABLE [users] NOCHECK CONSTRAINT ALL",
		"begin",
		"tx: DELETE FROM [posts]",
		"tx: INSERT INTO [posts] ([id], [user_id], [title]) VALUES (?, ?, ?)",
		"tx: DELETE FROM [users]",
		"tx: SET IDENTITY_INSERT [users] ON",
		"tx: INSERT INTO [users] ([id], [name]) VALUES (?, ?)",
		"tx: SET IDENTITY_INSERT [users] OFF",
		"rollback",
		"conn: ALTER TABLE [posts] WITH CHECK CHECK CONSTRAINT ALL",
		"conn: ALTER TABLE [users] WITH CHECK CHECK CONSTRAINT ALL",
	]);
}

#[tokio::test]
async fn test_oracle_toggles_named_constraints() {
	let dir = write_fixture_dir(&[("posts.yml", POSTS_YML), ("users.yml", USERS_YML)]);
	let conn = ScriptedConnection::new(MockScript {
		database_name: "APP_TEST".to_string(),
		constraints: vec![("POSTS".to_string(), "FK_POSTS_USERS".to_string())],
		..MockScript::default()
	});

	load_fixtures(dir.path(), &conn, &OracleDialect)
		.await
		.expect("Failed to load");

	assert_eq!(conn.writes(), [
		"conn: ALTER TABLE \"POSTS\" DISABLE CONSTRAINT \"FK_POSTS_USERS\"",
		"begin",
		"tx: DELETE FROM \"POSTS\"",
		"tx: INSERT INTO \"POSTS\" (\"ID\", \"USER_ID\", \"TITLE\") VALUES (:1, :2, :3)",
		"tx: DELETE FROM \"USERS\"",
		"tx: INSERT INTO \"USERS\" (\"ID\", \"NAME\") VALUES (:1, :2)",
		"commit",
		"conn: ALTER TABLE \"POSTS\" ENABLE CONSTRAINT \"FK_POSTS_USERS\"",
	]);
}
