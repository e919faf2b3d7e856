//! Fixture discovery and the load entry point.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::connection::{FixtureConnection, FixtureTransaction, TransactionWork};
use crate::dialect::Dialect;
use crate::error::{FixtureError, FixtureResult};
use crate::fixture::{FixtureFile, FixtureFormat};
use crate::guard;

/// Replaces the contents of every table that has a fixture file in
/// `directory`.
///
/// The load is all or nothing: after the safety check and discovery, every
/// purge and insert runs inside one transaction with referential integrity
/// suspended, so files can be loaded in any order regardless of foreign
/// keys. On any failure the transaction is rolled back and the database is
/// left as it was.
///
/// Files are processed in file name order. Recognized extensions are
/// `.yml`, `.yaml` and `.json`; anything else in the directory is ignored.
///
/// # Arguments
///
/// * `directory` - Flat directory of fixture files, one per table
/// * `conn` - Open connection to the target database
/// * `dialect` - Dialect matching the target engine
///
/// # Errors
///
/// Returns [`FixtureError::UnsafeDatabase`] before touching any data when
/// the database name check fails, [`FixtureError::Discovery`] when the
/// directory or a file cannot be read, [`FixtureError::Parse`] when a
/// file's content is malformed, and the driver's own error unmodified when
/// a statement fails.
///
/// # Example
///
/// ```ignore
/// use reinhardt_fixtures::prelude::*;
///
/// load_fixtures("testdata/fixtures", &conn, &MySqlDialect).await?;
/// ```
pub async fn load_fixtures(
	directory: impl AsRef<Path>,
	conn: &dyn FixtureConnection,
	dialect: &dyn Dialect,
) -> FixtureResult<()> {
	let directory = directory.as_ref();

	guard::ensure_test_database(conn, dialect).await?;

	let files = discover_fixtures(directory)?;
	debug!(
		directory = %directory.display(),
		files = files.len(),
		"loading fixtures"
	);

	let body = DirectoryLoad {
		files: &files,
		dialect,
	};
	dialect.with_integrity_suspended(conn, &body).await
}

/// Scans a directory for fixture files and reads their content eagerly.
///
/// Only regular files with a recognized extension are kept. The result is
/// sorted by file name so loads are deterministic.
fn discover_fixtures(directory: &Path) -> FixtureResult<Vec<FixtureFile>> {
	let discovery_error = |path: &Path, source: std::io::Error| FixtureError::Discovery {
		path: path.display().to_string(),
		source,
	};

	let entries = std::fs::read_dir(directory).map_err(|source| discovery_error(directory, source))?;

	let mut files = Vec::new();
	for entry in entries {
		let entry = entry.map_err(|source| discovery_error(directory, source))?;
		let path = entry.path();
		if !path.is_file() {
			continue;
		}
		let Some(format) = FixtureFormat::from_path(&path) else {
			continue;
		};
		let content =
			std::fs::read_to_string(&path).map_err(|source| discovery_error(&path, source))?;
		files.push(FixtureFile::new(path, format, content));
	}

	files.sort_by(|a, b| a.file_name().cmp(b.file_name()));
	Ok(files)
}

/// Whole-directory load body run inside the suspended integrity window.
struct DirectoryLoad<'a> {
	files: &'a [FixtureFile],
	dialect: &'a dyn Dialect,
}

#[async_trait]
impl TransactionWork for DirectoryLoad<'_> {
	async fn run(&self, tx: &mut dyn FixtureTransaction) -> FixtureResult<()> {
		for file in self.files {
			debug!(table = file.table_name(), "reloading table");
			file.purge(tx, self.dialect).await?;
			let insert = TableInsert {
				file,
				dialect: self.dialect,
			};
			self.dialect
				.while_inserting(tx, file.table_name(), &insert)
				.await?;
		}
		Ok(())
	}
}

/// Insert body for one table, bracketed by the dialect's identity toggle.
struct TableInsert<'a> {
	file: &'a FixtureFile,
	dialect: &'a dyn Dialect,
}

#[async_trait]
impl TransactionWork for TableInsert<'_> {
	async fn run(&self, tx: &mut dyn FixtureTransaction) -> FixtureResult<()> {
		self.file.insert(tx, self.dialect).await
	}
}
