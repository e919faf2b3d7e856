//! Fixture files and the statements they generate.
//!
//! One fixture file holds the full row set of one table; the table is named
//! after the file. Loading a file is always purge-then-insert, so the table
//! ends up containing exactly the declared rows.

use std::path::{Path, PathBuf};

use crate::connection::FixtureTransaction;
use crate::dialect::{Dialect, ParamStyle};
use crate::error::{FixtureError, FixtureResult};
use crate::value::FixtureValue;

/// Supported fixture file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixtureFormat {
	/// YAML format (`.yml`, `.yaml`).
	Yaml,

	/// JSON format (`.json`).
	Json,
}

impl FixtureFormat {
	/// Determines the fixture format from a file extension.
	///
	/// # Example
	///
	/// ```
	/// # use reinhardt_fixtures::FixtureFormat;
	/// assert_eq!(FixtureFormat::from_extension("yml"), Some(FixtureFormat::Yaml));
	/// assert_eq!(FixtureFormat::from_extension("json"), Some(FixtureFormat::Json));
	/// assert_eq!(FixtureFormat::from_extension("csv"), None);
	/// ```
	pub fn from_extension(ext: &str) -> Option<Self> {
		match ext.to_lowercase().as_str() {
			"yaml" | "yml" => Some(Self::Yaml),
			"json" => Some(Self::Json),
			_ => None,
		}
	}

	/// Determines the fixture format from a file path.
	pub fn from_path(path: &Path) -> Option<Self> {
		path.extension()
			.and_then(|ext| ext.to_str())
			.and_then(Self::from_extension)
	}
}

impl std::fmt::Display for FixtureFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Yaml => write!(f, "YAML"),
			Self::Json => write!(f, "JSON"),
		}
	}
}

/// One decoded fixture row. Columns keep their decode order; YAML mappings
/// preserve file order, JSON objects decode sorted by key. Inserts name
/// every column, so the order never matters beyond readability.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FixtureRow {
	pub(crate) columns: Vec<(String, FixtureValue)>,
}

/// One fixture file, mapped to the table named after it.
#[derive(Debug, Clone)]
pub struct FixtureFile {
	path: PathBuf,
	file_name: String,
	table_name: String,
	format: FixtureFormat,
	content: String,
}

impl FixtureFile {
	pub(crate) fn new(path: PathBuf, format: FixtureFormat, content: String) -> Self {
		let file_name = path
			.file_name()
			.and_then(|name| name.to_str())
			.unwrap_or_default()
			.to_string();
		let table_name = path
			.file_stem()
			.and_then(|stem| stem.to_str())
			.unwrap_or_default()
			.to_string();
		Self {
			path,
			file_name,
			table_name,
			format,
			content,
		}
	}

	/// Table this file loads into, the file name minus its extension.
	pub fn table_name(&self) -> &str {
		&self.table_name
	}

	/// File name including the extension.
	pub fn file_name(&self) -> &str {
		&self.file_name
	}

	/// Path the file was discovered at.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Format the content will be decoded as.
	pub fn format(&self) -> FixtureFormat {
		self.format
	}

	/// Deletes every existing row of the target table.
	pub(crate) async fn purge(
		&self,
		tx: &mut dyn FixtureTransaction,
		dialect: &dyn Dialect,
	) -> FixtureResult<()> {
		let sql = format!(
			"DELETE FROM {}",
			dialect.quote_identifier(self.table_name())
		);
		tx.execute(&sql, &[]).await?;
		Ok(())
	}

	/// Inserts the declared rows, one parameterized statement per row.
	///
	/// Fails fast on the first row that errors; the enclosing transaction is
	/// rolled back by the caller.
	pub(crate) async fn insert(
		&self,
		tx: &mut dyn FixtureTransaction,
		dialect: &dyn Dialect,
	) -> FixtureResult<()> {
		let rows = self.rows()?;
		for row in &rows {
			let (sql, params) = build_row_insert(dialect, self.table_name(), row);
			tx.execute(&sql, &params).await?;
		}
		Ok(())
	}

	/// Decodes the raw content into typed rows.
	fn rows(&self) -> FixtureResult<Vec<FixtureRow>> {
		match self.format {
			FixtureFormat::Yaml => self.rows_from_yaml(),
			FixtureFormat::Json => self.rows_from_json(),
		}
	}

	fn rows_from_yaml(&self) -> FixtureResult<Vec<FixtureRow>> {
		let document: serde_yaml::Value =
			serde_yaml::from_str(&self.content).map_err(|e| self.parse_error(e.to_string()))?;
		let records = match document {
			// An empty file still purges its table, it just inserts nothing.
			serde_yaml::Value::Null => return Ok(Vec::new()),
			serde_yaml::Value::Sequence(records) => records,
			_ => return Err(self.parse_error("expected a top-level sequence of records")),
		};

		records
			.iter()
			.enumerate()
			.map(|(index, record)| {
				let serde_yaml::Value::Mapping(mapping) = record else {
					return Err(self.parse_error(format!("record at index {index} is not a mapping")));
				};
				let mut columns = Vec::with_capacity(mapping.len());
				for (key, value) in mapping {
					let serde_yaml::Value::String(column) = key else {
						return Err(self.parse_error(format!(
							"record at index {index} has a non-string column name"
						)));
					};
					let value = FixtureValue::from_yaml_scalar(value).ok_or_else(|| {
						self.parse_error(format!(
							"column {column:?} at index {index} is not a scalar"
						))
					})?;
					columns.push((column.clone(), value));
				}
				Ok(FixtureRow { columns })
			})
			.collect()
	}

	fn rows_from_json(&self) -> FixtureResult<Vec<FixtureRow>> {
		let document: serde_json::Value =
			serde_json::from_str(&self.content).map_err(|e| self.parse_error(e.to_string()))?;
		let records = match document {
			serde_json::Value::Null => return Ok(Vec::new()),
			serde_json::Value::Array(records) => records,
			_ => return Err(self.parse_error("expected a top-level array of records")),
		};

		records
			.iter()
			.enumerate()
			.map(|(index, record)| {
				let serde_json::Value::Object(object) = record else {
					return Err(self.parse_error(format!("record at index {index} is not an object")));
				};
				let mut columns = Vec::with_capacity(object.len());
				for (column, value) in object {
					let value = FixtureValue::from_json_scalar(value).ok_or_else(|| {
						self.parse_error(format!(
							"column {column:?} at index {index} is not a scalar"
						))
					})?;
					columns.push((column.clone(), value));
				}
				Ok(FixtureRow { columns })
			})
			.collect()
	}

	fn parse_error(&self, message: impl Into<String>) -> FixtureError {
		FixtureError::Parse {
			file: self.file_name.clone(),
			message: message.into(),
		}
	}
}

/// Builds one INSERT statement for a row in the dialect's parameter style.
///
/// NULL values become an inline `NULL` keyword instead of a bound
/// placeholder, so placeholder numbering only counts actual parameters.
/// Date and time values under the colon style bind as formatted strings
/// wrapped in `to_date`.
pub(crate) fn build_row_insert(
	dialect: &dyn Dialect,
	table: &str,
	row: &FixtureRow,
) -> (String, Vec<FixtureValue>) {
	let mut columns = String::new();
	let mut placeholders = String::new();
	let mut params = Vec::new();

	for (column, value) in &row.columns {
		if !columns.is_empty() {
			columns.push_str(", ");
			placeholders.push_str(", ");
		}
		columns.push_str(&dialect.quote_identifier(column));

		if matches!(value, FixtureValue::Null) {
			placeholders.push_str("NULL");
			continue;
		}

		let index = params.len() + 1;
		match dialect.param_style() {
			ParamStyle::Question => placeholders.push('?'),
			ParamStyle::DollarNumbered => placeholders.push_str(&format!("${index}")),
			ParamStyle::ColonNumbered => match value {
				FixtureValue::DateTime(_) => placeholders
					.push_str(&format!("to_date(:{index}, 'YYYY-MM-DD HH24:MI:SS')")),
				FixtureValue::Date(_) => {
					placeholders.push_str(&format!("to_date(:{index}, 'YYYY-MM-DD')"))
				}
				FixtureValue::Time(_) => {
					placeholders.push_str(&format!("to_date(:{index}, 'HH24:MI:SS')"))
				}
				_ => placeholders.push_str(&format!(":{index}")),
			},
		}
		params.push(bind_param(dialect.param_style(), value));
	}

	let sql = format!(
		"INSERT INTO {} ({}) VALUES ({})",
		dialect.quote_identifier(table),
		columns,
		placeholders
	);
	(sql, params)
}

/// Renders a value for binding; colon-style temporal values become the
/// string form their `to_date` mask expects.
fn bind_param(style: ParamStyle, value: &FixtureValue) -> FixtureValue {
	if style == ParamStyle::ColonNumbered {
		match value {
			FixtureValue::Date(date) => {
				return FixtureValue::String(date.format("%Y-%m-%d").to_string());
			}
			FixtureValue::Time(time) => {
				return FixtureValue::String(time.format("%H:%M:%S").to_string());
			}
			FixtureValue::DateTime(datetime) => {
				return FixtureValue::String(datetime.format("%Y-%m-%d %H:%M:%S").to_string());
			}
			_ => {}
		}
	}
	value.clone()
}
