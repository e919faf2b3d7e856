//! Error types for fixture loading.
//!
//! This module defines the error types used throughout the reinhardt-fixtures crate.

use thiserror::Error;

/// Errors that can occur while loading fixtures.
#[derive(Debug, Error)]
pub enum FixtureError {
	/// The resolved database name does not look like a test database.
	#[error("Not a test database: {0:?}")]
	UnsafeDatabase(String),

	/// The fixture directory or one of its files could not be read.
	#[error("Fixture discovery failed at {path}: {source}")]
	Discovery {
		/// Path that could not be read.
		path: String,
		/// Underlying I/O error.
		#[source]
		source: std::io::Error,
	},

	/// A fixture file's content is malformed.
	#[error("Invalid fixture file {file}: {message}")]
	Parse {
		/// File the malformed content came from.
		file: String,
		/// What was wrong with it.
		message: String,
	},

	/// Statement execution failed; carries the driver's error unmodified.
	#[error("Database error: {0}")]
	Driver(Box<dyn std::error::Error + Send + Sync>),

	/// Transaction state error.
	#[error("Transaction error: {0}")]
	Transaction(String),
}

impl FixtureError {
	/// Wraps an arbitrary driver error.
	pub fn driver<E>(error: E) -> Self
	where
		E: std::error::Error + Send + Sync + 'static,
	{
		Self::Driver(Box::new(error))
	}
}

#[cfg(any(feature = "sqlite", feature = "mysql", feature = "postgres"))]
impl From<sqlx::Error> for FixtureError {
	fn from(error: sqlx::Error) -> Self {
		Self::Driver(Box::new(error))
	}
}

/// Result type alias for fixture operations.
pub type FixtureResult<T> = Result<T, FixtureError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_unsafe_database_error() {
		let error = FixtureError::UnsafeDatabase("production".to_string());
		assert_eq!(error.to_string(), "Not a test database: \"production\"");
	}

	#[rstest]
	fn test_discovery_error() {
		let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory");
		let error = FixtureError::Discovery {
			path: "testdata/fixtures".to_string(),
			source: io_error,
		};
		assert_eq!(
			error.to_string(),
			"Fixture discovery failed at testdata/fixtures: no such directory"
		);
	}

	#[rstest]
	fn test_parse_error() {
		let error = FixtureError::Parse {
			file: "users.yml".to_string(),
			message: "expected a sequence of mappings".to_string(),
		};
		assert_eq!(
			error.to_string(),
			"Invalid fixture file users.yml: expected a sequence of mappings"
		);
	}

	#[rstest]
	fn test_driver_error_wraps_source() {
		let io_error = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "connection reset");
		let error = FixtureError::driver(io_error);
		assert_eq!(error.to_string(), "Database error: connection reset");
		assert!(matches!(error, FixtureError::Driver(_)));
	}
}
