//! Safety checks keeping fixture loads away from non-test databases.
//!
//! Loading fixtures truncates every table it touches, so before any
//! destructive statement runs the resolved database name must match a
//! process-wide pattern (by default, any name containing `test`,
//! case-insensitive). The pattern and an explicit skip flag are global,
//! intended to be configured once at test-suite startup.

use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;

use crate::connection::FixtureConnection;
use crate::dialect::Dialect;
use crate::error::{FixtureError, FixtureResult};

/// Pattern the resolved database name must match before a load may run.
static DATABASE_NAME_PATTERN: Lazy<RwLock<Regex>> =
	Lazy::new(|| RwLock::new(Regex::new(r"(?i)test").expect("default pattern: invalid regex")));

/// Process-wide flag disabling the database name check entirely.
static SKIP_DATABASE_NAME_CHECK: AtomicBool = AtomicBool::new(false);

/// Replaces the pattern the target database name is checked against.
///
/// The default pattern accepts any name containing `test`, case-insensitive.
///
/// # Example
///
/// ```
/// # use regex::Regex;
/// reinhardt_fixtures::set_database_name_pattern(Regex::new(r"_test$").unwrap());
/// ```
pub fn set_database_name_pattern(pattern: Regex) {
	*DATABASE_NAME_PATTERN.write() = pattern;
}

/// Disables (or re-enables) the database name check process-wide.
///
/// Intended for environments where test databases are isolated by other
/// means and naming conventions cannot be relied on.
pub fn skip_database_name_check(skip: bool) {
	SKIP_DATABASE_NAME_CHECK.store(skip, Ordering::SeqCst);
}

/// Verifies the connection points at a test database.
///
/// Resolves the current database name through the dialect and checks it
/// against the configured pattern. A name that could not be determined
/// resolves to an empty string and is always rejected.
pub(crate) async fn ensure_test_database(
	conn: &dyn FixtureConnection,
	dialect: &dyn Dialect,
) -> FixtureResult<()> {
	if SKIP_DATABASE_NAME_CHECK.load(Ordering::SeqCst) {
		return Ok(());
	}

	let name = dialect.database_name(conn).await;
	if name.is_empty() || !DATABASE_NAME_PATTERN.read().is_match(&name) {
		return Err(FixtureError::UnsafeDatabase(name));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;

	#[rstest]
	#[serial]
	fn test_default_pattern_matches_test_names() {
		let pattern = DATABASE_NAME_PATTERN.read();
		assert!(pattern.is_match("myapp_test"));
		assert!(pattern.is_match("TEST_DB"));
		assert!(pattern.is_match("integration_tests"));
		assert!(!pattern.is_match("production"));
	}

	#[rstest]
	#[serial]
	fn test_set_database_name_pattern_replaces_rule() {
		set_database_name_pattern(Regex::new(r"^scratch_").unwrap());
		assert!(DATABASE_NAME_PATTERN.read().is_match("scratch_users"));
		assert!(!DATABASE_NAME_PATTERN.read().is_match("myapp_test"));

		set_database_name_pattern(Regex::new(r"(?i)test").unwrap());
		assert!(DATABASE_NAME_PATTERN.read().is_match("myapp_test"));
	}

	#[rstest]
	#[serial]
	fn test_skip_flag_round_trip() {
		assert!(!SKIP_DATABASE_NAME_CHECK.load(Ordering::SeqCst));
		skip_database_name_check(true);
		assert!(SKIP_DATABASE_NAME_CHECK.load(Ordering::SeqCst));
		skip_database_name_check(false);
		assert!(!SKIP_DATABASE_NAME_CHECK.load(Ordering::SeqCst));
	}
}
