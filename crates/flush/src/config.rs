//! Flush queue configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Longest a single flush may keep the event loop busy before yielding.
pub const DEFAULT_FLUSH_BUDGET: Duration = Duration::from_millis(5);

/// Default name of the event loop thread.
pub const DEFAULT_THREAD_NAME: &str = "sluice-ui";

/// Runtime settings for a [`FlushQueue`](crate::FlushQueue) and its event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushConfig {
	/// Time budget of one flush.
	pub budget: Duration,
	/// Surface task failures as [`FlushError`](crate::FlushError) instead of logging them.
	pub rethrow_errors: bool,
	pub thread_name: String,
}

impl Default for FlushConfig {
	fn default() -> Self {
		Self {
			budget: DEFAULT_FLUSH_BUDGET,
			rethrow_errors: false,
			thread_name: DEFAULT_THREAD_NAME.to_owned(),
		}
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawFlushConfig {
	budget_ms: Option<u64>,
	rethrow_errors: Option<bool>,
	thread_name: Option<String>,
}

impl FlushConfig {
	/// Test-mode configuration: failures are returned to the caller.
	pub fn rethrowing() -> Self {
		Self {
			rethrow_errors: true,
			..Self::default()
		}
	}

	pub fn with_budget(mut self, budget: Duration) -> Self {
		self.budget = budget;
		self
	}

	/// Parses a TOML table. Missing keys keep their defaults.
	///
	/// ```toml
	/// budget_ms = 5
	/// rethrow_errors = false
	/// thread_name = "sluice-ui"
	/// ```
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let raw: RawFlushConfig = toml::from_str(input)?;
		let mut config = Self::default();

		if let Some(ms) = raw.budget_ms {
			if ms == 0 {
				return Err(ConfigError::InvalidBudget(ms));
			}
			config.budget = Duration::from_millis(ms);
		}
		if let Some(rethrow) = raw.rethrow_errors {
			config.rethrow_errors = rethrow;
		}
		if let Some(name) = raw.thread_name {
			if name.trim().is_empty() {
				return Err(ConfigError::EmptyThreadName);
			}
			config.thread_name = name;
		}

		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_input_is_default() {
		assert_eq!(FlushConfig::from_toml_str("").unwrap(), FlushConfig::default());
		assert_eq!(FlushConfig::default().budget, Duration::from_millis(5));
	}

	#[test]
	fn fields_override_defaults() {
		let config = FlushConfig::from_toml_str("budget_ms = 16\nrethrow_errors = true\nthread_name = \"edt\"\n").unwrap();
		assert_eq!(config.budget, Duration::from_millis(16));
		assert!(config.rethrow_errors);
		assert_eq!(config.thread_name, "edt");
	}

	#[test]
	fn rejects_bad_values() {
		assert!(matches!(FlushConfig::from_toml_str("budget_ms = 0"), Err(ConfigError::InvalidBudget(0))));
		assert!(matches!(FlushConfig::from_toml_str("thread_name = \" \""), Err(ConfigError::EmptyThreadName)));
		assert!(matches!(FlushConfig::from_toml_str("budget = 5"), Err(ConfigError::Toml(_))));
		assert!(matches!(FlushConfig::from_toml_str("budget_ms = \"fast\""), Err(ConfigError::Toml(_))));
	}
}
