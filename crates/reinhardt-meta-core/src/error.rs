//! Error types for the metadata engine.
//!
//! Most recoverable conditions (malformed entries, invalid templates,
//! duplicate identifiers) are not errors at all: they are omitted and logged.
//! The variants below cover the few situations a caller has to act on.

use thiserror::Error;

/// Result type for metadata operations.
pub type MetaResult<T> = Result<T, MetaError>;

/// Metadata engine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum MetaError {
	/// The document has no element to host managed tags or attributes.
	///
	/// Fatal for the reconcile call that hit it only; the reconciler state is
	/// left as it was before the call.
	#[error("document has no <{0}> element")]
	MissingTarget(&'static str),

	/// Configuration values that cannot work together.
	#[error("invalid options: {0}")]
	InvalidOptions(String),

	/// Configuration text that does not parse.
	#[error("failed to parse configuration: {0}")]
	ConfigParse(String),

	/// Raw metadata input whose top level is not usable.
	#[error("invalid metadata input: {0}")]
	InvalidInput(String),
}

impl From<toml::de::Error> for MetaError {
	fn from(err: toml::de::Error) -> Self {
		Self::ConfigParse(err.to_string())
	}
}

impl From<serde_json::Error> for MetaError {
	fn from(err: serde_json::Error) -> Self {
		Self::ConfigParse(err.to_string())
	}
}
