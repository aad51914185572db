//! Escaping for server output.

pub use reinhardt_meta_core::descriptor::escape_json_for_script;

/// Escapes text for HTML content and double-quoted attribute values.
pub fn html_escape(s: &str) -> String {
	s.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
		.replace('"', "&quot;")
		.replace('\'', "&#x27;")
}

/// Escapes `value` unless `raw` is set.
pub(crate) fn escape_if(value: &str, raw: bool) -> String {
	if raw {
		value.to_string()
	} else {
		html_escape(value)
	}
}
