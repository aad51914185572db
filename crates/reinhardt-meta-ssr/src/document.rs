//! Full HTML document shell around server-rendered application markup.

use crate::escape::html_escape;
use crate::injector::ServerInjector;

/// Default id of the element wrapping the application markup.
pub const DEFAULT_CONTAINER_ID: &str = "app";

/// Renders a complete document around pre-rendered application markup.
#[derive(Debug, Clone)]
pub struct DocumentShell {
	/// Id of the element wrapping the application. `None` emits the markup bare.
	pub container_id: Option<String>,
	/// Put every tag on its own line.
	pub ln: bool,
}

impl Default for DocumentShell {
	fn default() -> Self {
		Self {
			container_id: Some(DEFAULT_CONTAINER_ID.to_string()),
			ln: true,
		}
	}
}

impl DocumentShell {
	/// Creates the default shell.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the container id.
	pub fn container_id(mut self, id: impl Into<String>) -> Self {
		self.container_id = Some(id.into());
		self
	}

	/// Emits the application markup without a container.
	pub fn no_container(mut self) -> Self {
		self.container_id = None;
		self
	}

	/// Disables line breaks between tags.
	pub fn compact(mut self) -> Self {
		self.ln = false;
		self
	}

	/// Renders the document.
	pub fn render(&self, injector: &ServerInjector, app_html: &str) -> String {
		let nl = if self.ln { "\n" } else { "" };
		let mut html = String::with_capacity(app_html.len() + 1024);

		html.push_str("<!DOCTYPE html>");
		html.push_str(nl);
		html.push_str(&start_tag("html", &injector.html_attrs().text(true)));
		html.push_str(nl);
		html.push_str(&start_tag("head", &injector.head_attrs().text(false)));
		html.push_str(nl);
		html.push_str(&injector.head(self.ln));
		html.push_str("</head>");
		html.push_str(nl);
		html.push_str(&start_tag("body", &injector.body_attrs().text(false)));
		html.push_str(nl);
		html.push_str(&injector.body_prepend(self.ln));

		match &self.container_id {
			Some(id) => {
				html.push_str(&format!("<div id=\"{}\">", html_escape(id)));
				html.push_str(app_html);
				html.push_str("</div>");
			}
			None => html.push_str(app_html),
		}
		html.push_str(nl);

		html.push_str(&injector.body_append(self.ln));
		html.push_str("</body>");
		html.push_str(nl);
		html.push_str("</html>");
		html
	}
}

/// Renders a document with the default shell.
pub fn render_document(injector: &ServerInjector, app_html: &str) -> String {
	DocumentShell::default().render(injector, app_html)
}

fn start_tag(name: &str, attrs: &str) -> String {
	if attrs.is_empty() {
		format!("<{}>", name)
	} else {
		format!("<{} {}>", name, attrs)
	}
}
