//! Server-side rendering of reinhardt-meta document metadata.
//!
//! [`ServerInjector`] resolves a component tree's declarations and renders
//! them to markup, field by field and placement by placement.
//! [`render_document`] wraps application markup in a complete document.
//!
//! Every emitted element carries the marker attribute valued with the
//! server app id, and `<html>` can carry the server-render marker, so the
//! client adopts server output instead of recreating it.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod document;
pub mod escape;
pub mod injector;
pub mod serialize;

pub use document::{DocumentShell, render_document};
pub use escape::{escape_json_for_script, html_escape};
pub use injector::{AttrsText, FieldText, ServerInjector, TagsText, TitleText};
pub use serialize::TextOptions;
