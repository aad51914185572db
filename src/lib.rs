//! # Reinhardt Meta
//!
//! Document metadata for component-based Rust web apps: the page title,
//! `<meta>`/`<link>`/`<style>`/`<script>`/`<noscript>`/`<base>` tags and the
//! attributes of `<html>`, `<head>` and `<body>`.
//!
//! Every component declares its own [`RawMetaInfo`](core::RawMetaInfo). The
//! engine merges the declarations of a whole component tree, descendants
//! overriding ancestors, and then either:
//!
//! - renders them to markup on the server (`ssr`), marking every emitted
//!   element so the client can adopt it, or
//! - keeps a live document in sync on the client (`client`), touching only
//!   the elements whose output changed.
//!
//! ## Feature Flags
//!
//! - `ssr` (default) - Server-side serializer ([`ssr`])
//! - `client` (default) - DOM reconciler, in-memory document and manager ([`client`])
//! - `web` - Browser document backed by `web-sys` (`wasm32` only)
//!
//! ## Quick Example
//!
//! ```rust
//! # #[cfg(feature = "ssr")]
//! # {
//! use reinhardt_meta::prelude::*;
//! use reinhardt_meta::ssr::{ServerInjector, TextOptions};
//!
//! let tree = MetaTree::with_meta(
//!     RawMetaInfo::new()
//!         .title_template("%s | Example")
//!         .meta(RawTag::charset("utf-8")),
//! )
//! .child(MetaTree::with_meta(RawMetaInfo::new().title("About")));
//!
//! let options = MetaOptions::default();
//! let injector = ServerInjector::new(&collect_meta_info(&tree), &options).unwrap();
//!
//! assert_eq!(injector.title().text(), "<title>About | Example</title>");
//! assert_eq!(
//!     injector.meta().text(TextOptions::new()),
//!     r#"<meta data-rh-meta="ssr" charset="utf-8">"#
//! );
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// Metadata model, merge resolver and tag generator.
pub use reinhardt_meta_core as core;

/// Server-side serializer.
#[cfg(feature = "ssr")]
pub use reinhardt_meta_ssr as ssr;

/// Client-side reconciler.
#[cfg(feature = "client")]
pub use reinhardt_meta_client as client;

pub use reinhardt_meta_core::{
	MergePolicy, MergedMetaInfo, MetaError, MetaOptions, MetaResult, RawMetaInfo, RawTag,
	RenderInstructions, generate, resolve,
};

#[cfg(feature = "ssr")]
pub use reinhardt_meta_ssr::{ServerInjector, render_document};

#[cfg(feature = "client")]
pub use reinhardt_meta_client::{MemoryDocument, MetaDom, MetaManager, Reconciler};

/// Re-export commonly used types.
pub mod prelude {
	pub use reinhardt_meta_core::prelude::*;
	pub use reinhardt_meta_core::tree::collect_json_tree;

	#[cfg(feature = "ssr")]
	pub use reinhardt_meta_ssr::{ServerInjector, TextOptions, render_document};

	#[cfg(feature = "client")]
	pub use reinhardt_meta_client::prelude::*;
}
