//! Core of the reinhardt-meta document metadata engine.
//!
//! Components declare metadata ([`RawMetaInfo`]); the engine folds the
//! declarations of a whole component tree into one [`MergedMetaInfo`] and
//! turns it into [`RenderInstructions`] that the server serializer
//! (`reinhardt-meta-ssr`) and the client reconciler (`reinhardt-meta-client`)
//! consume.
//!
//! # Data flow
//!
//! ```text
//! component tree ──collect──▶ [RawMetaInfo] ──resolve──▶ MergedMetaInfo
//!                                                          │
//!                                                      generate
//!                                                          ▼
//!                                                  RenderInstructions
//!                                                    │            │
//!                                              serializer    reconciler
//! ```
//!
//! # Example
//!
//! ```
//! use reinhardt_meta_core::prelude::*;
//!
//! let infos = vec![
//!     RawMetaInfo::new()
//!         .title_template("%s | Example")
//!         .meta(RawTag::charset("utf-8")),
//!     RawMetaInfo::new().title("About"),
//! ];
//!
//! let merged = resolve(&infos);
//! let instructions = generate(&merged, &MetaOptions::default());
//!
//! assert_eq!(instructions.title.text, "About | Example");
//! assert_eq!(instructions.tags(MetaField::Meta).len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod attr;
pub mod descriptor;
pub mod error;
pub mod field;
pub mod generate;
pub mod options;
pub mod raw;
pub mod resolve;
pub mod template;
pub mod tree;

pub use attr::{AttrMap, AttrValue, TagAttr};
pub use descriptor::{
	AttrsInstruction, RenderInstructions, TagContent, TagDescriptor, TagIdentity, TagKey,
	TitleInstruction,
};
pub use error::{MetaError, MetaResult};
pub use field::{MetaField, Placement};
pub use generate::generate;
pub use options::{DuplicatePolicy, MergePolicy, MetaOptions};
pub use raw::{AfterNavigationHook, ChangedHook, LoadCallback, RawMetaInfo, RawTag};
pub use resolve::{MergedMetaInfo, Resolver, resolve};
pub use template::Template;
pub use tree::{MetaNode, MetaTree, collect_json_tree, collect_meta_info, has_meta_info};

/// Re-export commonly used types.
pub mod prelude {
	pub use crate::attr::{AttrMap, AttrValue, TagAttr};
	pub use crate::descriptor::{
		AttrsInstruction, RenderInstructions, TagContent, TagDescriptor, TagIdentity, TagKey,
		TitleInstruction,
	};
	pub use crate::error::{MetaError, MetaResult};
	pub use crate::field::{MetaField, Placement};
	pub use crate::generate::generate;
	pub use crate::options::{DuplicatePolicy, MergePolicy, MetaOptions};
	pub use crate::raw::{RawMetaInfo, RawTag};
	pub use crate::resolve::{MergedMetaInfo, Resolver, resolve};
	pub use crate::template::Template;
	pub use crate::tree::{MetaNode, MetaTree, collect_meta_info};
}
