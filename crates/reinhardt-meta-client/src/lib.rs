//! Client-side reconciliation of reinhardt-meta document metadata.
//!
//! [`Reconciler`] applies [`RenderInstructions`] to a live document through
//! the [`MetaDom`] trait, touching only what changed since its previous
//! cycle. [`MetaManager`] wraps it with the resolve step and the
//! pause/resume gate hosts drive from their lifecycle.
//!
//! Two documents are provided: [`MemoryDocument`] for native hosts and
//! tests, and `WebDocument` for the browser (`web` feature on `wasm32`).
//!
//! # Example
//!
//! ```
//! use reinhardt_meta_client::{MemoryDocument, MetaDom, MetaManager};
//! use reinhardt_meta_core::prelude::*;
//!
//! let mut manager = MetaManager::new(MemoryDocument::new(), MetaOptions::default()).unwrap();
//! let infos = vec![RawMetaInfo::new().title("Home").meta(RawTag::charset("utf-8"))];
//!
//! let first = manager.refresh(&infos).unwrap();
//! assert_eq!(first.added_tags().len(), 1);
//! assert_eq!(manager.dom().title(), "Home");
//!
//! let second = manager.refresh(&infos).unwrap();
//! assert!(second.tags.is_empty());
//! ```
//!
//! [`RenderInstructions`]: reinhardt_meta_core::RenderInstructions

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod callbacks;
pub mod dom;
pub mod manager;
pub mod memory;
pub mod reconcile;
#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub mod web;

pub use callbacks::CallbackGuard;
pub use dom::{DomTarget, LoadListener, MetaDom};
pub use manager::{GateState, Injection, MetaManager, RefreshResult};
pub use memory::{MemoryDocument, NodeId};
pub use reconcile::{CLIENT_MARKER_VALUE, Reconciler, TagChanges};
#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub use web::WebDocument;

/// Re-export commonly used types.
pub mod prelude {
	pub use crate::dom::{DomTarget, MetaDom};
	pub use crate::manager::{GateState, MetaManager, RefreshResult};
	pub use crate::memory::MemoryDocument;
	pub use crate::reconcile::{Reconciler, TagChanges};
	#[cfg(all(target_arch = "wasm32", feature = "web"))]
	pub use crate::web::WebDocument;
}
