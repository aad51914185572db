//! The client-side entry point.
//!
//! [`MetaManager`] owns a document and its [`Reconciler`] and runs
//! resolve + generate + reconcile cycles on behalf of the host. The host
//! decides when a cycle should run; the manager only gates it.

use crate::dom::MetaDom;
use crate::reconcile::{Reconciler, TagChanges};
use reinhardt_meta_core::{
	MergePolicy, MergedMetaInfo, MetaOptions, MetaResult, RawMetaInfo, RenderInstructions, Resolver,
	TagKey, generate,
};

/// Whether gated cycles run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GateState {
	/// [`MetaManager::update`] runs a cycle.
	#[default]
	Active,
	/// [`MetaManager::update`] is a no-op until resumed.
	Paused,
}

/// The outcome of one completed cycle over elements of type `N`.
#[derive(Debug, Clone)]
pub struct RefreshResult<N> {
	/// The merged metadata the cycle applied.
	pub meta_info: MergedMetaInfo,
	/// Tags added and removed, with their elements.
	pub tags: TagChanges<N>,
}

impl<N> RefreshResult<N> {
	/// Keys of the tags the cycle added.
	pub fn added_tags(&self) -> Vec<TagKey> {
		self.tags.added_keys()
	}

	/// Keys of the tags the cycle removed.
	pub fn removed_tags(&self) -> Vec<TagKey> {
		self.tags.removed_keys()
	}

	/// Elements the cycle created.
	pub fn added_nodes(&self) -> impl Iterator<Item = &N> {
		self.tags.added.iter().map(|(_, node)| node)
	}

	/// Elements the cycle detached.
	pub fn removed_nodes(&self) -> impl Iterator<Item = &N> {
		self.tags.removed.iter().map(|(_, node)| node)
	}
}

/// A resolve that has not touched the document.
#[derive(Debug, Clone)]
pub struct Injection {
	/// The merged metadata.
	pub meta_info: MergedMetaInfo,
	/// What a cycle would apply.
	pub instructions: RenderInstructions,
}

/// Keeps one document in sync with a component tree's metadata.
pub struct MetaManager<D: MetaDom> {
	options: MetaOptions,
	resolver: Resolver,
	dom: D,
	reconciler: Reconciler<D>,
	state: GateState,
	navigating: bool,
}

impl<D: MetaDom> MetaManager<D> {
	/// Creates a manager with the default merge policy.
	pub fn new(dom: D, options: MetaOptions) -> MetaResult<Self> {
		Self::with_policy(dom, options, MergePolicy::default())
	}

	/// Creates a manager with an explicit merge policy.
	pub fn with_policy(dom: D, options: MetaOptions, policy: MergePolicy) -> MetaResult<Self> {
		options.validate()?;
		Ok(Self {
			reconciler: Reconciler::new(options.clone()),
			options,
			resolver: Resolver::with_policy(policy),
			dom,
			state: GateState::Active,
			navigating: false,
		})
	}

	/// The active configuration.
	pub fn get_options(&self) -> &MetaOptions {
		&self.options
	}

	/// The managed document.
	pub fn dom(&self) -> &D {
		&self.dom
	}

	/// The managed document, mutably.
	///
	/// Changes made through it are treated as stale state by the next cycle.
	pub fn dom_mut(&mut self) -> &mut D {
		&mut self.dom
	}

	/// The reconciler and its tag records.
	pub fn reconciler(&self) -> &Reconciler<D> {
		&self.reconciler
	}

	/// The gate.
	pub fn state(&self) -> GateState {
		self.state
	}

	/// Whether gated cycles are suspended.
	pub fn is_paused(&self) -> bool {
		self.state == GateState::Paused
	}

	/// Whether a navigation is in progress.
	pub fn is_navigating(&self) -> bool {
		self.navigating
	}

	/// Resolves and generates without touching the document.
	pub fn inject(&self, infos: &[RawMetaInfo]) -> Injection {
		let meta_info = self.resolver.resolve(infos);
		let instructions = generate(&meta_info, &self.options);
		Injection {
			meta_info,
			instructions,
		}
	}

	/// Runs a cycle regardless of the gate.
	pub fn refresh(&mut self, infos: &[RawMetaInfo]) -> MetaResult<RefreshResult<D::Node>> {
		let Injection {
			meta_info,
			instructions,
		} = self.inject(infos);
		let tags = self.reconciler.apply(&mut self.dom, &instructions)?;
		if let Some(changed) = &meta_info.changed {
			changed.call(&meta_info, &tags.added_keys(), &tags.removed_keys());
		}
		Ok(RefreshResult { meta_info, tags })
	}

	/// Runs a cycle unless paused.
	pub fn update(&mut self, infos: &[RawMetaInfo]) -> MetaResult<Option<RefreshResult<D::Node>>> {
		if self.is_paused() {
			tracing::debug!("metadata updates paused, skipping cycle");
			return Ok(None);
		}
		self.refresh(infos).map(Some)
	}

	/// Suspends gated cycles.
	pub fn pause(&mut self) {
		self.state = GateState::Paused;
	}

	/// Runs one last cycle, then suspends gated cycles.
	///
	/// The cycle runs even if the manager is already paused. The gate is
	/// left paused whether or not the cycle succeeds.
	pub fn pause_with_refresh(&mut self, infos: &[RawMetaInfo]) -> MetaResult<RefreshResult<D::Node>> {
		let result = self.refresh(infos);
		self.pause();
		result
	}

	/// Re-enables gated cycles.
	pub fn resume(&mut self) {
		self.state = GateState::Active;
	}

	/// Re-enables gated cycles and runs one.
	pub fn resume_with_refresh(&mut self, infos: &[RawMetaInfo]) -> MetaResult<RefreshResult<D::Node>> {
		self.resume();
		self.refresh(infos)
	}

	/// Marks the start of a navigation.
	///
	/// With `refresh_once_on_navigation`, gated cycles are suspended until
	/// [`finish_navigation`](Self::finish_navigation).
	pub fn begin_navigation(&mut self) {
		self.navigating = true;
		if self.options.refresh_once_on_navigation {
			tracing::trace!("pausing metadata updates for navigation");
			self.pause();
		}
	}

	/// Marks the end of a navigation.
	///
	/// When the navigation paused updates, resumes them, runs the one cycle
	/// and invokes the merged `after_navigation` hook. Returns `None` when no
	/// cycle was needed.
	pub fn finish_navigation(&mut self, infos: &[RawMetaInfo]) -> MetaResult<Option<RefreshResult<D::Node>>> {
		let was_navigating = std::mem::replace(&mut self.navigating, false);
		if !was_navigating || !self.options.refresh_once_on_navigation {
			return Ok(None);
		}
		let result = self.resume_with_refresh(infos)?;
		if let Some(hook) = &result.meta_info.after_navigation {
			hook.call(&result.meta_info);
		}
		Ok(Some(result))
	}

	/// Runs every callback whose element never reported a load.
	pub fn settle_callbacks(&mut self) -> usize {
		self.reconciler.settle_callbacks()
	}

	/// Consumes the manager, returning the document.
	pub fn into_dom(self) -> D {
		self.dom
	}
}

impl<D: MetaDom + std::fmt::Debug> std::fmt::Debug for MetaManager<D> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MetaManager")
			.field("options", &self.options)
			.field("dom", &self.dom)
			.field("state", &self.state)
			.field("navigating", &self.navigating)
			.finish()
	}
}
