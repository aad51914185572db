//! Load-callback tracking.
//!
//! A [`CallbackGuard`] makes sure an entry's callback runs at most once,
//! whichever of the load listener and the settle path gets there first, and
//! never after its element was removed.

use reinhardt_meta_core::{LoadCallback, TagKey};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

struct GuardState {
	key: TagKey,
	callback: LoadCallback,
	fired: AtomicBool,
	abandoned: AtomicBool,
}

/// Shared handle over one pending callback.
#[derive(Clone)]
pub struct CallbackGuard {
	state: Arc<GuardState>,
}

impl CallbackGuard {
	/// Tracks `callback` for the tag `key`.
	pub fn new(key: TagKey, callback: LoadCallback) -> Self {
		Self {
			state: Arc::new(GuardState {
				key,
				callback,
				fired: AtomicBool::new(false),
				abandoned: AtomicBool::new(false),
			}),
		}
	}

	/// The tag the callback belongs to.
	pub fn key(&self) -> &TagKey {
		&self.state.key
	}

	/// Runs the callback unless it already ran or was abandoned.
	///
	/// Returns true if this call ran it.
	pub fn fire(&self) -> bool {
		if self.state.abandoned.load(Ordering::SeqCst) {
			tracing::trace!(tag = %self.state.key, "ignoring load of removed tag");
			return false;
		}
		if self.state.fired.swap(true, Ordering::SeqCst) {
			return false;
		}
		self.state.callback.call();
		true
	}

	/// Drops the callback: its element was removed before it loaded.
	pub fn abandon(&self) {
		if !self.state.fired.load(Ordering::SeqCst) {
			tracing::trace!(tag = %self.state.key, "abandoning pending callback");
		}
		self.state.abandoned.store(true, Ordering::SeqCst);
	}

	/// Whether the callback ran or was abandoned.
	pub fn is_settled(&self) -> bool {
		self.state.fired.load(Ordering::SeqCst) || self.state.abandoned.load(Ordering::SeqCst)
	}

	/// Whether the callback ran.
	pub fn has_fired(&self) -> bool {
		self.state.fired.load(Ordering::SeqCst)
	}
}

impl std::fmt::Debug for CallbackGuard {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CallbackGuard")
			.field("key", &self.state.key)
			.field("fired", &self.state.fired.load(Ordering::SeqCst))
			.field("abandoned", &self.state.abandoned.load(Ordering::SeqCst))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use reinhardt_meta_core::{MetaField, TagIdentity};
	use rstest::{fixture, rstest};
	use std::sync::atomic::AtomicUsize;

	#[fixture]
	fn counter() -> Arc<AtomicUsize> {
		Arc::new(AtomicUsize::new(0))
	}

	fn guard(counter: &Arc<AtomicUsize>) -> CallbackGuard {
		let counter = Arc::clone(counter);
		CallbackGuard::new(
			TagKey::new(MetaField::Script, TagIdentity::Keyed("a".into())),
			LoadCallback::new(move || {
				counter.fetch_add(1, Ordering::SeqCst);
			}),
		)
	}

	#[rstest]
	fn test_fires_once(counter: Arc<AtomicUsize>) {
		let guard = guard(&counter);
		let listener = guard.clone();

		assert!(listener.fire());
		assert!(!guard.fire());
		assert_eq!(counter.load(Ordering::SeqCst), 1);
		assert!(guard.is_settled());
		assert!(guard.has_fired());
	}

	#[rstest]
	fn test_abandoned_never_fires(counter: Arc<AtomicUsize>) {
		let guard = guard(&counter);
		guard.abandon();

		assert!(!guard.fire());
		assert_eq!(counter.load(Ordering::SeqCst), 0);
		assert!(guard.is_settled());
		assert!(!guard.has_fired());
	}
}
