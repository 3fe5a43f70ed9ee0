use crate::{
	dom::Dom,
	lifecycle::{HookCounts, HookSet},
	view::View,
};
use core::cell::RefCell;
use hashbrown::HashMap;
use std::rc::{Rc, Weak};
use tracing::{instrument, trace};

/// Engine-owned bookkeeping for a single node.
pub(crate) struct Meta<D: Dom> {
	pub(crate) view: Option<Weak<dyn View<D>>>,
	pub(crate) mounted: bool,
	/// Hooks of `view` already counted in `hooks`.
	pub(crate) registered: HookSet,
	/// Subtree totals, [`None`] once everything dropped back to zero.
	pub(crate) hooks: Option<HookCounts>,
	pub(crate) list_index: Option<usize>,
}

impl<D: Dom> Default for Meta<D> {
	fn default() -> Self {
		Self {
			view: None,
			mounted: false,
			registered: HookSet::EMPTY,
			hooks: None,
			list_index: None,
		}
	}
}

impl<D: Dom> Meta<D> {
	pub(crate) fn live_view(&self) -> Option<Rc<dyn View<D>>> {
		self.view.as_ref().and_then(Weak::upgrade)
	}

	pub(crate) fn active_hooks(&self) -> Option<HookCounts> {
		self.hooks.filter(|hooks| !hooks.is_empty())
	}

	/// Whether dropping this entry would lose nothing.
	fn is_vacant(&self) -> bool {
		!self.mounted && self.active_hooks().is_none() && self.list_index.is_none() && self.live_view().is_none()
	}
}

/// Mounts views into a [`Dom`] and keeps track of their lifecycle.
///
/// All per-node state (owning view, mounted flag, hook counters) lives in a side table inside the engine, keyed by
/// [`Dom::Key`]. Nodes are never annotated.
///
/// # Re-entrancy
///
/// The engine releases its internal borrows before calling into any view, so hooks may mount and unmount other subtrees.
/// Updating a [`List`](`crate::List`) from within a hook fired by an update of that same list is not supported and panics.
pub struct Engine<D: Dom> {
	dom: D,
	side_table: RefCell<HashMap<D::Key, Meta<D>>>,
	pub(crate) templates: RefCell<HashMap<(Option<String>, String), D::Node>>,
}

impl<D: Dom> Engine<D> {
	#[must_use]
	pub fn new(dom: D) -> Self {
		Self {
			dom,
			side_table: RefCell::default(),
			templates: RefCell::default(),
		}
	}

	#[must_use]
	pub fn dom(&self) -> &D {
		&self.dom
	}

	/// Whether the engine considers `node` mounted.
	///
	/// This flag is maintained for nodes the engine mounted or reached while firing hooks. Untracked descendants of
	/// hook-less subtrees report `false` even while attached.
	#[must_use]
	pub fn is_mounted(&self, node: &D::Node) -> bool {
		self.read_meta(node, |meta| meta.map_or(false, |meta| meta.mounted))
	}

	/// The per-hook totals of registered hooks in `node`'s subtree, or [`None`] if there are none.
	#[must_use]
	pub fn hook_counts(&self, node: &D::Node) -> Option<HookCounts> {
		self.read_meta(node, |meta| meta.and_then(Meta::active_hooks))
	}

	/// The view `node` was last mounted or pooled as, if it's still alive.
	#[must_use]
	pub fn view_of(&self, node: &D::Node) -> Option<Rc<dyn View<D>>> {
		self.read_meta(node, |meta| meta.and_then(Meta::live_view))
	}

	/// Forgets all bookkeeping for `node` and its descendants, and lets the [`Dom`] drop what it holds for them.
	///
	/// Call this for detached subtrees that are being discarded. Releasing a subtree that is still attached corrupts the
	/// hook counters of its ancestors.
	#[instrument(skip(self))]
	pub fn release(&self, node: &D::Node) {
		debug_assert!(self.dom.parent_node(node).is_none(), "Released a node that is still attached");
		let mut stack = vec![node.clone()];
		let mut released = 0_usize;
		while let Some(node) = stack.pop() {
			if self.side_table.borrow_mut().remove(&self.dom.key(&node)).is_some() {
				released += 1;
			}
			self.dom.release(&node);
			let mut child = self.dom.first_child(&node);
			while let Some(current) = child {
				child = self.dom.next_sibling(&current);
				stack.push(current);
			}
		}
		trace!("Released {} side table entries.", released);
	}

	/// Number of nodes the engine currently keeps bookkeeping for.
	#[must_use]
	pub fn tracked_node_count(&self) -> usize {
		self.side_table.borrow().len()
	}

	pub(crate) fn read_meta<R>(&self, node: &D::Node, f: impl FnOnce(Option<&Meta<D>>) -> R) -> R {
		f(self.side_table.borrow().get(&self.dom.key(node)))
	}

	/// Runs `f` on `node`'s entry, creating it if necessary.
	///
	/// `f` must not call back into the engine.
	pub(crate) fn write_meta<R>(&self, node: &D::Node, f: impl FnOnce(&mut Meta<D>) -> R) -> R {
		let key = self.dom.key(node);
		f(self.side_table.borrow_mut().entry(key).or_default())
	}

	/// Like [`write_meta`](`Self::write_meta`), but doesn't create an entry.
	pub(crate) fn update_meta<R>(&self, node: &D::Node, f: impl FnOnce(&mut Meta<D>) -> R) -> Option<R> {
		self.side_table.borrow_mut().get_mut(&self.dom.key(node)).map(f)
	}

	/// Drops `node`'s entry if it holds nothing worth keeping.
	pub(crate) fn settle(&self, node: &D::Node) {
		let key = self.dom.key(node);
		let mut side_table = self.side_table.borrow_mut();
		if side_table.get(&key).map_or(false, Meta::is_vacant) {
			side_table.remove(&key);
		}
	}
}
