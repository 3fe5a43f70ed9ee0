//! Lifecycle hook propagation.
//!
//! Every node that has hook-implementing views somewhere in its subtree carries a [`HookCounts`] in the engine's side
//! table. The counters let a mount or unmount skip hook-less subtrees entirely and descend only where a hook can fire.

use crate::{dom::Dom, engine::Engine, view::View};
use core::{
	fmt::{self, Debug, Formatter},
	ops::BitOr,
};
use std::rc::Rc;
use tracing::{trace, trace_span, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
	Mount,
	Remount,
	Unmount,
}

impl Hook {
	pub const ALL: [Self; 3] = [Self::Mount, Self::Remount, Self::Unmount];

	#[must_use]
	pub fn name(self) -> &'static str {
		match self {
			Self::Mount => "onmount",
			Self::Remount => "onremount",
			Self::Unmount => "onunmount",
		}
	}

	fn index(self) -> usize {
		self as usize
	}

	fn bit(self) -> u8 {
		1 << self.index()
	}

	fn call<D: Dom>(self, view: &dyn View<D>) {
		match self {
			Self::Mount => view.onmount(),
			Self::Remount => view.onremount(),
			Self::Unmount => view.onunmount(),
		}
	}
}

/// A set of [`Hook`]s, as returned by [`View::hooks`].
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HookSet(u8);

impl HookSet {
	pub const EMPTY: Self = Self(0);
	pub const MOUNT: Self = Self(1);
	pub const REMOUNT: Self = Self(1 << 1);
	pub const UNMOUNT: Self = Self(1 << 2);
	pub const ALL: Self = Self(0b111);

	#[must_use]
	pub fn contains(self, hook: Hook) -> bool {
		self.0 & hook.bit() != 0
	}

	pub fn insert(&mut self, hook: Hook) {
		self.0 |= hook.bit();
	}

	#[must_use]
	pub fn is_empty(self) -> bool {
		self.0 == 0
	}

	pub fn iter(self) -> impl Iterator<Item = Hook> {
		Hook::ALL.into_iter().filter(move |&hook| self.contains(hook))
	}
}

impl BitOr for HookSet {
	type Output = Self;

	fn bitor(self, rhs: Self) -> Self {
		Self(self.0 | rhs.0)
	}
}

impl From<Hook> for HookSet {
	fn from(hook: Hook) -> Self {
		Self(hook.bit())
	}
}

impl Debug for HookSet {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.iter().map(Hook::name)).finish()
	}
}

/// How many registered implementations of each hook a subtree contains.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct HookCounts([u32; 3]);

impl HookCounts {
	#[must_use]
	pub fn get(&self, hook: Hook) -> u32 {
		self.0[hook.index()]
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.iter().all(|&count| count == 0)
	}

	fn increment(&mut self, hook: Hook) {
		self.0[hook.index()] += 1;
	}

	fn add(&mut self, other: &Self) {
		for (count, other) in self.0.iter_mut().zip(other.0) {
			*count += other;
		}
	}

	fn subtract(&mut self, other: &Self) {
		for (count, other) in self.0.iter_mut().zip(other.0) {
			debug_assert!(*count >= other, "Hook counter underflow");
			*count = count.saturating_sub(other);
		}
	}
}

impl Debug for HookCounts {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(Hook::ALL.iter().map(|&hook| (hook.name(), self.get(hook)))).finish()
	}
}

impl<D: Dom> Engine<D> {
	/// Whether `node` is reachable from a document or shadow root through parent links.
	pub(crate) fn is_connected(&self, node: &D::Node) -> bool {
		let dom = self.dom();
		let mut current = node.clone();
		loop {
			if dom.is_root(&current) {
				return true;
			}
			match dom.parent_node(&current) {
				Some(parent) => current = parent,
				None => return false,
			}
		}
	}

	/// Registers `view`'s hooks on `child_el`, fires the cascade if this is a remount or `parent_el` is connected, and
	/// accounts the subtree on all ancestors.
	///
	/// Runs after `child_el` was attached to `parent_el`.
	pub(crate) fn mount_hooks(&self, view: Option<&Rc<dyn View<D>>>, child_el: &D::Node, parent_el: &D::Node, remount: bool) {
		let view_hooks = view.map_or(HookSet::EMPTY, |view| view.hooks());
		let counts = self.write_meta(child_el, |meta| {
			if !remount {
				for hook in view_hooks.iter() {
					if !meta.registered.contains(hook) {
						meta.registered.insert(hook);
						meta.hooks.get_or_insert_with(HookCounts::default).increment(hook);
					}
				}
			}
			meta.active_hooks()
		});

		let connected = self.is_connected(parent_el);
		let counts = match counts {
			Some(counts) => counts,
			None => {
				self.write_meta(child_el, |meta| meta.mounted = connected);
				return;
			}
		};

		if remount || connected {
			self.trigger(child_el, if remount { Hook::Remount } else { Hook::Mount });
		}

		if !remount {
			let dom = self.dom();
			let mut ancestor = Some(parent_el.clone());
			while let Some(current) = ancestor {
				self.write_meta(&current, |meta| {
					meta.hooks.get_or_insert_with(HookCounts::default).add(&counts);
					if connected {
						meta.mounted = true;
					}
				});
				ancestor = dom.parent_node(&current);
			}
		}
	}

	/// Fires `onunmount` for `child_el`'s subtree if it is flagged mounted or `parent_el` is connected, and removes its
	/// counts from the ancestors starting at `parent_el`.
	///
	/// Runs before `child_el` is detached.
	pub(crate) fn unmount_hooks(&self, child_el: &D::Node, parent_el: Option<&D::Node>) {
		let counts = self.read_meta(child_el, |meta| meta.and_then(|meta| meta.active_hooks()));
		let counts = match counts {
			Some(counts) => counts,
			None => {
				self.update_meta(child_el, |meta| meta.mounted = false);
				self.settle(child_el);
				return;
			}
		};

		let mounted = self.read_meta(child_el, |meta| meta.map_or(false, |meta| meta.mounted));
		if mounted || parent_el.map_or(false, |parent_el| self.is_connected(parent_el)) {
			self.trigger(child_el, Hook::Unmount);
		} else {
			self.update_meta(child_el, |meta| meta.mounted = false);
		}

		let dom = self.dom();
		let mut ancestor = parent_el.cloned();
		while let Some(current) = ancestor {
			self.update_meta(&current, |meta| {
				if let Some(hooks) = &mut meta.hooks {
					hooks.subtract(&counts);
					if hooks.is_empty() {
						meta.hooks = None;
					}
				}
			});
			self.settle(&current);
			ancestor = dom.parent_node(&current);
		}
	}

	/// Fires `hook` on `root` and, pre-order, on every descendant reachable through nodes with active counters.
	fn trigger(&self, root: &D::Node, hook: Hook) {
		let span = trace_span!("Firing", hook = hook.name(), ?root);
		let _enter = span.enter();

		let dom = self.dom();
		let mounted = hook != Hook::Unmount;
		let mut stack = vec![root.clone()];
		let mut fired = 0_usize;
		while let Some(node) = stack.pop() {
			let (view, dropped, descend) = self.write_meta(&node, |meta| {
				meta.mounted = mounted;
				let view = meta.live_view();
				let dropped = view.is_none() && meta.view.is_some() && !meta.registered.is_empty();
				(view, dropped, meta.active_hooks().is_some())
			});
			if dropped {
				warn!(
					"The view registered for {:?} was dropped, so its {} hook can't fire. Keep mounted views alive elsewhere.",
					node,
					hook.name()
				);
			}

			if let Some(view) = view {
				if view.hooks().contains(hook) {
					fired += 1;
					hook.call(&*view);
				}
			}

			if descend {
				let first = stack.len();
				let mut child = dom.first_child(&node);
				while let Some(current) = child {
					child = dom.next_sibling(&current);
					stack.push(current);
				}
				stack[first..].reverse();
			} else if !mounted {
				self.settle(&node);
			}
		}
		trace!("Fired {} {} hook(s).", fired, hook.name());
	}
}
