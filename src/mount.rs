use crate::{
	dom::Dom,
	engine::Engine,
	error::{DomResultExt, Error, RESOLVE_LIMIT},
	view::{Mountable, View},
};
use std::rc::Rc;
use tracing::{instrument, trace, warn};

impl<D: Dom> Engine<D> {
	/// Resolves `target` to its node, following [`View::el`] through any number of nested views.
	///
	/// # Errors
	///
	/// [`Error::Unresolved`] iff the chain is longer than [`RESOLVE_LIMIT`](`crate::RESOLVE_LIMIT`).
	pub fn get_el(&self, target: &Mountable<D>) -> Result<D::Node, Error> {
		let mut current = target.clone();
		for _ in 0..RESOLVE_LIMIT {
			match current {
				Mountable::Node(node) => return Ok(node),
				Mountable::View(view) => current = view.el(),
			}
		}
		Err(Error::Unresolved { limit: RESOLVE_LIMIT })
	}

	/// Links `view` to the node it resolves to, so that passing that node later on is equivalent to passing the view.
	pub(crate) fn bind_view(&self, view: &Rc<dyn View<D>>) -> Result<D::Node, Error> {
		let el = self.get_el(&Mountable::View(Rc::clone(view)))?;
		self.write_meta(&el, |meta| meta.view = Some(Rc::downgrade(view)));
		Ok(el)
	}

	/// Promotes a bare node to the view that owns it, or records the back-reference for a view.
	fn adopt(&self, child: Mountable<D>, child_el: &D::Node) -> Mountable<D> {
		match child {
			Mountable::Node(node) => match self.view_of(&node) {
				Some(view) => Mountable::View(view),
				None => Mountable::Node(node),
			},
			Mountable::View(view) => {
				self.write_meta(child_el, |meta| meta.view = Some(Rc::downgrade(&view)));
				Mountable::View(view)
			}
		}
	}

	/// Attaches `child` to `parent`, firing lifecycle hooks as needed.
	///
	/// With `before`, `child` is inserted before that node, or replaces it if `replace` is set. Otherwise it's appended.
	///
	/// Mounting a child that currently has a different parent first unmounts it from there, so moves always fire
	/// `onunmount` before `onmount`. Mounting it again under the same parent fires `onremount` instead.
	///
	/// The engine only holds views weakly. Keep `child` alive (in a parent view, a [`List`](`crate::List`) or elsewhere)
	/// for as long as it is mounted, or its hooks stop firing.
	///
	/// Returns `child`, promoted to its owning view if a bare node was passed.
	///
	/// # Errors
	///
	/// Iff any argument can't be resolved to a node, or the insertion would create a cycle, or `before` isn't a child of
	/// `parent`, or the host rejects the insertion. Hooks and counters are left as they were in that case.
	#[instrument(skip_all, fields(replace = replace))]
	pub fn mount(
		&self,
		parent: impl Into<Mountable<D>>,
		child: impl Into<Mountable<D>>,
		before: Option<Mountable<D>>,
		replace: bool,
	) -> Result<Mountable<D>, Error> {
		let parent_el = self.get_el(&parent.into())?;
		let child = child.into();
		let child_el = self.get_el(&child)?;
		let before_el = before.map(|before| self.get_el(&before)).transpose()?;
		let child = self.adopt(child, &child_el);

		let dom = self.dom();
		self.check_insertion(&parent_el, &child_el, before_el.as_ref())?;
		let old_parent = dom.parent_node(&child_el);
		let moved = old_parent.as_ref().filter(|old_parent| **old_parent != parent_el);
		if let Some(old_parent) = moved {
			trace!("Moving {:?} from {:?} to {:?}.", child_el, old_parent, parent_el);
			self.unmount_hooks(&child_el, Some(old_parent));
		}

		let displaced = before_el.as_ref().filter(|before_el| replace && **before_el != child_el);
		if let Some(displaced) = displaced {
			self.unmount_hooks(displaced, Some(&parent_el));
		}

		let attached = match &before_el {
			Some(before_el) if replace => dom.replace_child(&parent_el, &child_el, before_el).during("replace child"),
			Some(before_el) => dom.insert_before(&parent_el, &child_el, before_el).during("insert before"),
			None => dom.append_child(&parent_el, &child_el).during("append child"),
		};
		if let Err(error) = attached {
			// Nothing moved, so account both nodes where they still are.
			if let Some(displaced) = displaced {
				let view = self.view_of(displaced);
				self.mount_hooks(view.as_ref(), displaced, &parent_el, false);
			}
			if let Some(old_parent) = moved {
				self.mount_hooks(child.as_view(), &child_el, old_parent, false);
			}
			return Err(error);
		}

		let remount = old_parent.as_ref() == Some(&parent_el);
		self.mount_hooks(child.as_view(), &child_el, &parent_el, remount);
		Ok(child)
	}

	/// Rejects insertions the host would refuse before any hooks fire: `child_el` containing `parent_el`, and an anchor
	/// that isn't a child of `parent_el`.
	fn check_insertion(&self, parent_el: &D::Node, child_el: &D::Node, anchor: Option<&D::Node>) -> Result<(), Error> {
		let dom = self.dom();
		let mut ancestor = Some(parent_el.clone());
		while let Some(current) = ancestor {
			if current == *child_el {
				return Err(Error::rejected("mount", "the child contains the parent"));
			}
			ancestor = dom.parent_node(&current);
		}

		match anchor {
			Some(anchor) if dom.parent_node(anchor).as_ref() != Some(parent_el) => {
				Err(Error::rejected("mount", "the anchor is not a child of the parent"))
			}
			_ => Ok(()),
		}
	}

	/// Detaches `child` from `parent`, firing `onunmount` on its subtree if it was mounted.
	///
	/// Does nothing if `child` has no parent.
	///
	/// # Errors
	///
	/// Iff an argument can't be resolved to a node or the host rejects the removal.
	#[instrument(skip_all)]
	pub fn unmount(&self, parent: impl Into<Mountable<D>>, child: impl Into<Mountable<D>>) -> Result<Mountable<D>, Error> {
		let parent_el = self.get_el(&parent.into())?;
		let child = child.into();
		let child_el = self.get_el(&child)?;
		let child = match child {
			Mountable::Node(node) => self.adopt(Mountable::Node(node), &child_el),
			view @ Mountable::View(_) => view,
		};

		let dom = self.dom();
		let actual_parent = match dom.parent_node(&child_el) {
			Some(actual_parent) => actual_parent,
			None => return Ok(child),
		};
		if actual_parent != parent_el {
			warn!("Asked to unmount {:?} from {:?}, but it is attached to {:?}. Unmounting from the latter.", child_el, parent_el, actual_parent);
		}

		self.unmount_hooks(&child_el, Some(&actual_parent));
		dom.remove_child(&actual_parent, &child_el).during("remove child")?;
		Ok(child)
	}

	/// Makes `children` the exact child list of `parent`, moving only nodes that are out of place.
	///
	/// Nodes left over after the last of `children` are unmounted.
	///
	/// # Errors
	///
	/// Iff an argument can't be resolved to a node or the host rejects a mutation.
	#[instrument(skip_all, fields(children = children.len()))]
	pub fn set_children(&self, parent: impl Into<Mountable<D>>, children: &[Mountable<D>]) -> Result<(), Error> {
		let parent = parent.into();
		let parent_el = self.get_el(&parent)?;
		let child_els = children.iter().map(|child| self.get_el(child)).collect::<Result<Vec<_>, _>>()?;

		let dom = self.dom();
		let mut current = dom.first_child(&parent_el);
		let mut moved = 0_usize;
		for (i, (child, child_el)) in children.iter().zip(&child_els).enumerate() {
			if current.as_ref() == Some(child_el) {
				current = dom.next_sibling(child_el);
				continue;
			}

			moved += 1;
			let next = current.as_ref().and_then(|current| dom.next_sibling(current));
			let tracked = self.read_meta(child_el, |meta| meta.map_or(false, |meta| meta.list_index.is_some()));
			let replace = tracked && next.is_some() && next.as_ref() == child_els.get(i + 1);

			self.mount(&parent, child, current.clone().map(Mountable::Node), replace)?;

			if replace {
				current = next;
			}
		}

		let mut removed = 0_usize;
		while let Some(stale) = current {
			current = dom.next_sibling(&stale);
			self.unmount(&parent, Mountable::Node(stale))?;
			removed += 1;
		}
		trace!("Mounted {} and removed {} child(ren).", moved, removed);
		Ok(())
	}
}
