use crate::{dom::Dom, lifecycle::HookSet};
use core::fmt::{self, Debug, Formatter};
use std::rc::Rc;

/// An application-defined object that owns a DOM node.
///
/// The only required capability is [`el`](`View::el`). Lifecycle hooks are opt-in: a view announces which ones it
/// implements through [`hooks`](`View::hooks`), and only those are registered and called.
///
/// ```
/// use std::{cell::Cell, rc::Rc};
/// use xylem_dom::{memory::{MemoryDom, Node}, Engine, HookSet, Mountable, View};
///
/// struct Greeting {
/// 	el: Node,
/// 	mounted: Cell<bool>,
/// }
///
/// impl View<MemoryDom> for Greeting {
/// 	fn el(&self) -> Mountable<MemoryDom> {
/// 		self.el.clone().into()
/// 	}
///
/// 	fn hooks(&self) -> HookSet {
/// 		HookSet::MOUNT
/// 	}
///
/// 	fn onmount(&self) {
/// 		self.mounted.set(true)
/// 	}
/// }
///
/// let engine = Engine::new(MemoryDom::new());
/// let greeting = Rc::new(Greeting {
/// 	el: engine.html("p.greeting", vec!["Hello!".into()]).unwrap(),
/// 	mounted: Cell::new(false),
/// });
///
/// let body = engine.dom().body();
/// engine.mount(body, greeting.clone(), None, false).unwrap();
/// assert!(greeting.mounted.get());
/// ```
pub trait View<D: Dom> {
	/// The node (or nested view) this view renders into.
	fn el(&self) -> Mountable<D>;

	/// Which of the hook methods below are implemented.
	fn hooks(&self) -> HookSet {
		HookSet::EMPTY
	}

	/// Called when the view's node becomes reachable from a root.
	fn onmount(&self) {}

	/// Called when the view's node is mounted again under the parent it is already attached to.
	fn onremount(&self) {}

	/// Called before the view's node is detached from a mounted tree.
	fn onunmount(&self) {}
}

/// Anything that can be mounted: a node, or a view that resolves to one.
pub enum Mountable<D: Dom> {
	Node(D::Node),
	View(Rc<dyn View<D>>),
}

impl<D: Dom> Mountable<D> {
	/// The view, if this isn't a bare node.
	#[must_use]
	pub fn as_view(&self) -> Option<&Rc<dyn View<D>>> {
		match self {
			Self::Node(_) => None,
			Self::View(view) => Some(view),
		}
	}

	#[must_use]
	pub fn as_node(&self) -> Option<&D::Node> {
		match self {
			Self::Node(node) => Some(node),
			Self::View(_) => None,
		}
	}
}

impl<D: Dom> Clone for Mountable<D> {
	fn clone(&self) -> Self {
		match self {
			Self::Node(node) => Self::Node(node.clone()),
			Self::View(view) => Self::View(Rc::clone(view)),
		}
	}
}

impl<D: Dom> Debug for Mountable<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Node(node) => f.debug_tuple("Node").field(node).finish(),
			Self::View(view) => f.debug_tuple("View").field(&Rc::as_ptr(view)).finish(),
		}
	}
}

impl<D: Dom, V: View<D> + 'static> From<Rc<V>> for Mountable<D> {
	fn from(view: Rc<V>) -> Self {
		Self::View(view)
	}
}

impl<D: Dom, V: View<D> + 'static> From<&Rc<V>> for Mountable<D> {
	fn from(view: &Rc<V>) -> Self {
		Self::View(Rc::clone(view) as Rc<dyn View<D>>)
	}
}

impl<D: Dom> From<&Mountable<D>> for Mountable<D> {
	fn from(mountable: &Mountable<D>) -> Self {
		mountable.clone()
	}
}
