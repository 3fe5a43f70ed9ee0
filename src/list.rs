//! Keyed list reconciliation.
//!
//! A [`ListPool`] maps data items to reusable views. A [`List`] additionally owns a container node and keeps its children in
//! the order of the last update, moving only what is out of place.

use crate::{
	dom::Dom,
	element::Query,
	engine::Engine,
	error::Error,
	view::{Mountable, View},
};
use core::{
	cell::{Ref, RefCell},
	hash::Hash,
	mem,
};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{instrument, trace};

/// A view that can be created and updated from a data item by a [`ListPool`].
pub trait ListItem<D: Dom>: View<D> + Sized + 'static {
	type Data;
	/// Shared construction data, passed to every [`create`](`ListItem::create`) call.
	type Init;
	/// Per-update context, passed to every [`update`](`ListItem::update`) call.
	type Context;

	/// # Errors
	///
	/// Whatever building the view's node fails with.
	fn create(engine: &Engine<D>, init: &Self::Init, item: &Self::Data, index: usize, items: &[Self::Data]) -> Result<Self, Error>;

	/// Called on new and reused views alike, once per update.
	///
	/// # Errors
	///
	/// Whatever updating the view's node fails with.
	#[allow(unused_variables)]
	fn update(
		&self,
		engine: &Engine<D>,
		item: &Self::Data,
		index: usize,
		items: &[Self::Data],
		context: &Self::Context,
	) -> Result<(), Error> {
		Ok(())
	}
}

type KeyFn<T, K> = Box<dyn Fn(&T) -> K>;

/// Caches views by identity so that updates reuse them.
///
/// Identity is the item's key if the pool was created with [`ListPool::keyed`], otherwise the item's position.
pub struct ListPool<D: Dom, V: ListItem<D>, K = usize> {
	init: V::Init,
	key: Option<KeyFn<V::Data, K>>,
	lookup: HashMap<K, Rc<V>>,
	old_lookup: HashMap<K, Rc<V>>,
	views: Vec<Rc<V>>,
	old_views: Vec<Rc<V>>,
	ids: Vec<K>,
	old_ids: Vec<K>,
}

impl<D: Dom, V: ListItem<D>> ListPool<D, V, usize> {
	/// A positional pool: the view at each index is reused for whatever item ends up there.
	#[must_use]
	pub fn new(init: V::Init) -> Self {
		Self::with_key(init, None)
	}
}

impl<D: Dom, V: ListItem<D>, K: Eq + Hash + Clone> ListPool<D, V, K> {
	/// A keyed pool: views follow their item's `key` across reorderings.
	#[must_use]
	pub fn keyed(init: V::Init, key: impl Fn(&V::Data) -> K + 'static) -> Self {
		Self::with_key(init, Some(Box::new(key)))
	}

	fn with_key(init: V::Init, key: Option<KeyFn<V::Data, K>>) -> Self {
		Self {
			init,
			key,
			lookup: HashMap::new(),
			old_lookup: HashMap::new(),
			views: Vec::new(),
			old_views: Vec::new(),
			ids: Vec::new(),
			old_ids: Vec::new(),
		}
	}

	#[must_use]
	pub fn is_keyed(&self) -> bool {
		self.key.is_some()
	}

	/// The views of the last update, in data order.
	#[must_use]
	pub fn views(&self) -> &[Rc<V>] {
		&self.views
	}

	/// The views of the update before the last one.
	#[must_use]
	pub fn old_views(&self) -> &[Rc<V>] {
		&self.old_views
	}

	/// The pooled view for `key`. Always [`None`] for positional pools.
	#[must_use]
	pub fn get(&self, key: &K) -> Option<&Rc<V>> {
		self.lookup.get(key)
	}

	/// Whether `key` was pooled before the last update.
	#[must_use]
	pub fn was_pooled(&self, key: &K) -> bool {
		self.old_lookup.contains_key(key)
	}

	/// Brings the pool in line with `data`, creating views for new identities and updating all of them.
	///
	/// On error, the pool is left as it was before the call.
	///
	/// # Errors
	///
	/// Iff creating, updating or resolving a view fails.
	#[instrument(skip_all, fields(items = data.len(), keyed = self.is_keyed()))]
	pub fn update(&mut self, engine: &Engine<D>, data: &[V::Data], context: &V::Context) -> Result<(), Error> {
		let mut lookup = HashMap::with_capacity(data.len());
		let mut views = Vec::with_capacity(data.len());
		let mut ids = Vec::with_capacity(if self.is_keyed() { data.len() } else { 0 });
		let mut created = 0_usize;

		for (index, item) in data.iter().enumerate() {
			let pooled = match &self.key {
				Some(key) => {
					let id = key(item);
					let pooled = self.lookup.get(&id).cloned();
					ids.push(id);
					pooled
				}
				None => self.views.get(index).cloned(),
			};
			let view = match pooled {
				Some(view) => view,
				None => {
					created += 1;
					Rc::new(V::create(engine, &self.init, item, index, data)?)
				}
			};

			view.update(engine, item, index, data, context)?;
			engine.bind_view(&(Rc::clone(&view) as Rc<dyn View<D>>))?;
			if let Some(id) = ids.last() {
				lookup.insert(id.clone(), Rc::clone(&view));
			}
			views.push(view);
		}
		trace!("Created {} and reused {} view(s).", created, views.len() - created);

		self.old_lookup = mem::replace(&mut self.lookup, lookup);
		self.old_views = mem::replace(&mut self.views, views);
		self.old_ids = mem::replace(&mut self.ids, ids);
		Ok(())
	}

	/// Views of the previous update that the last update didn't retain.
	fn orphans(&self) -> Vec<Rc<V>> {
		if self.is_keyed() {
			self.old_ids
				.iter()
				.zip(&self.old_views)
				.filter(|(id, _)| !self.lookup.contains_key(*id))
				.map(|(_, view)| Rc::clone(view))
				.collect()
		} else {
			self.old_views.iter().skip(self.views.len()).cloned().collect()
		}
	}
}

/// A container node whose children are kept in sync with a slice of data, one [`ListItem`] view per item.
///
/// ```
/// use std::rc::Rc;
/// use xylem_dom::{memory::{MemoryDom, Node}, Engine, Error, List, ListItem, Mountable, View};
///
/// struct Row(Node);
///
/// impl View<MemoryDom> for Row {
/// 	fn el(&self) -> Mountable<MemoryDom> {
/// 		self.0.clone().into()
/// 	}
/// }
///
/// impl ListItem<MemoryDom> for Row {
/// 	type Data = (u32, &'static str);
/// 	type Init = ();
/// 	type Context = ();
///
/// 	fn create(engine: &Engine<MemoryDom>, _: &(), item: &Self::Data, _: usize, _: &[Self::Data]) -> Result<Self, Error> {
/// 		Ok(Self(engine.html("li", vec![item.1.into()])?))
/// 	}
/// }
///
/// let engine = Engine::new(MemoryDom::new());
/// let list = Rc::new(List::<_, Row, u32>::keyed(&engine, "ul", (), |item| item.0).unwrap());
/// engine.mount(engine.dom().body(), &list, None, false).unwrap();
///
/// list.update(&engine, &[(1, "a"), (2, "b")], &()).unwrap();
/// list.update(&engine, &[(2, "b"), (1, "a")], &()).unwrap();
/// assert_eq!(list.node().to_html(), "<ul><li>b</li><li>a</li></ul>");
/// ```
pub struct List<D: Dom, V: ListItem<D>, K = usize> {
	el: D::Node,
	pool: RefCell<ListPool<D, V, K>>,
}

/// Builds the container from a selector, or adopts an existing node without cloning it.
fn container_el<D: Dom>(engine: &Engine<D>, container: Query<D>) -> Result<D::Node, Error> {
	match container {
		Query::Node(node) => Ok(node),
		selector @ Query::Selector(_) => engine.html(selector, Vec::new()),
	}
}

impl<D: Dom, V: ListItem<D>> List<D, V, usize> {
	/// A positional list.
	///
	/// `container` is either a selector, from which a new element is built, or an existing node, which is adopted as-is.
	///
	/// # Errors
	///
	/// Iff the container can't be built.
	pub fn new(engine: &Engine<D>, container: impl Into<Query<D>>, init: V::Init) -> Result<Self, Error> {
		Ok(Self {
			el: container_el(engine, container.into())?,
			pool: RefCell::new(ListPool::new(init)),
		})
	}
}

impl<D: Dom, V: ListItem<D>, K: Eq + Hash + Clone> List<D, V, K> {
	/// A keyed list, with item identity given by `key`.
	///
	/// `container` is either a selector, from which a new element is built, or an existing node, which is adopted as-is.
	///
	/// # Errors
	///
	/// Iff the container can't be built.
	pub fn keyed(
		engine: &Engine<D>,
		container: impl Into<Query<D>>,
		init: V::Init,
		key: impl Fn(&V::Data) -> K + 'static,
	) -> Result<Self, Error> {
		Ok(Self {
			el: container_el(engine, container.into())?,
			pool: RefCell::new(ListPool::keyed(init, key)),
		})
	}

	/// The container node.
	#[must_use]
	pub fn node(&self) -> &D::Node {
		&self.el
	}

	/// Updates the pool with `data` and then rearranges the container's children to match.
	///
	/// Views that are no longer part of the list are unmounted and their nodes released.
	///
	/// # Errors
	///
	/// Iff updating the pool or any DOM operation fails.
	///
	/// # Panics
	///
	/// Iff called from within a lifecycle hook fired by an ongoing update of this same list.
	#[instrument(skip_all, fields(items = data.len()))]
	pub fn update(&self, engine: &Engine<D>, data: &[V::Data], context: &V::Context) -> Result<(), Error> {
		let mut pool = self.pool.borrow_mut();
		pool.update(engine, data, context)?;

		let orphans = pool.orphans();
		for orphan in &orphans {
			let orphan_el = engine.get_el(&Mountable::from(orphan))?;
			engine.update_meta(&orphan_el, |meta| meta.list_index = None);
			engine.unmount(Mountable::Node(self.el.clone()), orphan)?;
			if engine.dom().parent_node(&orphan_el).is_none() {
				engine.release(&orphan_el);
			}
		}
		trace!("Removed {} orphaned view(s).", orphans.len());

		let mut children = Vec::with_capacity(pool.views().len());
		for (index, view) in pool.views().iter().enumerate() {
			let child = Mountable::from(view);
			let child_el = engine.get_el(&child)?;
			engine.write_meta(&child_el, |meta| meta.list_index = Some(index));
			children.push(child);
		}

		engine.set_children(Mountable::Node(self.el.clone()), &children)
	}

	/// The views in current order.
	///
	/// # Panics
	///
	/// Iff called during an update of this list.
	#[must_use]
	pub fn views(&self) -> Vec<Rc<V>> {
		self.pool.borrow().views().to_vec()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.pool.borrow().views().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// # Panics
	///
	/// Iff called during an update of this list.
	#[must_use]
	pub fn pool(&self) -> Ref<'_, ListPool<D, V, K>> {
		self.pool.borrow()
	}
}

impl<D: Dom, V: ListItem<D>, K: 'static> View<D> for List<D, V, K> {
	fn el(&self) -> Mountable<D> {
		Mountable::Node(self.el.clone())
	}
}
