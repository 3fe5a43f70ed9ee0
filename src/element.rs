//! Element construction from `tag#id.class` selectors and heterogeneous argument lists.

use crate::{
	attr::{format_number, Attrs},
	dom::{Dom, SVG_NAMESPACE},
	engine::Engine,
	error::{DomResultExt, Error},
	selector::Selector,
	view::{Mountable, View},
};
use core::fmt::{self, Debug, Formatter};
use std::rc::Rc;
use tracing::{instrument, trace};

/// What to build an element from: a selector, or an existing node to shallow-clone.
pub enum Query<D: Dom> {
	Selector(String),
	Node(D::Node),
}

impl<D: Dom> Clone for Query<D> {
	fn clone(&self) -> Self {
		match self {
			Self::Selector(selector) => Self::Selector(selector.clone()),
			Self::Node(node) => Self::Node(node.clone()),
		}
	}
}

impl<D: Dom> Debug for Query<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Selector(selector) => f.debug_tuple("Selector").field(selector).finish(),
			Self::Node(node) => f.debug_tuple("Node").field(node).finish(),
		}
	}
}

impl<D: Dom> From<&str> for Query<D> {
	fn from(selector: &str) -> Self {
		Self::Selector(selector.to_owned())
	}
}

impl<D: Dom> From<String> for Query<D> {
	fn from(selector: String) -> Self {
		Self::Selector(selector)
	}
}

/// One argument to [`Engine::html`]/[`Engine::svg`].
///
/// Arguments are applied in order, so later attributes override earlier ones and children appear in argument order.
pub enum Arg<D: Dom> {
	/// Appended as a text node.
	Text(String),
	/// Mounted as the last child.
	Child(Mountable<D>),
	/// Applied as with [`Engine::set_attr`], except that `class` extends the selector's classes.
	Attrs(Attrs<D>),
	/// Called with the element once it's reached.
	Init(Box<dyn FnOnce(&D::Node)>),
	/// Applied recursively.
	Many(Vec<Arg<D>>),
	/// Ignored. Produced from [`None`] and empty text.
	Skip,
}

impl<D: Dom> Arg<D> {
	pub fn init(init: impl FnOnce(&D::Node) + 'static) -> Self {
		Self::Init(Box::new(init))
	}
}

impl<D: Dom> Debug for Arg<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
			Self::Child(child) => f.debug_tuple("Child").field(child).finish(),
			Self::Attrs(attrs) => f.debug_tuple("Attrs").field(attrs).finish(),
			Self::Init(_) => f.write_str("Init(..)"),
			Self::Many(args) => f.debug_tuple("Many").field(args).finish(),
			Self::Skip => f.write_str("Skip"),
		}
	}
}

impl<D: Dom> From<&str> for Arg<D> {
	fn from(text: &str) -> Self {
		text.to_owned().into()
	}
}

impl<D: Dom> From<String> for Arg<D> {
	fn from(text: String) -> Self {
		if text.is_empty() {
			Self::Skip
		} else {
			Self::Text(text)
		}
	}
}

impl<D: Dom> From<f64> for Arg<D> {
	fn from(number: f64) -> Self {
		Self::Text(format_number(number))
	}
}

impl<D: Dom> From<i32> for Arg<D> {
	fn from(number: i32) -> Self {
		Self::Text(number.to_string())
	}
}

impl<D: Dom> From<u32> for Arg<D> {
	fn from(number: u32) -> Self {
		Self::Text(number.to_string())
	}
}

impl<D: Dom> From<usize> for Arg<D> {
	fn from(number: usize) -> Self {
		Self::Text(number.to_string())
	}
}

impl<D: Dom> From<Attrs<D>> for Arg<D> {
	fn from(attrs: Attrs<D>) -> Self {
		Self::Attrs(attrs)
	}
}

impl<D: Dom> From<Mountable<D>> for Arg<D> {
	fn from(child: Mountable<D>) -> Self {
		Self::Child(child)
	}
}

impl<D: Dom, V: View<D> + 'static> From<Rc<V>> for Arg<D> {
	fn from(view: Rc<V>) -> Self {
		Self::Child(view.into())
	}
}

impl<D: Dom, V: View<D> + 'static> From<&Rc<V>> for Arg<D> {
	fn from(view: &Rc<V>) -> Self {
		Self::Child(view.into())
	}
}

impl<D: Dom, T: Into<Arg<D>>> From<Vec<T>> for Arg<D> {
	fn from(args: Vec<T>) -> Self {
		Self::Many(args.into_iter().map(Into::into).collect())
	}
}

impl<D: Dom, T: Into<Arg<D>>> From<Option<T>> for Arg<D> {
	fn from(arg: Option<T>) -> Self {
		arg.map_or(Self::Skip, Into::into)
	}
}

impl<D: Dom> Engine<D> {
	/// Builds an HTML element.
	///
	/// Elements built from a selector are shallow clones of a cached template for that selector. A [`Query::Node`] is
	/// shallow-cloned too, so the node passed in is left untouched.
	///
	/// # Errors
	///
	/// Iff the host rejects the tag or any argument fails to apply.
	#[instrument(skip_all, fields(query = ?query))]
	pub fn html(&self, query: impl Into<Query<D>> + Debug, args: Vec<Arg<D>>) -> Result<D::Node, Error> {
		self.build(query.into(), None, args)
	}

	/// Like [`html`](`Self::html`), but creates elements in the [`SVG_NAMESPACE`].
	///
	/// # Errors
	///
	/// Iff the host rejects the tag or any argument fails to apply.
	#[instrument(skip_all, fields(query = ?query))]
	pub fn svg(&self, query: impl Into<Query<D>> + Debug, args: Vec<Arg<D>>) -> Result<D::Node, Error> {
		self.build(query.into(), Some(SVG_NAMESPACE), args)
	}

	/// Creates a text node.
	#[must_use]
	pub fn text(&self, data: &str) -> D::Node {
		self.dom().create_text_node(data)
	}

	/// Creates an element from `selector` without going through the template cache.
	///
	/// # Errors
	///
	/// Iff the host rejects the tag or a generated attribute.
	pub fn create_element(&self, selector: &str, namespace: Option<&str>) -> Result<D::Node, Error> {
		let Selector { tag, id, class_name } = Selector::parse(selector);
		let dom = self.dom();
		let el = dom.create_element(tag, namespace).during("create element")?;
		if let Some(id) = id {
			dom.set_attribute(&el, "id", &id).during("set attribute")?;
		}
		if let Some(class_name) = class_name {
			dom.set_attribute(&el, "class", &class_name).during("set attribute")?;
		}
		Ok(el)
	}

	fn build(&self, query: Query<D>, namespace: Option<&'static str>, args: Vec<Arg<D>>) -> Result<D::Node, Error> {
		let el = match query {
			Query::Selector(selector) => self.instantiate_template(selector, namespace)?,
			Query::Node(node) => self.dom().clone_shallow(&node).during("clone node")?,
		};
		self.apply_args(&el, args)?;
		Ok(el)
	}

	fn instantiate_template(&self, selector: String, namespace: Option<&'static str>) -> Result<D::Node, Error> {
		let key = (namespace.map(str::to_owned), selector);
		let cached = self.templates.borrow().get(&key).cloned();
		let template = match cached {
			Some(template) => {
				trace!("Template cache hit.");
				template
			}
			None => {
				let template = self.create_element(&key.1, namespace)?;
				self.templates.borrow_mut().insert(key, template.clone());
				template
			}
		};
		self.dom().clone_shallow(&template).during("clone template")
	}

	fn apply_args(&self, el: &D::Node, args: Vec<Arg<D>>) -> Result<(), Error> {
		for arg in args {
			match arg {
				Arg::Text(text) => {
					let text = self.text(&text);
					self.mount(Mountable::Node(el.clone()), Mountable::Node(text), None, false)?;
				}
				Arg::Child(child) => {
					self.mount(Mountable::Node(el.clone()), child, None, false)?;
				}
				Arg::Attrs(attrs) => self.apply_attrs(el, &attrs, true)?,
				Arg::Init(init) => init(el),
				Arg::Many(args) => self.apply_args(el, args)?,
				Arg::Skip => (),
			}
		}
		Ok(())
	}
}

/// Builds an HTML element with [`Engine::html`], converting each argument with [`Arg::from`].
///
/// ```
/// use xylem_dom::{el, memory::MemoryDom, Attrs, Engine};
///
/// let engine = Engine::new(MemoryDom::new());
/// let link = el!(engine, "a.nav", Attrs::new().set("href", "/"), "Home").unwrap();
/// assert_eq!(link.to_html(), r#"<a class="nav" href="/">Home</a>"#);
/// ```
#[macro_export]
macro_rules! el {
	($engine:expr, $query:expr $(, $arg:expr)* $(,)?) => {
		$engine.html($query, ::std::vec![$($crate::Arg::from($arg)),*])
	};
}

/// Like [`el!`], but builds an SVG element with [`Engine::svg`].
#[macro_export]
macro_rules! svg {
	($engine:expr, $query:expr $(, $arg:expr)* $(,)?) => {
		$engine.svg($query, ::std::vec![$($crate::Arg::from($arg)),*])
	};
}
