//! The browser [`Dom`], backed by [`web_sys`].

use crate::{
	attr::Value,
	dom::{Dom, ElementKind},
	element::{Arg, Query},
	view::Mountable,
};
use core::cell::{Cell, RefCell};
use hashbrown::HashMap;
use js_sys::{Object, Reflect, WeakMap};
use tracing::trace;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Document, Element, ShadowRoot, SvgElement};

/// Drives a browser [`Document`].
///
/// Node identities are assigned lazily and kept in a [`WeakMap`], so they don't keep nodes alive. Event handlers are
/// wrapped in [`Closure`]s that live until replaced by a new value for the same element and property, until the element
/// is released through [`Engine::release`](`crate::Engine::release`), or as long as this [`WebDom`].
pub struct WebDom {
	document: Document,
	keys: WeakMap,
	next_key: Cell<u32>,
	handlers: RefCell<HashMap<(u32, String), Closure<dyn Fn(web_sys::Event)>>>,
}

impl WebDom {
	#[must_use]
	pub fn from_document(document: Document) -> Self {
		Self {
			document,
			keys: WeakMap::new(),
			next_key: Cell::new(0),
			handlers: RefCell::default(),
		}
	}

	/// The current window's document, if there is one.
	#[must_use]
	pub fn for_window() -> Option<Self> {
		web_sys::window().and_then(|window| window.document()).map(Self::from_document)
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}

	/// Number of event handler closures currently held.
	#[must_use]
	pub fn handler_count(&self) -> usize {
		self.handlers.borrow().len()
	}
}

fn element(node: &web_sys::Node) -> Result<&Element, JsValue> {
	node.dyn_ref::<Element>().ok_or_else(|| JsValue::from_str("InvalidNodeTypeError: not an element"))
}

fn to_js(value: &Value<WebDom>) -> JsValue {
	match value {
		Value::Null => JsValue::NULL,
		Value::Text(text) => JsValue::from_str(text),
		Value::Number(number) => JsValue::from_f64(*number),
		Value::Bool(bool) => JsValue::from_bool(*bool),
		Value::Handler(_) => JsValue::UNDEFINED,
		Value::Map(attrs) => {
			let object = Object::new();
			for (key, value) in attrs.iter() {
				// Setting a property on a fresh plain object can't throw.
				let _ = Reflect::set(&object, &JsValue::from_str(key), &to_js(value));
			}
			object.into()
		}
	}
}

impl Dom for WebDom {
	type Node = web_sys::Node;
	type Key = u32;
	type Event = web_sys::Event;
	type Error = JsValue;

	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	fn key(&self, node: &web_sys::Node) -> u32 {
		let object: &Object = node.as_ref();
		if let Some(key) = self.keys.get(object).as_f64() {
			return key as u32;
		}
		let key = self.next_key.get();
		self.next_key.set(key + 1);
		self.keys.set(object, &JsValue::from(key));
		key
	}

	fn create_element(&self, tag: &str, namespace: Option<&str>) -> Result<web_sys::Node, JsValue> {
		match namespace {
			Some(namespace) => self.document.create_element_ns(Some(namespace), tag),
			None => self.document.create_element(tag),
		}
		.map(Into::into)
	}

	fn create_text_node(&self, data: &str) -> web_sys::Node {
		self.document.create_text_node(data).into()
	}

	fn clone_shallow(&self, node: &web_sys::Node) -> Result<web_sys::Node, JsValue> {
		node.clone_node()
	}

	fn element_kind(&self, node: &web_sys::Node) -> Option<ElementKind> {
		let element = node.dyn_ref::<Element>()?;
		Some(if element.dyn_ref::<SvgElement>().is_some() {
			ElementKind::Svg
		} else {
			ElementKind::Html
		})
	}

	fn is_root(&self, node: &web_sys::Node) -> bool {
		node.node_type() == web_sys::Node::DOCUMENT_NODE || node.dyn_ref::<ShadowRoot>().is_some()
	}

	fn parent_node(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.parent_node()
	}

	fn first_child(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.first_child()
	}

	fn next_sibling(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.next_sibling()
	}

	fn append_child(&self, parent: &web_sys::Node, child: &web_sys::Node) -> Result<(), JsValue> {
		parent.append_child(child).map(drop)
	}

	fn insert_before(&self, parent: &web_sys::Node, child: &web_sys::Node, anchor: &web_sys::Node) -> Result<(), JsValue> {
		parent.insert_before(child, Some(anchor)).map(drop)
	}

	fn replace_child(&self, parent: &web_sys::Node, child: &web_sys::Node, old: &web_sys::Node) -> Result<(), JsValue> {
		parent.replace_child(child, old).map(drop)
	}

	fn remove_child(&self, parent: &web_sys::Node, child: &web_sys::Node) -> Result<(), JsValue> {
		parent.remove_child(child).map(drop)
	}

	fn get_attribute(&self, element: &web_sys::Node, name: &str) -> Option<String> {
		element.dyn_ref::<Element>()?.get_attribute(name)
	}

	fn set_attribute(&self, node: &web_sys::Node, name: &str, value: &str) -> Result<(), JsValue> {
		element(node)?.set_attribute(name, value)
	}

	fn remove_attribute(&self, node: &web_sys::Node, name: &str) -> Result<(), JsValue> {
		element(node)?.remove_attribute(name)
	}

	fn set_attribute_ns(&self, node: &web_sys::Node, namespace: &str, name: &str, value: &str) -> Result<(), JsValue> {
		element(node)?.set_attribute_ns(Some(namespace), name, value)
	}

	fn remove_attribute_ns(&self, node: &web_sys::Node, namespace: &str, local_name: &str) -> Result<(), JsValue> {
		element(node)?.remove_attribute_ns(Some(namespace), local_name)
	}

	fn set_style(&self, node: &web_sys::Node, property: &str, value: &str) -> Result<(), JsValue> {
		let style = Reflect::get(element(node)?, &JsValue::from_str("style"))?;
		Reflect::set(&style, &JsValue::from_str(property), &JsValue::from_str(value)).map(drop)
	}

	fn set_data(&self, node: &web_sys::Node, key: &str, value: Option<&str>) -> Result<(), JsValue> {
		let dataset = Reflect::get(element(node)?, &JsValue::from_str("dataset"))?;
		match value {
			Some(value) => Reflect::set(&dataset, &JsValue::from_str(key), &JsValue::from_str(value)),
			None => Reflect::delete_property(dataset.unchecked_ref::<Object>(), &JsValue::from_str(key)),
		}
		.map(drop)
	}

	fn set_property(&self, node: &web_sys::Node, name: &str, value: &Value<Self>) -> Result<(), JsValue> {
		let element = element(node)?;
		let handler_key = (self.key(node), name.to_owned());
		match value {
			Value::Handler(handler) => {
				let handler = handler.clone();
				let closure = Closure::wrap(Box::new(move |event: web_sys::Event| handler(&event)) as Box<dyn Fn(web_sys::Event)>);
				Reflect::set(element, &JsValue::from_str(name), closure.as_ref())?;
				// The previous closure (if any) is only dropped once it's unreachable from the element.
				if self.handlers.borrow_mut().insert(handler_key, closure).is_some() {
					trace!("Replaced {:?} handler closure.", name);
				}
				Ok(())
			}
			value => {
				Reflect::set(element, &JsValue::from_str(name), &to_js(value))?;
				if self.handlers.borrow_mut().remove(&handler_key).is_some() {
					trace!("Dropped {:?} handler closure.", name);
				}
				Ok(())
			}
		}
	}

	fn release(&self, node: &web_sys::Node) {
		let key = self.key(node);
		let mut handlers = self.handlers.borrow_mut();
		let before = handlers.len();
		handlers.retain(|(handler_key, name), _| {
			if *handler_key != key {
				return true;
			}
			// Unhook first, so the element never calls into a dropped closure.
			let _ = Reflect::set(node, &JsValue::from_str(name), &JsValue::NULL);
			false
		});
		if handlers.len() < before {
			trace!("Dropped {} handler closure(s) of a released node.", before - handlers.len());
		}
	}
}

macro_rules! node_conversions {
	($($web_type:ty),*$(,)?) => {$(
		impl From<$web_type> for Mountable<WebDom> {
			fn from(node: $web_type) -> Self {
				Self::Node(node.into())
			}
		}

		impl From<&$web_type> for Mountable<WebDom> {
			fn from(node: &$web_type) -> Self {
				Self::Node(AsRef::<web_sys::Node>::as_ref(node).clone())
			}
		}

		impl From<$web_type> for Arg<WebDom> {
			fn from(node: $web_type) -> Self {
				Self::Child(node.into())
			}
		}

		impl From<&$web_type> for Arg<WebDom> {
			fn from(node: &$web_type) -> Self {
				Self::Child(node.into())
			}
		}

		impl From<$web_type> for Query<WebDom> {
			fn from(node: $web_type) -> Self {
				Self::Node(node.into())
			}
		}

		impl From<&$web_type> for Query<WebDom> {
			fn from(node: &$web_type) -> Self {
				Self::Node(AsRef::<web_sys::Node>::as_ref(node).clone())
			}
		}
	)*};
}

node_conversions!(web_sys::Node, Element, web_sys::HtmlElement, web_sys::Text);
