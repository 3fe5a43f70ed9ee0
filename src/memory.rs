//! A headless [`Dom`] that keeps its nodes in memory.
//!
//! It follows the browser closely enough to run the engine natively (mostly in tests): nodes have identity, children are
//! ordered, `insertBefore`/`replaceChild` detach the inserted node from its previous parent first, and invalid
//! mutations fail with the matching [`DomException`].
//!
//! Properties that reflect an attribute in browsers (`id`, `className`, `htmlFor`, …) write that attribute, `dataset`
//! writes `data-*` attributes and `style` is kept in sync with the `style` attribute. Other properties are stored as-is
//! and can be read back with [`Node::property`].

use crate::{
	attr::Value,
	dom::{Dom, ElementKind, SVG_NAMESPACE, XLINK_NAMESPACE},
	element::{Arg, Query},
	view::Mountable,
};
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter, Write as _},
};
use hashbrown::HashMap;
use std::rc::{Rc, Weak};
use thiserror::Error;
use tracing::trace;

/// Mirrors the `DOMException` names the browser would throw for the same mistakes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomException {
	#[error("NotFoundError: the node to operate relative to is not a child of this node")]
	NotFound,
	#[error("HierarchyRequestError: the operation would yield an incorrect node tree")]
	HierarchyRequest,
	#[error("InvalidCharacterError: {0:?} is not a valid name")]
	InvalidCharacter(String),
	#[error("InvalidNodeTypeError: the node is not an element")]
	InvalidNodeType,
}

/// An event passed to handlers by [`Node::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
	name: String,
}

impl Event {
	#[must_use]
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into() }
	}

	/// The event type, e.g. `"click"`.
	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}
}

#[derive(Debug, Clone)]
enum Kind {
	Document,
	ShadowRoot,
	Element { tag: String, namespace: Option<String> },
	Text(String),
}

#[derive(Debug, Clone)]
struct Attribute {
	namespace: Option<String>,
	name: String,
	value: String,
}

struct NodeData {
	id: u64,
	kind: Kind,
	parent: Weak<RefCell<NodeData>>,
	children: Vec<Node>,
	attributes: Vec<Attribute>,
	style: Vec<(String, String)>,
	properties: HashMap<String, Value<MemoryDom>>,
	shadow_root: Option<Node>,
}

/// A handle to a node of a [`MemoryDom`]. Equality is identity.
#[derive(Clone)]
pub struct Node(Rc<RefCell<NodeData>>);

impl PartialEq for Node {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl Eq for Node {}

impl Debug for Node {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let data = self.0.borrow();
		let mut tuple = f.debug_tuple("Node");
		tuple.field(&data.id);
		match &data.kind {
			Kind::Document => tuple.field(&"#document"),
			Kind::ShadowRoot => tuple.field(&"#shadow-root"),
			Kind::Element { tag, .. } => tuple.field(tag),
			Kind::Text(text) if cfg!(feature = "dangerous-logging") => tuple.field(text),
			Kind::Text(_) => tuple.field(&"#text"),
		};
		tuple.finish()
	}
}

/// Elements that have no closing tag in [`Node::to_html`].
const VOID_ELEMENTS: &[&str] = &["area", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr"];

enum Reflection {
	Text(&'static str),
	Presence(&'static str),
	TextContent,
}

fn reflection(property: &str) -> Option<Reflection> {
	Some(match property {
		"accessKey" => Reflection::Text("accesskey"),
		"className" => Reflection::Text("class"),
		"htmlFor" => Reflection::Text("for"),
		"dir" => Reflection::Text("dir"),
		"href" => Reflection::Text("href"),
		"id" => Reflection::Text("id"),
		"lang" => Reflection::Text("lang"),
		"name" => Reflection::Text("name"),
		"placeholder" => Reflection::Text("placeholder"),
		"src" => Reflection::Text("src"),
		"title" => Reflection::Text("title"),
		"type" => Reflection::Text("type"),
		"autofocus" => Reflection::Presence("autofocus"),
		"disabled" => Reflection::Presence("disabled"),
		"hidden" => Reflection::Presence("hidden"),
		"multiple" => Reflection::Presence("multiple"),
		"readOnly" => Reflection::Presence("readonly"),
		"required" => Reflection::Presence("required"),
		"textContent" | "innerText" => Reflection::TextContent,
		_ => return None,
	})
}

fn truthy(value: &Value<MemoryDom>) -> bool {
	match value {
		Value::Null => false,
		Value::Text(text) => !text.is_empty(),
		Value::Number(number) => *number != 0.0 && !number.is_nan(),
		Value::Bool(bool) => *bool,
		Value::Handler(_) | Value::Map(_) => true,
	}
}

fn validate_name(name: &str) -> Result<(), DomException> {
	if name.is_empty() || name.chars().any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '"' | '\'' | '/' | '=')) {
		Err(DomException::InvalidCharacter(name.to_owned()))
	} else {
		Ok(())
	}
}

/// `fooBar` → `data-foo-bar`
fn data_attribute_name(key: &str) -> String {
	let mut name = String::with_capacity(key.len() + 5);
	name.push_str("data-");
	for c in key.chars() {
		if c.is_ascii_uppercase() {
			name.push('-');
			name.push(c.to_ascii_lowercase());
		} else {
			name.push(c);
		}
	}
	name
}

fn parse_style(text: &str) -> Vec<(String, String)> {
	text.split(';')
		.filter_map(|declaration| {
			let (property, value) = declaration.split_once(':')?;
			let (property, value) = (property.trim(), value.trim());
			(!property.is_empty() && !value.is_empty()).then(|| (property.to_owned(), value.to_owned()))
		})
		.collect()
}

fn serialize_style(style: &[(String, String)]) -> String {
	style.iter().map(|(property, value)| format!("{}: {};", property, value)).collect::<Vec<_>>().join(" ")
}

fn escape(text: &str, attribute: bool) -> String {
	let mut escaped = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' if !attribute => escaped.push_str("&lt;"),
			'>' if !attribute => escaped.push_str("&gt;"),
			'"' if attribute => escaped.push_str("&quot;"),
			c => escaped.push(c),
		}
	}
	escaped
}

impl Node {
	fn data(&self) -> core::cell::Ref<'_, NodeData> {
		self.0.borrow()
	}

	fn data_mut(&self) -> core::cell::RefMut<'_, NodeData> {
		self.0.borrow_mut()
	}

	fn is_element(&self) -> bool {
		matches!(self.data().kind, Kind::Element { .. })
	}

	fn can_have_children(&self) -> bool {
		!matches!(self.data().kind, Kind::Text(_))
	}

	/// The element's local name, [`None`] for other nodes.
	#[must_use]
	pub fn tag_name(&self) -> Option<String> {
		match &self.data().kind {
			Kind::Element { tag, .. } => Some(tag.clone()),
			_ => None,
		}
	}

	#[must_use]
	pub fn namespace(&self) -> Option<String> {
		match &self.data().kind {
			Kind::Element { namespace, .. } => namespace.clone(),
			_ => None,
		}
	}

	/// The value of the non-namespaced attribute `name`.
	#[must_use]
	pub fn attribute(&self, name: &str) -> Option<String> {
		if name == "style" {
			let data = self.data();
			return (!data.style.is_empty()).then(|| serialize_style(&data.style));
		}
		self.data()
			.attributes
			.iter()
			.find(|attribute| attribute.namespace.is_none() && attribute.name == name)
			.map(|attribute| attribute.value.clone())
	}

	#[must_use]
	pub fn attribute_ns(&self, namespace: &str, local_name: &str) -> Option<String> {
		self.data()
			.attributes
			.iter()
			.find(|attribute| attribute.namespace.as_deref() == Some(namespace) && attribute.name == local_name)
			.map(|attribute| attribute.value.clone())
	}

	/// All non-namespaced attribute names, in the order they were first set.
	#[must_use]
	pub fn attribute_names(&self) -> Vec<String> {
		let data = self.data();
		let mut names = data
			.attributes
			.iter()
			.filter(|attribute| attribute.namespace.is_none())
			.map(|attribute| attribute.name.clone())
			.collect::<Vec<_>>();
		if !data.style.is_empty() {
			names.push("style".to_owned());
		}
		names
	}

	/// `element.style[property]`, [`None`] if unset.
	#[must_use]
	pub fn style(&self, property: &str) -> Option<String> {
		self.data().style.iter().find(|(name, _)| name == property).map(|(_, value)| value.clone())
	}

	/// `element.dataset[key]`.
	#[must_use]
	pub fn dataset(&self, key: &str) -> Option<String> {
		self.attribute(&data_attribute_name(key))
	}

	/// A stored (non-reflecting) property.
	#[must_use]
	pub fn property(&self, name: &str) -> Option<Value<MemoryDom>> {
		self.data().properties.get(name).cloned()
	}

	#[must_use]
	pub fn parent(&self) -> Option<Node> {
		self.data().parent.upgrade().map(Node)
	}

	#[must_use]
	pub fn children(&self) -> Vec<Node> {
		self.data().children.clone()
	}

	/// The shadow root attached with [`MemoryDom::attach_shadow`], if any.
	#[must_use]
	pub fn shadow_root(&self) -> Option<Node> {
		self.data().shadow_root.clone()
	}

	/// The concatenated text of this node and all its descendants.
	#[must_use]
	pub fn text_content(&self) -> String {
		let mut text = String::new();
		let mut stack = vec![self.clone()];
		while let Some(node) = stack.pop() {
			let data = node.data();
			if let Kind::Text(data) = &data.kind {
				text.push_str(data);
			}
			stack.extend(data.children.iter().rev().cloned());
		}
		text
	}

	/// Serializes this node and its light tree. Shadow trees are left out.
	#[must_use]
	pub fn to_html(&self) -> String {
		let mut html = String::new();
		self.write_html(&mut html);
		html
	}

	fn write_html(&self, html: &mut String) {
		let data = self.data();
		match &data.kind {
			Kind::Text(text) => html.push_str(&escape(text, false)),
			Kind::Document | Kind::ShadowRoot => {
				for child in &data.children {
					child.write_html(html);
				}
			}
			Kind::Element { tag, .. } => {
				html.push('<');
				html.push_str(tag);
				for attribute in &data.attributes {
					let prefix = if attribute.namespace.as_deref() == Some(XLINK_NAMESPACE) { "xlink:" } else { "" };
					let _ = write!(html, r#" {}{}="{}""#, prefix, attribute.name, escape(&attribute.value, true));
				}
				if !data.style.is_empty() {
					let _ = write!(html, r#" style="{}""#, escape(&serialize_style(&data.style), true));
				}
				html.push('>');
				if VOID_ELEMENTS.contains(&tag.as_str()) && data.children.is_empty() {
					return;
				}
				for child in &data.children {
					child.write_html(html);
				}
				let _ = write!(html, "</{}>", tag);
			}
		}
	}

	/// Calls the `on{name}` handler of this node and then of each ancestor.
	///
	/// Returns how many handlers were called.
	pub fn dispatch(&self, event: &Event) -> usize {
		let property = format!("on{}", event.name());
		let mut called = 0;
		let mut current = Some(self.clone());
		while let Some(node) = current {
			let handler = match node.data().properties.get(&property) {
				Some(Value::Handler(handler)) => Some(Rc::clone(handler)),
				_ => None,
			};
			if let Some(handler) = handler {
				called += 1;
				handler(event);
			}
			current = node.parent();
		}
		called
	}

	fn set_attribute_entry(&self, namespace: Option<&str>, name: &str, value: &str) {
		if namespace.is_none() && name == "style" {
			self.data_mut().style = parse_style(value);
			return;
		}
		let local_name = match namespace {
			Some(_) => name.rsplit(':').next().unwrap_or(name),
			None => name,
		};
		let mut data = self.data_mut();
		match data
			.attributes
			.iter_mut()
			.find(|attribute| attribute.namespace.as_deref() == namespace && attribute.name == local_name)
		{
			Some(attribute) => value.clone_into(&mut attribute.value),
			None => data.attributes.push(Attribute {
				namespace: namespace.map(str::to_owned),
				name: local_name.to_owned(),
				value: value.to_owned(),
			}),
		}
	}

	fn remove_attribute_entry(&self, namespace: Option<&str>, local_name: &str) {
		let mut data = self.data_mut();
		if namespace.is_none() && local_name == "style" {
			data.style.clear();
		}
		data.attributes
			.retain(|attribute| !(attribute.namespace.as_deref() == namespace && attribute.name == local_name));
	}

	fn position_in(&self, parent: &Node) -> Option<usize> {
		parent.data().children.iter().position(|child| child == self)
	}

	/// Removes `self` from its parent's children, if it has a parent.
	fn detach(&self) {
		if let Some(parent) = self.parent() {
			if let Some(index) = self.position_in(&parent) {
				parent.data_mut().children.remove(index);
			}
			self.data_mut().parent = Weak::new();
		}
	}

	fn is_inclusive_ancestor_of(&self, node: &Node) -> bool {
		let mut current = Some(node.clone());
		while let Some(node) = current {
			if node == *self {
				return true;
			}
			current = node.parent();
		}
		false
	}
}

/// A headless document.
pub struct MemoryDom {
	document: Node,
	body: Node,
	next_id: Cell<u64>,
}

impl Default for MemoryDom {
	fn default() -> Self {
		Self::new()
	}
}

impl Debug for MemoryDom {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryDom").field("document", &self.document).field("next_id", &self.next_id).finish()
	}
}

impl MemoryDom {
	/// Creates a document containing `<html><body></body></html>`.
	#[must_use]
	pub fn new() -> Self {
		let next_id = Cell::new(0);
		let document = Self::new_node(&next_id, Kind::Document);
		let html = Self::new_node(
			&next_id,
			Kind::Element {
				tag: "html".to_owned(),
				namespace: None,
			},
		);
		let body = Self::new_node(
			&next_id,
			Kind::Element {
				tag: "body".to_owned(),
				namespace: None,
			},
		);
		Self::attach(&html, &body, None);
		Self::attach(&document, &html, None);
		Self { document, body, next_id }
	}

	#[must_use]
	pub fn document(&self) -> Node {
		self.document.clone()
	}

	#[must_use]
	pub fn body(&self) -> Node {
		self.body.clone()
	}

	/// Attaches a new shadow root to `host`, or returns the existing one.
	///
	/// # Errors
	///
	/// Iff `host` isn't an element.
	pub fn attach_shadow(&self, host: &Node) -> Result<Node, DomException> {
		if !host.is_element() {
			return Err(DomException::InvalidNodeType);
		}
		if let Some(shadow_root) = host.shadow_root() {
			return Ok(shadow_root);
		}
		let shadow_root = Self::new_node(&self.next_id, Kind::ShadowRoot);
		host.data_mut().shadow_root = Some(shadow_root.clone());
		Ok(shadow_root)
	}

	fn new_node(next_id: &Cell<u64>, kind: Kind) -> Node {
		let id = next_id.get();
		next_id.set(id + 1);
		Node(Rc::new(RefCell::new(NodeData {
			id,
			kind,
			parent: Weak::new(),
			children: Vec::new(),
			attributes: Vec::new(),
			style: Vec::new(),
			properties: HashMap::new(),
			shadow_root: None,
		})))
	}

	/// Inserts an already detached `child` at `index` (or last).
	fn attach(parent: &Node, child: &Node, index: Option<usize>) {
		child.data_mut().parent = Rc::downgrade(&parent.0);
		let mut parent = parent.data_mut();
		match index {
			Some(index) => parent.children.insert(index, child.clone()),
			None => parent.children.push(child.clone()),
		}
	}

	fn check_insertion(parent: &Node, child: &Node) -> Result<(), DomException> {
		let child_is_root = matches!(child.data().kind, Kind::Document | Kind::ShadowRoot);
		if !parent.can_have_children() || child_is_root || child.is_inclusive_ancestor_of(parent) {
			Err(DomException::HierarchyRequest)
		} else {
			Ok(())
		}
	}

	fn require_element(element: &Node) -> Result<(), DomException> {
		if element.is_element() {
			Ok(())
		} else {
			Err(DomException::InvalidNodeType)
		}
	}
}

impl Dom for MemoryDom {
	type Node = Node;
	type Key = u64;
	type Event = Event;
	type Error = DomException;

	fn key(&self, node: &Node) -> u64 {
		node.data().id
	}

	fn create_element(&self, tag: &str, namespace: Option<&str>) -> Result<Node, DomException> {
		validate_name(tag)?;
		let tag = if namespace.is_none() { tag.to_ascii_lowercase() } else { tag.to_owned() };
		Ok(Self::new_node(
			&self.next_id,
			Kind::Element {
				tag,
				namespace: namespace.map(str::to_owned),
			},
		))
	}

	fn create_text_node(&self, data: &str) -> Node {
		Self::new_node(&self.next_id, Kind::Text(data.to_owned()))
	}

	fn clone_shallow(&self, node: &Node) -> Result<Node, DomException> {
		let data = node.data();
		if matches!(data.kind, Kind::Document | Kind::ShadowRoot) {
			return Err(DomException::InvalidNodeType);
		}
		let clone = Self::new_node(&self.next_id, data.kind.clone());
		{
			let mut clone = clone.data_mut();
			clone.attributes = data.attributes.clone();
			clone.style = data.style.clone();
		}
		Ok(clone)
	}

	fn element_kind(&self, node: &Node) -> Option<ElementKind> {
		match &node.data().kind {
			Kind::Element { namespace, .. } if namespace.as_deref() == Some(SVG_NAMESPACE) => Some(ElementKind::Svg),
			Kind::Element { .. } => Some(ElementKind::Html),
			_ => None,
		}
	}

	fn is_root(&self, node: &Node) -> bool {
		matches!(node.data().kind, Kind::Document | Kind::ShadowRoot)
	}

	fn parent_node(&self, node: &Node) -> Option<Node> {
		node.parent()
	}

	fn first_child(&self, node: &Node) -> Option<Node> {
		node.data().children.first().cloned()
	}

	fn next_sibling(&self, node: &Node) -> Option<Node> {
		let parent = node.parent()?;
		let index = node.position_in(&parent)?;
		let next = parent.data().children.get(index + 1).cloned();
		next
	}

	fn append_child(&self, parent: &Node, child: &Node) -> Result<(), DomException> {
		Self::check_insertion(parent, child)?;
		child.detach();
		Self::attach(parent, child, None);
		Ok(())
	}

	fn insert_before(&self, parent: &Node, child: &Node, anchor: &Node) -> Result<(), DomException> {
		if anchor.position_in(parent).is_none() {
			return Err(DomException::NotFound);
		}
		Self::check_insertion(parent, child)?;
		if child == anchor {
			return Ok(());
		}
		child.detach();
		let index = anchor.position_in(parent).ok_or(DomException::NotFound)?;
		Self::attach(parent, child, Some(index));
		Ok(())
	}

	fn replace_child(&self, parent: &Node, child: &Node, old: &Node) -> Result<(), DomException> {
		if old.position_in(parent).is_none() {
			return Err(DomException::NotFound);
		}
		Self::check_insertion(parent, child)?;
		if child == old {
			return Ok(());
		}
		child.detach();
		let index = old.position_in(parent).ok_or(DomException::NotFound)?;
		old.detach();
		Self::attach(parent, child, Some(index));
		Ok(())
	}

	fn remove_child(&self, parent: &Node, child: &Node) -> Result<(), DomException> {
		if child.position_in(parent).is_none() {
			return Err(DomException::NotFound);
		}
		child.detach();
		Ok(())
	}

	fn get_attribute(&self, element: &Node, name: &str) -> Option<String> {
		element.attribute(name)
	}

	fn set_attribute(&self, element: &Node, name: &str, value: &str) -> Result<(), DomException> {
		Self::require_element(element)?;
		validate_name(name)?;
		element.set_attribute_entry(None, name, value);
		Ok(())
	}

	fn remove_attribute(&self, element: &Node, name: &str) -> Result<(), DomException> {
		Self::require_element(element)?;
		element.remove_attribute_entry(None, name);
		Ok(())
	}

	fn set_attribute_ns(&self, element: &Node, namespace: &str, name: &str, value: &str) -> Result<(), DomException> {
		Self::require_element(element)?;
		validate_name(name)?;
		element.set_attribute_entry(Some(namespace), name, value);
		Ok(())
	}

	fn remove_attribute_ns(&self, element: &Node, namespace: &str, local_name: &str) -> Result<(), DomException> {
		Self::require_element(element)?;
		element.remove_attribute_entry(Some(namespace), local_name);
		Ok(())
	}

	fn set_style(&self, element: &Node, property: &str, value: &str) -> Result<(), DomException> {
		Self::require_element(element)?;
		let mut data = element.data_mut();
		let existing = data.style.iter().position(|(name, _)| name == property);
		match (existing, value.is_empty()) {
			(Some(index), true) => {
				data.style.remove(index);
			}
			(Some(index), false) => value.clone_into(&mut data.style[index].1),
			(None, true) => (),
			(None, false) => data.style.push((property.to_owned(), value.to_owned())),
		}
		Ok(())
	}

	fn set_data(&self, element: &Node, key: &str, value: Option<&str>) -> Result<(), DomException> {
		Self::require_element(element)?;
		let name = data_attribute_name(key);
		validate_name(&name)?;
		match value {
			Some(value) => element.set_attribute_entry(None, &name, value),
			None => element.remove_attribute_entry(None, &name),
		}
		Ok(())
	}

	fn set_property(&self, element: &Node, name: &str, value: &Value<Self>) -> Result<(), DomException> {
		Self::require_element(element)?;
		match reflection(name) {
			Some(Reflection::Text(attribute)) => match value.to_attribute_string() {
				Some(text) => element.set_attribute_entry(None, attribute, &text),
				None => element.remove_attribute_entry(None, attribute),
			},
			Some(Reflection::Presence(attribute)) => {
				if truthy(value) {
					element.set_attribute_entry(None, attribute, "");
				} else {
					element.remove_attribute_entry(None, attribute);
				}
			}
			Some(Reflection::TextContent) => {
				// Engine-managed children were already unmounted by the attribute applier.
				for child in element.children() {
					child.detach();
				}
				let text = value.to_attribute_string().unwrap_or_default();
				if !text.is_empty() {
					let text = self.create_text_node(&text);
					Self::attach(element, &text, None);
				}
			}
			None => {
				trace!("Storing property {:?}.", name);
				element.data_mut().properties.insert(name.to_owned(), value.clone());
			}
		}
		Ok(())
	}
}

impl From<Node> for Mountable<MemoryDom> {
	fn from(node: Node) -> Self {
		Self::Node(node)
	}
}

impl From<&Node> for Mountable<MemoryDom> {
	fn from(node: &Node) -> Self {
		Self::Node(node.clone())
	}
}

impl From<Node> for Arg<MemoryDom> {
	fn from(node: Node) -> Self {
		Self::Child(Mountable::Node(node))
	}
}

impl From<&Node> for Arg<MemoryDom> {
	fn from(node: &Node) -> Self {
		Self::Child(Mountable::Node(node.clone()))
	}
}

impl From<Node> for Query<MemoryDom> {
	fn from(node: Node) -> Self {
		Self::Node(node)
	}
}

impl From<&Node> for Query<MemoryDom> {
	fn from(node: &Node) -> Self {
		Self::Node(node.clone())
	}
}
