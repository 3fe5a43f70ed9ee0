//! The host document abstraction.
//!
//! The engine never touches a document directly. Everything it needs from the host is expressed as a method on [`Dom`],
//! which is implemented for the browser by [`WebDom`](`crate::web::WebDom`) and headlessly by [`MemoryDom`](`crate::memory::MemoryDom`).

use crate::attr::Value;
use core::{fmt::Debug, hash::Hash};

/// The [SVG namespace](https://www.w3.org/TR/SVG2/struct.html#Namespace).
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// The XLink namespace, used for `xlink:*` attributes on SVG elements.
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

/// Which attribute/property policy applies to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
	/// HTML (and, as a fallback, any other non-SVG) element.
	Html,
	/// An element in the [`SVG_NAMESPACE`].
	Svg,
}

/// A document the engine can construct and rearrange nodes in.
///
/// Nodes are handles: cloning a [`Dom::Node`] must not clone the underlying node, and [`PartialEq`] must compare identity.
pub trait Dom: Sized + 'static {
	type Node: Clone + PartialEq + Debug;
	/// A stable identity for a node, valid for as long as the node exists and never reused afterwards.
	type Key: Copy + Eq + Hash + Debug;
	/// The event type passed to [`Value::Handler`]s.
	type Event;
	type Error: Debug;

	fn key(&self, node: &Self::Node) -> Self::Key;

	/// Creates an unattached element, in `namespace` if given.
	///
	/// # Errors
	///
	/// Iff the host rejects the tag name.
	fn create_element(&self, tag: &str, namespace: Option<&str>) -> Result<Self::Node, Self::Error>;
	fn create_text_node(&self, data: &str) -> Self::Node;

	/// Clones `node` and its attributes, but not its children.
	///
	/// # Errors
	///
	/// Iff the host refuses to clone this kind of node.
	fn clone_shallow(&self, node: &Self::Node) -> Result<Self::Node, Self::Error>;

	/// [`None`] for anything that isn't an element.
	fn element_kind(&self, node: &Self::Node) -> Option<ElementKind>;

	/// Whether `node` is a document or shadow root, i.e. a point from which attached subtrees count as mounted.
	fn is_root(&self, node: &Self::Node) -> bool;

	fn parent_node(&self, node: &Self::Node) -> Option<Self::Node>;
	fn first_child(&self, node: &Self::Node) -> Option<Self::Node>;
	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

	/// # Errors
	///
	/// As the host's `appendChild`.
	fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), Self::Error>;

	/// # Errors
	///
	/// As the host's `insertBefore`.
	fn insert_before(&self, parent: &Self::Node, child: &Self::Node, anchor: &Self::Node) -> Result<(), Self::Error>;

	/// Puts `child` where `old` is and detaches `old`.
	///
	/// # Errors
	///
	/// As the host's `replaceChild`.
	fn replace_child(&self, parent: &Self::Node, child: &Self::Node, old: &Self::Node) -> Result<(), Self::Error>;

	/// # Errors
	///
	/// As the host's `removeChild`.
	fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), Self::Error>;

	fn get_attribute(&self, element: &Self::Node, name: &str) -> Option<String>;

	/// # Errors
	///
	/// Iff `element` isn't an element or the host rejects the name.
	fn set_attribute(&self, element: &Self::Node, name: &str, value: &str) -> Result<(), Self::Error>;

	/// # Errors
	///
	/// Iff `element` isn't an element.
	fn remove_attribute(&self, element: &Self::Node, name: &str) -> Result<(), Self::Error>;

	/// # Errors
	///
	/// Iff `element` isn't an element or the host rejects the name.
	fn set_attribute_ns(&self, element: &Self::Node, namespace: &str, name: &str, value: &str) -> Result<(), Self::Error>;

	/// # Errors
	///
	/// Iff `element` isn't an element.
	fn remove_attribute_ns(&self, element: &Self::Node, namespace: &str, local_name: &str) -> Result<(), Self::Error>;

	/// Writes `element.style[property]`. An empty `value` clears the property.
	///
	/// # Errors
	///
	/// Iff `element` has no style declaration.
	fn set_style(&self, element: &Self::Node, property: &str, value: &str) -> Result<(), Self::Error>;

	/// Writes `element.dataset[key]`, or deletes it if `value` is [`None`].
	///
	/// # Errors
	///
	/// Iff `element` has no dataset.
	fn set_data(&self, element: &Self::Node, key: &str, value: Option<&str>) -> Result<(), Self::Error>;

	/// Assigns a DOM property (as opposed to an attribute).
	///
	/// # Errors
	///
	/// Iff the host throws on assignment.
	fn set_property(&self, element: &Self::Node, name: &str, value: &Value<Self>) -> Result<(), Self::Error>;

	/// Drops whatever the host keeps for `node` beyond the node itself, such as handler closures.
	///
	/// Called for each node of a subtree the engine releases.
	fn release(&self, _node: &Self::Node) {}
}
