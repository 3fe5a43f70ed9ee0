//! Applying attributes, properties, styles and data to elements.
//!
//! Whether a key is written as an attribute or as a DOM property is decided up front by [`binding`], an explicit policy
//! per [`ElementKind`], rather than by probing the element.

use crate::{
	dom::{Dom, ElementKind, XLINK_NAMESPACE},
	engine::Engine,
	error::{DomResultExt, Error},
	view::Mountable,
};
use core::fmt::{self, Debug, Formatter};
use std::{borrow::Cow, rc::Rc};
use tracing::{instrument, trace, warn};

/// An event handler, assigned as a DOM property.
pub type Handler<D> = Rc<dyn Fn(&<D as Dom>::Event)>;

/// A value in an [`Attrs`] map.
pub enum Value<D: Dom> {
	/// Removes the attribute, style or data entry.
	Null,
	Text(String),
	Number(f64),
	Bool(bool),
	Handler(Handler<D>),
	/// Nested settings for `style`, `dataset` and (on SVG elements) `xlink`.
	Map(Attrs<D>),
}

impl<D: Dom> Value<D> {
	pub fn handler(handler: impl Fn(&D::Event) + 'static) -> Self {
		Self::Handler(Rc::new(handler))
	}

	#[must_use]
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// The attribute form of this value, formatted the way JavaScript stringifies it.
	///
	/// [`None`] for [`Value::Null`], handlers and maps.
	#[must_use]
	pub fn to_attribute_string(&self) -> Option<Cow<'_, str>> {
		match self {
			Self::Text(text) => Some(Cow::Borrowed(text)),
			Self::Number(number) => Some(Cow::Owned(format_number(*number))),
			Self::Bool(true) => Some(Cow::Borrowed("true")),
			Self::Bool(false) => Some(Cow::Borrowed("false")),
			Self::Null | Self::Handler(_) | Self::Map(_) => None,
		}
	}
}

pub(crate) fn format_number(number: f64) -> String {
	if number.is_nan() {
		"NaN".to_owned()
	} else if number.is_infinite() {
		let sign = if number > 0.0 { "" } else { "-" };
		format!("{}Infinity", sign)
	} else if number == 0.0 {
		// Covers -0 as well.
		"0".to_owned()
	} else if number.fract() == 0.0 && number.abs() < 1e21 {
		format!("{:.0}", number)
	} else {
		number.to_string()
	}
}

impl<D: Dom> Clone for Value<D> {
	fn clone(&self) -> Self {
		match self {
			Self::Null => Self::Null,
			Self::Text(text) => Self::Text(text.clone()),
			Self::Number(number) => Self::Number(*number),
			Self::Bool(bool) => Self::Bool(*bool),
			Self::Handler(handler) => Self::Handler(Rc::clone(handler)),
			Self::Map(attrs) => Self::Map(attrs.clone()),
		}
	}
}

impl<D: Dom> Debug for Value<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => f.write_str("Null"),
			Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
			Self::Number(number) => f.debug_tuple("Number").field(number).finish(),
			Self::Bool(bool) => f.debug_tuple("Bool").field(bool).finish(),
			Self::Handler(handler) => f.debug_tuple("Handler").field(&Rc::as_ptr(handler)).finish(),
			Self::Map(attrs) => f.debug_tuple("Map").field(attrs).finish(),
		}
	}
}

impl<D: Dom> PartialEq for Value<D> {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Null, Self::Null) => true,
			(Self::Text(a), Self::Text(b)) => a == b,
			(Self::Number(a), Self::Number(b)) => a == b,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Handler(a), Self::Handler(b)) => Rc::ptr_eq(a, b),
			(Self::Map(a), Self::Map(b)) => a == b,
			_ => false,
		}
	}
}

impl<D: Dom> From<&str> for Value<D> {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}

impl<D: Dom> From<String> for Value<D> {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl<D: Dom> From<&String> for Value<D> {
	fn from(text: &String) -> Self {
		Self::Text(text.clone())
	}
}

impl<D: Dom> From<bool> for Value<D> {
	fn from(bool: bool) -> Self {
		Self::Bool(bool)
	}
}

impl<D: Dom> From<f64> for Value<D> {
	fn from(number: f64) -> Self {
		Self::Number(number)
	}
}

impl<D: Dom> From<i32> for Value<D> {
	fn from(number: i32) -> Self {
		Self::Number(number.into())
	}
}

impl<D: Dom> From<u32> for Value<D> {
	fn from(number: u32) -> Self {
		Self::Number(number.into())
	}
}

impl<D: Dom> From<usize> for Value<D> {
	#[allow(clippy::cast_precision_loss)]
	fn from(number: usize) -> Self {
		Self::Number(number as f64)
	}
}

impl<D: Dom> From<Attrs<D>> for Value<D> {
	fn from(attrs: Attrs<D>) -> Self {
		Self::Map(attrs)
	}
}

impl<D: Dom, T: Into<Value<D>>> From<Option<T>> for Value<D> {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

/// An ordered key → [`Value`] mapping.
///
/// ```
/// use xylem_dom::{memory::MemoryDom, Attrs};
///
/// let attrs: Attrs<MemoryDom> = Attrs::new()
/// 	.set("type", "checkbox")
/// 	.set("checked", true)
/// 	.set("style", Attrs::new().set("color", "red"));
/// assert_eq!(attrs.len(), 3);
/// ```
pub struct Attrs<D: Dom>(Vec<(Cow<'static, str>, Value<D>)>);

impl<D: Dom> Attrs<D> {
	#[must_use]
	pub fn new() -> Self {
		Self(Vec::new())
	}

	/// Appends an entry. Later entries for the same key win when applied.
	#[must_use]
	pub fn set(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<Value<D>>) -> Self {
		self.0.push((key.into(), value.into()));
		self
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value<D>)> {
		self.0.iter().map(|(key, value)| (&**key, value))
	}
}

impl<D: Dom> Default for Attrs<D> {
	fn default() -> Self {
		Self::new()
	}
}

impl<D: Dom> Clone for Attrs<D> {
	fn clone(&self) -> Self {
		Self(self.0.clone())
	}
}

impl<D: Dom> Debug for Attrs<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.iter()).finish()
	}
}

impl<D: Dom> PartialEq for Attrs<D> {
	fn eq(&self, other: &Self) -> bool {
		self.0 == other.0
	}
}

impl<D: Dom, K: Into<Cow<'static, str>>, V: Into<Value<D>>> FromIterator<(K, V)> for Attrs<D> {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect())
	}
}

/// Where a key of an [`Attrs`] ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
	/// Each nested entry is a CSS property on `el.style`.
	Style,
	/// Each nested entry is written to `el.dataset`.
	Dataset,
	/// Assigned as `el[key]`.
	Property,
	/// Each nested entry is an attribute in the XLink namespace.
	Xlink,
	/// `setAttribute`/`removeAttribute`.
	Attribute,
}

/// Properties whose assignment replaces all of an element's children.
const CHILD_REPLACING_PROPERTIES: &[&str] = &["innerHTML", "innerText", "textContent"];

/// DOM properties of HTML elements that are assigned as properties rather than attributes.
///
/// Sorted, for binary search. `list` is deliberately absent: on `<input>` it is a read-only property, so it must stay an
/// attribute.
pub const HTML_PROPERTIES: &[&str] = &[
	"accessKey",
	"autocomplete",
	"autofocus",
	"checked",
	"className",
	"contentEditable",
	"defaultChecked",
	"defaultValue",
	"dir",
	"disabled",
	"draggable",
	"hidden",
	"href",
	"htmlFor",
	"id",
	"indeterminate",
	"innerHTML",
	"innerText",
	"lang",
	"max",
	"maxLength",
	"min",
	"minLength",
	"multiple",
	"name",
	"placeholder",
	"readOnly",
	"required",
	"selected",
	"selectedIndex",
	"spellcheck",
	"src",
	"step",
	"tabIndex",
	"textContent",
	"title",
	"type",
	"value",
];

/// The attribute/property policy: decides how `key` = `value` is applied to an element of the given `kind`.
///
/// In priority order:
///
/// 1. `style` with a map → [`Binding::Style`].
/// 2. Handlers on SVG elements → [`Binding::Property`].
/// 3. `dataset` with a map → [`Binding::Dataset`].
/// 4. On HTML elements, keys in [`HTML_PROPERTIES`] and handlers → [`Binding::Property`].
/// 5. `xlink` with a map on SVG elements → [`Binding::Xlink`].
/// 6. Everything else → [`Binding::Attribute`].
#[must_use]
pub fn binding<D: Dom>(kind: ElementKind, key: &str, value: &Value<D>) -> Binding {
	let is_map = matches!(value, Value::Map(_));
	let is_handler = matches!(value, Value::Handler(_));
	match kind {
		_ if key == "style" && is_map => Binding::Style,
		ElementKind::Svg if is_handler => Binding::Property,
		_ if key == "dataset" && is_map => Binding::Dataset,
		ElementKind::Html if key != "list" && (is_handler || HTML_PROPERTIES.binary_search(&key).is_ok()) => Binding::Property,
		ElementKind::Svg if key == "xlink" && is_map => Binding::Xlink,
		_ => Binding::Attribute,
	}
}

/// `existing` plus each class in `added` that isn't already present.
fn merge_classes(existing: &str, added: &str) -> String {
	let mut merged = existing.split_whitespace().collect::<Vec<_>>();
	for class in added.split_whitespace() {
		if !merged.contains(&class) {
			merged.push(class);
		}
	}
	merged.join(" ")
}

impl<D: Dom> Engine<D> {
	/// Applies each entry of `attrs` to `target`'s element according to [`binding`].
	///
	/// Idempotent.
	///
	/// # Errors
	///
	/// Iff `target` can't be resolved or the host rejects a write.
	#[instrument(skip_all, fields(keys = attrs.len()))]
	pub fn set_attr(&self, target: impl Into<Mountable<D>>, attrs: &Attrs<D>) -> Result<(), Error> {
		let el = self.get_el(&target.into())?;
		self.apply_attrs(&el, attrs, false)
	}

	/// Applies a single `key` = `value` to `target`'s element according to [`binding`].
	///
	/// # Errors
	///
	/// Iff `target` can't be resolved or the host rejects the write.
	#[instrument(skip(self, target, value))]
	pub fn set_attr_value(&self, target: impl Into<Mountable<D>>, key: &str, value: impl Into<Value<D>>) -> Result<(), Error> {
		let el = self.get_el(&target.into())?;
		self.apply_attr(&el, key, &value.into(), false)
	}

	/// Sets each entry of `styles` as a CSS property of `target`'s element. [`Value::Null`] clears a property.
	///
	/// # Errors
	///
	/// Iff `target` can't be resolved or the host rejects a write.
	#[instrument(skip_all, fields(properties = styles.len()))]
	pub fn set_style(&self, target: impl Into<Mountable<D>>, styles: &Attrs<D>) -> Result<(), Error> {
		let el = self.get_el(&target.into())?;
		self.apply_styles(&el, styles)
	}

	/// `initial` is set while an element is being built, in which case `class` extends the selector's classes.
	pub(crate) fn apply_attrs(&self, el: &D::Node, attrs: &Attrs<D>, initial: bool) -> Result<(), Error> {
		for (key, value) in attrs.iter() {
			self.apply_attr(el, key, value, initial)?;
		}
		Ok(())
	}

	fn apply_attr(&self, el: &D::Node, key: &str, value: &Value<D>, initial: bool) -> Result<(), Error> {
		let dom = self.dom();
		let kind = match dom.element_kind(el) {
			Some(kind) => kind,
			None => {
				warn!("Ignoring attribute {:?} on non-element {:?}.", key, el);
				return Ok(());
			}
		};

		let binding = binding(kind, key, value);
		if cfg!(feature = "dangerous-logging") {
			trace!(?binding, key, ?value, "Applying");
		} else {
			trace!(?binding, key, "Applying");
		}

		match (binding, value) {
			(Binding::Style, Value::Map(styles)) => self.apply_styles(el, styles),
			(Binding::Dataset, Value::Map(data)) => {
				for (key, value) in data.iter() {
					let value = value.to_attribute_string();
					dom.set_data(el, key, value.as_deref()).during("set data")?;
				}
				Ok(())
			}
			(Binding::Xlink, Value::Map(links)) => {
				for (key, value) in links.iter() {
					match value.to_attribute_string() {
						Some(value) => dom.set_attribute_ns(el, XLINK_NAMESPACE, key, &value).during("set XLink attribute")?,
						None => dom.remove_attribute_ns(el, XLINK_NAMESPACE, key).during("remove XLink attribute")?,
					}
				}
				Ok(())
			}
			(Binding::Property, value) => {
				if CHILD_REPLACING_PROPERTIES.contains(&key) {
					self.unmount_children(el)?;
				}
				dom.set_property(el, key, value).during("set property")
			}
			(_, Value::Map(_)) | (_, Value::Handler(_)) => {
				warn!("Can't set {:?} as an attribute; Ignoring it.", key);
				Ok(())
			}
			(_, Value::Null) if initial && key == "class" => Ok(()),
			(_, Value::Null) => dom.remove_attribute(el, key).during("remove attribute"),
			(_, value) => {
				let value = value.to_attribute_string().unwrap_or_default();
				if initial && key == "class" {
					let existing = dom.get_attribute(el, "class").unwrap_or_default();
					dom.set_attribute(el, key, &merge_classes(&existing, &value)).during("set attribute")
				} else {
					dom.set_attribute(el, key, &value).during("set attribute")
				}
			}
		}
	}

	/// Unmounts every child of `el` through the engine, so their hooks and counters are accounted for.
	fn unmount_children(&self, el: &D::Node) -> Result<(), Error> {
		let dom = self.dom();
		let mut removed = 0_usize;
		while let Some(child) = dom.first_child(el) {
			self.unmount(Mountable::Node(el.clone()), Mountable::Node(child))?;
			removed += 1;
		}
		if removed > 0 {
			trace!("Unmounted {} child(ren) ahead of a content property.", removed);
		}
		Ok(())
	}

	fn apply_styles(&self, el: &D::Node, styles: &Attrs<D>) -> Result<(), Error> {
		let dom = self.dom();
		for (property, value) in styles.iter() {
			let value = value.to_attribute_string().unwrap_or_default();
			dom.set_style(el, property, &value).during("set style")?;
		}
		Ok(())
	}
}
