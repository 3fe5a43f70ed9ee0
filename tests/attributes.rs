#![cfg(not(target_arch = "wasm32"))]

use rstest::rstest;
use std::{cell::Cell, rc::Rc};
use xylem_dom::{
	dom::XLINK_NAMESPACE,
	el,
	memory::{Event, MemoryDom},
	svg, Attrs, Engine, Value,
};

use memory_probe_::init_logging;

fn engine() -> Engine<MemoryDom> {
	init_logging();
	Engine::new(MemoryDom::new())
}

#[rstest]
#[case("div.x", "a", "x a")]
#[case("div.x.a", "a b", "x a b")]
#[case("div", "a b", "a b")]
#[case("p.x", "", "x")]
fn initial_class_extends_the_selector(#[case] selector: &str, #[case] class: &str, #[case] expected: &str) {
	let engine = engine();
	let el = el!(engine, selector, Attrs::new().set("class", class)).unwrap();
	assert_eq!(el.attribute("class").as_deref(), Some(expected));
}

#[test]
fn initial_null_class_keeps_the_selector() {
	let engine = engine();
	let el = el!(engine, ".x", Attrs::new().set("class", Value::Null)).unwrap();
	assert_eq!(el.attribute("class").as_deref(), Some("x"));
}

#[test]
fn later_class_replaces() {
	let engine = engine();
	let el = el!(engine, ".x").unwrap();
	let attrs = Attrs::new().set("class", "a b");
	engine.set_attr(&el, &attrs).unwrap();
	engine.set_attr(&el, &attrs).unwrap();
	assert_eq!(el.attribute("class").as_deref(), Some("a b"));
}

#[test]
fn styles() {
	let engine = engine();
	let el = el!(engine, "div", Attrs::new().set("style", Attrs::new().set("color", "red").set("margin", "0"))).unwrap();
	assert_eq!(el.style("color").as_deref(), Some("red"));
	assert_eq!(el.style("margin").as_deref(), Some("0"));

	engine.set_style(&el, &Attrs::new().set("color", Value::Null)).unwrap();
	assert_eq!(el.style("color"), None);
	assert_eq!(el.attribute("style").as_deref(), Some("margin: 0;"));
}

#[test]
fn string_styles_are_attributes() {
	let engine = engine();
	let el = el!(engine, "div", Attrs::new().set("style", "color: blue")).unwrap();
	assert_eq!(el.style("color").as_deref(), Some("blue"));
}

#[test]
fn dataset() {
	let engine = engine();
	let el = el!(engine, "div", Attrs::new().set("dataset", Attrs::new().set("userId", 7).set("role", "admin"))).unwrap();
	assert_eq!(el.attribute("data-user-id").as_deref(), Some("7"));
	assert_eq!(el.dataset("role").as_deref(), Some("admin"));

	engine.set_attr_value(&el, "dataset", Attrs::new().set("role", Value::Null)).unwrap();
	assert_eq!(el.dataset("role"), None);
}

#[test]
fn xlink() {
	let engine = engine();
	let el = svg!(engine, "use", Attrs::new().set("xlink", Attrs::new().set("href", "#icon"))).unwrap();
	assert_eq!(el.attribute_ns(XLINK_NAMESPACE, "href").as_deref(), Some("#icon"));
	assert_eq!(el.attribute("xlink"), None);

	engine.set_attr_value(&el, "xlink", Attrs::new().set("href", Value::Null)).unwrap();
	assert_eq!(el.attribute_ns(XLINK_NAMESPACE, "href"), None);
}

#[test]
fn html_xlink_is_an_ignored_attribute() {
	let engine = engine();
	let el = el!(engine, "a", Attrs::new().set("xlink", Attrs::new().set("href", "#icon"))).unwrap();
	assert_eq!(el.attribute_ns(XLINK_NAMESPACE, "href"), None);
	assert_eq!(el.attribute("xlink"), None);
}

#[rstest]
#[case("value", "typed")]
#[case("defaultValue", "typed")]
#[case("placeholder", "Name")]
fn html_properties(#[case] key: &str, #[case] value: &str) {
	let engine = engine();
	let el = engine.html("input", vec![]).unwrap();
	engine.set_attr_value(&el, key, value).unwrap();
	let reflected = el.attribute(&key.to_ascii_lowercase());
	let stored = el.property(key);
	assert!(reflected.as_deref() == Some(value) || stored == Some(Value::from(value)));
}

#[test]
fn value_is_not_an_attribute() {
	let engine = engine();
	let el = el!(engine, "input", Attrs::new().set("value", "typed")).unwrap();
	assert_eq!(el.attribute("value"), None);
	assert_eq!(el.property("value"), Some(Value::from("typed")));
}

#[test]
fn list_stays_an_attribute() {
	let engine = engine();
	let el = el!(engine, "input", Attrs::new().set("list", "suggestions")).unwrap();
	assert_eq!(el.attribute("list").as_deref(), Some("suggestions"));
	assert_eq!(el.property("list"), None);
}

#[rstest]
#[case(Value::from(2), "2")]
#[case(Value::from(0.5), "0.5")]
#[case(Value::from(true), "true")]
#[case(Value::from("x"), "x")]
fn attribute_values(#[case] value: Value<MemoryDom>, #[case] expected: &str) {
	let engine = engine();
	let el = engine.html("td", vec![]).unwrap();
	engine.set_attr_value(&el, "aria-colspan", value).unwrap();
	assert_eq!(el.attribute("aria-colspan").as_deref(), Some(expected));
}

#[test]
fn null_removes_attributes() {
	let engine = engine();
	let el = el!(engine, "div", Attrs::new().set("aria-label", "x")).unwrap();
	engine.set_attr_value(&el, "aria-label", Value::Null).unwrap();
	assert_eq!(el.attribute("aria-label"), None);
}

#[test]
fn svg_numbers_are_attributes() {
	let engine = engine();
	let el = svg!(engine, "rect", Attrs::new().set("width", 3).set("height", 1.5)).unwrap();
	assert_eq!(el.attribute("width").as_deref(), Some("3"));
	assert_eq!(el.attribute("height").as_deref(), Some("1.5"));
}

#[test]
fn maps_on_plain_attributes_are_skipped() {
	let engine = engine();
	let el = el!(engine, "div", Attrs::new().set("aria", Attrs::new().set("x", "y")).set("title", "kept")).unwrap();
	assert_eq!(el.attribute("aria"), None);
	assert_eq!(el.attribute("title").as_deref(), Some("kept"));
}

#[rstest]
#[case::html(false)]
#[case::svg(true)]
fn handlers_are_properties(#[case] is_svg: bool) {
	let engine = engine();
	let clicks = Rc::new(Cell::new(0));
	let handler = {
		let clicks = Rc::clone(&clicks);
		Value::<MemoryDom>::handler(move |event: &Event| {
			assert_eq!(event.name(), "click");
			clicks.set(clicks.get() + 1);
		})
	};
	let attrs = Attrs::new().set("onclick", handler);
	let el = if is_svg { svg!(engine, "circle", attrs) } else { el!(engine, "button", attrs) }.unwrap();

	assert!(matches!(el.property("onclick"), Some(Value::Handler(_))));
	assert_eq!(el.attribute("onclick"), None);
	assert_eq!(el.dispatch(&Event::new("click")), 1);
	assert_eq!(clicks.get(), 1);
}

#[test]
fn events_bubble_to_ancestor_handlers() {
	let engine = engine();
	let clicks = Rc::new(Cell::new(0));
	let counter = Rc::clone(&clicks);
	let button = engine.html("button", vec![]).unwrap();
	let _form = el!(
		engine,
		"form",
		Attrs::new().set("onclick", Value::<MemoryDom>::handler(move |_| counter.set(counter.get() + 1))),
		&button
	)
	.unwrap();

	assert_eq!(button.dispatch(&Event::new("click")), 1);
	assert_eq!(clicks.get(), 1);
}

#[test]
fn reflected_properties() {
	let engine = engine();
	let label = el!(engine, "label", Attrs::new().set("htmlFor", "name").set("id", "l").set("hidden", true)).unwrap();
	assert_eq!(label.attribute("for").as_deref(), Some("name"));
	assert_eq!(label.attribute("id").as_deref(), Some("l"));
	assert_eq!(label.attribute("hidden").as_deref(), Some(""));

	engine.set_attr_value(&label, "hidden", false).unwrap();
	assert_eq!(label.attribute("hidden"), None);
}

#[test]
fn later_arguments_win() {
	let engine = engine();
	let el = el!(engine, "a", Attrs::new().set("title", "first"), Attrs::new().set("title", "second")).unwrap();
	assert_eq!(el.attribute("title").as_deref(), Some("second"));
}
