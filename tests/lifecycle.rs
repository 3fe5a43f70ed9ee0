#![cfg(not(target_arch = "wasm32"))]

use std::rc::{Rc, Weak};
use xylem_dom::{
	memory::{MemoryDom, Node},
	Engine, Error, Hook, HookSet, Mountable, View, RESOLVE_LIMIT,
};

use memory_probe_::{entries, init_logging, log, take, Probe};

fn engine() -> Engine<MemoryDom> {
	init_logging();
	Engine::new(MemoryDom::new())
}

#[test]
fn mount_unmount_round_trip() {
	let engine = engine();
	let log = log();
	let body = engine.dom().body();
	let probe = Probe::new(&engine, &log, "p", HookSet::ALL);

	let mounted = engine.mount(&body, &probe, None, false).unwrap();
	assert!(mounted.as_view().is_some());
	assert_eq!(take(&log), entries(&[("p", Hook::Mount)]));
	assert!(engine.is_mounted(&probe.el));
	assert_eq!(engine.hook_counts(&body).unwrap().get(Hook::Mount), 1);
	assert_eq!(engine.hook_counts(&engine.dom().document()).unwrap().get(Hook::Unmount), 1);

	engine.unmount(&body, &probe).unwrap();
	assert_eq!(take(&log), entries(&[("p", Hook::Unmount)]));
	assert!(!engine.is_mounted(&probe.el));
	assert_eq!(probe.el.parent(), None);
	assert_eq!(engine.hook_counts(&body), None);
	assert_eq!(engine.hook_counts(&engine.dom().document()), None);
}

#[test]
fn mounting_again_under_the_same_parent_remounts() {
	let engine = engine();
	let log = log();
	let body = engine.dom().body();
	let probe = Probe::new(&engine, &log, "p", HookSet::ALL);

	engine.mount(&body, &probe, None, false).unwrap();
	engine.mount(&body, &probe, None, false).unwrap();
	assert_eq!(take(&log), entries(&[("p", Hook::Mount), ("p", Hook::Remount)]));
	assert_eq!(engine.hook_counts(&body).unwrap().get(Hook::Remount), 1);
}

#[test]
fn remount_after_unmount_counts_once() {
	let engine = engine();
	let log = log();
	let body = engine.dom().body();
	let probe = Probe::new(&engine, &log, "p", HookSet::MOUNT);

	engine.mount(&body, &probe, None, false).unwrap();
	engine.unmount(&body, &probe).unwrap();
	engine.mount(&body, &probe, None, false).unwrap();
	assert_eq!(take(&log), entries(&[("p", Hook::Mount), ("p", Hook::Mount)]));
	assert_eq!(engine.hook_counts(&body).unwrap().get(Hook::Mount), 1);
	assert_eq!(engine.hook_counts(&probe.el).unwrap().get(Hook::Mount), 1);
}

#[test]
fn detached_subtrees_fire_once_attached() {
	let engine = engine();
	let log = log();
	let body = engine.dom().body();
	let container = engine.html("section", vec![]).unwrap();
	let probe = Probe::new(&engine, &log, "p", HookSet::MOUNT);

	engine.mount(&container, &probe, None, false).unwrap();
	assert!(take(&log).is_empty());
	assert!(!engine.is_mounted(&probe.el));
	assert_eq!(engine.hook_counts(&container).unwrap().get(Hook::Mount), 1);

	engine.mount(&body, &container, None, false).unwrap();
	assert_eq!(take(&log), entries(&[("p", Hook::Mount)]));
	assert!(engine.is_mounted(&probe.el));
	assert_eq!(engine.hook_counts(&body).unwrap().get(Hook::Mount), 1);
}

#[test]
fn remounting_under_a_detached_parent_still_fires() {
	let engine = engine();
	let log = log();
	let section = engine.html("section", vec![]).unwrap();
	let probe = Probe::new(&engine, &log, "p", HookSet::ALL);

	engine.mount(&section, &probe, None, false).unwrap();
	assert!(take(&log).is_empty());

	engine.mount(&section, &probe, None, false).unwrap();
	assert_eq!(take(&log), entries(&[("p", Hook::Remount)]));
	assert_eq!(engine.hook_counts(&section).unwrap().get(Hook::Remount), 1);

	engine.unmount(&section, &probe).unwrap();
	assert_eq!(take(&log), entries(&[("p", Hook::Unmount)]));
	assert_eq!(engine.hook_counts(&section), None);
}

#[test]
fn hooks_fire_in_pre_order() {
	let engine = engine();
	let log = log();
	let body = engine.dom().body();
	let a = Probe::new(&engine, &log, "a", HookSet::ALL);
	let b = Probe::new(&engine, &log, "b", HookSet::ALL);
	let c = Probe::new(&engine, &log, "c", HookSet::ALL);
	let d = Probe::new(&engine, &log, "d", HookSet::ALL);

	engine.mount(&b, &c, None, false).unwrap();
	engine.mount(&a, &b, None, false).unwrap();
	engine.mount(&a, &d, None, false).unwrap();
	assert!(take(&log).is_empty());
	assert_eq!(engine.hook_counts(&a.el).unwrap().get(Hook::Mount), 3);

	engine.mount(&body, &a, None, false).unwrap();
	assert_eq!(
		take(&log),
		entries(&[("a", Hook::Mount), ("b", Hook::Mount), ("c", Hook::Mount), ("d", Hook::Mount)])
	);

	engine.unmount(&body, &a).unwrap();
	assert_eq!(
		take(&log),
		entries(&[("a", Hook::Unmount), ("b", Hook::Unmount), ("c", Hook::Unmount), ("d", Hook::Unmount)])
	);
	assert_eq!(engine.hook_counts(&body), None);
}

#[test]
fn hookless_views_are_skipped_but_not_their_children() {
	let engine = engine();
	let log = log();
	let body = engine.dom().body();
	let outer = Probe::new(&engine, &log, "outer", HookSet::EMPTY);
	let inner = Probe::new(&engine, &log, "inner", HookSet::UNMOUNT);

	engine.mount(&outer, &inner, None, false).unwrap();
	engine.mount(&body, &outer, None, false).unwrap();
	assert!(take(&log).is_empty());
	assert_eq!(engine.hook_counts(&outer.el).unwrap().get(Hook::Mount), 0);
	assert_eq!(engine.hook_counts(&outer.el).unwrap().get(Hook::Unmount), 1);

	engine.unmount(&body, &outer).unwrap();
	assert_eq!(take(&log), entries(&[("inner", Hook::Unmount)]));
}

#[test]
fn moving_unmounts_first() {
	let engine = engine();
	let log = log();
	let body = engine.dom().body();
	let first = engine.html("div.first", vec![]).unwrap();
	let second = engine.html("div.second", vec![]).unwrap();
	engine.mount(&body, &first, None, false).unwrap();
	engine.mount(&body, &second, None, false).unwrap();
	let probe = Probe::new(&engine, &log, "p", HookSet::ALL);

	engine.mount(&first, &probe, None, false).unwrap();
	engine.mount(&second, &probe, None, false).unwrap();
	assert_eq!(take(&log), entries(&[("p", Hook::Mount), ("p", Hook::Unmount), ("p", Hook::Mount)]));
	assert_eq!(probe.el.parent(), Some(second.clone()));
	assert_eq!(engine.hook_counts(&first), None);
	assert_eq!(engine.hook_counts(&second).unwrap().get(Hook::Mount), 1);
	assert_eq!(engine.hook_counts(&body).unwrap().get(Hook::Mount), 1);
}

#[test]
fn insert_before_and_replace() {
	let engine = engine();
	let log = log();
	let body = engine.dom().body();
	let a = Probe::new(&engine, &log, "a", HookSet::ALL);
	let b = Probe::new(&engine, &log, "b", HookSet::ALL);
	let c = Probe::new(&engine, &log, "c", HookSet::ALL);

	engine.mount(&body, &a, None, false).unwrap();
	engine.mount(&body, &b, Some(Mountable::from(&a)), false).unwrap();
	assert_eq!(body.children(), vec![b.el.clone(), a.el.clone()]);

	engine.mount(&body, &c, Some(Mountable::from(&a)), true).unwrap();
	assert_eq!(body.children(), vec![b.el.clone(), c.el.clone()]);
	assert_eq!(a.el.parent(), None);
	assert_eq!(
		take(&log),
		entries(&[("a", Hook::Mount), ("b", Hook::Mount), ("a", Hook::Unmount), ("c", Hook::Mount)])
	);
	assert_eq!(engine.hook_counts(&body).unwrap().get(Hook::Mount), 2);
}

#[test]
fn rejected_moves_leave_everything_in_place() {
	let engine = engine();
	let log = log();
	let body = engine.dom().body();
	let a = Probe::new(&engine, &log, "a", HookSet::ALL);
	let b = Probe::new(&engine, &log, "b", HookSet::ALL);
	engine.mount(&body, &a, None, false).unwrap();
	engine.mount(&a, &b, None, false).unwrap();
	take(&log);

	assert!(matches!(engine.mount(&b, &a, None, false), Err(Error::Dom { .. })));
	assert!(take(&log).is_empty());
	assert_eq!(a.el.parent(), Some(body.clone()));
	assert!(engine.is_mounted(&a.el));
	assert_eq!(engine.hook_counts(&body).unwrap().get(Hook::Mount), 2);
}

#[test]
fn foreign_anchors_are_rejected_before_hooks_fire() {
	let engine = engine();
	let log = log();
	let body = engine.dom().body();
	let a = Probe::new(&engine, &log, "a", HookSet::ALL);
	let c = Probe::new(&engine, &log, "c", HookSet::ALL);
	let elsewhere = engine.html("div", vec![]).unwrap();
	let stray = engine.html("span", vec![]).unwrap();
	engine.mount(&elsewhere, &stray, None, false).unwrap();
	engine.mount(&body, &a, None, false).unwrap();
	engine.mount(&body, &c, None, false).unwrap();
	take(&log);

	assert!(engine.mount(&body, &a, Some(Mountable::Node(stray.clone())), true).is_err());
	assert!(engine.mount(&elsewhere, &c, Some(Mountable::Node(a.el.clone())), false).is_err());
	assert!(take(&log).is_empty());
	assert_eq!(body.children(), vec![a.el.clone(), c.el.clone()]);
	assert_eq!(engine.hook_counts(&body).unwrap().get(Hook::Mount), 2);
	assert_eq!(engine.hook_counts(&elsewhere), None);
}

#[test]
fn host_failures_restore_the_old_attachment() {
	let engine = engine();
	let log = log();
	let body = engine.dom().body();
	let text = engine.text("leaf");
	engine.mount(&body, &text, None, false).unwrap();
	let probe = Probe::new(&engine, &log, "p", HookSet::ALL);
	engine.mount(&body, &probe, None, false).unwrap();
	take(&log);

	// Text nodes can't have children.
	assert!(engine.mount(&text, &probe, None, false).is_err());
	assert_eq!(probe.el.parent(), Some(body.clone()));
	assert!(engine.is_mounted(&probe.el));
	assert_eq!(take(&log).last(), Some(&("p".to_owned(), Hook::Mount)));
	assert_eq!(engine.hook_counts(&body).unwrap().get(Hook::Mount), 1);
	assert_eq!(engine.hook_counts(&text), None);
}

#[test]
fn shadow_roots_count_as_connected() {
	let engine = engine();
	let log = log();
	let host = engine.html("div.host", vec![]).unwrap();
	let shadow_root = engine.dom().attach_shadow(&host).unwrap();
	let probe = Probe::new(&engine, &log, "p", HookSet::MOUNT);

	engine.mount(&shadow_root, &probe, None, false).unwrap();
	assert_eq!(take(&log), entries(&[("p", Hook::Mount)]));
	assert!(engine.is_mounted(&probe.el));
}

#[test]
fn bare_nodes_are_promoted_to_their_views() {
	let engine = engine();
	let log = log();
	let body = engine.dom().body();
	let probe = Probe::new(&engine, &log, "p", HookSet::ALL);

	engine.mount(&body, &probe, None, false).unwrap();
	let unmounted = engine.unmount(&body, probe.el.clone()).unwrap();
	assert!(Rc::ptr_eq(unmounted.as_view().unwrap(), &(Rc::clone(&probe) as Rc<dyn View<MemoryDom>>)));
	assert_eq!(take(&log), entries(&[("p", Hook::Mount), ("p", Hook::Unmount)]));

	engine.mount(&body, probe.el.clone(), None, false).unwrap();
	assert_eq!(take(&log), entries(&[("p", Hook::Mount)]));
}

#[test]
fn unmounting_from_the_wrong_parent_uses_the_actual_one() {
	let engine = engine();
	let log = log();
	let body = engine.dom().body();
	let elsewhere = engine.html("div", vec![]).unwrap();
	let probe = Probe::new(&engine, &log, "p", HookSet::UNMOUNT);

	engine.mount(&body, &probe, None, false).unwrap();
	engine.unmount(&elsewhere, &probe).unwrap();
	assert_eq!(take(&log), entries(&[("p", Hook::Unmount)]));
	assert_eq!(probe.el.parent(), None);
	assert_eq!(engine.hook_counts(&body), None);

	// Unattached: nothing to do.
	engine.unmount(&body, &probe).unwrap();
	assert!(take(&log).is_empty());
}

#[test]
fn set_children_moves_only_what_is_out_of_place() {
	let engine = engine();
	let log = log();
	let body = engine.dom().body();
	let container = engine.html("div", vec![]).unwrap();
	engine.mount(&body, &container, None, false).unwrap();
	let a = Probe::new(&engine, &log, "a", HookSet::ALL);
	let b = Probe::new(&engine, &log, "b", HookSet::ALL);
	let c = Probe::new(&engine, &log, "c", HookSet::ALL);

	engine.set_children(&container, &[Mountable::from(&a), Mountable::from(&b), Mountable::from(&c)]).unwrap();
	assert_eq!(take(&log), entries(&[("a", Hook::Mount), ("b", Hook::Mount), ("c", Hook::Mount)]));

	engine.set_children(&container, &[Mountable::from(&a), Mountable::from(&b), Mountable::from(&c)]).unwrap();
	assert!(take(&log).is_empty());

	engine.set_children(&container, &[Mountable::from(&c), Mountable::from(&a)]).unwrap();
	assert_eq!(container.children(), vec![c.el.clone(), a.el.clone()]);
	assert_eq!(take(&log), entries(&[("c", Hook::Remount), ("b", Hook::Unmount)]));
	assert_eq!(engine.hook_counts(&container).unwrap().get(Hook::Mount), 2);
}

struct Wrapper(Rc<Probe>);

impl View<MemoryDom> for Wrapper {
	fn el(&self) -> Mountable<MemoryDom> {
		Mountable::from(&self.0)
	}
}

#[test]
fn nested_views_resolve_to_the_innermost_node() {
	let engine = engine();
	let log = log();
	let probe = Probe::new(&engine, &log, "p", HookSet::EMPTY);
	let wrapper = Rc::new(Wrapper(Rc::clone(&probe)));

	assert_eq!(engine.get_el(&Mountable::from(&wrapper)).unwrap(), probe.el);
	engine.mount(engine.dom().body(), &wrapper, None, false).unwrap();
	assert!(engine.view_of(&probe.el).is_some());
}

struct Cycle(Weak<Cycle>);

impl View<MemoryDom> for Cycle {
	fn el(&self) -> Mountable<MemoryDom> {
		Mountable::View(self.0.upgrade().unwrap())
	}
}

#[test]
fn cyclic_views_fail_to_resolve() {
	let engine = engine();
	let cycle = Rc::new_cyclic(|this| Cycle(this.clone()));
	assert!(matches!(
		engine.get_el(&Mountable::from(&cycle)),
		Err(Error::Unresolved { limit: RESOLVE_LIMIT })
	));
	assert!(engine.mount(engine.dom().body(), &cycle, None, false).is_err());
}

#[test]
fn released_subtrees_are_forgotten() {
	let engine = engine();
	let log = log();
	let body = engine.dom().body();
	let outer = Probe::new(&engine, &log, "outer", HookSet::ALL);
	let inner = Probe::new(&engine, &log, "inner", HookSet::ALL);
	engine.mount(&outer, &inner, None, false).unwrap();
	engine.mount(&body, &outer, None, false).unwrap();
	let tracked = engine.tracked_node_count();

	engine.unmount(&body, &outer).unwrap();
	engine.release(&outer.el);
	assert_eq!(engine.tracked_node_count(), tracked - 2);
	assert!(engine.view_of(&outer.el).is_none());
	assert!(engine.view_of(&inner.el).is_none());
	assert_eq!(engine.hook_counts(&inner.el), None);
}

#[test]
fn content_properties_unmount_replaced_children() {
	let engine = engine();
	let log = log();
	let body = engine.dom().body();
	let container = engine.html("div", vec![]).unwrap();
	let probe = Probe::new(&engine, &log, "p", HookSet::ALL);
	engine.mount(&container, &probe, None, false).unwrap();
	engine.mount(&body, &container, None, false).unwrap();
	take(&log);

	engine.set_attr_value(&container, "textContent", "replaced").unwrap();
	assert_eq!(take(&log), entries(&[("p", Hook::Unmount)]));
	assert_eq!(probe.el.parent(), None);
	assert_eq!(container.text_content(), "replaced");
	assert_eq!(engine.hook_counts(&container), None);
	assert_eq!(engine.hook_counts(&body), None);
}

#[test]
fn dropped_views_stop_firing() {
	let engine = engine();
	let log = log();
	let section = engine.html("section", vec![]).unwrap();
	let probe = Probe::new(&engine, &log, "p", HookSet::MOUNT);
	let el = probe.el.clone();
	engine.mount(&section, probe, None, false).unwrap();
	assert!(engine.view_of(&el).is_none());

	engine.mount(engine.dom().body(), &section, None, false).unwrap();
	assert!(take(&log).is_empty());
	assert_eq!(engine.hook_counts(&section).unwrap().get(Hook::Mount), 1);
}

#[test]
fn text_nodes_can_be_mounted() {
	let engine = engine();
	let body = engine.dom().body();
	let text: Node = engine.text("plain");
	engine.mount(&body, &text, None, false).unwrap();
	assert_eq!(body.text_content(), "plain");
	assert!(engine.hook_counts(&body).is_none());
}
