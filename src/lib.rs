#![doc(html_root_url = "https://docs.rs/xylem-dom/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! A retained-mode DOM mounting and lifecycle engine.
//!
//! Views own real DOM nodes. The [`Engine`] mounts them, fires their `onmount`/`onremount`/`onunmount` hooks exactly
//! when they become (or stop being) reachable from a document or shadow root, and reconciles [`List`]s of keyed views
//! with as few DOM mutations as possible.
//!
//! The document itself is abstracted by [`Dom`]: [`web::WebDom`] drives a browser through [`web_sys`], while
//! [`memory::MemoryDom`] is a headless implementation suitable for native tests.
//!
//! # Logging
//!
//! Diagnostics are emitted through [`tracing`]. Attribute values and text content are omitted from log events unless the
//! `"dangerous-logging"` feature is enabled, since they may contain personally identifiable information.

pub mod attr;
pub mod dom;
pub mod memory;
pub mod selector;
pub mod web;

mod element;
mod engine;
mod error;
mod lifecycle;
mod list;
mod mount;
mod view;

pub use attr::{Attrs, Binding, Value};
pub use dom::{Dom, ElementKind};
pub use element::{Arg, Query};
pub use engine::Engine;
pub use error::{Error, RESOLVE_LIMIT};
pub use lifecycle::{Hook, HookCounts, HookSet};
pub use list::{List, ListItem, ListPool};
pub use view::{Mountable, View};
