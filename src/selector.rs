//! Parsing of the `tag#id.class` shorthand accepted by [`Engine::html`](`crate::Engine::html`).

/// The tag used when a selector names none.
pub const DEFAULT_TAG: &str = "div";

/// A parsed `tag#id.class.class` selector.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector<'a> {
	pub tag: &'a str,
	/// Every character read in id mode, [`None`] if there were none.
	pub id: Option<String>,
	/// Space-joined classes, [`None`] if there were none.
	pub class_name: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
	Tag,
	Id,
	Class,
}

impl<'a> Selector<'a> {
	/// Scans `query` once, left to right.
	///
	/// `#` switches to id mode and `.` to class mode, where each `.` after the first class starts a new, space-separated
	/// one. Everything else accumulates into the current mode. The tag ([`DEFAULT_TAG`] if empty) is whatever precedes
	/// the first marker. Parsing never fails.
	#[must_use]
	pub fn parse(query: &'a str) -> Self {
		let mut mode = Mode::Tag;
		let mut tag_end = query.len();
		let mut id = String::new();
		let mut class_name = String::new();
		for (i, c) in query.char_indices() {
			if mode == Mode::Tag && (c == '#' || c == '.') {
				tag_end = i;
			}
			match (c, mode) {
				('#', _) => mode = Mode::Id,
				('.', _) => {
					if !class_name.is_empty() {
						class_name.push(' ');
					}
					mode = Mode::Class;
				}
				(_, Mode::Tag) => (),
				(_, Mode::Id) => id.push(c),
				(_, Mode::Class) => class_name.push(c),
			}
		}

		Self {
			tag: match &query[..tag_end] {
				"" => DEFAULT_TAG,
				tag => tag,
			},
			id: (!id.is_empty()).then(|| id),
			class_name: (!class_name.is_empty()).then(|| class_name),
		}
	}
}
