//! Minimal simple-selector matching.
//!
//! Supports comma-separated alternatives of `tag`, `[attr]`, `[attr=value]`
//! (value optionally quoted), and compounds like `tag[attr=value]`. No
//! combinators, classes, or pseudo-selectors; anything unparseable simply
//! never matches.

use indexmap::IndexMap;

struct Compound<'a> {
	tag: Option<&'a str>,
	attrs: Vec<(&'a str, Option<&'a str>)>,
}

fn parse_compound(input: &str) -> Option<Compound<'_>> {
	let input = input.trim();
	if input.is_empty() {
		return None;
	}
	let bracket = input.find('[').unwrap_or(input.len());
	let (tag_part, mut rest) = input.split_at(bracket);
	let tag = match tag_part.trim() {
		"" | "*" => None,
		t => Some(t),
	};
	let mut attrs = Vec::new();
	while let Some(stripped) = rest.strip_prefix('[') {
		let end = stripped.find(']')?;
		let inner = &stripped[..end];
		rest = &stripped[end + 1..];
		match inner.split_once('=') {
			Some((name, value)) => {
				let value = value.trim().trim_matches('"').trim_matches('\'');
				attrs.push((name.trim(), Some(value)));
			}
			None => attrs.push((inner.trim(), None)),
		}
	}
	if !rest.trim().is_empty() {
		return None;
	}
	Some(Compound { tag, attrs })
}

/// Tests an element (tag plus attribute map) against a simple selector.
pub(crate) fn element_matches(
	tag: &str,
	attrs: &IndexMap<Box<str>, String>,
	selector: &str,
) -> bool {
	selector.split(',').any(|alt| {
		let Some(compound) = parse_compound(alt) else {
			return false;
		};
		if let Some(want) = compound.tag
			&& !want.eq_ignore_ascii_case(tag)
		{
			return false;
		}
		compound.attrs.iter().all(|(name, value)| match value {
			None => attrs.contains_key(*name),
			Some(want) => attrs.get(*name).is_some_and(|have| have == want),
		})
	})
}
