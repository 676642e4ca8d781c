//! Minimal RSS envelope reading.
//!
//! Feeds are only ever read for a handful of flat `<item>` children, so the
//! envelope is sliced by tag name; HTML embedded in `<description>` goes
//! through `scraper`.

use scraper::{Html, Selector};

use crate::error::ProviderError;

/// Raw `<item>` bodies of an RSS document.
pub fn items(raw: &str) -> Result<Vec<&str>, ProviderError> {
	if !raw.contains("<channel") {
		return Err(ProviderError::Malformed("no <channel> element".into()));
	}
	let mut out = Vec::new();
	let mut rest = raw;
	while let Some(start) = find_open(rest, "item") {
		let after_open = &rest[start..];
		let Some(body_start) = after_open.find('>') else {
			break;
		};
		let body = &after_open[body_start + 1..];
		let Some(end) = body.find("</item>") else {
			return Err(ProviderError::Malformed("unterminated <item>".into()));
		};
		out.push(&body[..end]);
		rest = &body[end + "</item>".len()..];
	}
	Ok(out)
}

/// Text content of the first `<tag>` in `block`, CDATA unwrapped and
/// entities decoded. Blank content reads as `None`.
pub fn field(block: &str, tag: &str) -> Option<String> {
	let start = find_open(block, tag)?;
	let after_open = &block[start..];
	let open_end = after_open.find('>')?;
	if after_open[..open_end].ends_with('/') {
		return None;
	}
	let body = &after_open[open_end + 1..];
	let end = body.find(&format!("</{tag}>"))?;
	let content = body[..end].trim();

	let text = match content
		.strip_prefix("<![CDATA[")
		.and_then(|c| c.strip_suffix("]]>"))
	{
		Some(inner) => inner.trim().to_string(),
		None => decode_entities(content),
	};
	(!text.is_empty()).then_some(text)
}

/// Position of `<tag` followed by `>`, `/` or whitespace.
fn find_open(haystack: &str, tag: &str) -> Option<usize> {
	let needle = format!("<{tag}");
	let mut offset = 0;
	while let Some(found) = haystack[offset..].find(&needle) {
		let at = offset + found;
		let next = haystack[at + needle.len()..].chars().next();
		if matches!(next, Some('>' | '/') | Some(' ' | '\t' | '\n' | '\r')) {
			return Some(at);
		}
		offset = at + needle.len();
	}
	None
}

/// Decodes character references in one pass, so `&amp;lt;` stays `&lt;`.
/// Unknown or malformed references are kept as written.
fn decode_entities(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut rest = text;
	while let Some(at) = rest.find('&') {
		out.push_str(&rest[..at]);
		let tail = &rest[at..];
		let decoded = tail
			.find(';')
			.filter(|&end| end <= 10)
			.and_then(|end| Some((end, reference(&tail[1..end])?)));
		match decoded {
			Some((end, c)) => {
				out.push(c);
				rest = &tail[end + 1..];
			}
			None => {
				out.push('&');
				rest = &tail[1..];
			}
		}
	}
	out.push_str(rest);
	out
}

/// The character `&name;` stands for: a named entity, `#39` or `#x27`.
fn reference(name: &str) -> Option<char> {
	let (digits, radix) = match name {
		"amp" => return Some('&'),
		"lt" => return Some('<'),
		"gt" => return Some('>'),
		"quot" => return Some('"'),
		"apos" => return Some('\''),
		"nbsp" => return Some('\u{a0}'),
		_ => {
			let number = name.strip_prefix('#')?;
			match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
				Some(hex) => (hex, 16),
				None => (number, 10),
			}
		}
	};
	if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
		return None;
	}
	char::from_u32(u32::from_str_radix(digits, radix).ok()?)
}

/// `src` of the first `<img>` in an HTML fragment.
pub fn first_image(html: &str) -> Option<String> {
	let selector = Selector::parse("img").ok()?;
	let fragment = Html::parse_fragment(html);
	fragment
		.select(&selector)
		.filter_map(|img| img.value().attr("src"))
		.map(str::trim)
		.find(|src| !src.is_empty())
		.map(str::to_string)
}

/// Trimmed, non-empty text runs of an HTML fragment in document order.
pub fn text_runs(html: &str) -> Vec<String> {
	Html::parse_fragment(html)
		.root_element()
		.text()
		.map(str::trim)
		.filter(|run| !run.is_empty())
		.map(str::to_string)
		.collect()
}
