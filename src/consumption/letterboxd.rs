//! Letterboxd member RSS (`https://letterboxd.com/<user>/rss/`).
//!
//! Per `<item>`:
//! - title: `<letterboxd:filmTitle>`, else `<title>` minus its
//!   `", 2019 - ★★★★½"` suffix
//! - rating: `<letterboxd:memberRating>`, else `★`/`½` glyphs in `<title>`
//! - image: first `<img src>` in the `<description>` HTML
//! - link: `<link>`
//!
//! The feed has no director, so films carry no creator.

use url::Url;

use super::fetch::endpoint;
use super::rating::Rating;
use super::rss;
use super::{Entry, Page};
use crate::error::ProviderError;

pub fn feed_url(user: &str) -> Result<Url, ProviderError> {
	endpoint("https://letterboxd.com/", &[user, "rss", ""], &[])
}

pub fn parse(raw: &str) -> Result<Page, ProviderError> {
	let entries = rss::items(raw)?
		.into_iter()
		.filter_map(item_entry)
		.collect();
	Ok(Page {
		entries,
		total_pages: Some(1),
	})
}

fn item_entry(item: &str) -> Option<Entry> {
	let raw_title = rss::field(item, "title");
	let title = rss::field(item, "letterboxd:filmTitle")
		.or_else(|| raw_title.as_deref().map(strip_title_suffix))?;

	let rating = rss::field(item, "letterboxd:memberRating")
		.and_then(|value| value.parse::<f64>().ok())
		.and_then(Rating::from_value)
		.or_else(|| raw_title.as_deref().and_then(rating_suffix).and_then(Rating::from_glyphs));

	Some(Entry {
		title,
		creator: None,
		link: rss::field(item, "link"),
		image: rss::field(item, "description").and_then(|html| rss::first_image(&html)),
		rating,
		interactions: None,
	})
}

/// The `" - ★★★½"` tail of a feed title, when present.
fn rating_suffix(title: &str) -> Option<&str> {
	let (_, tail) = title.rsplit_once(" - ")?;
	let tail = tail.trim();
	(!tail.is_empty() && tail.chars().all(|c| c == '★' || c == '½')).then_some(tail)
}

fn strip_title_suffix(title: &str) -> String {
	let mut title = title.trim();
	if rating_suffix(title).is_some() {
		if let Some((head, _)) = title.rsplit_once(" - ") {
			title = head.trim_end();
		}
	}
	if let Some((head, year)) = title.rsplit_once(", ") {
		if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) {
			title = head;
		}
	}
	title.to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	const FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0" xmlns:letterboxd="https://letterboxd.com">
<channel>
<title>Letterboxd - dak</title>
<item>
	<title>Parasite, 2019 - ★★★★½</title>
	<link>https://letterboxd.com/dak/film/parasite-2019/</link>
	<letterboxd:filmTitle>Parasite</letterboxd:filmTitle>
	<letterboxd:filmYear>2019</letterboxd:filmYear>
	<letterboxd:memberRating>4.5</letterboxd:memberRating>
	<description><![CDATA[ <p><img src="https://a.ltrbxd.com/parasite.jpg"/></p> <p>Watched.</p> ]]></description>
</item>
<item>
	<title>Blade Runner 2049, 2017 - ★★★★★</title>
	<link>https://letterboxd.com/dak/film/blade-runner-2049/</link>
	<description><![CDATA[ <p>No poster.</p> ]]></description>
</item>
<item>
	<title>Stalker, 1979</title>
</item>
</channel>
</rss>"#;

	#[test]
	fn parses_diary_items() {
		let page = parse(FEED).unwrap();
		assert_eq!(page.entries.len(), 3);

		let parasite = &page.entries[0];
		assert_eq!(parasite.title, "Parasite");
		assert_eq!(parasite.rating.map(Rating::value), Some(4.5));
		assert_eq!(parasite.image.as_deref(), Some("https://a.ltrbxd.com/parasite.jpg"));
		assert_eq!(parasite.creator, None);

		let blade_runner = &page.entries[1];
		assert_eq!(blade_runner.title, "Blade Runner 2049");
		assert_eq!(blade_runner.rating, Some(Rating::MAX));
		assert_eq!(blade_runner.image, None);

		let stalker = &page.entries[2];
		assert_eq!(stalker.title, "Stalker");
		assert_eq!(stalker.rating, None);
		assert_eq!(stalker.link, None);
	}

	#[test]
	fn title_suffixes() {
		assert_eq!(strip_title_suffix("Heat, 1995 - ★★★"), "Heat");
		assert_eq!(strip_title_suffix("Crazy, Stupid, Love."), "Crazy, Stupid, Love.");
		assert_eq!(strip_title_suffix("Mission - Impossible"), "Mission - Impossible");
		assert_eq!(rating_suffix("Heat, 1995 - ½"), Some("½"));
	}

	#[test]
	fn html_error_page_is_malformed() {
		assert!(parse("<!DOCTYPE html><html>Not found</html>").is_err());
	}

	#[test]
	fn feed_url_for_user() {
		assert_eq!(
			feed_url("dak").unwrap().as_str(),
			"https://letterboxd.com/dak/rss/"
		);
	}
}
