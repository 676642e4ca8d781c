//! Goodreads shelf RSS (`/review/list_rss/<user id>?shelf=read`).
//!
//! Per `<item>`: `<title>`, `<link>`, `<author_name>`, `<user_rating>` (`0`
//! means unrated), image from `<book_large_image_url>`, `<book_image_url>` or
//! the first `<img src>` in `<description>`. Without `<user_rating>`, a
//! `rating: N` line in the description is used (`average rating:` is not).

use url::Url;

use super::fetch::endpoint;
use super::rating::Rating;
use super::rss;
use super::{Entry, Page};
use crate::error::ProviderError;

pub fn feed_url(user_id: &str, key: Option<&str>) -> Result<Url, ProviderError> {
	let mut query = vec![("shelf", "read")];
	if let Some(key) = key {
		query.push(("key", key));
	}
	endpoint("https://www.goodreads.com/", &["review", "list_rss", user_id], &query)
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
	let title = rss::field(item, "title")?;
	let description = rss::field(item, "description");

	let rating = match rss::field(item, "user_rating") {
		Some(value) => value.parse::<u8>().ok().and_then(|n| Rating::from_stars(n, false)),
		None => description.as_deref().and_then(description_rating),
	};

	let image = rss::field(item, "book_large_image_url")
		.or_else(|| rss::field(item, "book_image_url"))
		.or_else(|| description.as_deref().and_then(rss::first_image));

	Some(Entry {
		title,
		creator: rss::field(item, "author_name"),
		link: rss::field(item, "link"),
		image,
		rating,
		interactions: None,
	})
}

fn description_rating(html: &str) -> Option<Rating> {
	rss::text_runs(html)
		.iter()
		.find_map(|run| run.strip_prefix("rating:"))
		.and_then(|value| value.trim().parse::<u8>().ok())
		.and_then(|n| Rating::from_stars(n, false))
}
