//! Last.fm `user.gettopalbums`.
//!
//! Shape read: `topalbums.album[]` with `name`, `playcount` (string or
//! number), `url`, `artist.name` and `image[]` of `{"#text", "size"}`; the
//! last non-empty image is the largest. Paging comes from
//! `topalbums.@attr.totalPages`. A top-level `error` is an API failure.

use serde_json::Value;
use url::Url;

use super::fetch::endpoint;
use super::{Entry, Page};
use crate::error::ProviderError;

const API_ROOT: &str = "https://ws.audioscrobbler.com/2.0/";

pub fn page_url(user: &str, api_key: &str, page: u32, limit: usize) -> Result<Url, ProviderError> {
	let (page, limit) = (page.to_string(), limit.to_string());
	endpoint(
		API_ROOT,
		&[],
		&[
			("method", "user.gettopalbums"),
			("user", user),
			("api_key", api_key),
			("format", "json"),
			("period", "12month"),
			("limit", &limit),
			("page", &page),
		],
	)
}

pub fn parse(raw: &str) -> Result<Page, ProviderError> {
	let root: Value =
		serde_json::from_str(raw).map_err(|e| ProviderError::Malformed(e.to_string()))?;

	if let Some(code) = root.get("error") {
		return Err(ProviderError::Api {
			code: code.as_i64().unwrap_or(-1),
			message: root
				.get("message")
				.and_then(Value::as_str)
				.unwrap_or("unknown error")
				.to_string(),
		});
	}

	let top = root
		.get("topalbums")
		.ok_or_else(|| ProviderError::Malformed("missing topalbums".into()))?;

	// A lone album arrives as an object rather than a one-element array.
	let albums: Vec<&Value> = match top.get("album") {
		Some(Value::Array(list)) => list.iter().collect(),
		Some(single @ Value::Object(_)) => vec![single],
		_ => Vec::new(),
	};

	let total_pages = top
		.get("@attr")
		.and_then(|attr| attr.get("totalPages"))
		.and_then(as_count)
		.and_then(|n| u32::try_from(n).ok());

	Ok(Page {
		entries: albums.into_iter().filter_map(album_entry).collect(),
		total_pages,
	})
}

fn album_entry(album: &Value) -> Option<Entry> {
	let title = album.get("name").and_then(Value::as_str)?.trim();
	if title.is_empty() {
		return None;
	}
	let creator = match album.get("artist") {
		Some(Value::String(name)) => Some(name.as_str()),
		Some(artist) => artist.get("name").and_then(Value::as_str),
		None => None,
	}
	.map(str::trim)
	.filter(|name| !name.is_empty())
	.map(str::to_string);

	let image = album
		.get("image")
		.and_then(Value::as_array)
		.and_then(|images| {
			images
				.iter()
				.filter_map(|img| img.get("#text").and_then(Value::as_str))
				.filter(|src| !src.is_empty())
				.last()
		})
		.map(str::to_string);

	Some(Entry {
		title: title.to_string(),
		creator,
		link: album.get("url").and_then(Value::as_str).map(str::to_string),
		image,
		rating: None,
		interactions: album.get("playcount").and_then(as_count),
	})
}

fn as_count(value: &Value) -> Option<u64> {
	match value {
		Value::Number(n) => n.as_u64(),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}
