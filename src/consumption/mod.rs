//! Consumption history ingestion.
//!
//! Each configured provider is fetched and parsed on its own; a provider that
//! fails contributes nothing and never affects the others. Items are not
//! deduplicated across providers, so the same film or album reported by two
//! services appears twice.

mod fetch;
mod goodreads;
mod lastfm;
mod letterboxd;
mod rating;
mod rss;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::ProviderError;

pub use fetch::{Fetch, HttpFetcher, redact};
pub use rating::Rating;

/// Upper bound on artists handed to synthesis.
pub const MAX_ENTITIES: usize = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
	AudioRelease,
	Book,
	Film,
}

impl Category {
	pub fn label(self) -> &'static str {
		match self {
			Self::AudioRelease => "album",
			Self::Book => "book",
			Self::Film => "film",
		}
	}
}

/// One consumed thing, normalized from any provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
	pub id: String,
	pub category: Category,
	pub title: String,
	pub creator: Option<String>,
	pub link: Option<String>,
	pub image: Option<String>,
	pub rating: Option<Rating>,
	pub interactions: Option<u64>,
	pub standout: bool,
}

/// Provider-local record before ids and flags are assigned.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
	pub title: String,
	pub creator: Option<String>,
	pub link: Option<String>,
	pub image: Option<String>,
	pub rating: Option<Rating>,
	pub interactions: Option<u64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Page {
	pub entries: Vec<Entry>,
	pub total_pages: Option<u32>,
}

impl ProviderKind {
	pub fn category(self) -> Category {
		match self {
			Self::LastFm => Category::AudioRelease,
			Self::Letterboxd => Category::Film,
			Self::Goodreads => Category::Book,
		}
	}

	fn page_url(self, config: &ProviderConfig, identity: &str, page: u32) -> Result<Url, ProviderError> {
		let credential = config.credential.as_deref();
		match self {
			Self::LastFm => lastfm::page_url(
				identity,
				credential.unwrap_or_default(),
				page,
				self.policy().page_size,
			),
			Self::Letterboxd => letterboxd::feed_url(identity),
			Self::Goodreads => goodreads::feed_url(identity, credential),
		}
	}

	/// Parses one raw payload from this provider.
	pub fn parse(self, raw: &str) -> Result<Page, ProviderError> {
		match self {
			Self::LastFm => lastfm::parse(raw),
			Self::Letterboxd => letterboxd::parse(raw),
			Self::Goodreads => goodreads::parse(raw),
		}
	}

	fn to_items(self, entries: Vec<Entry>) -> Vec<Item> {
		let threshold = self.policy().standout_interactions;
		entries
			.into_iter()
			.enumerate()
			.map(|(index, entry)| Item {
				id: format!("{}-{index}", self.slug()),
				category: self.category(),
				standout: rating::is_standout(entry.rating, entry.interactions, threshold),
				title: entry.title,
				creator: entry.creator,
				link: entry.link,
				image: entry.image,
				rating: entry.rating,
				interactions: entry.interactions,
			})
			.collect()
	}
}

/// Result of one ingestion pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ingestion {
	pub items: Vec<Item>,
	/// Providers that answered, with the identity that worked.
	pub succeeded: Vec<(ProviderKind, String)>,
}

/// Fetches every provider concurrently and merges in declared order.
pub async fn ingest<F: Fetch>(fetcher: &F, providers: &[ProviderConfig]) -> Ingestion {
	let results = join_all(providers.iter().map(|config| ingest_provider(fetcher, config))).await;

	let mut ingestion = Ingestion::default();
	for (config, result) in providers.iter().zip(results) {
		let Some(entries) = result else {
			continue;
		};
		if let Some(identity) = &config.identity {
			ingestion.succeeded.push((config.kind, identity.clone()));
		}
		ingestion.items.extend(config.kind.to_items(entries));
	}
	log::info!(
		"ingested {} items from {} provider(s)",
		ingestion.items.len(),
		ingestion.succeeded.len()
	);
	ingestion
}

/// `None` when the provider was skipped or its first page failed.
async fn ingest_provider<F: Fetch>(fetcher: &F, config: &ProviderConfig) -> Option<Vec<Entry>> {
	let kind = config.kind;
	let Some(identity) = config.identity.as_deref() else {
		log::debug!("{}: no identity, skipped", kind.display_name());
		return None;
	};
	let policy = kind.policy();
	if policy.needs_credential && config.credential.is_none() {
		log::warn!("{}: no credential configured, skipped", kind.display_name());
		return None;
	}

	let mut entries = Vec::new();
	for page in 1..=policy.max_pages {
		match fetch_page(fetcher, config, identity, page).await {
			Ok(fetched) => {
				let short = fetched.entries.len() < policy.page_size;
				let last = fetched.total_pages.is_some_and(|total| page >= total);
				entries.extend(fetched.entries);
				if short || last {
					break;
				}
			}
			Err(e) if page == 1 => {
				log::warn!("{}: {e}", kind.display_name());
				return None;
			}
			Err(e) => {
				log::warn!("{}: page {page} failed, keeping earlier pages: {e}", kind.display_name());
				break;
			}
		}
	}
	Some(entries)
}

async fn fetch_page<F: Fetch>(
	fetcher: &F,
	config: &ProviderConfig,
	identity: &str,
	page: u32,
) -> Result<Page, ProviderError> {
	let url = config.kind.page_url(config, identity, page)?;
	let raw = fetcher.get_text(url).await?;
	config.kind.parse(&raw)
}

/// An artist handed to synthesis.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
	pub name: String,
	pub interactions: Option<u64>,
	pub genres: Vec<String>,
}

/// Distinct album artists in first-seen order with summed plays.
pub fn entities(items: &[Item], limit: usize) -> Vec<Entity> {
	let mut out: Vec<Entity> = Vec::new();
	for item in items.iter().filter(|i| i.category == Category::AudioRelease) {
		let Some(name) = item.creator.as_deref() else {
			continue;
		};
		if let Some(entity) = out.iter_mut().find(|e| e.name == name) {
			if let Some(plays) = item.interactions {
				entity.interactions = Some(entity.interactions.unwrap_or(0).saturating_add(plays));
			}
		} else if out.len() < limit {
			out.push(Entity {
				name: name.to_string(),
				interactions: item.interactions,
				genres: Vec::new(),
			});
		}
	}
	out
}

const DEMO_ARTISTS: &[(&str, u64, &[&str])] = &[
	("Radiohead", 1500, &["alternative rock", "art rock"]),
	("Aphex Twin", 800, &["electronic", "idm"]),
	("Kendrick Lamar", 1200, &["hip hop", "conscious rap"]),
	("Miles Davis", 600, &["jazz", "fusion"]),
	("Pink Floyd", 900, &["progressive rock", "psychedelic"]),
	("Daft Punk", 1100, &["electronic", "house"]),
	("Björk", 700, &["art pop", "electronic"]),
	("MF DOOM", 500, &["hip hop", "abstract hip hop"]),
	("Talking Heads", 650, &["new wave", "art rock"]),
	("Frank Ocean", 1300, &["r&b", "neo soul"]),
	("Tame Impala", 950, &["psychedelic rock", "indie"]),
	("Four Tet", 400, &["electronic", "folktronica"]),
	("Flying Lotus", 550, &["electronic", "experimental hip hop"]),
	("J Dilla", 450, &["hip hop", "instrumental hip hop"]),
	("Bon Iver", 850, &["indie folk", "alternative"]),
];

/// Built-in artists for trying the visualization without an account.
pub fn demo_entities() -> Vec<Entity> {
	DEMO_ARTISTS
		.iter()
		.map(|&(name, plays, genres)| Entity {
			name: name.to_string(),
			interactions: Some(plays),
			genres: genres.iter().map(|g| g.to_string()).collect(),
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;

	use futures::executor::block_on;

	use super::*;
	use crate::error::FetchError;

	/// Serves canned bodies by URL host, recording every request.
	#[derive(Default)]
	struct CannedFetcher {
		routes: Vec<(&'static str, Result<String, u16>)>,
		seen: RefCell<Vec<Url>>,
	}

	impl CannedFetcher {
		fn route(mut self, needle: &'static str, body: Result<String, u16>) -> Self {
			self.routes.push((needle, body));
			self
		}
	}

	impl Fetch for CannedFetcher {
		async fn get_text(&self, url: Url) -> Result<String, FetchError> {
			self.seen.borrow_mut().push(url.clone());
			let hit = self
				.routes
				.iter()
				.find(|(needle, _)| url.as_str().contains(needle));
			match hit {
				Some((_, Ok(body))) => Ok(body.clone()),
				Some((_, Err(code))) => Err(FetchError::Status(*code)),
				None => Err(FetchError::Network("no route".into())),
			}
		}
	}

	fn goodreads_feed(count: usize) -> String {
		let items: String = (0..count)
			.map(|i| {
				format!(
					"<item><title>Book {i}</title><author_name>Author {i}</author_name><user_rating>{}</user_rating></item>",
					if i == 0 { 5 } else { 3 }
				)
			})
			.collect();
		format!("<rss><channel>{items}</channel></rss>")
	}

	fn lastfm_page(albums: &[(&str, &str, u64)], total_pages: u32) -> String {
		let albums: Vec<String> = albums
			.iter()
			.map(|(title, artist, plays)| {
				format!(r#"{{"name":"{title}","playcount":"{plays}","artist":{{"name":"{artist}"}}}}"#)
			})
			.collect();
		format!(
			r#"{{"topalbums":{{"album":[{}],"@attr":{{"totalPages":"{total_pages}"}}}}}}"#,
			albums.join(",")
		)
	}

	fn providers() -> Vec<ProviderConfig> {
		vec![
			ProviderConfig::new(ProviderKind::Letterboxd).with_identity("dak"),
			ProviderConfig::new(ProviderKind::Goodreads).with_identity("42"),
		]
	}

	#[test]
	fn one_failing_provider_does_not_affect_another() {
		let fetcher = CannedFetcher::default()
			.route("letterboxd.com", Ok("{ not a feed".into()))
			.route("goodreads.com", Ok(goodreads_feed(5)));
		let ingestion = block_on(ingest(&fetcher, &providers()));

		assert_eq!(ingestion.items.len(), 5);
		assert!(ingestion.items.iter().all(|i| i.category == Category::Book));
		assert_eq!(ingestion.items[0].id, "goodreads-0");
		assert!(ingestion.items[0].standout);
		assert!(!ingestion.items[1].standout);
		assert_eq!(ingestion.succeeded, vec![(ProviderKind::Goodreads, "42".to_string())]);
	}

	#[test]
	fn network_errors_yield_empty_ingestion() {
		let fetcher = CannedFetcher::default().route("goodreads.com", Err(503));
		let ingestion = block_on(ingest(&fetcher, &providers()));
		assert!(ingestion.items.is_empty());
		assert!(ingestion.succeeded.is_empty());
	}

	#[test]
	fn providers_without_identity_are_not_fetched() {
		let fetcher = CannedFetcher::default();
		let configs = vec![
			ProviderConfig::new(ProviderKind::Letterboxd),
			ProviderConfig::new(ProviderKind::LastFm).with_identity("dak"),
		];
		let ingestion = block_on(ingest(&fetcher, &configs));
		assert!(ingestion.items.is_empty());
		assert!(fetcher.seen.borrow().is_empty());
	}

	#[test]
	fn lastfm_pages_until_short_page() {
		let full: Vec<(String, String, u64)> = (0..50)
			.map(|i| (format!("Album {i}"), format!("Artist {}", i % 7), 600 - i))
			.collect();
		let full: Vec<(&str, &str, u64)> = full
			.iter()
			.map(|(t, a, p)| (t.as_str(), a.as_str(), *p))
			.collect();
		let fetcher = CannedFetcher::default()
			.route("page=1", Ok(lastfm_page(&full, 9)))
			.route("page=2", Ok(lastfm_page(&[("Tail", "Artist 0", 10)], 9)));
		let configs =
			vec![ProviderConfig::new(ProviderKind::LastFm).with_identity("dak").with_credential("k")];

		let ingestion = block_on(ingest(&fetcher, &configs));
		assert_eq!(fetcher.seen.borrow().len(), 2);
		assert_eq!(ingestion.items.len(), 51);
		assert_eq!(ingestion.items[50].id, "lastfm-50");
		assert!(ingestion.items[0].standout);
		assert!(!ingestion.items[50].standout);
	}

	#[test]
	fn lastfm_stops_at_page_bound() {
		let full: Vec<(String, String, u64)> =
			(0..50).map(|i| (format!("A{i}"), "X".to_string(), 1)).collect();
		let full: Vec<(&str, &str, u64)> =
			full.iter().map(|(t, a, p)| (t.as_str(), a.as_str(), *p)).collect();
		let body = lastfm_page(&full, 99);
		let fetcher = CannedFetcher::default().route("audioscrobbler", Ok(body));
		let configs =
			vec![ProviderConfig::new(ProviderKind::LastFm).with_identity("dak").with_credential("k")];

		let ingestion = block_on(ingest(&fetcher, &configs));
		assert_eq!(fetcher.seen.borrow().len(), 3);
		assert_eq!(ingestion.items.len(), 150);
	}

	#[test]
	fn later_page_failure_keeps_earlier_pages() {
		let full: Vec<(String, String, u64)> =
			(0..50).map(|i| (format!("A{i}"), "X".to_string(), 1)).collect();
		let full: Vec<(&str, &str, u64)> =
			full.iter().map(|(t, a, p)| (t.as_str(), a.as_str(), *p)).collect();
		let fetcher = CannedFetcher::default()
			.route("page=1", Ok(lastfm_page(&full, 3)))
			.route("page=2", Err(500));
		let configs =
			vec![ProviderConfig::new(ProviderKind::LastFm).with_identity("dak").with_credential("k")];

		let ingestion = block_on(ingest(&fetcher, &configs));
		assert_eq!(ingestion.items.len(), 50);
		assert_eq!(ingestion.succeeded.len(), 1);
	}

	fn item(id: &str, category: Category, creator: Option<&str>, plays: Option<u64>) -> Item {
		Item {
			id: id.into(),
			category,
			title: id.into(),
			creator: creator.map(str::to_string),
			link: None,
			image: None,
			rating: None,
			interactions: plays,
			standout: false,
		}
	}

	#[test]
	fn entities_group_album_artists() {
		let items = vec![
			item("a", Category::AudioRelease, Some("Radiohead"), Some(10)),
			item("b", Category::Book, Some("Camus"), None),
			item("c", Category::AudioRelease, Some("Björk"), None),
			item("d", Category::AudioRelease, Some("Radiohead"), Some(5)),
			item("e", Category::AudioRelease, None, Some(5)),
			item("f", Category::AudioRelease, Some("Four Tet"), Some(1)),
		];
		let found = entities(&items, 2);
		let names: Vec<_> = found.iter().map(|e| e.name.as_str()).collect();
		assert_eq!(names, ["Radiohead", "Björk"]);
		assert_eq!(found[0].interactions, Some(15));
		assert_eq!(found[1].interactions, None);
	}

	#[test]
	fn summed_plays_saturate() {
		let items = vec![
			item("a", Category::AudioRelease, Some("Boards of Canada"), Some(u64::MAX)),
			item("b", Category::AudioRelease, Some("Boards of Canada"), Some(7)),
		];
		assert_eq!(entities(&items, 30)[0].interactions, Some(u64::MAX));
	}

	#[test]
	fn demo_has_fifteen_artists() {
		let demo = demo_entities();
		assert_eq!(demo.len(), 15);
		assert!(demo.iter().all(|e| e.interactions.is_some() && !e.genres.is_empty()));
	}
}
