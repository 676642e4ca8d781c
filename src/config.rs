//! Runtime settings.
//!
//! Credentials come from the build environment (`LASTFM_API_KEY`,
//! `GEMINI_API_KEY`, `GEMINI_MODEL`) and can be overridden from the settings
//! form. Identities are persisted by the store between launches.

use serde::{Deserialize, Serialize};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// External history providers, in merge order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
	LastFm,
	Letterboxd,
	Goodreads,
}

impl ProviderKind {
	pub const ALL: [ProviderKind; 3] = [Self::LastFm, Self::Letterboxd, Self::Goodreads];

	/// Prefix for item ids and storage keys.
	pub fn slug(self) -> &'static str {
		match self {
			Self::LastFm => "lastfm",
			Self::Letterboxd => "letterboxd",
			Self::Goodreads => "goodreads",
		}
	}

	pub fn display_name(self) -> &'static str {
		match self {
			Self::LastFm => "Last.fm",
			Self::Letterboxd => "Letterboxd",
			Self::Goodreads => "Goodreads",
		}
	}

	/// Paging and standout thresholds for this provider.
	pub fn policy(self) -> ProviderPolicy {
		match self {
			// Top albums; 500+ plays marks a standout.
			Self::LastFm => ProviderPolicy {
				page_size: 50,
				max_pages: 3,
				standout_interactions: Some(500),
				needs_credential: true,
			},
			// Diary feed, one page; only a five-star rating is a standout.
			Self::Letterboxd => ProviderPolicy {
				page_size: 50,
				max_pages: 1,
				standout_interactions: None,
				needs_credential: false,
			},
			// Read shelf feed, one page; only a five-star rating is a standout.
			Self::Goodreads => ProviderPolicy {
				page_size: 100,
				max_pages: 1,
				standout_interactions: None,
				needs_credential: false,
			},
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProviderPolicy {
	pub page_size: usize,
	pub max_pages: u32,
	/// Interaction count that must be exceeded (strictly) for a standout.
	pub standout_interactions: Option<u64>,
	pub needs_credential: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderConfig {
	pub kind: ProviderKind,
	pub identity: Option<String>,
	pub credential: Option<String>,
}

impl ProviderConfig {
	pub fn new(kind: ProviderKind) -> Self {
		Self {
			kind,
			identity: None,
			credential: None,
		}
	}

	pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
		self.identity = non_blank(identity.into());
		self
	}

	pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
		self.credential = non_blank(credential.into());
		self
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
	pub providers: Vec<ProviderConfig>,
	pub collaborator_key: Option<String>,
	pub collaborator_model: String,
}

impl Settings {
	/// Settings from the build environment, with no identities yet.
	pub fn from_env() -> Self {
		let lastfm = ProviderConfig::new(ProviderKind::LastFm)
			.with_credential(option_env!("LASTFM_API_KEY").unwrap_or_default());
		Self {
			providers: vec![
				lastfm,
				ProviderConfig::new(ProviderKind::Letterboxd),
				ProviderConfig::new(ProviderKind::Goodreads),
			],
			collaborator_key: option_env!("GEMINI_API_KEY").and_then(|k| non_blank(k.to_string())),
			collaborator_model: option_env!("GEMINI_MODEL")
				.unwrap_or(DEFAULT_GEMINI_MODEL)
				.to_string(),
		}
	}

	pub fn has_any_identity(&self) -> bool {
		self.providers.iter().any(|p| p.identity.is_some())
	}
}

/// Trims `value`, mapping blank input to `None`.
pub fn non_blank(value: String) -> Option<String> {
	let trimmed = value.trim();
	if trimmed.is_empty() {
		None
	} else {
		Some(trimmed.to_string())
	}
}
