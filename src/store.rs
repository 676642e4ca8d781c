//! Persistent graph cache.
//!
//! Everything lives in a flat string key-value store (`localStorage` in the
//! browser). A version key guards the cached graph and items: when it does not
//! match [`CACHE_VERSION`], they are dropped along with the last synthesis
//! diagnostics. Provider identities are user input rather than cache and
//! survive a version change.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::components::force_graph::Graph;
use crate::config::ProviderKind;
use crate::consumption::Item;
use crate::error::StoreError;
use crate::synth::Diagnostics;

pub const CACHE_VERSION: &str = "5";

const VERSION_KEY: &str = "soundmind_cache_version";
const GRAPH_KEY: &str = "soundmind_graph";
const ITEMS_KEY: &str = "soundmind_items";
const DIAGNOSTICS_KEY: &str = "soundmind_diagnostics";
const IDENTITY_PREFIX: &str = "soundmind_identity_";

pub trait KeyValue {
	fn get(&self, key: &str) -> Option<String>;
	fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
	fn remove(&self, key: &str);
}

/// `window.localStorage`.
pub struct BrowserStorage {
	storage: web_sys::Storage,
}

impl BrowserStorage {
	pub fn open() -> Result<Self, StoreError> {
		let storage = web_sys::window()
			.and_then(|window| window.local_storage().ok().flatten())
			.ok_or(StoreError::Unavailable)?;
		Ok(Self { storage })
	}
}

impl KeyValue for BrowserStorage {
	fn get(&self, key: &str) -> Option<String> {
		self.storage.get_item(key).ok().flatten()
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
		// Fails when the origin's quota is exhausted.
		self.storage
			.set_item(key, value)
			.map_err(|_| StoreError::Rejected(key.to_string()))
	}

	fn remove(&self, key: &str) {
		let _ = self.storage.remove_item(key);
	}
}

#[derive(Default)]
pub struct MemoryStorage {
	entries: RefCell<HashMap<String, String>>,
}

impl KeyValue for MemoryStorage {
	fn get(&self, key: &str) -> Option<String> {
		self.entries.borrow().get(key).cloned()
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
		self.entries
			.borrow_mut()
			.insert(key.to_string(), value.to_string());
		Ok(())
	}

	fn remove(&self, key: &str) {
		self.entries.borrow_mut().remove(key);
	}
}

/// Browser storage when the page may use it, memory otherwise.
pub enum Backend {
	Browser(BrowserStorage),
	Memory(MemoryStorage),
}

impl Backend {
	pub fn open() -> Self {
		match BrowserStorage::open() {
			Ok(storage) => Self::Browser(storage),
			Err(e) => {
				log::warn!("{e}; cache will not outlive this page");
				Self::Memory(MemoryStorage::default())
			}
		}
	}
}

impl KeyValue for Backend {
	fn get(&self, key: &str) -> Option<String> {
		match self {
			Self::Browser(s) => s.get(key),
			Self::Memory(s) => s.get(key),
		}
	}

	fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
		match self {
			Self::Browser(s) => s.set(key, value),
			Self::Memory(s) => s.set(key, value),
		}
	}

	fn remove(&self, key: &str) {
		match self {
			Self::Browser(s) => s.remove(key),
			Self::Memory(s) => s.remove(key),
		}
	}
}

/// Where the last synthesized graph is kept between sessions.
pub trait GraphRepository {
	/// The cached graph; corrupt entries are removed and read as a miss.
	fn load(&self) -> Option<Graph>;
	fn save(&self, graph: &Graph) -> Result<(), StoreError>;
	/// Drops cached data written under another version. True if it did.
	fn invalidate_if_version_mismatch(&self) -> bool;
	fn clear(&self);
}

pub struct VersionedStore<S> {
	storage: S,
}

impl<S: KeyValue> VersionedStore<S> {
	pub fn new(storage: S) -> Self {
		Self { storage }
	}

	pub fn load_items(&self) -> Vec<Item> {
		self.read(ITEMS_KEY).unwrap_or_default()
	}

	pub fn save_items(&self, items: &[Item]) -> Result<(), StoreError> {
		self.write(ITEMS_KEY, items)
	}

	pub fn load_diagnostics(&self) -> Option<Diagnostics> {
		self.read(DIAGNOSTICS_KEY)
	}

	pub fn save_diagnostics(&self, diagnostics: &Diagnostics) -> Result<(), StoreError> {
		self.write(DIAGNOSTICS_KEY, diagnostics)
	}

	pub fn identity(&self, kind: ProviderKind) -> Option<String> {
		self.storage.get(&identity_key(kind))
	}

	pub fn save_identity(&self, kind: ProviderKind, identity: Option<&str>) -> Result<(), StoreError> {
		let key = identity_key(kind);
		match identity {
			Some(identity) => self.storage.set(&key, identity),
			None => {
				self.storage.remove(&key);
				Ok(())
			}
		}
	}

	/// Deserializes `key`, removing the entry if it does not parse.
	fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
		let raw = self.storage.get(key)?;
		match serde_json::from_str(&raw) {
			Ok(value) => Some(value),
			Err(e) => {
				log::warn!("dropping corrupt {key}: {e}");
				self.storage.remove(key);
				None
			}
		}
	}

	fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
		let encoded = serde_json::to_string(value)?;
		self.storage.set(key, &encoded)?;
		self.storage.set(VERSION_KEY, CACHE_VERSION)
	}
}

impl<S: KeyValue> GraphRepository for VersionedStore<S> {
	fn load(&self) -> Option<Graph> {
		let graph: Graph = self.read(GRAPH_KEY)?;
		if graph.is_empty() || !graph.has_unique_ids() {
			log::warn!("dropping cached graph without usable nodes");
			self.storage.remove(GRAPH_KEY);
			return None;
		}
		log::debug!("loaded cached graph with {} nodes", graph.nodes.len());
		Some(graph)
	}

	fn save(&self, graph: &Graph) -> Result<(), StoreError> {
		self.write(GRAPH_KEY, graph)
	}

	fn invalidate_if_version_mismatch(&self) -> bool {
		if self.storage.get(VERSION_KEY).as_deref() == Some(CACHE_VERSION) {
			return false;
		}
		log::info!("cache version changed, clearing cached graph");
		self.clear();
		if let Err(e) = self.storage.set(VERSION_KEY, CACHE_VERSION) {
			log::warn!("could not record cache version: {e}");
		}
		true
	}

	fn clear(&self) {
		self.storage.remove(GRAPH_KEY);
		self.storage.remove(ITEMS_KEY);
		self.storage.remove(DIAGNOSTICS_KEY);
	}
}

fn identity_key(kind: ProviderKind) -> String {
	format!("{IDENTITY_PREFIX}{}", kind.slug())
}
