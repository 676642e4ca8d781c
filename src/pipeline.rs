//! Sync: ingest history and synthesize a graph from it.
//!
//! Running a flow never writes the store. The caller decides whether the
//! result is still wanted and only then hands it to [`persist`].

use crate::config::{ProviderKind, Settings};
use crate::consumption::{self, Entity, Fetch, Item, MAX_ENTITIES};
use crate::store::{GraphRepository, KeyValue, VersionedStore};
use crate::synth::{self, Collaborator, GeminiCollaborator, Synthesis};

/// Long-running steps reported to the caller as they begin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
	Fetching,
	Analyzing,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outcome {
	pub items: Vec<Item>,
	/// Identities whose provider answered with at least one page.
	pub identities: Vec<(ProviderKind, String)>,
	/// `None` when no artist could be extracted from the items.
	pub synthesis: Option<Synthesis>,
}

/// The configured generative collaborator, if it has a key.
pub fn collaborator(settings: &Settings) -> Option<GeminiCollaborator> {
	settings
		.collaborator_key
		.as_deref()
		.map(|key| GeminiCollaborator::new(key, settings.collaborator_model.as_str()))
}

pub async fn sync<F, C>(
	settings: &Settings,
	fetcher: &F,
	collaborator: Option<&C>,
	mut on_stage: impl FnMut(Stage),
) -> Outcome
where
	F: Fetch,
	C: Collaborator,
{
	on_stage(Stage::Fetching);
	let ingestion = consumption::ingest(fetcher, &settings.providers).await;
	let entities = consumption::entities(&ingestion.items, MAX_ENTITIES);
	let synthesis = analyze(&entities, collaborator, &mut on_stage).await;
	Outcome {
		items: ingestion.items,
		identities: ingestion.succeeded,
		synthesis,
	}
}

/// Synthesizes the built-in demo artists without touching any provider.
pub async fn demo<C: Collaborator>(collaborator: Option<&C>, mut on_stage: impl FnMut(Stage)) -> Outcome {
	Outcome {
		synthesis: analyze(&consumption::demo_entities(), collaborator, &mut on_stage).await,
		..Outcome::default()
	}
}

async fn analyze<C: Collaborator>(
	entities: &[Entity],
	collaborator: Option<&C>,
	on_stage: &mut impl FnMut(Stage),
) -> Option<Synthesis> {
	if entities.is_empty() {
		log::info!("no artists to analyze");
		return None;
	}
	on_stage(Stage::Analyzing);
	synth::synthesize(entities, collaborator).await
}

/// Records a finished run: identities, items, graph and synthesis diagnostics.
/// Empty parts leave the previous cache in place.
pub fn persist<S: KeyValue>(outcome: &Outcome, store: &VersionedStore<S>) {
	for (kind, identity) in &outcome.identities {
		if let Err(e) = store.save_identity(*kind, Some(identity)) {
			log::warn!("could not remember {} identity: {e}", kind.display_name());
		}
	}
	if !outcome.items.is_empty() {
		if let Err(e) = store.save_items(&outcome.items) {
			log::warn!("could not cache items: {e}");
		}
	}
	let Some(synthesis) = &outcome.synthesis else {
		return;
	};
	if let Err(e) = store.save(&synthesis.graph) {
		log::warn!("could not cache graph: {e}");
	}
	if let Err(e) = store.save_diagnostics(&synthesis.diagnostics()) {
		log::warn!("could not record synthesis diagnostics: {e}");
	}
}
