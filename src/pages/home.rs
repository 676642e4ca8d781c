use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::components::force_graph::{ForceGraphCanvas, Graph, Hover, RelationKind};
use crate::components::shelf::Shelf;
use crate::config::{ProviderKind, Settings, non_blank};
use crate::consumption::{HttpFetcher, Item};
use crate::pipeline::{self, Stage};
use crate::store::{Backend, GraphRepository, VersionedStore};
use crate::synth::{self, Origin, Synthesis};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Status {
	Connect,
	Fetching,
	Analyzing,
	Visualizing,
}

fn open_store() -> VersionedStore<Backend> {
	VersionedStore::new(Backend::open())
}

fn progress_line(stage: Stage) -> &'static str {
	match stage {
		Stage::Fetching => "Fetching your history...",
		Stage::Analyzing => "Analyzing artist relationships...",
	}
}

/// Text fields of the connect form.
#[derive(Clone, Copy)]
struct Form {
	lastfm_user: RwSignal<String>,
	lastfm_key: RwSignal<String>,
	letterboxd_user: RwSignal<String>,
	goodreads_id: RwSignal<String>,
	gemini_key: RwSignal<String>,
}

impl Form {
	fn new() -> Self {
		Self {
			lastfm_user: RwSignal::new(String::new()),
			lastfm_key: RwSignal::new(String::new()),
			letterboxd_user: RwSignal::new(String::new()),
			goodreads_id: RwSignal::new(String::new()),
			gemini_key: RwSignal::new(String::new()),
		}
	}

	fn identity(&self, kind: ProviderKind) -> RwSignal<String> {
		match kind {
			ProviderKind::LastFm => self.lastfm_user,
			ProviderKind::Letterboxd => self.letterboxd_user,
			ProviderKind::Goodreads => self.goodreads_id,
		}
	}

	/// Build-time settings overlaid with whatever the form holds.
	fn settings(&self) -> Settings {
		let mut settings = Settings::from_env();
		let lastfm_key = non_blank(self.lastfm_key.get_untracked());
		settings.providers = settings
			.providers
			.into_iter()
			.map(|provider| {
				let kind = provider.kind;
				let provider = provider.with_identity(self.identity(kind).get_untracked());
				match (kind, &lastfm_key) {
					(ProviderKind::LastFm, Some(key)) => provider.with_credential(key.as_str()),
					_ => provider,
				}
			})
			.collect();
		if let Some(key) = non_blank(self.gemini_key.get_untracked()) {
			settings.collaborator_key = Some(key);
		}
		settings
	}
}

/// SoundMind: connect accounts, then explore the synthesized artist graph.
#[component]
pub fn Home() -> impl IntoView {
	let status = RwSignal::new(Status::Connect);
	let progress = RwSignal::new(String::new());
	let notice = RwSignal::new(None::<String>);
	let graph = RwSignal::new(Graph::default());
	let items = RwSignal::new(Vec::<Item>::new());
	let hovered = RwSignal::new(None::<Hover>);
	let form = Form::new();
	// Bumped on reset; work started under an older value is discarded.
	let epoch = StoredValue::new(0u64);

	{
		let store = open_store();
		store.invalidate_if_version_mismatch();
		for kind in ProviderKind::ALL {
			if let Some(identity) = store.identity(kind) {
				form.identity(kind).set(identity);
			}
		}
		items.set(store.load_items());
		if let Some(failure) = store.load_diagnostics().and_then(|d| d.failure) {
			log::debug!("last synthesis fell back: {failure}");
		}
		if let Some(cached) = store.load() {
			graph.set(cached);
			status.set(Status::Visualizing);
		}
	}

	let begin = move |first: Status| {
		let ticket = epoch.get_value();
		notice.set(None);
		hovered.set(None);
		progress.set(String::new());
		status.set(first);
		ticket
	};
	let is_current = move |ticket: u64| epoch.try_get_value() == Some(ticket);
	let on_stage = move |ticket: u64| {
		move |stage: Stage| {
			if !is_current(ticket) {
				return;
			}
			if stage == Stage::Analyzing {
				status.set(Status::Analyzing);
			}
			progress.set(progress_line(stage).to_string());
		}
	};
	let show = move |synthesis: Option<Synthesis>, empty_notice: &str| match synthesis {
		Some(Synthesis { graph: g, origin, .. }) => {
			if let Origin::Fallback(reason) = origin {
				notice.set(Some(format!("Showing a basic graph ({reason}).")));
			}
			graph.set(g);
			status.set(Status::Visualizing);
		}
		None => {
			notice.set(Some(empty_notice.to_string()));
			status.set(Status::Connect);
		}
	};

	let sync = move || {
		let settings = form.settings();
		if !settings.has_any_identity() {
			notice.set(Some("Enter at least one account to sync.".into()));
			return;
		}
		let ticket = begin(Status::Fetching);
		spawn_local(async move {
			let collaborator = pipeline::collaborator(&settings);
			let outcome = pipeline::sync(
				&settings,
				&HttpFetcher::default(),
				collaborator.as_ref(),
				on_stage(ticket),
			)
			.await;
			if !is_current(ticket) {
				log::debug!("discarding stale sync result");
				return;
			}
			pipeline::persist(&outcome, &open_store());
			let empty_notice = if outcome.items.is_empty() {
				"Nothing could be fetched. Check the account names and try again."
			} else {
				"No artists found in your history to connect."
			};
			items.set(outcome.items);
			show(outcome.synthesis, empty_notice);
		});
	};

	let demo = move || {
		let settings = form.settings();
		let ticket = begin(Status::Analyzing);
		spawn_local(async move {
			let collaborator = pipeline::collaborator(&settings);
			let outcome = pipeline::demo(collaborator.as_ref(), on_stage(ticket)).await;
			if is_current(ticket) {
				pipeline::persist(&outcome, &open_store());
				show(outcome.synthesis, "The demo could not be built.");
			}
		});
	};

	let reset = move || {
		epoch.update_value(|e| *e += 1);
		open_store().clear();
		graph.set(Graph::default());
		items.set(Vec::new());
		hovered.set(None);
		notice.set(None);
		status.set(Status::Connect);
	};

	let cancel = move || {
		epoch.update_value(|e| *e += 1);
		status.set(if graph.with_untracked(Graph::is_empty) {
			Status::Connect
		} else {
			Status::Visualizing
		});
	};

	on_cleanup(move || {
		// Invalidates anything still in flight.
		epoch.try_update_value(|e| *e += 1);
	});

	let on_submit = move |ev: SubmitEvent| {
		ev.prevent_default();
		sync();
	};

	let field = move |label: &'static str, value: RwSignal<String>, kind: &'static str| {
		view! {
			<label class="field">
				<span>{label}</span>
				<input
					type=kind
					prop:value=move || value.get()
					on:input=move |ev| value.set(event_target_value(&ev))
				/>
			</label>
		}
	};

	view! {
		<div class="soundmind">
			{move || match status.get() {
				Status::Connect => view! {
					<div class="connect">
						<h1>"SoundMind"</h1>
						<p class="subtitle">"Map the artists you love and how they connect."</p>
						<form on:submit=on_submit>
							{field("Last.fm username", form.lastfm_user, "text")}
							{field("Last.fm API key (optional)", form.lastfm_key, "password")}
							{field("Letterboxd username", form.letterboxd_user, "text")}
							{field("Goodreads user id", form.goodreads_id, "text")}
							{field("Gemini API key (optional)", form.gemini_key, "password")}
							<div class="actions">
								<button type="submit">"Sync"</button>
								<button type="button" on:click=move |_| demo()>"Try demo"</button>
							</div>
						</form>
					</div>
				}
				.into_any(),
				Status::Fetching | Status::Analyzing => view! {
					<div class="working">
						<div class="spinner"></div>
						<p>{move || progress.get()}</p>
						<button type="button" on:click=move |_| cancel()>"Cancel"</button>
					</div>
				}
				.into_any(),
				Status::Visualizing => view! {
					<div class="fullscreen-graph">
						<ForceGraphCanvas graph=graph hovered=hovered fullscreen=true />
						<div class="graph-overlay">
							<h1>"SoundMind"</h1>
							<Legend />
							<InfoPanel graph=graph hovered=hovered />
							<button type="button" on:click=move |_| reset()>"Start over"</button>
						</div>
					</div>
				}
				.into_any(),
			}}
			<Show when=move || notice.with(Option::is_some)>
				<p class="notice">{move || notice.get().unwrap_or_default()}</p>
			</Show>
			<Shelf items=items />
		</div>
	}
}

/// Colour key for relationship kinds.
#[component]
fn Legend() -> impl IntoView {
	view! {
		<ul class="legend">
			{RelationKind::ALL
				.into_iter()
				.map(|kind| {
					view! {
						<li>
							<span class="swatch" style:background-color=kind.color()></span>
							{kind.as_str()}
						</li>
					}
				})
				.collect_view()}
		</ul>
	}
}

/// Details for whatever the pointer is over.
#[component]
fn InfoPanel(graph: RwSignal<Graph>, hovered: RwSignal<Option<Hover>>) -> impl IntoView {
	let details = move || {
		let hover = hovered.get()?;
		graph.with(|g| match hover {
			Hover::Node(id) => g.node(&id).map(|node| {
				let kind = match node.group.and_then(synth::group_label) {
					Some(family) => format!("{} \u{b7} {family}", node.kind.label()),
					None => node.kind.label().to_string(),
				};
				let plays = node.playcount.map(|p| format!("{p} plays"));
				(node.id.clone(), kind, plays)
			}),
			Hover::Edge(index) => g.edges.get(index).map(|edge| {
				let reason = (!edge.reason.is_empty()).then(|| edge.reason.clone());
				(
					format!("{} \u{2194} {}", edge.source, edge.target),
					edge.kind.as_str().to_string(),
					reason,
				)
			}),
		})
	};

	view! {
		{move || {
			details()
				.map(|(title, kind, detail)| {
					view! {
						<div class="info-panel">
							<h2>{title}</h2>
							<p class="kind">{kind}</p>
							{detail.map(|d| view! { <p>{d}</p> })}
						</div>
					}
				})
		}}
	}
}

