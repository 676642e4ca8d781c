//! Relationship graph synthesis.
//!
//! The entity list is described to a generative collaborator, which answers
//! with free text that should contain a `{"nodes": [...], "links": [...]}`
//! object. Whatever goes wrong along the way, a non-empty entity list always
//! produces a graph: the deterministic fallback takes over.

mod gemini;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::components::force_graph::{Graph, GraphEdge, GraphNode, NodeKind, RelationKind};
use crate::consumption::Entity;
use crate::error::SynthesisError;

pub use gemini::GeminiCollaborator;

/// Most edges ever requested, however long the entity list.
const MAX_REQUESTED_EDGES: usize = 30;

/// Longest text kept in a [`Diagnostics`] field, in characters.
const MAX_DIAGNOSTIC_CHARS: usize = 4096;

/// Genre families offered to the collaborator, numbered from 1.
const GROUPS: [&str; 7] = ["Electronic", "Hip Hop", "Rock", "R&B", "Jazz", "Pop", "Other"];

/// Display name of a node group, when it is one the prompt defines.
pub fn group_label(group: u32) -> Option<&'static str> {
	let index = usize::try_from(group).ok()?.checked_sub(1)?;
	GROUPS.get(index).copied()
}

/// Something that turns a prompt into free text.
pub trait Collaborator {
	async fn generate(&self, prompt: &str) -> Result<String, SynthesisError>;
}

/// Where a synthesized graph came from.
#[derive(Clone, Debug, PartialEq)]
pub enum Origin {
	Collaborator,
	/// The collaborator was skipped or failed; the reason is user-facing.
	Fallback(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Synthesis {
	pub graph: Graph,
	pub origin: Origin,
	/// The collaborator's text, when it answered at all.
	pub raw_response: Option<String>,
}

impl Synthesis {
	pub fn diagnostics(&self) -> Diagnostics {
		let failure = match &self.origin {
			Origin::Collaborator => None,
			Origin::Fallback(reason) => Some(capped(reason)),
		};
		Diagnostics {
			raw_response: self.raw_response.as_deref().map(capped),
			failure,
		}
	}
}

/// Last exchange with the collaborator, kept so a fallback can be explained later.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
	pub raw_response: Option<String>,
	pub failure: Option<String>,
}

fn capped(text: &str) -> String {
	text.chars().take(MAX_DIAGNOSTIC_CHARS).collect()
}

/// Derives a graph for `entities`. `None` only for an empty list.
pub async fn synthesize<C: Collaborator>(
	entities: &[Entity],
	collaborator: Option<&C>,
) -> Option<Synthesis> {
	if entities.is_empty() {
		return None;
	}
	let (raw_response, result) = match collaborator {
		Some(collaborator) => ask(collaborator, entities).await,
		None => (None, Err(SynthesisError::MissingCredential)),
	};
	Some(match result {
		Ok(graph) => {
			log::info!(
				"synthesized {} nodes and {} edges",
				graph.nodes.len(),
				graph.edges.len()
			);
			Synthesis {
				graph,
				origin: Origin::Collaborator,
				raw_response,
			}
		}
		Err(e) => {
			log::warn!("synthesis fell back: {e}");
			Synthesis {
				graph: fallback_graph(entities),
				origin: Origin::Fallback(e.to_string()),
				raw_response,
			}
		}
	})
}

/// Queries the collaborator. The text comes back even when it does not parse.
async fn ask<C: Collaborator>(
	collaborator: &C,
	entities: &[Entity],
) -> (Option<String>, Result<Graph, SynthesisError>) {
	let prompt = build_prompt(entities);
	log::debug!("prompt:\n{prompt}");
	let text = match collaborator.generate(&prompt).await {
		Ok(text) => text,
		Err(e) => return (None, Err(e)),
	};
	let result = graph_from_text(&text, entities);
	(Some(text), result)
}

fn graph_from_text(text: &str, entities: &[Entity]) -> Result<Graph, SynthesisError> {
	if text.trim().is_empty() {
		return Err(SynthesisError::EmptyResponse);
	}
	let mut graph = parse_response(text)?;
	attach_playcounts(&mut graph, entities);
	Ok(graph)
}

/// Minimum edge count asked of the collaborator.
pub fn requested_edges(entity_count: usize) -> usize {
	(entity_count * 2).min(MAX_REQUESTED_EDGES)
}

pub fn build_prompt(entities: &[Entity]) -> String {
	let described: Vec<String> = entities
		.iter()
		.map(|entity| match entity.genres.as_slice() {
			[] => entity.name.clone(),
			genres => {
				let shown = &genres[..genres.len().min(3)];
				format!("{} ({})", entity.name, shown.join(", "))
			}
		})
		.collect();
	let kinds: Vec<&str> = RelationKind::ALL.iter().map(|k| k.as_str()).collect();
	let groups: Vec<String> = GROUPS
		.iter()
		.enumerate()
		.map(|(i, name)| format!("{}={name}", i + 1))
		.collect();

	format!(
		r#"You are a music expert. Analyze these artists and create a JSON network graph showing their connections.

Artists: {artists}

Return ONLY valid JSON with this exact structure:
{{
  "nodes": [{{"id": "Artist Name", "group": 1, "type": "artist"}}],
  "links": [{{"source": "Artist A", "target": "Artist B", "reason": "Brief reason", "type": "collaboration"}}]
}}

Connection types: {kinds}
Groups: {groups}

Create {edges} links minimum. Every artist needs at least 2 connections."#,
		artists = described.join(", "),
		kinds = kinds.join(", "),
		groups = groups.join(", "),
		edges = requested_edges(entities.len()),
	)
}

/// Parses collaborator text, retrying once with code fences stripped.
pub fn parse_response(text: &str) -> Result<Graph, SynthesisError> {
	let value = match serde_json::from_str::<Value>(text) {
		Ok(value) => value,
		Err(_) => {
			let cleaned = text.replace("```json", "").replace("```", "");
			serde_json::from_str::<Value>(cleaned.trim())
				.map_err(|e| SynthesisError::Unparseable(e.to_string()))?
		}
	};
	let graph = graph_from_value(&value)?;
	if graph.is_empty() {
		return Err(SynthesisError::EmptyGraph);
	}
	Ok(graph)
}

fn graph_from_value(value: &Value) -> Result<Graph, SynthesisError> {
	let Value::Object(root) = value else {
		return Err(SynthesisError::Unparseable("expected a JSON object".into()));
	};
	let list = |key: &str| {
		root.get(key)
			.and_then(Value::as_array)
			.map(Vec::as_slice)
			.unwrap_or_default()
	};

	let nodes = list("nodes").iter().filter_map(node_from_value).collect();
	let edges_key = if root.contains_key("links") { "links" } else { "edges" };
	let edges = list(edges_key).iter().filter_map(edge_from_value).collect();
	Ok(Graph::new(nodes, edges))
}

fn node_from_value(value: &Value) -> Option<GraphNode> {
	let id = value.get("id").and_then(Value::as_str)?.trim();
	if id.is_empty() {
		return None;
	}
	Some(GraphNode {
		id: id.to_string(),
		group: value
			.get("group")
			.and_then(Value::as_u64)
			.and_then(|g| u32::try_from(g).ok()),
		kind: value
			.get("type")
			.and_then(Value::as_str)
			.and_then(NodeKind::parse)
			.unwrap_or_default(),
		playcount: None,
	})
}

fn edge_from_value(value: &Value) -> Option<GraphEdge> {
	let field = |key: &str| value.get(key).and_then(Value::as_str).map(str::trim);
	let (source, target) = (field("source")?, field("target")?);
	if source.is_empty() || target.is_empty() {
		return None;
	}
	Some(GraphEdge::new(
		source,
		target,
		field("type").map(RelationKind::parse).unwrap_or_default(),
		field("reason").unwrap_or_default(),
	))
}

fn attach_playcounts(graph: &mut Graph, entities: &[Entity]) {
	for node in &mut graph.nodes {
		node.playcount = entities
			.iter()
			.find(|entity| entity.name == node.id)
			.and_then(|entity| entity.interactions);
	}
}

/// Graph built from the entity list alone.
pub fn fallback_graph(entities: &[Entity]) -> Graph {
	let nodes = entities
		.iter()
		.enumerate()
		.map(|(i, entity)| GraphNode {
			group: Some((i % 5) as u32),
			playcount: entity.interactions,
			..GraphNode::new(entity.name.clone())
		})
		.collect();

	let mut edges = Vec::new();
	if let [a, b, ..] = entities {
		edges.push(GraphEdge::new(&a.name, &b.name, RelationKind::Similar, "Similar sound"));
	}
	if let [_, b, c, ..] = entities {
		edges.push(GraphEdge::new(&b.name, &c.name, RelationKind::Genre, "Genre overlap"));
	}
	Graph::new(nodes, edges)
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use futures::executor::block_on;

	use super::*;

	/// Replies with a fixed result and counts calls.
	struct Scripted {
		reply: Result<&'static str, ()>,
		calls: Cell<usize>,
	}

	impl Scripted {
		fn new(reply: Result<&'static str, ()>) -> Self {
			Self {
				reply,
				calls: Cell::new(0),
			}
		}
	}

	impl Collaborator for Scripted {
		async fn generate(&self, _prompt: &str) -> Result<String, SynthesisError> {
			self.calls.set(self.calls.get() + 1);
			self.reply
				.map(str::to_string)
				.map_err(|()| SynthesisError::Transport("connection reset".into()))
		}
	}

	fn named(names: &[&str]) -> Vec<Entity> {
		names
			.iter()
			.enumerate()
			.map(|(i, name)| Entity {
				name: name.to_string(),
				interactions: Some(100 * (i as u64 + 1)),
				genres: Vec::new(),
			})
			.collect()
	}

	#[test]
	fn fallback_without_credential() {
		let entities = named(&["X", "Y", "Z"]);
		let synthesis = block_on(synthesize::<Scripted>(&entities, None)).unwrap();

		let ids: Vec<_> = synthesis.graph.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, ["X", "Y", "Z"]);
		assert!(!synthesis.graph.edges.is_empty());
		assert!(matches!(synthesis.origin, Origin::Fallback(_)));
		assert_eq!(synthesis.graph.nodes[2].group, Some(2));
		assert_eq!(synthesis.graph.nodes[0].playcount, Some(100));
	}

	#[test]
	fn fallback_on_transport_error_and_garbage() {
		let entities = named(&["X", "Y"]);
		for reply in [Err(()), Ok("I cannot help with that."), Ok("   "), Ok(r#"{"nodes":[]}"#)] {
			let collaborator = Scripted::new(reply);
			let synthesis = block_on(synthesize(&entities, Some(&collaborator))).unwrap();
			assert_eq!(collaborator.calls.get(), 1);
			assert!(matches!(synthesis.origin, Origin::Fallback(_)));
			assert_eq!(synthesis.graph.nodes.len(), 2);
			assert_eq!(synthesis.graph.edges.len(), 1);
		}
	}

	#[test]
	fn diagnostics_keep_raw_text_and_reason() {
		let entities = named(&["X", "Y"]);
		let collaborator = Scripted::new(Ok("I cannot help with that."));
		let synthesis = block_on(synthesize(&entities, Some(&collaborator))).unwrap();
		let diagnostics = synthesis.diagnostics();
		assert_eq!(diagnostics.raw_response.as_deref(), Some("I cannot help with that."));
		assert!(diagnostics.failure.unwrap().starts_with("unparseable response"));

		let offline = Scripted::new(Err(()));
		let synthesis = block_on(synthesize(&entities, Some(&offline))).unwrap();
		assert_eq!(
			synthesis.diagnostics(),
			Diagnostics {
				raw_response: None,
				failure: Some("collaborator unreachable: connection reset".into()),
			}
		);

		let answered = Scripted::new(Ok(r#"{"nodes":[{"id":"X"}]}"#));
		let synthesis = block_on(synthesize(&entities, Some(&answered))).unwrap();
		assert_eq!(synthesis.diagnostics().failure, None);
		assert!(synthesis.diagnostics().raw_response.is_some());
	}

	#[test]
	fn diagnostics_are_capped() {
		let synthesis = Synthesis {
			graph: Graph::default(),
			origin: Origin::Fallback("x".repeat(10_000)),
			raw_response: Some("é".repeat(10_000)),
		};
		let diagnostics = synthesis.diagnostics();
		assert_eq!(diagnostics.failure.unwrap().len(), MAX_DIAGNOSTIC_CHARS);
		assert_eq!(diagnostics.raw_response.unwrap().chars().count(), MAX_DIAGNOSTIC_CHARS);
	}

	#[test]
	fn empty_entities_yield_nothing() {
		let collaborator = Scripted::new(Ok("{}"));
		assert_eq!(block_on(synthesize(&[], Some(&collaborator))), None);
		assert_eq!(collaborator.calls.get(), 0);
	}

	#[test]
	fn fenced_response_is_repaired() {
		let collaborator = Scripted::new(Ok(
			"```json\n{\"nodes\":[{\"id\":\"X\",\"group\":3},{\"id\":\"Y\",\"type\":\"genre\"},{\"group\":1}],\
			 \"links\":[{\"source\":\"X\",\"target\":\"Y\",\"type\":\"influence\",\"reason\":\"Toured together\"}]}\n```",
		));
		let entities = named(&["X", "Y"]);
		let synthesis = block_on(synthesize(&entities, Some(&collaborator))).unwrap();

		assert_eq!(synthesis.origin, Origin::Collaborator);
		let graph = synthesis.graph;
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.nodes[0].group, Some(3));
		assert_eq!(graph.nodes[0].kind, NodeKind::Artist);
		assert_eq!(graph.nodes[1].kind, NodeKind::Genre);
		assert_eq!(graph.nodes[1].playcount, Some(200));
		assert_eq!(graph.edges[0].kind, RelationKind::Influence);
		assert_eq!(graph.edges[0].reason, "Toured together");
	}

	#[test]
	fn conversion_defaults_and_dedupes() {
		let graph = parse_response(
			r#"{"nodes":[{"id":"A"},{"id":"A","group":9},{"id":""},{"id":7}],
			    "links":[{"source":"A","target":"B"},{"source":"A"}]}"#,
		)
		.unwrap();
		assert_eq!(graph.nodes.len(), 1);
		assert_eq!(graph.nodes[0].group, None);
		assert_eq!(graph.edges.len(), 1);
		assert_eq!(graph.edges[0].kind, RelationKind::Similar);

		assert!(matches!(parse_response("[1, 2]"), Err(SynthesisError::Unparseable(_))));
	}

	#[test]
	fn prompt_names_entities_and_edge_budget() {
		let mut entities = named(&["Radiohead", "Björk"]);
		entities[0].genres = vec!["art rock".into(), "alternative".into(), "electronic".into(), "extra".into()];
		let prompt = build_prompt(&entities);
		assert!(prompt.contains("Radiohead (art rock, alternative, electronic), Björk"));
		assert!(!prompt.contains("extra"));
		assert!(prompt.contains("Create 4 links minimum"));
		assert!(prompt.contains("collaboration, influence, genre, label, feature, similar"));

		assert!(prompt.contains("Groups: 1=Electronic, 2=Hip Hop, 3=Rock, 4=R&B, 5=Jazz, 6=Pop, 7=Other"));

		assert_eq!(requested_edges(40), 30);
	}

	#[test]
	fn group_labels() {
		assert_eq!(group_label(1), Some("Electronic"));
		assert_eq!(group_label(7), Some("Other"));
		assert_eq!(group_label(0), None);
		assert_eq!(group_label(8), None);
	}

	#[test]
	fn fallback_shapes() {
		let one = fallback_graph(&named(&["Solo"]));
		assert_eq!(one.nodes.len(), 1);
		assert!(one.edges.is_empty());

		let two = fallback_graph(&named(&["A", "B"]));
		assert_eq!(two.edges.len(), 1);
		assert_eq!(two.edges[0].reason, "Similar sound");
	}
}
