use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// What a node stands for. Only used for labelling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
	#[default]
	Artist,
	Album,
	Genre,
}

impl NodeKind {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"artist" => Some(Self::Artist),
			"album" => Some(Self::Album),
			"genre" => Some(Self::Genre),
			_ => None,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			Self::Artist => "Artist",
			Self::Album => "Album",
			Self::Genre => "Genre",
		}
	}
}

/// Relationship vocabulary for edges. Anything unknown reads as `Similar`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
	Collaboration,
	Influence,
	Genre,
	Label,
	Feature,
	#[default]
	#[serde(other)]
	Similar,
}

impl RelationKind {
	pub const ALL: [RelationKind; 6] = [
		Self::Collaboration,
		Self::Influence,
		Self::Genre,
		Self::Label,
		Self::Feature,
		Self::Similar,
	];

	pub fn parse(raw: &str) -> Self {
		match raw.trim().to_ascii_lowercase().as_str() {
			"collaboration" => Self::Collaboration,
			"influence" => Self::Influence,
			"genre" => Self::Genre,
			"label" => Self::Label,
			"feature" => Self::Feature,
			_ => Self::Similar,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Collaboration => "collaboration",
			Self::Influence => "influence",
			Self::Genre => "genre",
			Self::Label => "label",
			Self::Feature => "feature",
			Self::Similar => "similar",
		}
	}

	pub fn color(self) -> &'static str {
		match self {
			Self::Collaboration => "#3b82f6",
			Self::Influence => "#8b5cf6",
			Self::Genre => "#10b981",
			Self::Label => "#f59e0b",
			Self::Feature => "#ef4444",
			Self::Similar => "#6b7280",
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
	pub id: String,
	#[serde(default)]
	pub group: Option<u32>,
	#[serde(default, rename = "type")]
	pub kind: NodeKind,
	#[serde(default)]
	pub playcount: Option<u64>,
}

impl GraphNode {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			group: None,
			kind: NodeKind::Artist,
			playcount: None,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
	pub source: String,
	pub target: String,
	#[serde(default)]
	pub reason: String,
	#[serde(default, rename = "type")]
	pub kind: RelationKind,
}

impl GraphEdge {
	pub fn new(
		source: impl Into<String>,
		target: impl Into<String>,
		kind: RelationKind,
		reason: impl Into<String>,
	) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			reason: reason.into(),
			kind,
		}
	}
}

/// Node set plus edge list; the unit of caching and visualization.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
	pub nodes: Vec<GraphNode>,
	#[serde(alias = "links")]
	pub edges: Vec<GraphEdge>,
}

impl Graph {
	/// Builds a graph, keeping the first node for every repeated id.
	pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
		let mut seen = HashSet::with_capacity(nodes.len());
		let nodes = nodes
			.into_iter()
			.filter(|node| seen.insert(node.id.clone()))
			.collect();
		Self { nodes, edges }
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|node| node.id == id)
	}

	/// True when every node id appears once.
	pub fn has_unique_ids(&self) -> bool {
		let mut seen = HashSet::with_capacity(self.nodes.len());
		self.nodes.iter().all(|node| seen.insert(node.id.as_str()))
	}
}
