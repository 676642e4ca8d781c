use super::state::ForceLayout;
use super::types::Graph;

pub const NODE_HIT_RADIUS: f64 = 30.0;
pub const EDGE_HIT_TOLERANCE: f64 = 12.0;

/// What the pointer is over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Hover {
	Node(String),
	/// Index into `Graph::edges`.
	Edge(usize),
}

/// An edge whose endpoints are both simulated, with their current positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeSegment {
	pub edge: usize,
	pub from: (f64, f64),
	pub to: (f64, f64),
}

/// Edges that can be drawn this frame. Dangling edges are left out.
pub fn drawable_edges(layout: &ForceLayout, graph: &Graph) -> Vec<EdgeSegment> {
	graph
		.edges
		.iter()
		.enumerate()
		.filter_map(|(edge, link)| {
			let source = layout.body(&link.source)?;
			let target = layout.body(&link.target)?;
			Some(EdgeSegment {
				edge,
				from: (source.x, source.y),
				to: (target.x, target.y),
			})
		})
		.collect()
}

/// Distance from `point` to the finite segment `a`-`b`.
pub fn distance_to_segment(point: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
	let (px, py) = (point.0 - a.0, point.1 - a.1);
	let (sx, sy) = (b.0 - a.0, b.1 - a.1);
	let len_sq = sx * sx + sy * sy;
	let t = if len_sq > 0.0 {
		((px * sx + py * sy) / len_sq).clamp(0.0, 1.0)
	} else {
		0.0
	};
	let (cx, cy) = (a.0 + t * sx, a.1 + t * sy);
	((point.0 - cx).powi(2) + (point.1 - cy).powi(2)).sqrt()
}

/// First node within [`NODE_HIT_RADIUS`], else the first edge within
/// [`EDGE_HIT_TOLERANCE`]. Iteration order decides ties, not distance.
pub fn hit_test(layout: &ForceLayout, graph: &Graph, x: f64, y: f64) -> Option<Hover> {
	if graph.is_empty() {
		return None;
	}

	let node = layout.bodies().iter().find(|body| {
		let (dx, dy) = (x - body.x, y - body.y);
		(dx * dx + dy * dy).sqrt() < NODE_HIT_RADIUS
	});
	if let Some(body) = node {
		return Some(Hover::Node(body.id.clone()));
	}

	drawable_edges(layout, graph)
		.into_iter()
		.find(|segment| distance_to_segment((x, y), segment.from, segment.to) < EDGE_HIT_TOLERANCE)
		.map(|segment| Hover::Edge(segment.edge))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::state::{SimulationParams, Viewport};
	use crate::components::force_graph::types::{GraphEdge, GraphNode, RelationKind};

	fn two_node_layout() -> (ForceLayout, Graph) {
		let graph = Graph::new(
			vec![GraphNode::new("A"), GraphNode::new("B")],
			vec![
				GraphEdge::new("A", "ghost", RelationKind::Similar, "dangling"),
				GraphEdge::new("A", "B", RelationKind::Collaboration, "duet"),
			],
		);
		let mut layout =
			ForceLayout::new(SimulationParams::default(), Viewport::new(1000.0, 800.0), 4);
		layout.seed(&graph);
		for _ in 0..300 {
			layout.tick(&graph);
		}
		(layout, graph)
	}

	#[test]
	fn pointer_on_node_center_hits_node() {
		let (layout, graph) = two_node_layout();
		let body = layout.body("B").unwrap();
		assert_eq!(
			hit_test(&layout, &graph, body.x, body.y),
			Some(Hover::Node("B".into()))
		);
	}

	#[test]
	fn pointer_on_edge_midpoint_hits_edge() {
		let (layout, graph) = two_node_layout();
		let a = layout.body("A").unwrap();
		let b = layout.body("B").unwrap();
		let gap = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
		assert!(gap > 2.0 * NODE_HIT_RADIUS, "bodies only {gap}px apart");
		let (mx, my) = ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
		assert_eq!(hit_test(&layout, &graph, mx, my), Some(Hover::Edge(1)));
	}

	#[test]
	fn empty_space_hits_nothing() {
		let (layout, graph) = two_node_layout();
		assert_eq!(hit_test(&layout, &graph, -500.0, -500.0), None);
	}

	#[test]
	fn dangling_edges_are_not_drawable() {
		let (layout, graph) = two_node_layout();
		let segments = drawable_edges(&layout, &graph);
		assert_eq!(segments.len(), 1);
		assert_eq!(segments[0].edge, 1);
	}

	#[test]
	fn segment_distance_clamps_to_endpoints() {
		assert_eq!(distance_to_segment((5.0, 3.0), (0.0, 0.0), (10.0, 0.0)), 3.0);
		assert_eq!(distance_to_segment((-3.0, 4.0), (0.0, 0.0), (10.0, 0.0)), 5.0);
		assert_eq!(distance_to_segment((13.0, 4.0), (0.0, 0.0), (10.0, 0.0)), 5.0);
		assert_eq!(distance_to_segment((3.0, 4.0), (0.0, 0.0), (0.0, 0.0)), 5.0);
	}

	#[test]
	fn first_match_wins_over_nearest() {
		let graph = Graph::new(vec![GraphNode::new("A"), GraphNode::new("B")], Vec::new());
		let mut layout =
			ForceLayout::new(SimulationParams::default(), Viewport::new(1000.0, 800.0), 8);
		layout.seed(&graph);
		layout.place("A", 100.0, 100.0);
		layout.place("B", 120.0, 100.0);
		// B sits under the pointer, A is 20px away but comes first.
		assert_eq!(
			hit_test(&layout, &graph, 120.0, 100.0),
			Some(Hover::Node("A".into()))
		);
	}
}
