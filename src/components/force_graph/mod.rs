mod animation;
mod component;
mod hit;
mod render;
mod state;
mod types;

pub use component::ForceGraphCanvas;
pub use hit::Hover;
pub use types::{Graph, GraphEdge, GraphNode, NodeKind, RelationKind};
