use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::hit::{Hover, drawable_edges};
use super::state::ForceLayout;
use super::types::Graph;

const MIN_NODE_RADIUS: f64 = 3.0;
const MAX_NODE_RADIUS: f64 = 8.0;
const DEFAULT_PLAYCOUNT: u64 = 500;
const GLOW_RADIUS: f64 = 30.0;

#[derive(Clone, Copy, Debug)]
pub struct Palette {
	pub node: &'static str,
	pub label: &'static str,
	pub glow: &'static str,
}

impl Palette {
	pub const LIGHT: Palette = Palette {
		node: "#1a1a1a",
		label: "#1a1a1a",
		glow: "rgba(26, 26, 26, 0.2)",
	};
	pub const DARK: Palette = Palette {
		node: "#e0e0e0",
		label: "#e0e0e0",
		glow: "rgba(224, 224, 224, 0.3)",
	};

	pub fn from_preference() -> Self {
		let dark = web_sys::window()
			.and_then(|window| window.match_media("(prefers-color-scheme: dark)").ok().flatten())
			.is_some_and(|query| query.matches());
		if dark { Self::DARK } else { Self::LIGHT }
	}
}

/// Pixel radius for a node, scaled by its interaction count.
pub fn node_radius(playcount: Option<u64>) -> f64 {
	(playcount.unwrap_or(DEFAULT_PLAYCOUNT) as f64 / 200.0).clamp(MIN_NODE_RADIUS, MAX_NODE_RADIUS)
}

pub fn render(
	layout: &ForceLayout,
	graph: &Graph,
	hovered: Option<&Hover>,
	palette: Palette,
	ctx: &CanvasRenderingContext2d,
) {
	let viewport = layout.viewport();
	ctx.clear_rect(0.0, 0.0, viewport.width, viewport.height);
	if graph.is_empty() {
		return;
	}
	draw_edges(layout, graph, hovered, ctx);
	draw_nodes(layout, hovered, palette, ctx);
}

fn draw_edges(
	layout: &ForceLayout,
	graph: &Graph,
	hovered: Option<&Hover>,
	ctx: &CanvasRenderingContext2d,
) {
	for segment in drawable_edges(layout, graph) {
		let color = graph.edges[segment.edge].kind.color();
		let is_hovered = hovered == Some(&Hover::Edge(segment.edge));

		ctx.begin_path();
		ctx.move_to(segment.from.0, segment.from.1);
		ctx.line_to(segment.to.0, segment.to.1);
		if is_hovered {
			ctx.set_stroke_style_str(color);
			ctx.set_line_width(2.0);
		} else {
			ctx.set_stroke_style_str(&format!("{color}33"));
			ctx.set_line_width(1.0);
		}
		ctx.stroke();
	}
}

fn draw_nodes(
	layout: &ForceLayout,
	hovered: Option<&Hover>,
	palette: Palette,
	ctx: &CanvasRenderingContext2d,
) {
	for body in layout.bodies() {
		let is_hovered = matches!(hovered, Some(Hover::Node(id)) if *id == body.id);
		let radius = node_radius(body.playcount);
		let (x, y) = (body.x, body.y);

		if is_hovered {
			if let Ok(gradient) = ctx.create_radial_gradient(x, y, 0.0, x, y, GLOW_RADIUS) {
				let _ = gradient.add_color_stop(0.0, palette.glow);
				let _ = gradient.add_color_stop(1.0, "rgba(0, 0, 0, 0)");
				ctx.set_fill_style_canvas_gradient(&gradient);
				ctx.begin_path();
				let _ = ctx.arc(x, y, GLOW_RADIUS, 0.0, 2.0 * PI);
				ctx.fill();
			}
		}

		ctx.set_fill_style_str(palette.node);
		ctx.begin_path();
		let _ = ctx.arc(
			x,
			y,
			if is_hovered { radius + 2.0 } else { radius },
			0.0,
			2.0 * PI,
		);
		ctx.fill();

		if is_hovered {
			ctx.set_fill_style_str(palette.label);
			ctx.set_font("14px system-ui, -apple-system, sans-serif");
			let _ = ctx.fill_text(&body.id, x + 15.0, y + 5.0);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::node_radius;

	#[test]
	fn node_radius_is_clamped() {
		assert_eq!(node_radius(None), 3.0);
		assert_eq!(node_radius(Some(0)), 3.0);
		assert_eq!(node_radius(Some(1200)), 6.0);
		assert_eq!(node_radius(Some(50_000)), 8.0);
	}
}
