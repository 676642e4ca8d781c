use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::types::Graph;

/// Tunables for the layout simulation. Units are pixels and ticks.
#[derive(Clone, Copy, Debug)]
pub struct SimulationParams {
	pub repulsion: f64,
	pub softening: f64,
	pub spring_length: f64,
	pub spring_strength: f64,
	pub center_force: f64,
	pub damping: f64,
	pub max_speed: f64,
	pub padding: f64,
	pub boundary_nudge: f64,
	pub seed_spread: f64,
	pub seed_speed: f64,
}

impl Default for SimulationParams {
	fn default() -> Self {
		Self {
			repulsion: 1200.0,
			softening: 0.1,
			spring_length: 150.0,
			spring_strength: 0.03,
			center_force: 0.0002,
			damping: 0.92,
			max_speed: 60.0,
			padding: 80.0,
			boundary_nudge: 0.5,
			seed_spread: 100.0,
			seed_speed: 2.0,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
}

impl Viewport {
	pub fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	pub fn center(&self) -> (f64, f64) {
		(self.width / 2.0, self.height / 2.0)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	Idle,
	Seeded,
	Running,
}

/// Simulated copy of a graph node.
#[derive(Clone, Debug)]
pub struct Body {
	pub id: String,
	pub playcount: Option<u64>,
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
}

/// Perpetual force-directed layout over the nodes of a [`Graph`].
///
/// Holds positions and velocities keyed by node id. The edge list is read
/// from the graph on every tick, so edges may change without a reseed.
pub struct ForceLayout {
	params: SimulationParams,
	viewport: Viewport,
	phase: Phase,
	bodies: Vec<Body>,
	index: HashMap<String, usize>,
	rng: StdRng,
	forces: Vec<(f64, f64)>,
}

impl ForceLayout {
	pub fn new(params: SimulationParams, viewport: Viewport, seed: u64) -> Self {
		Self {
			params,
			viewport,
			phase: Phase::Idle,
			bodies: Vec::new(),
			index: HashMap::new(),
			rng: StdRng::seed_from_u64(seed),
			forces: Vec::new(),
		}
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn viewport(&self) -> Viewport {
		self.viewport
	}

	pub fn bodies(&self) -> &[Body] {
		&self.bodies
	}

	pub fn body(&self, id: &str) -> Option<&Body> {
		self.index.get(id).map(|&i| &self.bodies[i])
	}

	pub fn resize(&mut self, viewport: Viewport) {
		self.viewport = viewport;
	}

	/// Sum of squared speeds over all bodies.
	pub fn kinetic_energy(&self) -> f64 {
		self.bodies
			.iter()
			.map(|body| body.vx * body.vx + body.vy * body.vy)
			.sum()
	}

	/// True when the simulated set no longer matches the graph's node ids.
	pub fn needs_reseed(&self, graph: &Graph) -> bool {
		self.bodies.len() != graph.nodes.len()
			|| graph
				.nodes
				.iter()
				.any(|node| !self.index.contains_key(&node.id))
	}

	/// Adopts `graph`. Returns true when every body was re-seeded.
	///
	/// Bodies are only rebuilt when the node id set changed; otherwise the
	/// existing positions carry over and only node metadata is refreshed.
	pub fn seed(&mut self, graph: &Graph) -> bool {
		if graph.is_empty() {
			self.reset();
			return false;
		}

		if !self.needs_reseed(graph) {
			for node in &graph.nodes {
				if let Some(&i) = self.index.get(&node.id) {
					self.bodies[i].playcount = node.playcount;
				}
			}
			if self.phase == Phase::Idle {
				self.phase = Phase::Seeded;
			}
			return false;
		}

		let (cx, cy) = self.viewport.center();
		let half_spread = self.params.seed_spread / 2.0;
		let half_speed = self.params.seed_speed / 2.0;
		self.bodies.clear();
		self.index.clear();
		for node in &graph.nodes {
			let body = Body {
				id: node.id.clone(),
				playcount: node.playcount,
				x: cx + self.rng.gen_range(-half_spread..=half_spread),
				y: cy + self.rng.gen_range(-half_spread..=half_spread),
				vx: self.rng.gen_range(-half_speed..=half_speed),
				vy: self.rng.gen_range(-half_speed..=half_speed),
			};
			self.index.insert(node.id.clone(), self.bodies.len());
			self.bodies.push(body);
		}
		self.phase = Phase::Seeded;
		log::debug!("layout seeded with {} bodies", self.bodies.len());
		true
	}

	#[cfg(test)]
	pub(crate) fn place(&mut self, id: &str, x: f64, y: f64) {
		if let Some(&i) = self.index.get(id) {
			self.bodies[i].x = x;
			self.bodies[i].y = y;
		}
	}

	pub fn reset(&mut self) {
		self.bodies.clear();
		self.index.clear();
		self.forces.clear();
		self.phase = Phase::Idle;
	}

	/// Advances the simulation by one frame using the edges of `graph`.
	pub fn tick(&mut self, graph: &Graph) {
		if self.phase == Phase::Idle || self.bodies.is_empty() {
			return;
		}
		self.phase = Phase::Running;

		let p = self.params;
		let count = self.bodies.len();
		self.forces.clear();
		self.forces.resize(count, (0.0, 0.0));

		for i in 0..count {
			for j in (i + 1)..count {
				let dx = self.bodies[i].x - self.bodies[j].x;
				let dy = self.bodies[i].y - self.bodies[j].y;
				let dist_sq = dx * dx + dy * dy + p.softening;
				let dist = dist_sq.sqrt();
				let push = p.repulsion / dist_sq;
				let (fx, fy) = (dx / dist * push, dy / dist * push);
				self.forces[i].0 += fx;
				self.forces[i].1 += fy;
				self.forces[j].0 -= fx;
				self.forces[j].1 -= fy;
			}
		}

		for edge in &graph.edges {
			let (Some(&s), Some(&t)) = (self.index.get(&edge.source), self.index.get(&edge.target))
			else {
				continue;
			};
			if s == t {
				continue;
			}
			let dx = self.bodies[t].x - self.bodies[s].x;
			let dy = self.bodies[t].y - self.bodies[s].y;
			let dist = (dx * dx + dy * dy).sqrt();
			if dist < 1e-6 {
				continue;
			}
			let pull = (dist - p.spring_length) * p.spring_strength;
			let (fx, fy) = (dx / dist * pull, dy / dist * pull);
			self.forces[s].0 += fx;
			self.forces[s].1 += fy;
			self.forces[t].0 -= fx;
			self.forces[t].1 -= fy;
		}

		let (cx, cy) = self.viewport.center();
		let (width, height) = (self.viewport.width, self.viewport.height);
		let max_speed_sq = p.max_speed * p.max_speed;
		for (body, &(fx, fy)) in self.bodies.iter_mut().zip(&self.forces) {
			body.vx = (body.vx + fx + (cx - body.x) * p.center_force) * p.damping;
			body.vy = (body.vy + fy + (cy - body.y) * p.center_force) * p.damping;

			let speed_sq = body.vx * body.vx + body.vy * body.vy;
			if speed_sq > max_speed_sq {
				let scale = p.max_speed / speed_sq.sqrt();
				body.vx *= scale;
				body.vy *= scale;
			}

			body.x += body.vx;
			body.y += body.vy;

			if body.x < p.padding {
				body.vx += p.boundary_nudge;
			}
			if body.x > width - p.padding {
				body.vx -= p.boundary_nudge;
			}
			if body.y < p.padding {
				body.vy += p.boundary_nudge;
			}
			if body.y > height - p.padding {
				body.vy -= p.boundary_nudge;
			}
		}
	}
}
