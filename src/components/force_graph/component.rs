use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, Window};

use super::animation::{AnimationLoop, WindowListener};
use super::hit::{Hover, hit_test};
use super::render::{self, Palette};
use super::state::{ForceLayout, Phase, SimulationParams, Viewport};
use super::types::Graph;

/// Kinetic energy below which the layout is reported as settled.
const SETTLED_ENERGY: f64 = 0.05;

/// Simulation plus the graph it was seeded from.
struct Scene {
	layout: ForceLayout,
	graph: Graph,
	palette: Palette,
	settled: bool,
}

impl Scene {
	fn adopt(&mut self, graph: Graph) {
		if self.layout.seed(&graph) {
			log::info!(
				"graph changed, re-seeding {} nodes / {} edges",
				graph.nodes.len(),
				graph.edges.len()
			);
			self.settled = false;
		}
		self.graph = graph;
	}

	fn step(&mut self) {
		self.layout.tick(&self.graph);
		if !self.settled
			&& self.layout.phase() == Phase::Running
			&& self.layout.kinetic_energy() < SETTLED_ENERGY
		{
			self.settled = true;
			log::debug!("layout settled");
		}
	}
}

/// Live browser resources; dropping this stops the loop.
struct Running {
	frames: AnimationLoop,
	_resize: WindowListener,
}

fn viewport_size(window: &Window, canvas: &HtmlCanvasElement, fullscreen: bool) -> (f64, f64) {
	if fullscreen {
		let width = window.inner_width().ok().and_then(|v| v.as_f64());
		let height = window.inner_height().ok().and_then(|v| v.as_f64());
		(width.unwrap_or(800.0), height.unwrap_or(600.0))
	} else {
		canvas
			.parent_element()
			.map(|p| (p.client_width() as f64, p.client_height() as f64))
			.unwrap_or((800.0, 600.0))
	}
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas
		.get_context("2d")
		.ok()
		.flatten()
		.and_then(|ctx| ctx.dyn_into().ok())
}

fn random_seed() -> u64 {
	(js_sys::Math::random() * u64::MAX as f64) as u64
}

/// Animated force-directed rendering of `graph`.
///
/// Hover results are written to `hovered`; they only affect highlighting.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] graph: Signal<Graph>,
	hovered: RwSignal<Option<Hover>>,
	#[prop(default = true)] fullscreen: bool,
	#[prop(optional)] seed: Option<u64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let scene: Rc<RefCell<Option<Scene>>> = Rc::new(RefCell::new(None));
	let running = StoredValue::new_local(None::<Running>);
	let scene_init = scene.clone();

	Effect::new(move |_| {
		let data = graph.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();

		let has_scene = scene_init.borrow().is_some();
		if has_scene {
			if let Some(ref mut s) = *scene_init.borrow_mut() {
				s.adopt(data);
			}
			let alive = running
				.try_with_value(|r| r.as_ref().is_some_and(|r| r.frames.is_running()))
				.unwrap_or(false);
			if alive {
				return;
			}
		} else {
			let Some(window) = web_sys::window() else {
				return;
			};
			let (w, h) = viewport_size(&window, &canvas, fullscreen);
			canvas.set_width(w as u32);
			canvas.set_height(h as u32);
			let mut s = Scene {
				layout: ForceLayout::new(
					SimulationParams::default(),
					Viewport::new(w, h),
					seed.unwrap_or_else(random_seed),
				),
				graph: Graph::default(),
				palette: Palette::from_preference(),
				settled: false,
			};
			s.adopt(data);
			*scene_init.borrow_mut() = Some(s);
		}

		let Some(window) = web_sys::window() else {
			return;
		};
		let Some(ctx) = context_2d(&canvas) else {
			log::warn!("canvas 2d context unavailable");
			return;
		};

		let scene_anim = scene_init.clone();
		let frames = AnimationLoop::start(&window, move || {
			if let Some(ref mut s) = *scene_anim.borrow_mut() {
				s.step();
				let hover = hovered.try_get_untracked().flatten();
				render::render(&s.layout, &s.graph, hover.as_ref(), s.palette, &ctx);
			}
		});

		let (scene_resize, canvas_resize, window_resize) =
			(scene_init.clone(), canvas.clone(), window.clone());
		let resize = WindowListener::add(&window, "resize", move || {
			let (nw, nh) = viewport_size(&window_resize, &canvas_resize, fullscreen);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(ref mut s) = *scene_resize.borrow_mut() {
				s.layout.resize(Viewport::new(nw, nh));
			}
		});

		if let Some(frames) = frames {
			running.set_value(Some(Running {
				frames,
				_resize: resize,
			}));
		}
	});

	on_cleanup(move || {
		running.try_update_value(|r| {
			if let Some(r) = r.take() {
				r.frames.stop();
			}
		});
	});

	let scene_mm = scene.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let rect = canvas.get_bounding_client_rect();
		let (x, y) = (
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);

		let found = match *scene_mm.borrow() {
			Some(ref s) => hit_test(&s.layout, &s.graph, x, y),
			None => None,
		};
		if hovered.get_untracked() != found {
			hovered.set(found);
		}
	};

	let on_mouseleave = move |_: MouseEvent| {
		if hovered.get_untracked().is_some() {
			hovered.set(None);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousemove=on_mousemove
			on:mouseleave=on_mouseleave
			style="display: block; width: 100%; height: 100%; cursor: crosshair;"
		/>
	}
}
