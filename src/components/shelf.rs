use leptos::prelude::*;

use crate::consumption::Item;

/// Everything the last sync brought in, standouts marked with a star.
#[component]
pub fn Shelf(#[prop(into)] items: Signal<Vec<Item>>) -> impl IntoView {
	view! {
		<Show when=move || items.with(|i| !i.is_empty())>
			<section class="shelf">
				<h2>{move || format!("Your shelf ({})", items.with(Vec::len))}</h2>
				<ul>
					<For each=move || items.get() key=|item| item.id.clone() let:item>
						<ShelfItem item=item />
					</For>
				</ul>
			</section>
		</Show>
	}
}

#[component]
fn ShelfItem(item: Item) -> impl IntoView {
	let title = match &item.link {
		Some(link) => view! { <a href=link.clone() target="_blank" rel="noopener">{item.title.clone()}</a> }
			.into_any(),
		None => view! { <span>{item.title.clone()}</span> }.into_any(),
	};
	let meta = [
		Some(item.category.label().to_string()),
		item.creator.clone(),
		item.rating.map(|r| r.glyphs()),
		item.interactions.map(|n| format!("{n} plays")),
	]
	.into_iter()
	.flatten()
	.collect::<Vec<_>>()
	.join(" \u{b7} ");

	view! {
		<li class="shelf-item" class:standout=item.standout>
			{item.image.map(|src| view! { <img src=src alt="" loading="lazy" /> })}
			<div>
				{title}
				{item.standout.then(|| view! { <span class="standout-mark" title="Standout">"\u{2605}"</span> })}
				<p class="meta">{meta}</p>
			</div>
		</li>
	}
}
