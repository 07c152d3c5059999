use leptos::prelude::*;
use leptos::task::spawn_local;
use log::error;

use crate::components::social_graph::{AgentRecord, SocialGraphCanvas};
use crate::data::{AGENTS_URL, fetch_agents};

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	// `None` until the fetch settles; a failed fetch mounts an empty graph
	let agents = RwSignal::new(None::<Vec<AgentRecord>>);
	let load_error = RwSignal::new(None::<String>);

	spawn_local(async move {
		match fetch_agents(AGENTS_URL).await {
			Ok(records) => agents.set(Some(records)),
			Err(err) => {
				error!("Failed to load agent data from {AGENTS_URL}: {err}");
				load_error.set(Some(err.to_string()));
				agents.set(Some(Vec::new()));
			}
		}
	});

	view! {
		<div class="fullscreen-graph">
			<SocialGraphCanvas agents=agents fullscreen=true />
			<div class="graph-overlay">
				<h1>"Agent Social Network"</h1>
				<p class="subtitle">
					"Hover an agent for details. Click to highlight its friends. Drag to pin. Scroll to zoom."
				</p>
				{move || {
					load_error
						.get()
						.map(|err| view! { <p class="load-error">"Could not load agents: " {err}</p> })
				}}
			</div>
		</div>
	}
}
