//! Body-level overlays: the edge strength tooltip and the agent detail card.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use log::warn;
use thiserror::Error;
use web_sys::{Document, Element};

use super::types::Node;

const TOOLTIP_OFFSET: (f64, f64) = (5.0, -28.0);
const CARD_OFFSET: (f64, f64) = (10.0, -10.0);

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OverlaySlot {
	Tooltip,
	DetailCard,
}

impl OverlaySlot {
	pub const ALL: [OverlaySlot; 2] = [OverlaySlot::Tooltip, OverlaySlot::DetailCard];

	fn class_name(self) -> &'static str {
		match self {
			OverlaySlot::Tooltip => "tooltip",
			OverlaySlot::DetailCard => "hover-card",
		}
	}
}

/// What the detail card shows; absent counters are filled in here.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailCard {
	pub name: String,
	pub avatar: String,
	pub description: String,
	pub friends: usize,
	pub jobs_in_progress: u32,
	pub jobs_completed: u32,
	pub rating: Option<f64>,
}

impl DetailCard {
	pub fn for_node(node: &Node) -> Self {
		Self {
			name: node.name.clone(),
			avatar: node.avatar.clone(),
			description: node.description.clone(),
			friends: node.degree,
			jobs_in_progress: node.workload.jobs_in_progress.unwrap_or(0),
			jobs_completed: node.workload.jobs_completed.unwrap_or(0),
			rating: node.workload.rating,
		}
	}

	pub fn rating_text(&self) -> String {
		match self.rating {
			Some(rating) if rating.is_finite() => format!("{rating}"),
			_ => "N/A".into(),
		}
	}

	/// Label/value rows under the header.
	pub fn rows(&self) -> [(&'static str, String); 4] {
		[
			("Friends", self.friends.to_string()),
			("Jobs in Progress", self.jobs_in_progress.to_string()),
			("Jobs Completed", self.jobs_completed.to_string()),
			("Rating", self.rating_text()),
		]
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum OverlayContent {
	Strength(f64),
	Agent(DetailCard),
}

#[derive(Debug, Error)]
pub enum OverlayError {
	#[error("no document body to attach overlays to")]
	NoBody,
	#[error("DOM rejected overlay operation: {0}")]
	Dom(String),
}

/// Host-side storage for overlay elements.
pub trait OverlayBackend {
	fn attach(&mut self, slot: OverlaySlot) -> Result<(), OverlayError>;
	fn show(&mut self, slot: OverlaySlot, content: &OverlayContent, left: f64, top: f64);
	fn hide(&mut self, slot: OverlaySlot);
	/// Remove the element; a no-op when it was never attached.
	fn detach(&mut self, slot: OverlaySlot);
}

/// Engine-owned lifecycle around a backend: attach once, show/hide on demand,
/// detach everything at teardown.
pub struct Overlays<B: OverlayBackend> {
	backend: B,
	shown: HashMap<OverlaySlot, (OverlayContent, (f64, f64))>,
	attached: Vec<OverlaySlot>,
}

impl<B: OverlayBackend> Overlays<B> {
	pub fn new(backend: B) -> Self {
		Self {
			backend,
			shown: HashMap::new(),
			attached: Vec::new(),
		}
	}

	pub fn attach(&mut self) {
		for slot in OverlaySlot::ALL {
			if self.attached.contains(&slot) {
				continue;
			}
			match self.backend.attach(slot) {
				Ok(()) => self.attached.push(slot),
				Err(err) => warn!("Overlay {slot:?} unavailable: {err}"),
			}
		}
	}

	/// Show `content` anchored at page coordinates, or hide when `None`.
	pub fn sync(&mut self, slot: OverlaySlot, content: Option<OverlayContent>, page: (f64, f64)) {
		if !self.attached.contains(&slot) {
			return;
		}
		let Some(content) = content else {
			if self.shown.remove(&slot).is_some() {
				self.backend.hide(slot);
			}
			return;
		};

		let offset = match slot {
			OverlaySlot::Tooltip => TOOLTIP_OFFSET,
			OverlaySlot::DetailCard => CARD_OFFSET,
		};
		let at = (page.0 + offset.0, page.1 + offset.1);
		if self.shown.get(&slot) == Some(&(content.clone(), at)) {
			return;
		}
		self.backend.show(slot, &content, at.0, at.1);
		self.shown.insert(slot, (content, at));
	}

	pub fn detach_all(&mut self) {
		self.shown.clear();
		for slot in self.attached.drain(..) {
			self.backend.detach(slot);
		}
	}
}

/// Overlays as absolutely positioned `<div>`s appended to the document body.
pub struct DomOverlays {
	instance: u64,
	elements: HashMap<OverlaySlot, Element>,
}

impl Default for DomOverlays {
	fn default() -> Self {
		Self {
			instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
			elements: HashMap::new(),
		}
	}
}

impl DomOverlays {
	/// Unique element id so teardown never touches another instance's overlay.
	pub fn element_id(&self, slot: OverlaySlot) -> String {
		format!("social-graph-{}-{}", self.instance, slot.class_name())
	}

	fn document() -> Option<Document> {
		web_sys::window()?.document()
	}

	fn render_card(document: &Document, root: &Element, card: &DetailCard) -> Result<(), OverlayError> {
		root.set_text_content(None);
		let header = create(document, "div", "display: flex; align-items: center; margin-bottom: 10px;")?;
		let avatar = create(
			document,
			"img",
			"width: 40px; height: 40px; border-radius: 20px; margin-right: 8px;",
		)?;
		avatar.set_attribute("src", &card.avatar).map_err(dom_error)?;
		avatar.set_attribute("alt", &card.name).map_err(dom_error)?;
		let title = create(document, "h3", "margin: 0;")?;
		title.set_text_content(Some(&card.name));
		header.append_child(&avatar).map_err(dom_error)?;
		header.append_child(&title).map_err(dom_error)?;
		root.append_child(&header).map_err(dom_error)?;

		let description = create(document, "p", "")?;
		description.set_text_content(Some(&card.description));
		root.append_child(&description).map_err(dom_error)?;

		for (label, value) in card.rows() {
			let row = create(document, "p", "")?;
			let strong = create(document, "strong", "")?;
			strong.set_text_content(Some(&format!("{label}:")));
			let text = create(document, "span", "")?;
			text.set_text_content(Some(&format!(" {value}")));
			row.append_child(&strong).map_err(dom_error)?;
			row.append_child(&text).map_err(dom_error)?;
			root.append_child(&row).map_err(dom_error)?;
		}
		Ok(())
	}
}

fn dom_error(err: wasm_bindgen::JsValue) -> OverlayError {
	OverlayError::Dom(format!("{err:?}"))
}

fn create(document: &Document, tag: &str, style: &str) -> Result<Element, OverlayError> {
	let element = document.create_element(tag).map_err(dom_error)?;
	if !style.is_empty() {
		element.set_attribute("style", style).map_err(dom_error)?;
	}
	Ok(element)
}

fn base_style(slot: OverlaySlot) -> &'static str {
	match slot {
		OverlaySlot::Tooltip => {
			"position: absolute; background: #f9f9f9; border: 1px solid #d3d3d3; padding: 5px; \
			 border-radius: 5px; pointer-events: none; transition: opacity 200ms;"
		}
		OverlaySlot::DetailCard => {
			"position: absolute; background: white; border: 1px solid #d3d3d3; border-radius: 5px; \
			 padding: 10px; box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1); pointer-events: none; \
			 transition: opacity 200ms;"
		}
	}
}

impl OverlayBackend for DomOverlays {
	fn attach(&mut self, slot: OverlaySlot) -> Result<(), OverlayError> {
		let document = Self::document().ok_or(OverlayError::NoBody)?;
		let body = document.body().ok_or(OverlayError::NoBody)?;
		let element = create(&document, "div", &format!("{} opacity: 0;", base_style(slot)))?;
		element.set_id(&self.element_id(slot));
		element.set_class_name(slot.class_name());
		body.append_child(&element).map_err(dom_error)?;
		self.elements.insert(slot, element);
		Ok(())
	}

	fn show(&mut self, slot: OverlaySlot, content: &OverlayContent, left: f64, top: f64) {
		let (Some(element), Some(document)) = (self.elements.get(&slot), Self::document()) else {
			return;
		};
		let filled = match content {
			OverlayContent::Strength(strength) => {
				element.set_text_content(Some(&format!("Strength: {strength}")));
				Ok(())
			}
			OverlayContent::Agent(card) => Self::render_card(&document, element, card),
		};
		if let Err(err) = filled {
			warn!("Failed to fill overlay {slot:?}: {err}");
		}
		let style = format!(
			"{} left: {left}px; top: {top}px; opacity: {};",
			base_style(slot),
			if slot == OverlaySlot::Tooltip { 0.9 } else { 1.0 },
		);
		let _ = element.set_attribute("style", &style);
	}

	fn hide(&mut self, slot: OverlaySlot) {
		if let Some(element) = self.elements.get(&slot) {
			let _ = element.set_attribute("style", &format!("{} opacity: 0;", base_style(slot)));
		}
	}

	fn detach(&mut self, slot: OverlaySlot) {
		if let Some(element) = self.elements.remove(&slot) {
			element.remove();
		} else if let Some(stray) =
			Self::document().and_then(|d| d.get_element_by_id(&self.element_id(slot)))
		{
			stray.remove();
		}
	}
}

#[cfg(test)]
pub(super) mod tests {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::*;
	use crate::components::social_graph::types::{AgentRecord, Workload};

	/// In-memory backend that records which overlays exist and what they show.
	#[derive(Clone, Default)]
	pub struct FakeOverlays {
		pub live: Rc<RefCell<HashMap<OverlaySlot, Option<(OverlayContent, f64, f64)>>>>,
		pub refuse: bool,
		pub shows: Rc<RefCell<usize>>,
	}

	impl OverlayBackend for FakeOverlays {
		fn attach(&mut self, slot: OverlaySlot) -> Result<(), OverlayError> {
			if self.refuse {
				return Err(OverlayError::NoBody);
			}
			self.live.borrow_mut().insert(slot, None);
			Ok(())
		}

		fn show(&mut self, slot: OverlaySlot, content: &OverlayContent, left: f64, top: f64) {
			*self.shows.borrow_mut() += 1;
			if let Some(entry) = self.live.borrow_mut().get_mut(&slot) {
				*entry = Some((content.clone(), left, top));
			}
		}

		fn hide(&mut self, slot: OverlaySlot) {
			if let Some(entry) = self.live.borrow_mut().get_mut(&slot) {
				*entry = None;
			}
		}

		fn detach(&mut self, slot: OverlaySlot) {
			self.live.borrow_mut().remove(&slot);
		}
	}

	#[test]
	fn card_defaults_absent_counters() {
		let mut node = Node::from_record(&AgentRecord {
			id: "x".into(),
			name: "Xi".into(),
			..Default::default()
		});
		node.degree = 3;
		let card = DetailCard::for_node(&node);
		let rows = card.rows();
		assert_eq!(rows[0], ("Friends", "3".to_string()));
		assert_eq!(rows[1].1, "0");
		assert_eq!(rows[2].1, "0");
		assert_eq!(rows[3].1, "N/A");

		node.workload = Workload {
			jobs_in_progress: Some(2),
			jobs_completed: Some(40),
			rating: Some(4.5),
		};
		let rows = DetailCard::for_node(&node).rows();
		assert_eq!(rows[1].1, "2");
		assert_eq!(rows[2].1, "40");
		assert_eq!(rows[3].1, "4.5");
	}

	#[test]
	fn sync_positions_and_skips_redundant_updates() {
		let backend = FakeOverlays::default();
		let mut overlays = Overlays::new(backend.clone());
		overlays.attach();

		overlays.sync(OverlaySlot::Tooltip, Some(OverlayContent::Strength(0.5)), (100.0, 100.0));
		overlays.sync(OverlaySlot::Tooltip, Some(OverlayContent::Strength(0.5)), (100.0, 100.0));
		assert_eq!(*backend.shows.borrow(), 1);
		assert_eq!(
			backend.live.borrow()[&OverlaySlot::Tooltip],
			Some((OverlayContent::Strength(0.5), 105.0, 72.0))
		);

		overlays.sync(OverlaySlot::Tooltip, None, (0.0, 0.0));
		assert_eq!(backend.live.borrow()[&OverlaySlot::Tooltip], None);
	}

	#[test]
	fn detach_is_idempotent_and_tolerates_failed_attach() {
		let backend = FakeOverlays::default();
		let mut overlays = Overlays::new(backend.clone());
		overlays.attach();
		overlays.attach();
		assert_eq!(backend.live.borrow().len(), 2);
		overlays.detach_all();
		overlays.detach_all();
		assert!(backend.live.borrow().is_empty());

		let refusing = FakeOverlays {
			refuse: true,
			..Default::default()
		};
		let mut overlays = Overlays::new(refusing.clone());
		overlays.attach();
		overlays.sync(OverlaySlot::DetailCard, Some(OverlayContent::Strength(1.0)), (0.0, 0.0));
		overlays.detach_all();
		assert!(refusing.live.borrow().is_empty());
		assert_eq!(*refusing.shows.borrow(), 0);
	}
}
