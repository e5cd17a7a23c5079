//! A [`Host`] that renders into the browser DOM through [`web_sys`].

use crate::{
	description::{Attribute, Handler, Listener, Props, TEXT_TAG, TEXT_VALUE_ATTRIBUTE},
	host::Host,
	rc_hash_map::RcHashMap,
	schedule::Deadline,
};
use core::time::Duration;
use js_sys::Function;
use thiserror::Error;
use tracing::{error, info, instrument, level_filters::STATIC_MAX_LEVEL, trace, warn, Level};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

/// A failed DOM call.
#[derive(Debug, Error)]
#[error("DOM operation failed: {0:?}")]
pub struct DomError(pub JsValue);

/// Renders into the child nodes of containers belonging to one [`web_sys::Document`].
///
/// Event listener closures are shared by all elements bound to the same [`Handler`] and reference-counted per [`DomHost`] instance.
/// Associated event listeners stop working if the instance is dropped.
pub struct DomHost {
	document: web_sys::Document,
	handler_handles: RcHashMap<usize, u16, Closure<dyn Fn(web_sys::Event)>>,
	request_work: Option<Box<dyn FnMut()>>,
}
impl DomHost {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		Self {
			document,
			handler_handles: RcHashMap::new(),
			request_work: None,
		}
	}

	/// Sets the callback through which the engine asks to be driven again, for example by requesting an idle callback.
	#[must_use]
	pub fn with_work_request(self, request_work: impl FnMut() + 'static) -> Self {
		Self {
			request_work: Some(Box::new(request_work)),
			..self
		}
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}

	/// Number of distinct handlers currently bound to at least one element.
	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.handler_handles.len()
	}

	#[instrument(skip(self))]
	fn add_event_listener(&mut self, target: &web_sys::EventTarget, listener: &Listener) -> Result<(), DomError> {
		let Listener { event, handler } = listener;
		let closure = self
			.handler_handles
			.increment_or_insert_with(handler.addr(), |_| {
				let handler: Handler = handler.clone();
				Closure::wrap(Box::new(move |event: web_sys::Event| handler.call(&event)) as Box<dyn Fn(web_sys::Event)>)
			})
			.map_err(|_| DomError("Too many (more than 65k) active references to the same `Handler`".into()))?;
		target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref::<Function>()).map_err(DomError)
	}

	#[instrument(skip(self))]
	fn remove_event_listener(&mut self, target: &web_sys::EventTarget, listener: &Listener) -> Result<(), DomError> {
		let Listener { event, handler } = listener;
		match self.handler_handles.weak_decrement(&handler.addr()) {
			Ok(Some(closure)) => target.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref::<Function>()).map_err(DomError),
			Ok(None) => {
				error!("Tried to remove a listener that was never added.");
				Ok(())
			}
			Err(_) => Err(DomError("Tried to decrement handler reference more often than bound".into())),
		}
	}

	fn free_unbound_listeners(&mut self) {
		let freed = self.handler_handles.drain_weak().count();
		if freed > 0 {
			trace!("Freed {} event listener(s).", freed);
		}
		info!("Event listener count/cached capacity: {}/{}", self.handler_handles.len(), self.handler_handles.capacity());
	}
}

impl Host for DomHost {
	type Node = web_sys::Node;
	type Error = DomError;

	fn create_host_node(&mut self, tag: &str) -> Result<Self::Node, Self::Error> {
		if tag == TEXT_TAG {
			Ok(self.document.create_text_node("").into())
		} else {
			Ok(self.document.create_element(tag).map_err(DomError)?.into())
		}
	}

	fn insert_host_node(&mut self, parent: &Self::Node, node: &Self::Node, index: usize) -> Result<(), Self::Error> {
		let index: u32 = index.try_into().map_err(|_| DomError("Host index out of range.".into()))?;
		let next_sibling = parent.child_nodes().get(index);
		parent.insert_before(node, next_sibling.as_ref()).map(drop).map_err(DomError)
	}

	fn remove_host_node(&mut self, parent: &Self::Node, node: &Self::Node) -> Result<(), Self::Error> {
		parent.remove_child(node).map(drop).map_err(DomError)
	}

	#[allow(clippy::similar_names)]
	#[instrument(skip(self, old, new))]
	fn apply_host_props(&mut self, node: &Self::Node, old: &Props, new: &Props) -> Result<(), Self::Error> {
		if let Some(text) = node.dyn_ref::<web_sys::Text>() {
			let value = new.attribute(TEXT_VALUE_ATTRIBUTE).unwrap_or_default();
			if old.attribute(TEXT_VALUE_ATTRIBUTE) != Some(value) {
				text.set_data(value);
			}
			return Ok(());
		}

		let element = node.dyn_ref::<web_sys::Element>().ok_or_else(|| DomError(JsValue::from_str("Expected an element.")))?;

		let (mut a_1, mut a_2) = (&old.attributes[..], &new.attributes[..]);
		while !a_1.is_empty() && a_1.first() == a_2.first() {
			a_1 = &a_1[1..];
			a_2 = &a_2[1..];
		}
		while !a_1.is_empty() && a_1.last() == a_2.last() {
			a_1 = &a_1[..a_1.len() - 1];
			a_2 = &a_2[..a_2.len() - 1];
		}
		for Attribute { name, value } in a_1 {
			if let Err(error) = element.remove_attribute(name) {
				warn!("Could not remove attribute with name {:?}, value {:?}: {:?}", name, value, error);
			}
		}
		for Attribute { name, value } in a_2 {
			element.set_attribute(name, value).map_err(DomError)?;
		}

		if STATIC_MAX_LEVEL >= Level::ERROR {
			for (i_a, l_a) in new.listeners.iter().enumerate() {
				for (i_b, l_b) in new.listeners.iter().enumerate() {
					if i_a != i_b && l_a == l_b {
						// The DOM would deduplicate these silently.
						error!("Duplicate event binding: {:?}", l_a);
					}
				}
			}
		}

		let (mut l_1, mut l_2) = (&old.listeners[..], &new.listeners[..]);
		while !l_1.is_empty() && l_1.first() == l_2.first() {
			l_1 = &l_1[1..];
			l_2 = &l_2[1..];
		}
		while !l_1.is_empty() && l_1.last() == l_2.last() {
			l_1 = &l_1[..l_1.len() - 1];
			l_2 = &l_2[..l_2.len() - 1];
		}
		if !l_1.is_empty() || !l_2.is_empty() {
			let target: &web_sys::EventTarget = element.as_ref();
			for removed in l_1 {
				self.remove_event_listener(target, removed)?;
			}
			for added in l_2 {
				self.add_event_listener(target, added)?;
			}
			self.free_unbound_listeners();
		}
		Ok(())
	}

	fn release_host_node(&mut self, node: &Self::Node, props: &Props) -> Result<(), Self::Error> {
		if props.listeners.is_empty() {
			return Ok(());
		}
		let target: &web_sys::EventTarget = node.as_ref();
		for listener in &props.listeners {
			self.remove_event_listener(target, listener)?;
		}
		self.free_unbound_listeners();
		Ok(())
	}

	fn request_work(&mut self) {
		if let Some(request_work) = &mut self.request_work {
			request_work()
		}
	}
}

impl Deadline for web_sys::IdleDeadline {
	fn time_remaining(&self) -> Duration {
		Duration::from_secs_f64(web_sys::IdleDeadline::time_remaining(self).max(0.0) / 1000.0)
	}
}
