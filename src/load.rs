//! Reading existing DOM content back as [`Description`]s.

use crate::description::{Attribute, Description};
use tracing::trace;
use wasm_bindgen::JsCast;
use web_sys::{Attr, Element, NamedNodeMap, Node, NodeList, Text};

pub fn load_child_nodes(child_nodes: &NodeList) -> Vec<Description> {
	(0..child_nodes.length())
		.filter_map(|i| child_nodes.item(i))
		.filter_map(|child| load_node(&child))
		.collect()
}

/// Elements and text nodes are loaded. Anything else (like comments) is skipped.
pub fn load_node(node: &Node) -> Option<Description> {
	if let Some(element) = node.dyn_ref::<Element>() {
		Some(load_element(element))
	} else if let Some(text) = node.dyn_ref::<Text>() {
		Some(Description::text(text.data()))
	} else {
		trace!("Skipping unrecognised child node: {:?}", node);
		None
	}
}

/// Loads `element` with its attributes and content. Tag names are lowercased.
pub fn load_element(element: &Element) -> Description {
	let node: &Node = element.as_ref();
	let mut description = Description::host(element.tag_name().to_lowercase()).with_children(load_child_nodes(&node.child_nodes()));
	description.props.attributes = load_attributes(&element.attributes());
	description
}

pub fn load_attributes(attributes: &NamedNodeMap) -> Vec<Attribute> {
	(0..attributes.length()).filter_map(|i| attributes.item(i)).map(|attribute| load_attribute(&attribute)).collect()
}

pub fn load_attribute(attribute: &Attr) -> Attribute {
	Attribute {
		name: attribute.local_name().into(),
		value: attribute.value().into(),
	}
}
