//! Single-pass positional child diffing.
//!
//! Old children and new descriptions are compared pairwise by position.
//! A node is reused only if the description at its own position has the same type and key,
//! so reordered siblings are deleted and placed again rather than moved.
//! Keep sibling order stable where that matters.

use crate::{
	description::Description,
	error::EngineError,
	node::{EffectTag, NodeId, Tree, WorkNode},
	temp_set::TempKeySet,
};
use tracing::{instrument, trace, trace_span};

/// Replaces the children of the in-progress node `parent` with nodes for `descriptions`.
///
/// Children of `parent`'s alternate are reused where type and key match at the same position and tagged [`EffectTag::Update`].
/// Descriptions without a match get fresh nodes tagged [`EffectTag::Placement`].
/// Old children without a match are tagged [`EffectTag::Deletion`], appended to `deletions` and not linked into the new chain.
///
/// # Errors
///
/// [`EngineError::DuplicateKey`] if two of `descriptions` share a key. Nothing is changed in that case.
#[instrument(skip(tree, deletions, key_set, descriptions), fields(descriptions.len = descriptions.len()))]
pub fn reconcile_children<N: Clone>(
	tree: &mut Tree<N>,
	deletions: &mut Vec<NodeId>,
	key_set: &mut TempKeySet,
	parent: NodeId,
	descriptions: Vec<Description>,
) -> Result<(), EngineError> {
	{
		let keys = key_set.temp();
		for key in descriptions.iter().filter_map(|description| description.key.as_ref()) {
			if !keys.insert(key.clone()) {
				return Err(EngineError::DuplicateKey { key: key.clone() });
			}
		}
	}

	let mut old = tree[parent].alternate.and_then(|alternate| tree.get(alternate)).and_then(|alternate| alternate.first_child);
	let mut descriptions = descriptions.into_iter();
	let mut previous: Option<NodeId> = None;
	let mut index = 0;
	tree[parent].first_child = None;

	loop {
		let description = descriptions.next();
		if description.is_none() && old.is_none() {
			break;
		}

		let produced = match (old, description) {
			(Some(old), Some(description)) if tree[old].matches(&description) => {
				let span = trace_span!("Reusing", ?old, index);
				let _enter = span.enter();
				let reused = tree.create_or_reuse_alternate(old, description.props);
				tree[reused].effect_tag = EffectTag::Update;
				Some(reused)
			}
			(old, description) => {
				if let Some(old) = old {
					trace!(?old, "Deleting.");
					tree[old].effect_tag = EffectTag::Deletion;
					deletions.push(old);
				}
				description.map(|description| {
					let mut node = WorkNode::fresh(description);
					node.effect_tag = EffectTag::Placement;
					let placed = tree.insert(node);
					trace!(?placed, index, "Placing.");
					placed
				})
			}
		};

		if let Some(produced) = produced {
			let node = &mut tree[produced];
			node.parent = Some(parent);
			node.child_index = index;
			node.next_sibling = None;
			match previous {
				None => tree[parent].first_child = Some(produced),
				Some(previous) => tree[previous].next_sibling = Some(produced),
			}
			previous = Some(produced);
			index += 1;
		}

		old = old.and_then(|old| tree[old].next_sibling);
	}

	Ok(())
}
