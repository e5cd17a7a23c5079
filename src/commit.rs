//! Atomic application of a finished render pass to the host tree.

use crate::{
	description::Props,
	error::EngineError,
	host::Host,
	node::{EffectTag, NodeId, NodeKind, NodeType, Tree},
	schedule::WorkLoop,
};
use hashbrown::HashMap;
use tracing::{debug, instrument, trace, trace_span};

fn host_error<E: std::error::Error + 'static>(error: E) -> EngineError {
	EngineError::Host(Box::new(error))
}

/// Applies every effect of the finished render pass in `work`, then makes its in-progress tree current.
///
/// Deletions are applied first, then placements and updates in pre-order.
/// Nothing in here yields.
///
/// Returns the new current root, or [`None`] if `work` is not ready to commit.
///
/// # Errors
///
/// [`EngineError::Host`] if the host adapter fails. The trees are not swapped in that case,
/// but host changes made before the failure remain.
#[instrument(skip(tree, work, host))]
pub fn commit_all_work<H: Host>(tree: &mut Tree<H::Node>, work: &mut WorkLoop, host: &mut H) -> Result<Option<NodeId>, EngineError> {
	let root = match (work.next_unit_of_work, work.in_progress_root) {
		(None, Some(root)) => root,
		_ => return Ok(None),
	};

	for &deleted in &work.deletions {
		commit_deletion(tree, host, deleted)?;
	}

	let in_progress = tree.subtree(root);
	let mut positions = HostPositions::default();
	for &id in &in_progress {
		let position = positions.visit(tree, id);
		commit_work(tree, host, id, position)?;
	}

	// Point of no return: swap generations.
	for &id in &in_progress {
		let node = &mut tree[id];
		node.is_current = true;
		let alternate = node.alternate;
		if let Some(alternate) = alternate.and_then(|alternate| tree.get_mut(alternate)) {
			alternate.is_current = false;
			alternate.effect_tag = EffectTag::None;
			alternate.update_queue.clear();
		}
	}

	let mut released = 0_usize;
	for deleted in work.deletions.drain(..) {
		for id in tree.subtree(deleted) {
			if let Some(node) = tree.remove(id) {
				released += 1;
				if let Some(alternate) = node.alternate {
					if tree.get(alternate).map_or(false, |alternate| !alternate.is_current) {
						tree.remove(alternate);
						released += 1;
					}
				}
			}
		}
	}
	debug!(?root, nodes = in_progress.len(), released, "Committed.");

	work.reset();
	Ok(Some(root))
}

/// Releases the host bindings of the deleted subtree at `id` and detaches its topmost host nodes from their host parent.
fn commit_deletion<H: Host>(tree: &mut Tree<H::Node>, host: &mut H, id: NodeId) -> Result<(), EngineError> {
	let span = trace_span!("Deleting", ?id);
	let _enter = span.enter();

	let parent = match host_parent(tree, id) {
		Some(parent) => parent,
		None => {
			trace!("No host parent. Nothing to detach.");
			return Ok(());
		}
	};

	// Only host nodes not below another deleted host node are attached to `parent` directly.
	let mut stack = vec![(id, true)];
	while let Some((id, attached)) = stack.pop() {
		let node = &mut tree[id];
		let is_host = node.kind() == NodeKind::HostLeaf;
		if let Some(handle) = node.host.take().filter(|_| is_host) {
			trace!(?handle, attached, "Releasing host node.");
			host.release_host_node(&handle, &node.memoized_props).map_err(host_error)?;
			if attached {
				host.remove_host_node(&parent, &handle).map_err(host_error)?;
			}
		}

		let children_start = stack.len();
		stack.extend(tree.children(id).map(|child| (child, attached && !is_host)));
		stack[children_start..].reverse();
	}
	Ok(())
}

/// Applies `id`'s own effect and memoizes its props.
///
/// `position` is the host parent and host index from [`HostPositions::visit`].
fn commit_work<H: Host>(tree: &mut Tree<H::Node>, host: &mut H, id: NodeId, position: Option<(NodeId, usize)>) -> Result<(), EngineError> {
	let node = &tree[id];
	match (node.effect_tag, &node.node_type) {
		(EffectTag::Placement, NodeType::Host(tag)) => {
			let span = trace_span!("Placing host node", ?id);
			let _enter = span.enter();

			let handle = host.create_host_node(tag).map_err(host_error)?;
			host.apply_host_props(&handle, &Props::default(), &node.pending_props).map_err(host_error)?;
			match position.and_then(|(parent, index)| Some((tree[parent].host.clone()?, index))) {
				Some((parent, index)) => {
					trace!(?parent, index, "Inserting.");
					host.insert_host_node(&parent, &handle, index).map_err(host_error)?;
				}
				None => trace!("No host parent. Leaving detached."),
			}
			tree[id].host = Some(handle);
		}

		(EffectTag::Update, NodeType::Host(_)) => {
			if let Some(handle) = &node.host {
				if !node.memoized_props.host_eq(&node.pending_props) {
					let span = trace_span!("Updating host node", ?id, ?handle);
					let _enter = span.enter();
					host.apply_host_props(handle, &node.memoized_props, &node.pending_props).map_err(host_error)?;
				}
			}
		}

		(EffectTag::None | EffectTag::Placement | EffectTag::Update | EffectTag::Deletion, _) => (),
	}

	let node = &mut tree[id];
	node.memoized_props = node.pending_props.clone();
	node.effect_tag = EffectTag::None;
	Ok(())
}

/// The host node of `id`'s closest host-owning ancestor.
fn host_parent<N: Clone>(tree: &Tree<N>, id: NodeId) -> Option<N> {
	let mut node = tree[id].parent?;
	loop {
		if tree[node].kind().is_host_parent() {
			return tree[node].host.clone();
		}
		node = tree[node].parent?;
	}
}

/// Running host child counts of a pre-order walk over the in-progress tree.
///
/// Deletions are committed before the walk starts, so the host leaves visited earlier under a host parent
/// are exactly the host nodes in front of the next one.
#[derive(Debug, Default)]
struct HostPositions {
	host_parents: HashMap<NodeId, NodeId>,
	next_index: HashMap<NodeId, usize>,
}
impl HostPositions {
	/// Records `id`, which must come right after its pre-order predecessor.
	///
	/// Returns the closest host-owning ancestor of a host leaf and the index its host node belongs at there.
	fn visit<N>(&mut self, tree: &Tree<N>, id: NodeId) -> Option<(NodeId, usize)> {
		let node = &tree[id];
		let host_parent = node.parent.and_then(|parent| {
			if tree[parent].kind().is_host_parent() {
				Some(parent)
			} else {
				self.host_parents.get(&parent).copied()
			}
		})?;
		self.host_parents.insert(id, host_parent);

		if node.kind() != NodeKind::HostLeaf {
			return None;
		}
		let next = self.next_index.entry(host_parent).or_insert(0);
		let index = *next;
		*next += 1;
		Some((host_parent, index))
	}
}
