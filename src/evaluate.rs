use crate::{
	description::{Description, RenderContext},
	error::EngineError,
	node::{MemoizedState, NodeId, NodeType, Tree},
	reconcile::reconcile_children,
	temp_set::TempKeySet,
};
use tracing::{instrument, trace};

/// Evaluates one unit of work: computes the next children of `id` and reconciles them.
///
/// Only `id` and its new children are written to.
/// Host nodes are not touched here; their bindings are created while committing.
///
/// # Errors
///
/// [`EngineError::Component`] if a component's render callback fails,
/// or any error of [`reconcile_children`].
#[instrument(skip(tree, deletions, key_set))]
pub fn begin_work<N: Clone>(tree: &mut Tree<N>, deletions: &mut Vec<NodeId>, key_set: &mut TempKeySet, id: NodeId) -> Result<(), EngineError> {
	let children = match tree[id].node_type.clone() {
		NodeType::Root => {
			let element = tree.drain_update_queue(id).as_element().cloned();
			element.into_iter().collect()
		}

		NodeType::Host(_) => tree[id].pending_props.children.clone(),

		NodeType::Function(function) => {
			trace!(component = function.name(), "Calling function component.");
			function
				.call(&tree[id].pending_props)
				.map_err(|source| EngineError::Component {
					component: function.name().to_owned().into(),
					source,
				})?
				.into_iter()
				.collect()
		}

		NodeType::Stateful(stateful) => {
			let instance = match tree[id].instance.clone() {
				Some(instance) => instance,
				None => {
					trace!(component = stateful.name(), "Constructing instance.");
					let node = &mut tree[id];
					let instance = stateful.construct(&node.pending_props);
					node.memoized_state = MemoizedState::State(instance.initial_state(&node.pending_props));
					node.instance = Some(instance.clone());
					instance
				}
			};
			tree.drain_update_queue(id);

			let node = &tree[id];
			let empty_state;
			let state = match node.memoized_state.as_state() {
				Some(state) => state,
				None => {
					empty_state = Default::default();
					&empty_state
				}
			};

			trace!(component = stateful.name(), "Rendering instance.");
			instance
				.render(&RenderContext {
					node: id,
					props: &node.pending_props,
					state,
				})
				.map_err(|source| EngineError::Component {
					component: stateful.name().to_owned().into(),
					source,
				})?
				.into_iter()
				.collect::<Vec<Description>>()
		}
	};

	reconcile_children(tree, deletions, key_set, id, children)
}
