//! The double-buffered work-node model.
//!
//! Every logical node of a rendered tree is represented by at most two [`WorkNode`]s,
//! one per tree generation, which find each other through their `alternate` link.
//! All of them live in one [`Tree`] arena and refer to each other by [`NodeId`].

use crate::description::{Component, Description, ElementType, FunctionComponent, Key, Props, State, StatefulComponent};
use core::{
	fmt::{self, Debug, Formatter},
	ops::{Index, IndexMut},
};
use slotmap::{new_key_type, SlotMap};
use std::{borrow::Cow, collections::VecDeque, rc::Rc};
use tracing::trace;

new_key_type! {
	/// Generational handle of a [`WorkNode`] in a [`Tree`].
	pub struct NodeId;
}

/// What a work node stands for. The [`NodeKind`] follows from it.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeType {
	/// The top of a tree, bound to a host container.
	Root,
	Host(Cow<'static, str>),
	Function(FunctionComponent),
	Stateful(StatefulComponent),
}
impl NodeType {
	#[must_use]
	pub fn kind(&self) -> NodeKind {
		match self {
			NodeType::Root => NodeKind::Root,
			NodeType::Host(_) => NodeKind::HostLeaf,
			NodeType::Function(_) => NodeKind::FunctionComponent,
			NodeType::Stateful(_) => NodeKind::StatefulComponent,
		}
	}

	/// Whether a node of this type can be reused for an element of type `element_type`.
	#[must_use]
	pub fn is_same_type(&self, element_type: &ElementType) -> bool {
		match (self, element_type) {
			(NodeType::Host(a), ElementType::Host(b)) => a == b,
			(NodeType::Function(a), ElementType::Function(b)) => a == b,
			(NodeType::Stateful(a), ElementType::Stateful(b)) => a == b,
			_ => false,
		}
	}
}
impl From<ElementType> for NodeType {
	fn from(element_type: ElementType) -> Self {
		match element_type {
			ElementType::Host(tag) => NodeType::Host(tag),
			ElementType::Function(function) => NodeType::Function(function),
			ElementType::Stateful(stateful) => NodeType::Stateful(stateful),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
	HostLeaf,
	FunctionComponent,
	StatefulComponent,
	Root,
}
impl NodeKind {
	/// Whether nodes of this kind own a host node that host children are attached to.
	#[must_use]
	pub fn is_host_parent(self) -> bool {
		matches!(self, NodeKind::HostLeaf | NodeKind::Root)
	}
}

/// The structural change an in-progress node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectTag {
	None,
	Placement,
	Update,
	Deletion,
}
impl Default for EffectTag {
	fn default() -> Self {
		Self::None
	}
}

/// A pending change to a node's [`MemoizedState`].
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
	/// Replaces the rendered element, as used by [`Engine::render`](`crate::Engine::render`) on roots.
	Element(Description),
	/// Merged into a stateful component's state, key by key.
	State(State),
}

/// First-in-first-applied queue of [`Update`]s.
#[derive(Debug, Clone, Default)]
pub struct UpdateQueue(VecDeque<Update>);
impl UpdateQueue {
	pub fn push(&mut self, update: Update) {
		self.0.push_back(update)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Update> {
		self.0.iter()
	}

	pub fn clear(&mut self) {
		self.0.clear()
	}
}

/// Output or state of the last pass that evaluated a node.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoizedState {
	None,
	/// The element a root renders.
	Element(Description),
	/// A stateful component's state.
	State(State),
}
impl Default for MemoizedState {
	fn default() -> Self {
		Self::None
	}
}
impl MemoizedState {
	#[must_use]
	pub fn as_element(&self) -> Option<&Description> {
		match self {
			MemoizedState::Element(element) => Some(element),
			MemoizedState::None | MemoizedState::State(_) => None,
		}
	}

	#[must_use]
	pub fn as_state(&self) -> Option<&State> {
		match self {
			MemoizedState::State(state) => Some(state),
			MemoizedState::None | MemoizedState::Element(_) => None,
		}
	}

	fn apply(&mut self, update: Update) {
		match (self, update) {
			(this, Update::Element(element)) => *this = MemoizedState::Element(element),
			(MemoizedState::State(state), Update::State(patch)) => state.extend(patch),
			(this, Update::State(patch)) => *this = MemoizedState::State(patch),
		}
	}
}

/// One node of one tree generation.
///
/// `N` is the host adapter's node handle.
pub struct WorkNode<N> {
	pub(crate) node_type: NodeType,
	pub(crate) key: Option<Key>,
	pub(crate) pending_props: Props,
	pub(crate) memoized_props: Props,
	pub(crate) memoized_state: MemoizedState,
	pub(crate) instance: Option<Rc<dyn Component>>,
	pub(crate) update_queue: UpdateQueue,

	pub(crate) parent: Option<NodeId>,
	pub(crate) first_child: Option<NodeId>,
	pub(crate) next_sibling: Option<NodeId>,
	pub(crate) child_index: usize,

	pub(crate) host: Option<N>,
	pub(crate) alternate: Option<NodeId>,
	pub(crate) effect_tag: EffectTag,
	pub(crate) is_current: bool,
}
impl<N> WorkNode<N> {
	/// A root bound to `container`, not yet part of any committed tree.
	pub(crate) fn root(container: N) -> Self {
		Self {
			host: Some(container),
			..Self::empty(NodeType::Root, None, Props::default())
		}
	}

	/// A node seen for the first time, from its description.
	pub(crate) fn fresh(description: Description) -> Self {
		let Description { element_type, key, props } = description;
		Self::empty(element_type.into(), key, props)
	}

	fn empty(node_type: NodeType, key: Option<Key>, pending_props: Props) -> Self {
		Self {
			node_type,
			key,
			pending_props,
			memoized_props: Props::default(),
			memoized_state: MemoizedState::None,
			instance: None,
			update_queue: UpdateQueue::default(),
			parent: None,
			first_child: None,
			next_sibling: None,
			child_index: 0,
			host: None,
			alternate: None,
			effect_tag: EffectTag::None,
			is_current: false,
		}
	}

	#[must_use]
	pub fn kind(&self) -> NodeKind {
		self.node_type.kind()
	}

	#[must_use]
	pub fn node_type(&self) -> &NodeType {
		&self.node_type
	}

	#[must_use]
	pub fn key(&self) -> Option<&str> {
		self.key.as_deref()
	}

	#[must_use]
	pub fn pending_props(&self) -> &Props {
		&self.pending_props
	}

	#[must_use]
	pub fn memoized_props(&self) -> &Props {
		&self.memoized_props
	}

	#[must_use]
	pub fn memoized_state(&self) -> &MemoizedState {
		&self.memoized_state
	}

	#[must_use]
	pub fn update_queue(&self) -> &UpdateQueue {
		&self.update_queue
	}

	#[must_use]
	pub fn parent(&self) -> Option<NodeId> {
		self.parent
	}

	#[must_use]
	pub fn first_child(&self) -> Option<NodeId> {
		self.first_child
	}

	#[must_use]
	pub fn next_sibling(&self) -> Option<NodeId> {
		self.next_sibling
	}

	/// Position among the siblings produced by the last reconciliation of the parent.
	///
	/// Host indices are counted separately at commit, since component siblings may own any number of host nodes.
	#[must_use]
	pub fn child_index(&self) -> usize {
		self.child_index
	}

	/// The bound host node. For roots, this is the container.
	#[must_use]
	pub fn host(&self) -> Option<&N> {
		self.host.as_ref()
	}

	#[must_use]
	pub fn alternate(&self) -> Option<NodeId> {
		self.alternate
	}

	#[must_use]
	pub fn effect_tag(&self) -> EffectTag {
		self.effect_tag
	}

	/// Whether this node belongs to the committed tree generation.
	#[must_use]
	pub fn is_current(&self) -> bool {
		self.is_current
	}

	/// Whether this node can be reused for `description` in the same position.
	#[must_use]
	pub fn matches(&self, description: &Description) -> bool {
		self.node_type.is_same_type(&description.element_type) && self.key == description.key
	}
}
impl<N: Debug> Debug for WorkNode<N> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let mut debug = f.debug_struct("WorkNode");
		debug
			.field("kind", &self.kind())
			.field("key", &self.key)
			.field("parent", &self.parent)
			.field("first_child", &self.first_child)
			.field("next_sibling", &self.next_sibling)
			.field("child_index", &self.child_index)
			.field("host", &self.host)
			.field("alternate", &self.alternate)
			.field("effect_tag", &self.effect_tag)
			.field("is_current", &self.is_current)
			.field("update_queue.len()", &self.update_queue.len());
		if cfg!(feature = "dangerous-logging") {
			debug
				.field("node_type", &self.node_type)
				.field("pending_props", &self.pending_props)
				.field("memoized_props", &self.memoized_props)
				.field("memoized_state", &self.memoized_state);
		}
		debug.finish()
	}
}

/// Arena of every [`WorkNode`] of both tree generations.
pub struct Tree<N> {
	nodes: SlotMap<NodeId, WorkNode<N>>,
}
impl<N> Default for Tree<N> {
	fn default() -> Self {
		Self::new()
	}
}
impl<N> Tree<N> {
	#[must_use]
	pub fn new() -> Self {
		Self { nodes: SlotMap::with_key() }
	}

	#[must_use]
	pub fn get(&self, id: NodeId) -> Option<&WorkNode<N>> {
		self.nodes.get(id)
	}

	pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut WorkNode<N>> {
		self.nodes.get_mut(id)
	}

	#[must_use]
	pub fn contains(&self, id: NodeId) -> bool {
		self.nodes.contains_key(id)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (NodeId, &WorkNode<N>)> {
		self.nodes.iter()
	}

	pub(crate) fn insert(&mut self, node: WorkNode<N>) -> NodeId {
		self.nodes.insert(node)
	}

	pub(crate) fn remove(&mut self, id: NodeId) -> Option<WorkNode<N>> {
		self.nodes.remove(id)
	}

	/// The children of `id`, in sibling order.
	pub fn children(&self, id: NodeId) -> Children<'_, N> {
		Children {
			tree: self,
			next: self.get(id).and_then(|node| node.first_child),
		}
	}

	/// `id` and every node reachable from it through child and sibling links below it, in pre-order.
	#[must_use]
	pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
		let mut subtree = vec![];
		let mut stack = vec![id];
		while let Some(id) = stack.pop() {
			subtree.push(id);
			let children_start = stack.len();
			stack.extend(self.children(id));
			stack[children_start..].reverse();
		}
		subtree
	}

	/// Walks up the parent links, returning the topmost node.
	#[must_use]
	pub fn top(&self, mut id: NodeId) -> NodeId {
		while let Some(parent) = self.get(id).and_then(|node| node.parent) {
			id = parent;
		}
		id
	}

	/// Prepares the other generation of `current` for a new render pass with `pending_props`.
	///
	/// If `current` already has an alternate, that node is reset and reused.
	/// Otherwise a new node is allocated and linked to `current` in both directions.
	/// Either way, the returned node has no children or siblings yet,
	/// shares `current`'s host binding, component instance, memoized props and state,
	/// and holds a copy of its update queue.
	pub fn create_or_reuse_alternate(&mut self, current: NodeId, pending_props: Props) -> NodeId
	where
		N: Clone,
	{
		let current_node = &self[current];
		let node_type = current_node.node_type.clone();
		let key = current_node.key.clone();
		let memoized_props = current_node.memoized_props.clone();
		let memoized_state = current_node.memoized_state.clone();
		let instance = current_node.instance.clone();
		let update_queue = current_node.update_queue.clone();
		let host = current_node.host.clone();

		match current_node.alternate.filter(|&alternate| self.contains(alternate)) {
			Some(alternate) => {
				trace!(?current, ?alternate, "Reusing alternate.");
				let node = &mut self[alternate];
				node.node_type = node_type;
				node.key = key;
				node.pending_props = pending_props;
				node.memoized_props = memoized_props;
				node.memoized_state = memoized_state;
				node.instance = instance;
				node.update_queue = update_queue;
				node.parent = None;
				node.first_child = None;
				node.next_sibling = None;
				node.child_index = 0;
				node.host = host;
				node.effect_tag = EffectTag::None;
				node.is_current = false;
				alternate
			}
			None => {
				let alternate = self.insert(WorkNode {
					memoized_props,
					memoized_state,
					instance,
					update_queue,
					host,
					alternate: Some(current),
					..WorkNode::empty(node_type, key, pending_props)
				});
				trace!(?current, ?alternate, "Allocated alternate.");
				self[current].alternate = Some(alternate);
				alternate
			}
		}
	}

	/// Folds every queued update into `id`'s memoized state, oldest first, and empties the queue.
	pub fn drain_update_queue(&mut self, id: NodeId) -> &MemoizedState {
		let node = &mut self[id];
		let queue = core::mem::take(&mut node.update_queue);
		if !queue.is_empty() {
			trace!(node = ?id, count = queue.len(), "Draining update queue.");
		}
		for update in queue.0 {
			node.memoized_state.apply(update);
		}
		&node.memoized_state
	}
}
impl<N> Index<NodeId> for Tree<N> {
	type Output = WorkNode<N>;

	fn index(&self, id: NodeId) -> &Self::Output {
		&self.nodes[id]
	}
}
impl<N> IndexMut<NodeId> for Tree<N> {
	fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
		&mut self.nodes[id]
	}
}

/// Iterator over a node's children. See [`Tree::children`].
pub struct Children<'a, N> {
	tree: &'a Tree<N>,
	next: Option<NodeId>,
}
impl<'a, N> Iterator for Children<'a, N> {
	type Item = NodeId;

	fn next(&mut self) -> Option<Self::Item> {
		let current = self.next?;
		self.next = self.tree.get(current).and_then(|node| node.next_sibling);
		Some(current)
	}
}
