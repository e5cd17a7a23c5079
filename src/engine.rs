use crate::{
	commit::commit_all_work,
	config::Config,
	description::{Description, Props},
	error::EngineError,
	evaluate::begin_work,
	host::Host,
	node::{EffectTag, NodeId, NodeKind, Tree, Update, WorkNode},
	schedule::{Deadline, Phase, Unbounded, WorkLoop},
	temp_set::TempKeySet,
};
use std::collections::VecDeque;
use tracing::{error, info, instrument, trace, warn};

/// An incremental reconciler driving one [`Host`].
///
/// # Correct Use
///
/// Call [`Engine::render`] to show a description in a container and [`Engine::schedule_update`] to patch component state.
/// Neither does any rendering by itself: drive the work with [`Engine::perform_work`] from the host's idle callback
/// (the engine asks for one through [`Host::request_work`]), or synchronously with [`Engine::flush`].
///
/// Only one render pass is in flight at a time.
/// Updates requested while it runs are queued and applied once it has been committed or aborted,
/// after which a fresh pass starts. They never cancel the pass in flight.
pub struct Engine<H: Host> {
	host: H,
	config: Config,
	tree: Tree<H::Node>,
	work: WorkLoop,
	roots: Vec<NodeId>,
	pending_roots: VecDeque<NodeId>,
	deferred_updates: VecDeque<(NodeId, Update)>,
	key_set: TempKeySet,
}
impl<H: Host> Engine<H> {
	#[must_use]
	pub fn new(host: H) -> Self {
		Self::with_config(host, Config::default())
	}

	#[must_use]
	pub fn with_config(host: H, config: Config) -> Self {
		Self {
			host,
			config,
			tree: Tree::new(),
			work: WorkLoop::default(),
			roots: vec![],
			pending_roots: VecDeque::new(),
			deferred_updates: VecDeque::new(),
			key_set: TempKeySet::new(),
		}
	}

	#[must_use]
	pub fn config(&self) -> &Config {
		&self.config
	}

	#[must_use]
	pub fn host(&self) -> &H {
		&self.host
	}

	pub fn host_mut(&mut self) -> &mut H {
		&mut self.host
	}

	pub fn into_host(self) -> H {
		self.host
	}

	/// Both tree generations.
	#[must_use]
	pub fn tree(&self) -> &Tree<H::Node> {
		&self.tree
	}

	#[must_use]
	pub fn node(&self, id: NodeId) -> Option<&WorkNode<H::Node>> {
		self.tree.get(id)
	}

	#[must_use]
	pub fn phase(&self) -> Phase {
		self.work.phase()
	}

	#[must_use]
	pub fn next_unit_of_work(&self) -> Option<NodeId> {
		self.work.next_unit_of_work
	}

	#[must_use]
	pub fn in_progress_root(&self) -> Option<NodeId> {
		self.work.in_progress_root
	}

	/// Old nodes tagged for deletion by the render pass in flight.
	#[must_use]
	pub fn deletions(&self) -> &[NodeId] {
		&self.work.deletions
	}

	/// One root per container, current where it has been committed before.
	#[must_use]
	pub fn roots(&self) -> &[NodeId] {
		&self.roots
	}

	#[must_use]
	pub fn root_of(&self, container: &H::Node) -> Option<NodeId> {
		self.roots.iter().copied().find(|&root| self.tree[root].host.as_ref() == Some(container))
	}

	/// Whether updates are waiting for a render pass that hasn't started yet.
	#[must_use]
	pub fn has_pending_work(&self) -> bool {
		!self.pending_roots.is_empty() || !self.deferred_updates.is_empty()
	}

	/// Requests that `container`'s content becomes `description`.
	///
	/// The first call for a container allocates its root. The root renders on the next [`Engine::step`].
	///
	/// # Errors
	///
	/// See [`Engine::schedule_update`].
	#[instrument(skip(self, description))]
	pub fn render(&mut self, description: Description, container: H::Node) -> Result<(), EngineError> {
		match self.root_of(&container) {
			Some(root) => self.schedule_update(root, Update::Element(description)),
			None => {
				let mut node = WorkNode::root(container);
				node.update_queue.push(Update::Element(description));
				let root = self.tree.insert(node);
				info!(?root, "Created root.");
				self.roots.push(root);
				self.pending_roots.push_back(root);
				self.host.request_work();
				Ok(())
			}
		}
	}

	/// Queues `update` on `node`.
	///
	/// Any handle of a logical node works, whether it belongs to the current tree generation or not.
	/// If no render pass is in flight, the update goes onto the current tree right away,
	/// so that all updates requested before the next [`Engine::step`] are applied by the same pass.
	/// Otherwise it waits until the pass in flight ends.
	///
	/// # Errors
	///
	/// [`EngineError::StaleNode`] if the node was deleted.
	#[instrument(skip(self, update))]
	pub fn schedule_update(&mut self, node: NodeId, update: Update) -> Result<(), EngineError> {
		if !self.tree.contains(node) {
			return Err(EngineError::StaleNode(node));
		}

		if self.work.phase() != Phase::Idle {
			trace!("Render pass in flight. Deferring update.");
			self.deferred_updates.push_back((node, update));
			return Ok(());
		}

		self.enqueue(node, update)?;
		self.host.request_work();
		Ok(())
	}

	/// Performs one transition: starts a pending render pass, evaluates one unit of work, or commits.
	///
	/// Returns the phase afterwards.
	///
	/// # Errors
	///
	/// Any failure aborts the render pass in flight:
	/// effect tags are cleared, nodes created during the pass are released and the engine returns to [`Phase::Idle`].
	/// Nothing is retried. Updates applied to the current tree stay there and are part of the next pass.
	#[instrument(skip(self))]
	pub fn step(&mut self) -> Result<Phase, EngineError> {
		let result = match self.work.phase() {
			Phase::Idle => {
				self.start_next_render();
				Ok(())
			}
			Phase::Rendering => self.perform_unit_of_work(),
			Phase::Committing => self.commit(),
		};

		if let Err(error) = result {
			error!(%error, "Aborting render pass.");
			self.abort();
			return Err(error);
		}
		Ok(self.work.phase())
	}

	/// Steps until idle, or until `deadline` leaves less than [`Config::yield_threshold`] between two units of work.
	///
	/// Commits never yield. Yielding with work left calls [`Host::request_work`].
	///
	/// # Errors
	///
	/// See [`Engine::step`].
	#[instrument(skip(self, deadline))]
	pub fn perform_work(&mut self, deadline: &impl Deadline) -> Result<Phase, EngineError> {
		loop {
			match self.work.phase() {
				Phase::Idle if !self.has_pending_work() => return Ok(Phase::Idle),
				Phase::Rendering if deadline.time_remaining() < self.config.yield_threshold => {
					trace!("Yielding.");
					self.host.request_work();
					return Ok(Phase::Rendering);
				}
				Phase::Idle | Phase::Rendering | Phase::Committing => {
					self.step()?;
				}
			}
		}
	}

	/// Performs all pending work without yielding.
	///
	/// # Errors
	///
	/// See [`Engine::step`].
	pub fn flush(&mut self) -> Result<(), EngineError> {
		self.perform_work(&Unbounded).map(drop)
	}

	/// Resolves `node` to the member of its logical node that belongs to the current tree.
	fn resolve_current(&self, node: NodeId) -> Result<NodeId, EngineError> {
		let work_node = self.tree.get(node).ok_or(EngineError::StaleNode(node))?;
		if work_node.is_current {
			return Ok(node);
		}
		if let Some(alternate) = work_node.alternate.filter(|&alternate| self.tree.get(alternate).map_or(false, WorkNode::is_current)) {
			return Ok(alternate);
		}
		// Roots that were never committed.
		if work_node.kind() == NodeKind::Root && self.roots.contains(&node) {
			return Ok(node);
		}
		Err(EngineError::StaleNode(node))
	}

	fn enqueue(&mut self, node: NodeId, update: Update) -> Result<(), EngineError> {
		let target = self.resolve_current(node)?;
		self.tree[target].update_queue.push(update);
		let root = self.tree.top(target);
		if !self.pending_roots.contains(&root) {
			self.pending_roots.push_back(root);
		}
		trace!(?target, ?root, "Enqueued update.");
		Ok(())
	}

	/// Moves deferred updates onto the current tree and starts a render pass for the first pending root, if any.
	fn start_next_render(&mut self) {
		while let Some((node, update)) = self.deferred_updates.pop_front() {
			if let Err(error) = self.enqueue(node, update) {
				warn!(%error, "Dropping deferred update.");
			}
		}

		while let Some(root) = self.pending_roots.pop_front() {
			let root = match self.resolve_current(root) {
				Ok(root) => root,
				Err(error) => {
					warn!(%error, "Skipping pending root.");
					continue;
				}
			};

			let in_progress_root = if self.tree[root].is_current {
				self.tree.create_or_reuse_alternate(root, Props::default())
			} else {
				root
			};
			trace!(current = ?root, ?in_progress_root, "Starting render pass.");
			self.work.start(in_progress_root);
			return;
		}
	}

	fn perform_unit_of_work(&mut self) -> Result<(), EngineError> {
		if let Some(id) = self.work.next_unit_of_work {
			begin_work(&mut self.tree, &mut self.work.deletions, &mut self.key_set, id)?;
			self.work.advance(&self.tree, self.config.depth_limit)?;
		}
		Ok(())
	}

	fn commit(&mut self) -> Result<(), EngineError> {
		if let Some(root) = commit_all_work(&mut self.tree, &mut self.work, &mut self.host)? {
			if let Some(previous) = self.tree[root].alternate {
				if let Some(slot) = self.roots.iter_mut().find(|slot| **slot == previous) {
					*slot = root;
				}
			}
		}
		if self.has_pending_work() {
			self.host.request_work();
		}
		Ok(())
	}

	/// Discards the render pass in flight.
	fn abort(&mut self) {
		if let Some(root) = self.work.in_progress_root {
			let mut released = 0_usize;
			for id in self.tree.subtree(root) {
				let fresh = self.tree.get(id).map_or(false, |node| node.alternate.is_none());
				if fresh && id != root {
					self.tree.remove(id);
					released += 1;
				} else if let Some(node) = self.tree.get_mut(id) {
					// Kept nodes may still link to released ones.
					node.effect_tag = EffectTag::None;
					node.first_child = None;
					node.next_sibling = None;
				}
			}
			trace!(?root, released, "Aborted render pass.");
		}

		for &deleted in &self.work.deletions {
			if let Some(node) = self.tree.get_mut(deleted) {
				node.effect_tag = EffectTag::None;
			}
		}
		self.work.reset();
	}
}
