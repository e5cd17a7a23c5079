//! Cooperative, depth-first traversal of the in-progress tree.

use crate::{
	error::EngineError,
	node::{NodeId, Tree},
};
use core::{cell::Cell, time::Duration};
use std::time::Instant;
use tracing::trace;

/// Where an [`Engine`](`crate::Engine`) stands with respect to its single pending render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
	/// No render is in flight.
	Idle,
	/// Units of work remain to be evaluated.
	Rendering,
	/// Every node has been evaluated and the in-progress tree waits to be committed.
	Committing,
}

/// State of the render pass in flight, if any.
#[derive(Debug, Default)]
pub struct WorkLoop {
	pub(crate) next_unit_of_work: Option<NodeId>,
	pub(crate) in_progress_root: Option<NodeId>,
	/// Old nodes tagged for deletion during this pass, in tagging order.
	pub(crate) deletions: Vec<NodeId>,
	/// Nesting of `next_unit_of_work` below `in_progress_root`.
	pub(crate) depth: usize,
}
impl WorkLoop {
	#[must_use]
	pub fn phase(&self) -> Phase {
		match (self.next_unit_of_work, self.in_progress_root) {
			(Some(_), _) => Phase::Rendering,
			(None, Some(_)) => Phase::Committing,
			(None, None) => Phase::Idle,
		}
	}

	pub(crate) fn start(&mut self, root: NodeId) {
		debug_assert_eq!(self.phase(), Phase::Idle);
		self.next_unit_of_work = Some(root);
		self.in_progress_root = Some(root);
		self.depth = 0;
	}

	pub(crate) fn reset(&mut self) {
		self.next_unit_of_work = None;
		self.in_progress_root = None;
		self.deletions.clear();
		self.depth = 0;
	}

	/// Moves `next_unit_of_work` on from the node that was just evaluated:
	/// to its first child, else to the next sibling of it or of its closest ancestor that has one.
	/// The traversal ends at `in_progress_root`.
	///
	/// # Errors
	///
	/// [`EngineError::DepthLimit`] when descending below `depth_limit`.
	pub(crate) fn advance<N>(&mut self, tree: &Tree<N>, depth_limit: usize) -> Result<(), EngineError> {
		let (current, root) = match (self.next_unit_of_work, self.in_progress_root) {
			(Some(current), Some(root)) => (current, root),
			_ => return Ok(()),
		};

		if let Some(child) = tree[current].first_child {
			if self.depth >= depth_limit {
				return Err(EngineError::DepthLimit { limit: depth_limit });
			}
			self.depth += 1;
			self.next_unit_of_work = Some(child);
			return Ok(());
		}

		let mut node = current;
		self.next_unit_of_work = loop {
			if node == root {
				break None;
			}
			if let Some(sibling) = tree[node].next_sibling {
				break Some(sibling);
			}
			match tree[node].parent {
				Some(parent) => {
					self.depth -= 1;
					node = parent;
				}
				None => break None,
			}
		};
		if self.next_unit_of_work.is_none() {
			trace!(?root, "All units of work done.");
		}
		Ok(())
	}
}

/// How long the host runtime lets the scheduler keep working.
pub trait Deadline {
	fn time_remaining(&self) -> Duration;
}

/// A deadline that never expires.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;
impl Deadline for Unbounded {
	fn time_remaining(&self) -> Duration {
		Duration::MAX
	}
}

/// A fixed budget of wall-clock time, starting at construction.
#[derive(Debug, Clone, Copy)]
pub struct TimeSlice {
	end: Instant,
}
impl TimeSlice {
	#[must_use]
	pub fn new(budget: Duration) -> Self {
		Self { end: Instant::now() + budget }
	}
}
impl Deadline for TimeSlice {
	fn time_remaining(&self) -> Duration {
		self.end.saturating_duration_since(Instant::now())
	}
}

/// Allows a fixed number of units of work, counting down by one per query.
///
/// Useful to drive the scheduler deterministically.
#[derive(Debug, Default)]
pub struct UnitBudget(Cell<usize>);
impl UnitBudget {
	#[must_use]
	pub fn new(units: usize) -> Self {
		Self(Cell::new(units))
	}

	#[must_use]
	pub fn remaining(&self) -> usize {
		self.0.get()
	}
}
impl Deadline for UnitBudget {
	fn time_remaining(&self) -> Duration {
		match self.0.get() {
			0 => Duration::ZERO,
			units => {
				self.0.set(units - 1);
				Duration::MAX
			}
		}
	}
}
