use crate::description::Key;
use hashbrown::HashSet;

/// A reusable set of sibling keys, kept around to avoid reallocating for each sibling group.
#[derive(Debug, Default)]
pub struct TempKeySet(HashSet<Key>);
impl TempKeySet {
	pub fn new() -> Self {
		Self(HashSet::new())
	}

	/// Borrows the set, cleared.
	pub fn temp(&mut self) -> &mut HashSet<Key> {
		self.0.clear();
		&mut self.0
	}
}
