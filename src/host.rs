use crate::description::Props;
use core::fmt::Debug;
use std::error::Error;

/// Adapter to the externally managed host tree.
///
/// An [`Engine`](`crate::Engine`) only calls the `*_host_*` methods while committing, never while rendering.
pub trait Host {
	/// Handle of a host node. Containers passed to [`Engine::render`](`crate::Engine::render`) are handles too.
	type Node: Clone + PartialEq + Debug;
	type Error: Error + 'static;

	/// Creates a detached host node. `tag` may be [`TEXT_TAG`](`crate::TEXT_TAG`).
	///
	/// # Errors
	///
	/// Aborts the commit.
	fn create_host_node(&mut self, tag: &str) -> Result<Self::Node, Self::Error>;

	/// Inserts `node` as `index`th child of `parent`.
	///
	/// # Errors
	///
	/// Aborts the commit.
	fn insert_host_node(&mut self, parent: &Self::Node, node: &Self::Node, index: usize) -> Result<(), Self::Error>;

	/// Detaches `node` from `parent`.
	///
	/// # Errors
	///
	/// Aborts the commit.
	fn remove_host_node(&mut self, parent: &Self::Node, node: &Self::Node) -> Result<(), Self::Error>;

	/// Brings `node`'s attributes and listeners from `old` to `new`.
	///
	/// Fresh nodes are passed empty `old` props.
	///
	/// # Errors
	///
	/// Aborts the commit.
	fn apply_host_props(&mut self, node: &Self::Node, old: &Props, new: &Props) -> Result<(), Self::Error>;

	/// Releases whatever the adapter holds for `node`, which is being deleted with `props` applied.
	///
	/// Called for every host node of a deleted subtree, before the topmost ones are removed.
	///
	/// # Errors
	///
	/// Aborts the commit.
	fn release_host_node(&mut self, _node: &Self::Node, _props: &Props) -> Result<(), Self::Error> {
		Ok(())
	}

	/// Asks the host runtime to call [`Engine::perform_work`](`crate::Engine::perform_work`) again later, for example from an idle callback.
	fn request_work(&mut self) {}
}
