use crate::{
	description::{ComponentError, Key},
	node::NodeId,
};
use std::{borrow::Cow, error::Error};
use thiserror::Error;

/// Everything that can abort a render pass or reject a request.
///
/// Apart from [`EngineError::StaleNode`], which is returned before any work is done,
/// each of these aborts the render pass in flight. See [`Engine::step`](`crate::Engine::step`).
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("component `{component}` failed to render")]
	Component {
		component: Cow<'static, str>,
		#[source]
		source: ComponentError,
	},

	/// The host adapter failed during commit.
	///
	/// The host tree may have been changed partially at this point and is not rolled back.
	#[error("host adapter failed during commit")]
	Host(#[source] Box<dyn Error + 'static>),

	#[error("duplicate key {key:?} among siblings")]
	DuplicateKey { key: Key },

	#[error("work node {0:?} no longer exists")]
	StaleNode(NodeId),

	#[error("depth limit of {limit} reached")]
	DepthLimit { limit: usize },
}
