#![doc(html_root_url = "https://docs.rs/fiber-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! An incremental tree reconciler.
//!
//! An [`Engine`] keeps two generations of a render tree: the current one, which matches the host tree,
//! and an in-progress one that is built in small, interruptible units of work.
//! Once the in-progress tree is complete, its effects are committed to the [`Host`] in one pass and the generations swap.
//!
//! The `web` feature adds a `web-sys` DOM host in the `dom` module, and DOM loading in `load`.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod commit;
mod config;
mod description;
mod engine;
mod error;
mod evaluate;
mod host;
mod node;
mod reconcile;
mod schedule;
mod temp_set;

#[cfg(feature = "web")]
pub mod dom;
#[cfg(feature = "web")]
pub mod load;
#[cfg(feature = "web")]
mod rc_hash_map;

pub use config::Config;
pub use description::{
	Attribute, Component, ComponentError, Description, ElementType, FunctionComponent, Handler, Key, Listener, Props, RenderContext, State, StatefulComponent, Value, TEXT_TAG,
	TEXT_VALUE_ATTRIBUTE,
};
pub use engine::Engine;
pub use error::EngineError;
pub use host::Host;
pub use node::{Children, EffectTag, MemoizedState, NodeId, NodeKind, NodeType, Tree, Update, UpdateQueue, WorkNode};
pub use schedule::{Deadline, Phase, TimeSlice, Unbounded, UnitBudget};
