//! Element descriptions: the plain, tree-shaped values a render pass is computed from.
//!
//! A [`Description`] names what should exist at one position of the tree.
//! Host elements become host nodes through the [`Host`](`crate::Host`) adapter,
//! while [`FunctionComponent`]s and [`StatefulComponent`]s are evaluated during rendering to produce further descriptions.

use crate::node::NodeId;
use core::{
	any::Any,
	fmt::{self, Debug, Formatter},
};
use std::{borrow::Cow, error::Error, rc::Rc};

/// Tag of the host leaf created by [`Description::text`].
pub const TEXT_TAG: &str = "#text";

/// Name of the attribute holding the content of a [`TEXT_TAG`] node.
pub const TEXT_VALUE_ATTRIBUTE: &str = "nodeValue";

/// Identity-preserving hint among siblings.
pub type Key = Cow<'static, str>;

/// Failure raised by a component's render callback.
pub type ComponentError = Box<dyn Error + 'static>;

/// Component state, patched key-wise by [`Update::State`](`crate::Update::State`).
pub type State = hashbrown::HashMap<Cow<'static, str>, Value>;

/// A loosely typed state value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(Cow<'static, str>),
}
impl Value {
	#[must_use]
	pub fn as_int(&self) -> Option<i64> {
		match *self {
			Value::Int(int) => Some(int),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_bool(&self) -> Option<bool> {
		match *self {
			Value::Bool(bool) => Some(bool),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Text(text) => Some(text),
			_ => None,
		}
	}
}
impl From<bool> for Value {
	fn from(bool: bool) -> Self {
		Self::Bool(bool)
	}
}
impl From<i64> for Value {
	fn from(int: i64) -> Self {
		Self::Int(int)
	}
}
impl From<i32> for Value {
	fn from(int: i32) -> Self {
		Self::Int(int.into())
	}
}
impl From<f64> for Value {
	fn from(float: f64) -> Self {
		Self::Float(float)
	}
}
impl From<&'static str> for Value {
	fn from(text: &'static str) -> Self {
		Self::Text(text.into())
	}
}
impl From<String> for Value {
	fn from(text: String) -> Self {
		Self::Text(text.into())
	}
}

/// A host-level attribute, applied verbatim by the host adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
	pub name: Cow<'static, str>,
	pub value: Cow<'static, str>,
}

/// A shared event handler.
///
/// Handlers compare by identity, so reusing the same [`Handler`] across renders lets the host adapter skip rebinding it.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&dyn Any)>);
impl Handler {
	pub fn new(handler: impl Fn(&dyn Any) + 'static) -> Self {
		Self(Rc::new(handler))
	}

	/// Invokes the handler with a host-specific event.
	pub fn call(&self, event: &dyn Any) {
		(self.0)(event)
	}

	/// A stable address for this handler, usable as map key.
	#[must_use]
	pub fn addr(&self) -> usize {
		Rc::as_ptr(&self.0).cast::<()>() as usize
	}
}
impl PartialEq for Handler {
	fn eq(&self, other: &Self) -> bool {
		self.addr() == other.addr()
	}
}
impl Eq for Handler {}
impl Debug for Handler {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Handler").field(&format_args!("{:#x}", self.addr())).finish()
	}
}

/// An event binding on a host element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listener {
	pub event: Cow<'static, str>,
	pub handler: Handler,
}

/// The input of one node for one render pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
	pub attributes: Vec<Attribute>,
	pub listeners: Vec<Listener>,
	pub children: Vec<Description>,
}
impl Props {
	#[must_use]
	pub fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes.iter().find(|attribute| attribute.name == name).map(|attribute| attribute.value.as_ref())
	}

	/// Whether the host-visible parts (attributes and listeners) are equal.
	///
	/// Children are reconciled structurally and not compared here.
	#[must_use]
	pub fn host_eq(&self, other: &Self) -> bool {
		self.attributes == other.attributes && self.listeners == other.listeners
	}
}

type RenderFn = dyn Fn(&Props) -> Result<Option<Description>, ComponentError>;

/// A stateless component: a pure function from props to at most one child description.
#[derive(Clone)]
pub struct FunctionComponent {
	name: Cow<'static, str>,
	render: Rc<RenderFn>,
}
impl FunctionComponent {
	pub fn new(name: impl Into<Cow<'static, str>>, render: impl Fn(&Props) -> Result<Option<Description>, ComponentError> + 'static) -> Self {
		Self {
			name: name.into(),
			render: Rc::new(render),
		}
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	pub(crate) fn call(&self, props: &Props) -> Result<Option<Description>, ComponentError> {
		(self.render)(props)
	}
}
impl PartialEq for FunctionComponent {
	fn eq(&self, other: &Self) -> bool {
		Rc::as_ptr(&self.render).cast::<()>() == Rc::as_ptr(&other.render).cast::<()>()
	}
}
impl Debug for FunctionComponent {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("FunctionComponent").field(&self.name).finish()
	}
}

/// What a [`Component`] sees while rendering.
#[derive(Debug)]
pub struct RenderContext<'a> {
	/// The work node being evaluated.
	///
	/// Pass it to [`Engine::schedule_update`](`crate::Engine::schedule_update`) to patch this component's state later.
	pub node: NodeId,
	pub props: &'a Props,
	pub state: &'a State,
}

/// A stateful component instance.
///
/// One instance is constructed per logical node and shared by both of its generations.
pub trait Component {
	/// The state the instance starts out with, before any queued patch is applied.
	fn initial_state(&self, _props: &Props) -> State {
		State::new()
	}

	/// # Errors
	///
	/// Failures abort the current render pass.
	fn render(&self, context: &RenderContext<'_>) -> Result<Option<Description>, ComponentError>;
}

type ConstructFn = dyn Fn(&Props) -> Rc<dyn Component>;

/// Constructor of stateful [`Component`] instances.
#[derive(Clone)]
pub struct StatefulComponent {
	name: Cow<'static, str>,
	construct: Rc<ConstructFn>,
}
impl StatefulComponent {
	pub fn new<C: Component + 'static>(name: impl Into<Cow<'static, str>>, construct: impl Fn(&Props) -> C + 'static) -> Self {
		Self {
			name: name.into(),
			construct: Rc::new(move |props: &Props| Rc::new(construct(props)) as Rc<dyn Component>),
		}
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	pub(crate) fn construct(&self, props: &Props) -> Rc<dyn Component> {
		(self.construct)(props)
	}
}
impl PartialEq for StatefulComponent {
	fn eq(&self, other: &Self) -> bool {
		Rc::as_ptr(&self.construct).cast::<()>() == Rc::as_ptr(&other.construct).cast::<()>()
	}
}
impl Debug for StatefulComponent {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("StatefulComponent").field(&self.name).finish()
	}
}

/// The type of a [`Description`], which decides the kind of work node it turns into.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
	/// A host element, by tag.
	Host(Cow<'static, str>),
	Function(FunctionComponent),
	Stateful(StatefulComponent),
}

/// Declarative description of one element and its children.
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
	pub element_type: ElementType,
	pub key: Option<Key>,
	pub props: Props,
}
impl Description {
	#[must_use]
	pub fn new(element_type: ElementType) -> Self {
		Self {
			element_type,
			key: None,
			props: Props::default(),
		}
	}

	pub fn host(tag: impl Into<Cow<'static, str>>) -> Self {
		Self::new(ElementType::Host(tag.into()))
	}

	/// A text leaf. See [`TEXT_TAG`].
	pub fn text(text: impl Into<Cow<'static, str>>) -> Self {
		Self::host(TEXT_TAG).with_attribute(TEXT_VALUE_ATTRIBUTE, text)
	}

	#[must_use]
	pub fn function(component: &FunctionComponent) -> Self {
		Self::new(ElementType::Function(component.clone()))
	}

	#[must_use]
	pub fn stateful(component: &StatefulComponent) -> Self {
		Self::new(ElementType::Stateful(component.clone()))
	}

	#[must_use]
	pub fn with_key(mut self, key: impl Into<Key>) -> Self {
		self.key = Some(key.into());
		self
	}

	#[must_use]
	pub fn with_attribute(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Cow<'static, str>>) -> Self {
		self.props.attributes.push(Attribute {
			name: name.into(),
			value: value.into(),
		});
		self
	}

	#[must_use]
	pub fn with_handler(mut self, event: impl Into<Cow<'static, str>>, handler: Handler) -> Self {
		self.props.listeners.push(Listener { event: event.into(), handler });
		self
	}

	#[must_use]
	pub fn with_listener(self, event: impl Into<Cow<'static, str>>, handler: impl Fn(&dyn Any) + 'static) -> Self {
		self.with_handler(event, Handler::new(handler))
	}

	#[must_use]
	pub fn with_child(mut self, child: Description) -> Self {
		self.props.children.push(child);
		self
	}

	#[must_use]
	pub fn with_children(mut self, children: impl IntoIterator<Item = Description>) -> Self {
		self.props.children.extend(children);
		self
	}

	/// The host tag, if this describes a host element.
	#[must_use]
	pub fn tag(&self) -> Option<&str> {
		match &self.element_type {
			ElementType::Host(tag) => Some(tag),
			ElementType::Function(_) | ElementType::Stateful(_) => None,
		}
	}
}
