use fiber_dom::{Component, ComponentError, Description, EngineError, FunctionComponent, NodeId, Phase, Props, RenderContext, State, StatefulComponent, Update, Value};
use std::{cell::Cell, rc::Rc};

use recording_host_::{setup, Call};

#[derive(Default)]
struct Probe {
	node: Cell<Option<NodeId>>,
	renders: Cell<usize>,
	constructions: Cell<usize>,
}

struct Counter(Rc<Probe>);
impl Component for Counter {
	fn initial_state(&self, props: &Props) -> State {
		let start = props.attribute("start").and_then(|start| start.parse::<i64>().ok()).unwrap_or_default();
		let mut state = State::new();
		state.insert("count".into(), start.into());
		state
	}

	fn render(&self, context: &RenderContext<'_>) -> Result<Option<Description>, ComponentError> {
		self.0.node.set(Some(context.node));
		self.0.renders.set(self.0.renders.get() + 1);
		let count = context.state.get("count").and_then(Value::as_int).ok_or("missing count")?;
		Ok(Some(Description::host("span").with_child(Description::text(count.to_string()))))
	}
}

fn counter(probe: &Rc<Probe>) -> StatefulComponent {
	let probe = Rc::clone(probe);
	StatefulComponent::new("Counter", move |_| {
		probe.constructions.set(probe.constructions.get() + 1);
		Counter(Rc::clone(&probe))
	})
}

fn patch(count: i64) -> Update {
	let mut state = State::new();
	state.insert("count".into(), count.into());
	Update::State(state)
}

fn count(state: &State) -> Option<i64> {
	state.get("count").and_then(Value::as_int)
}

#[test]
fn initial_state_comes_from_props() {
	let probe = Rc::new(Probe::default());
	let (mut engine, container) = setup();
	engine.render(Description::stateful(&counter(&probe)).with_attribute("start", "7"), container).unwrap();
	engine.flush().unwrap();

	assert_eq!(engine.host().content(container), "<span>7</span>");
	let node = engine.node(probe.node.get().unwrap()).unwrap();
	assert_eq!(node.memoized_state().as_state().and_then(count), Some(7));
}

#[test]
fn queued_patches_apply_in_order() {
	let probe = Rc::new(Probe::default());
	let (mut engine, container) = setup();
	engine.render(Description::stateful(&counter(&probe)), container).unwrap();
	engine.flush().unwrap();
	assert_eq!(engine.host().content(container), "<span>0</span>");

	let node = probe.node.get().unwrap();
	engine.schedule_update(node, patch(1)).unwrap();
	engine.schedule_update(node, patch(2)).unwrap();
	assert_eq!(engine.phase(), Phase::Idle);
	assert_eq!(engine.node(node).unwrap().update_queue().len(), 2);

	let renders = probe.renders.get();
	engine.flush().unwrap();
	assert_eq!(probe.renders.get(), renders + 1);

	let current = engine.node(probe.node.get().unwrap()).unwrap();
	assert_eq!(current.memoized_state().as_state().and_then(count), Some(2));
	assert!(current.update_queue().is_empty());
	assert!(engine.node(node).unwrap().update_queue().is_empty());
	assert_eq!(engine.host().content(container), "<span>2</span>");
}

struct Labelled(Rc<Cell<Option<NodeId>>>);
impl Component for Labelled {
	fn render(&self, context: &RenderContext<'_>) -> Result<Option<Description>, ComponentError> {
		self.0.set(Some(context.node));
		let label = context.state.get("label").and_then(Value::as_str).unwrap_or("?");
		let count = context.state.get("count").and_then(Value::as_int).unwrap_or_default();
		Ok(Some(Description::text(format!("{}: {}", label, count))))
	}
}

#[test]
fn patches_merge_key_by_key() {
	let node = Rc::new(Cell::new(None));
	let labelled = {
		let node = Rc::clone(&node);
		StatefulComponent::new("Labelled", move |_| Labelled(Rc::clone(&node)))
	};

	let (mut engine, container) = setup();
	engine.render(Description::host("p").with_child(Description::stateful(&labelled)), container).unwrap();
	engine.flush().unwrap();
	assert_eq!(engine.host().content(container), "<p>?: 0</p>");

	let mut label = State::new();
	label.insert("label".into(), "clicks".into());
	engine.schedule_update(node.get().unwrap(), Update::State(label)).unwrap();
	engine.schedule_update(node.get().unwrap(), patch(3)).unwrap();
	engine.flush().unwrap();
	assert_eq!(engine.host().content(container), "<p>clicks: 3</p>");
}

#[test]
fn updates_during_render_wait_for_next_pass() {
	let probe = Rc::new(Probe::default());
	let (mut engine, container) = setup();
	engine.render(Description::stateful(&counter(&probe)), container).unwrap();
	engine.flush().unwrap();

	let node = probe.node.get().unwrap();
	engine.schedule_update(node, patch(1)).unwrap();
	assert_eq!(engine.step().unwrap(), Phase::Rendering);

	engine.schedule_update(node, patch(5)).unwrap();
	assert_eq!(engine.node(node).unwrap().update_queue().len(), 1);
	assert!(engine.has_pending_work());

	let renders = probe.renders.get();
	engine.flush().unwrap();
	assert_eq!(probe.renders.get(), renders + 2);
	assert_eq!(engine.host().content(container), "<span>5</span>");
	assert!(!engine.has_pending_work());
}

#[test]
fn any_generation_handle_reaches_current_node() {
	let probe = Rc::new(Probe::default());
	let (mut engine, container) = setup();
	engine.render(Description::stateful(&counter(&probe)), container).unwrap();
	engine.flush().unwrap();
	let first = probe.node.get().unwrap();

	engine.schedule_update(first, patch(1)).unwrap();
	engine.flush().unwrap();
	let second = probe.node.get().unwrap();
	assert_ne!(first, second);
	assert!(!engine.node(first).unwrap().is_current());
	assert!(engine.node(second).unwrap().is_current());

	engine.schedule_update(first, patch(2)).unwrap();
	engine.flush().unwrap();
	assert_eq!(engine.host().content(container), "<span>2</span>");

	engine.schedule_update(second, patch(3)).unwrap();
	engine.flush().unwrap();
	assert_eq!(engine.host().content(container), "<span>3</span>");
}

#[test]
fn instance_outlives_renders() {
	let probe = Rc::new(Probe::default());
	let counter = counter(&probe);
	let (mut engine, container) = setup();

	for i in 0..3 {
		engine.render(Description::host("div").with_child(Description::stateful(&counter)), container).unwrap();
		engine.flush().unwrap();
		engine.schedule_update(probe.node.get().unwrap(), patch(i)).unwrap();
		engine.flush().unwrap();
	}
	assert_eq!(probe.constructions.get(), 1);
	assert_eq!(engine.host().content(container), "<div><span>2</span></div>");
}

#[test]
fn deleted_node_is_stale() {
	let probe = Rc::new(Probe::default());
	let counter = counter(&probe);
	let (mut engine, container) = setup();
	engine.render(Description::host("div").with_child(Description::stateful(&counter)), container).unwrap();
	engine.flush().unwrap();
	let node = probe.node.get().unwrap();

	engine.render(Description::host("div"), container).unwrap();
	engine.flush().unwrap();
	assert!(!engine.tree().contains(node));

	match engine.schedule_update(node, patch(1)) {
		Err(EngineError::StaleNode(stale)) => assert_eq!(stale, node),
		other => panic!("Expected a stale node error, got {:?}", other),
	}
	assert!(!engine.has_pending_work());
}

#[test]
fn function_component_renders_from_props() {
	let greeting = FunctionComponent::new("Greeting", |props| Ok(Some(Description::text(format!("Hello, {}!", props.attribute("name").unwrap_or("world"))))));
	let (mut engine, container) = setup();

	engine.render(Description::host("h1").with_child(Description::function(&greeting).with_attribute("name", "Ferris")), container).unwrap();
	engine.flush().unwrap();
	assert_eq!(engine.host().content(container), "<h1>Hello, Ferris!</h1>");
	engine.host_mut().take_calls();

	engine.render(Description::host("h1").with_child(Description::function(&greeting)), container).unwrap();
	engine.flush().unwrap();
	assert_eq!(engine.host().content(container), "<h1>Hello, world!</h1>");
	assert!(engine.host().calls.iter().all(|call| matches!(call, Call::Apply { .. })));
	assert_eq!(engine.host().calls.len(), 1);
}

#[test]
fn component_error_aborts_pass() {
	let broken = FunctionComponent::new("Broken", |_| Err("boom".into()));
	let (mut engine, container) = setup();
	engine.render(Description::host("p").with_child(Description::text("fine")), container).unwrap();
	engine.flush().unwrap();
	let root = engine.roots()[0];
	let nodes = engine.tree().len();
	engine.host_mut().take_calls();

	engine.render(Description::host("div").with_child(Description::function(&broken)), container).unwrap();
	match engine.flush() {
		Err(EngineError::Component { component, source }) => {
			assert_eq!(component, "Broken");
			assert_eq!(source.to_string(), "boom");
		}
		other => panic!("Expected a component error, got {:?}", other),
	}

	assert_eq!(engine.phase(), Phase::Idle);
	assert_eq!(engine.roots(), [root]);
	assert!(engine.host().calls.is_empty());
	assert_eq!(engine.host().content(container), "<p>fine</p>");
	// The root's alternate stays allocated for reuse.
	assert_eq!(engine.tree().len(), nodes + 1);

	engine.render(Description::host("p").with_child(Description::text("recovered")), container).unwrap();
	engine.flush().unwrap();
	assert_eq!(engine.host().content(container), "<p>recovered</p>");
}

#[test]
fn failed_first_render_can_be_retried() {
	let broken = FunctionComponent::new("Broken", |_| Err("boom".into()));
	let (mut engine, container) = setup();

	engine.render(Description::function(&broken), container).unwrap();
	assert!(matches!(engine.flush(), Err(EngineError::Component { .. })));
	assert_eq!(engine.tree().len(), 1);
	assert_eq!(engine.host().content(container), "");

	engine.render(Description::text("second try"), container).unwrap();
	engine.flush().unwrap();
	assert_eq!(engine.host().content(container), "second try");
}
