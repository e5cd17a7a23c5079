use fiber_dom::{Description, EffectTag, Engine, EngineError, NodeId, Phase};

use recording_host_::{render_until_commit, setup, Call, RecordingHost};

fn list(ids: &[&'static str]) -> Description {
	Description::host("ul").with_children(ids.iter().map(|&id| Description::host("li").with_attribute("id", id)))
}

fn keyed_list(keys: &[&'static str]) -> Description {
	Description::host("ul").with_children(keys.iter().map(|&key| Description::host("li").with_key(key).with_attribute("id", key)))
}

/// The `ul` below `root` and its children.
fn list_nodes(engine: &Engine<RecordingHost>, root: NodeId) -> (NodeId, Vec<NodeId>) {
	let ul = engine.tree().children(root).next().unwrap();
	(ul, engine.tree().children(ul).collect())
}

fn effect_tags(engine: &Engine<RecordingHost>, nodes: &[NodeId]) -> Vec<EffectTag> {
	nodes.iter().map(|&node| engine.node(node).unwrap().effect_tag()).collect()
}

#[test]
fn surplus_old_children_are_deleted() {
	let (mut engine, container) = setup();
	engine.render(list(&["a", "b", "c"]), container).unwrap();
	engine.flush().unwrap();

	let (old_ul, old) = list_nodes(&engine, engine.roots()[0]);
	let ul_host = *engine.node(old_ul).unwrap().host().unwrap();
	engine.host_mut().take_calls();

	engine.render(list(&["x"]), container).unwrap();
	render_until_commit(&mut engine);

	let (_, new) = list_nodes(&engine, engine.in_progress_root().unwrap());
	assert_eq!(effect_tags(&engine, &new), [EffectTag::Update]);
	assert_eq!(engine.node(new[0]).unwrap().alternate(), Some(old[0]));
	assert_eq!(engine.deletions(), &old[1..]);
	assert_eq!(effect_tags(&engine, &old[1..]), [EffectTag::Deletion, EffectTag::Deletion]);

	assert_eq!(engine.step().unwrap(), Phase::Idle);
	assert_eq!(engine.host().count(|call| matches!(call, Call::Remove { parent, .. } if *parent == ul_host)), 2);
	assert_eq!(engine.host().content(container), r#"<ul><li id="x"></li></ul>"#);
	assert!(!engine.tree().contains(old[1]));
	assert!(!engine.tree().contains(old[2]));
}

#[test]
fn new_children_are_placed_in_order() {
	let (mut engine, container) = setup();
	engine.render(list(&[]), container).unwrap();
	engine.flush().unwrap();

	let (old_ul, old) = list_nodes(&engine, engine.roots()[0]);
	assert!(old.is_empty());
	let ul_host = *engine.node(old_ul).unwrap().host().unwrap();
	engine.host_mut().take_calls();

	engine.render(list(&["x", "y"]), container).unwrap();
	render_until_commit(&mut engine);

	let (ul, new) = list_nodes(&engine, engine.in_progress_root().unwrap());
	assert_eq!(engine.node(ul).unwrap().effect_tag(), EffectTag::Update);
	assert_eq!(effect_tags(&engine, &new), [EffectTag::Placement, EffectTag::Placement]);
	assert!(new.iter().all(|&node| engine.node(node).unwrap().alternate().is_none()));
	assert!(engine.deletions().is_empty());

	engine.step().unwrap();
	let indices = engine
		.host()
		.calls
		.iter()
		.filter_map(|call| match *call {
			Call::Insert { parent, index, .. } if parent == ul_host => Some(index),
			_ => None,
		})
		.collect::<Vec<_>>();
	assert_eq!(indices, [0, 1]);
	assert_eq!(engine.host().content(container), r#"<ul><li id="x"></li><li id="y"></li></ul>"#);
}

#[test]
fn swapped_keyed_siblings_are_replaced() {
	let (mut engine, container) = setup();
	engine.render(keyed_list(&["x", "y"]), container).unwrap();
	engine.flush().unwrap();

	let (_, old) = list_nodes(&engine, engine.roots()[0]);
	engine.host_mut().take_calls();

	engine.render(keyed_list(&["y", "x"]), container).unwrap();
	render_until_commit(&mut engine);

	let (_, new) = list_nodes(&engine, engine.in_progress_root().unwrap());
	assert_eq!(effect_tags(&engine, &new), [EffectTag::Placement, EffectTag::Placement]);
	assert_eq!(engine.deletions(), &old[..]);
	assert_eq!(effect_tags(&engine, &old), [EffectTag::Deletion, EffectTag::Deletion]);

	engine.step().unwrap();
	assert_eq!(engine.host().count(|call| matches!(call, Call::Remove { .. })), 2);
	assert_eq!(engine.host().count(|call| matches!(call, Call::Insert { .. })), 2);
	assert_eq!(engine.host().content(container), r#"<ul><li id="y"></li><li id="x"></li></ul>"#);
}

#[test]
fn matching_keys_in_place_are_reused() {
	let (mut engine, container) = setup();
	engine.render(keyed_list(&["x", "y"]), container).unwrap();
	engine.flush().unwrap();

	let (_, old) = list_nodes(&engine, engine.roots()[0]);

	engine.render(keyed_list(&["x", "y", "z"]), container).unwrap();
	render_until_commit(&mut engine);

	let (_, new) = list_nodes(&engine, engine.in_progress_root().unwrap());
	assert_eq!(effect_tags(&engine, &new), [EffectTag::Update, EffectTag::Update, EffectTag::Placement]);
	assert_eq!(engine.node(new[0]).unwrap().alternate(), Some(old[0]));
	assert_eq!(engine.node(new[1]).unwrap().alternate(), Some(old[1]));
	assert_eq!(engine.node(new[2]).unwrap().key(), Some("z"));
	assert!(engine.deletions().is_empty());

	engine.flush().unwrap();
	assert_eq!(engine.host().content(container), r#"<ul><li id="x"></li><li id="y"></li><li id="z"></li></ul>"#);
}

#[test]
fn changed_type_replaces_node() {
	let (mut engine, container) = setup();
	engine.render(Description::host("div").with_child(Description::host("p")), container).unwrap();
	engine.flush().unwrap();

	let div = engine.tree().children(engine.roots()[0]).next().unwrap();
	let p = engine.tree().children(div).next().unwrap();

	engine.render(Description::host("div").with_child(Description::host("pre")), container).unwrap();
	render_until_commit(&mut engine);

	let new_div = engine.tree().children(engine.in_progress_root().unwrap()).next().unwrap();
	let new = engine.tree().children(new_div).collect::<Vec<_>>();
	assert_eq!(effect_tags(&engine, &new), [EffectTag::Placement]);
	assert_eq!(engine.deletions(), [p]);

	engine.step().unwrap();
	assert_eq!(engine.host().content(container), "<div><pre></pre></div>");
}

#[test]
fn all_children_removed() {
	let (mut engine, container) = setup();
	engine.render(list(&["a", "b"]), container).unwrap();
	engine.flush().unwrap();

	let (_, old) = list_nodes(&engine, engine.roots()[0]);

	engine.render(list(&[]), container).unwrap();
	render_until_commit(&mut engine);

	let (_, new) = list_nodes(&engine, engine.in_progress_root().unwrap());
	assert!(new.is_empty());
	assert_eq!(engine.deletions(), &old[..]);

	engine.step().unwrap();
	assert_eq!(engine.host().content(container), "<ul></ul>");
}

#[test]
fn duplicate_keys_are_rejected() {
	let (mut engine, container) = setup();
	engine.render(keyed_list(&["a", "b", "a"]), container).unwrap();

	match engine.flush() {
		Err(EngineError::DuplicateKey { key }) => assert_eq!(key, "a"),
		other => panic!("Expected a duplicate key error, got {:?}", other),
	}
	assert_eq!(engine.phase(), Phase::Idle);
	assert!(engine.host().calls.is_empty());
	assert_eq!(engine.host().content(container), "");
}
