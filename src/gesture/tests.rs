//! Unit tests for the gesture controller and context menu

use crate::config::Mode;
use crate::fsm::{Automaton, EdgeId, NodeId, SymbolMask};
use crate::geometry::{Canvas, HitTarget, Point};
use crate::gesture::*;

fn canvas() -> Canvas {
    Canvas::new(800.0, 600.0)
}

fn nfa(symbols: &[&str]) -> Automaton {
    Automaton::with_alphabet(Mode::NonDeterministic, false, symbols.iter().copied())
}

fn down(x: f32, y: f32, target: HitTarget) -> PointerEvent {
    PointerEvent::Down {
        button: Button::Primary,
        pos: Point::new(x, y),
        target,
    }
}

fn up(x: f32, y: f32, target: HitTarget) -> PointerEvent {
    PointerEvent::Up {
        button: Button::Primary,
        pos: Point::new(x, y),
        target,
    }
}

fn moved(x: f32, y: f32, target: HitTarget) -> PointerEvent {
    PointerEvent::Move {
        pos: Point::new(x, y),
        target,
    }
}

/// Two states with a two-symbol transition 0 -> 1.
fn with_edge() -> (Automaton, NodeId, EdgeId) {
    let mut automaton = nfa(&["a", "b"]);
    let q1 = automaton.add_node(400.0, 240.0);
    let id = automaton
        .add_or_merge_edge(NodeId(0), q1, SymbolMask::from_bits(vec![true, true]))
        .unwrap();
    (automaton, q1, id)
}

#[test]
fn test_click_on_canvas_adds_node() {
    let automaton = nfa(&["a"]);
    let mut controller = GestureController::new(canvas());
    let transition = controller.handle(&automaton, down(300.0, 100.0, HitTarget::Canvas));
    assert_eq!(transition.commands, vec![Command::AddNode { x: 300.0, y: 100.0 }]);
    assert_eq!(controller.gesture(), &Gesture::Idle);
}

#[test]
fn test_click_over_trash_adds_nothing() {
    let automaton = nfa(&["a"]);
    let mut controller = GestureController::new(canvas());
    let transition = controller.handle(&automaton, down(780.0, 580.0, HitTarget::Canvas));
    assert!(transition.commands.is_empty());
    let transition = controller.handle(&automaton, down(780.0, 580.0, HitTarget::Trash));
    assert!(transition.commands.is_empty());
}

#[test]
fn test_clear_button_resets() {
    let automaton = nfa(&["a"]);
    let mut controller = GestureController::new(canvas());
    let transition = controller.handle(&automaton, down(750.0, 10.0, HitTarget::ClearButton));
    assert_eq!(transition.commands, vec![Command::Reset]);
}

#[test]
fn test_secondary_button_ignored() {
    let automaton = nfa(&["a"]);
    let mut controller = GestureController::new(canvas());
    let transition = controller.handle(
        &automaton,
        PointerEvent::Down {
            button: Button::Secondary,
            pos: Point::new(300.0, 100.0),
            target: HitTarget::Canvas,
        },
    );
    assert_eq!(transition, Transition::default());
    assert_eq!(controller.gesture(), &Gesture::Idle);
}

#[test]
fn test_node_follows_pointer_keeping_grab_offset() {
    let automaton = nfa(&["a"]);
    let mut controller = GestureController::new(canvas());
    controller.handle(&automaton, down(205.0, 245.0, HitTarget::Node(NodeId(0))));
    assert_eq!(
        controller.gesture(),
        &Gesture::DraggingNode { node: NodeId(0), offset: Point::new(5.0, 5.0) }
    );

    let transition = controller.handle(&automaton, moved(305.0, 345.0, HitTarget::Node(NodeId(0))));
    assert_eq!(
        transition.commands,
        vec![Command::MoveNode { node: NodeId(0), x: 300.0, y: 340.0 }]
    );
}

#[test]
fn test_node_drag_cancelled_at_border() {
    let automaton = nfa(&["a"]);
    let mut controller = GestureController::new(canvas());
    controller.handle(&automaton, down(200.0, 240.0, HitTarget::Node(NodeId(0))));

    let transition = controller.handle(&automaton, moved(3.0, 240.0, HitTarget::Canvas));
    assert!(transition.commands.is_empty());
    assert_eq!(controller.gesture(), &Gesture::Idle);

    // Further moves no longer drag.
    let transition = controller.handle(&automaton, moved(100.0, 240.0, HitTarget::Canvas));
    assert!(transition.commands.is_empty());
}

#[test]
fn test_node_dropped_on_trash_is_removed() {
    let mut automaton = nfa(&["a"]);
    let q1 = automaton.add_node(400.0, 240.0);
    let mut controller = GestureController::new(canvas());
    controller.handle(&automaton, down(400.0, 240.0, HitTarget::Node(q1)));
    let transition = controller.handle(&automaton, up(790.0, 590.0, HitTarget::Trash));
    assert_eq!(transition.commands, vec![Command::RemoveNode(q1)]);
    assert_eq!(transition.feedback, None);
    assert_eq!(controller.gesture(), &Gesture::Idle);
}

#[test]
fn test_initial_node_on_trash_warns() {
    let automaton = nfa(&["a"]);
    let mut controller = GestureController::new(canvas());
    controller.handle(&automaton, down(200.0, 240.0, HitTarget::Node(NodeId(0))));
    let transition = controller.handle(&automaton, up(790.0, 590.0, HitTarget::Trash));
    assert_eq!(transition.commands, vec![Command::ResetNodePosition(NodeId(0))]);
    assert_eq!(
        transition.feedback,
        Some(Feedback::Warning("Cannot delete initial node".to_string()))
    );
}

#[test]
fn test_node_drop_elsewhere_keeps_position() {
    let automaton = nfa(&["a"]);
    let mut controller = GestureController::new(canvas());
    controller.handle(&automaton, down(200.0, 240.0, HitTarget::Node(NodeId(0))));
    let transition = controller.handle(&automaton, up(300.0, 240.0, HitTarget::Canvas));
    assert!(transition.commands.is_empty());
    assert_eq!(controller.gesture(), &Gesture::Idle);
}

#[test]
fn test_hover_menu_opens_and_closes() {
    let automaton = nfa(&["a"]);
    let mut controller = GestureController::new(canvas());

    controller.handle(&automaton, moved(200.0, 240.0, HitTarget::Node(NodeId(0))));
    assert_eq!(controller.gesture(), &Gesture::HoverMenuOpen { node: NodeId(0) });
    assert_eq!(controller.menu_node(), Some(NodeId(0)));
    assert_eq!(controller.hover().node, Some(NodeId(0)));

    controller.handle(
        &automaton,
        moved(200.0, 215.0, HitTarget::MenuSymbol { node: NodeId(0), symbol: 0 }),
    );
    assert_eq!(controller.gesture(), &Gesture::HoverMenuOpen { node: NodeId(0) });

    controller.handle(&automaton, moved(200.0, 272.0, HitTarget::MenuRing(NodeId(0))));
    assert_eq!(controller.gesture(), &Gesture::HoverMenuOpen { node: NodeId(0) });

    controller.handle(&automaton, moved(400.0, 400.0, HitTarget::Canvas));
    assert_eq!(controller.gesture(), &Gesture::Idle);
    assert_eq!(controller.hover(), &Hover::default());
}

#[test]
fn test_no_hover_menu_in_deterministic_mode() {
    let automaton = Automaton::with_alphabet(Mode::Deterministic, false, ["a"]);
    let mut controller = GestureController::new(canvas());
    controller.handle(&automaton, moved(200.0, 240.0, HitTarget::Node(NodeId(0))));
    assert_eq!(controller.gesture(), &Gesture::Idle);
    assert_eq!(controller.hover().node, Some(NodeId(0)));

    let transition = controller.handle(
        &automaton,
        down(200.0, 215.0, HitTarget::MenuSymbol { node: NodeId(0), symbol: 0 }),
    );
    assert!(transition.commands.is_empty());
    assert_eq!(controller.gesture(), &Gesture::Idle);
}

#[test]
fn test_hover_never_opens_menu_while_dragging() {
    let (automaton, q1, _) = with_edge();
    let mut controller = GestureController::new(canvas());
    controller.handle(&automaton, down(200.0, 240.0, HitTarget::Node(NodeId(0))));
    controller.handle(&automaton, moved(400.0, 240.0, HitTarget::Node(q1)));
    assert!(matches!(controller.gesture(), Gesture::DraggingNode { .. }));
}

#[test]
fn test_new_edge_from_menu_symbol() {
    let mut automaton = nfa(&["a", "b"]);
    let q1 = automaton.add_node(400.0, 240.0);
    let mut controller = GestureController::new(canvas());

    controller.handle(&automaton, moved(200.0, 240.0, HitTarget::Node(NodeId(0))));
    let transition = controller.handle(
        &automaton,
        down(210.0, 215.0, HitTarget::MenuSymbol { node: NodeId(0), symbol: 1 }),
    );
    assert!(transition.commands.is_empty());
    assert_eq!(
        controller.gesture(),
        &Gesture::DraggingNewEdge { source: NodeId(0), mask: SymbolMask::single(2, 1) }
    );

    controller.handle(&automaton, moved(400.0, 240.0, HitTarget::Node(q1)));
    let transition = controller.handle(&automaton, up(400.0, 240.0, HitTarget::Node(q1)));
    assert_eq!(
        transition.commands,
        vec![Command::InsertEdge { source: NodeId(0), target: q1, mask: SymbolMask::single(2, 1) }]
    );
    assert_eq!(controller.gesture(), &Gesture::Idle);
}

#[test]
fn test_new_edge_dropped_on_canvas_is_discarded() {
    let automaton = nfa(&["a"]);
    let mut controller = GestureController::new(canvas());
    controller.handle(
        &automaton,
        down(200.0, 215.0, HitTarget::MenuSymbol { node: NodeId(0), symbol: 0 }),
    );
    let transition = controller.handle(&automaton, up(500.0, 300.0, HitTarget::Canvas));
    assert!(transition.commands.is_empty());
    assert_eq!(controller.gesture(), &Gesture::Idle);
}

#[test]
fn test_label_drag_detaches_and_retargets() {
    let (automaton, q1, id) = with_edge();
    let mut controller = GestureController::new(canvas());

    let transition = controller.handle(&automaton, down(300.0, 226.0, HitTarget::EdgeLabel(id)));
    assert_eq!(transition.commands, vec![Command::DetachEdge(id)]);
    assert_eq!(
        controller.gesture(),
        &Gesture::DraggingExistingEdge {
            source: NodeId(0),
            original_target: q1,
            mask: SymbolMask::from_bits(vec![true, true]),
        }
    );

    let transition = controller.handle(&automaton, up(200.0, 240.0, HitTarget::Node(NodeId(0))));
    assert_eq!(
        transition.commands,
        vec![Command::InsertEdge {
            source: NodeId(0),
            target: NodeId(0),
            mask: SymbolMask::from_bits(vec![true, true]),
        }]
    );
}

#[test]
fn test_label_drag_on_canvas_returns_home() {
    let (automaton, q1, id) = with_edge();
    let mut controller = GestureController::new(canvas());
    controller.handle(&automaton, down(300.0, 226.0, HitTarget::EdgeLabel(id)));
    let transition = controller.handle(&automaton, up(500.0, 100.0, HitTarget::Canvas));
    assert_eq!(
        transition.commands,
        vec![Command::InsertEdge {
            source: NodeId(0),
            target: q1,
            mask: SymbolMask::from_bits(vec![true, true]),
        }]
    );
}

#[test]
fn test_label_drag_on_trash_discards() {
    let (automaton, _, id) = with_edge();
    let mut controller = GestureController::new(canvas());
    controller.handle(&automaton, down(300.0, 226.0, HitTarget::EdgeLabel(id)));
    let transition = controller.handle(&automaton, up(790.0, 590.0, HitTarget::Trash));
    assert!(transition.commands.is_empty());
    assert_eq!(controller.gesture(), &Gesture::Idle);
}

#[test]
fn test_deterministic_trash_returns_payload() {
    let automaton = Automaton::with_alphabet(Mode::Deterministic, false, ["a"]);
    let (id, _) = automaton.edges().next().unwrap();
    let mut controller = GestureController::new(canvas());

    controller.handle(&automaton, down(200.0, 180.0, HitTarget::EdgeLabel(id)));
    let transition = controller.handle(&automaton, up(790.0, 590.0, HitTarget::Trash));
    assert_eq!(
        transition.commands,
        vec![Command::InsertEdge {
            source: NodeId(0),
            target: NodeId(0),
            mask: SymbolMask::single(1, 0),
        }]
    );

    controller.handle(&automaton, down(200.0, 200.0, HitTarget::EdgeBody(id)));
    let transition = controller.handle(&automaton, up(790.0, 590.0, HitTarget::Trash));
    assert_eq!(
        transition.commands,
        vec![Command::InsertGroup {
            source: NodeId(0),
            target: NodeId(0),
            mask: SymbolMask::single(1, 0),
        }]
    );
}

#[test]
fn test_body_drag_carries_pair_union() {
    let mut automaton = nfa(&["a", "b", "c"]);
    let q1 = automaton.add_node(400.0, 240.0);
    let ids = automaton.add_edge_group(NodeId(0), q1, &SymbolMask::from_bits(vec![true, false, true]));
    let mut controller = GestureController::new(canvas());

    let transition = controller.handle(&automaton, down(300.0, 250.0, HitTarget::EdgeBody(ids[0])));
    assert_eq!(
        transition.commands,
        vec![Command::DetachGroup { source: NodeId(0), target: q1 }]
    );
    let mask = SymbolMask::from_bits(vec![true, false, true]);
    assert_eq!(
        controller.gesture(),
        &Gesture::DraggingEdgeGroup { source: NodeId(0), original_target: q1, mask: mask.clone() }
    );

    let transition = controller.handle(&automaton, up(200.0, 240.0, HitTarget::Node(NodeId(0))));
    assert_eq!(
        transition.commands,
        vec![Command::InsertGroup { source: NodeId(0), target: NodeId(0), mask }]
    );
}

#[test]
fn test_body_drag_on_trash_discards() {
    let (automaton, _, id) = with_edge();
    let mut controller = GestureController::new(canvas());
    controller.handle(&automaton, down(300.0, 240.0, HitTarget::EdgeBody(id)));
    let transition = controller.handle(&automaton, up(780.0, 580.0, HitTarget::Canvas));
    assert!(transition.commands.is_empty());
}

#[test]
fn test_double_click_toggles_accepting() {
    let automaton = nfa(&["a"]);
    let mut controller = GestureController::new(canvas());
    let transition = controller.handle(
        &automaton,
        PointerEvent::DoubleClick { pos: Point::new(200.0, 240.0), target: HitTarget::Node(NodeId(0)) },
    );
    assert_eq!(transition.commands, vec![Command::ToggleAccepting(NodeId(0))]);
}

#[test]
fn test_down_ignored_while_dragging() {
    let (automaton, _, id) = with_edge();
    let mut controller = GestureController::new(canvas());
    controller.handle(&automaton, down(300.0, 226.0, HitTarget::EdgeLabel(id)));
    let transition = controller.handle(&automaton, down(500.0, 100.0, HitTarget::Canvas));
    assert!(transition.commands.is_empty());
    assert!(controller.gesture().is_dragging());
}

#[test]
fn test_menu_keywords() {
    for action in MenuAction::ALL {
        assert_eq!(action.keyword().parse::<MenuAction>(), Ok(action));
    }
    assert_eq!("non-final".parse::<MenuAction>(), Ok(MenuAction::NonFinal));
    assert_eq!(
        "explode".parse::<MenuAction>(),
        Err(UnknownAction("explode".to_string()))
    );
}

#[test]
fn test_menu_for_nodes() {
    let mut automaton = nfa(&["a"]);
    let q1 = automaton.add_node(400.0, 240.0);

    let initial = Hover { node: Some(NodeId(0)), ..Hover::default() };
    assert_eq!(enabled_menu_actions(&automaton, &initial), vec![MenuAction::Final]);

    automaton.toggle_accepting(q1).unwrap();
    automaton.add_or_merge_edge(q1, q1, SymbolMask::single(1, 0)).unwrap();
    crate::layout::resolve(&mut automaton);
    let other = Hover { node: Some(q1), ..Hover::default() };
    assert_eq!(
        enabled_menu_actions(&automaton, &other),
        vec![MenuAction::NonFinal, MenuAction::Flip, MenuAction::Remove, MenuAction::Init]
    );

    assert_eq!(enabled_menu_actions(&automaton, &Hover::default()), vec![MenuAction::Add]);
}

#[test]
fn test_menu_for_edges() {
    let (mut automaton, _, id) = with_edge();
    let loop_id = automaton
        .add_or_merge_edge(NodeId(0), NodeId(0), SymbolMask::single(2, 0))
        .unwrap();

    let label = |edge| Hover { node: None, edge: Some(edge), over_label: true };
    let body = |edge| Hover { node: None, edge: Some(edge), over_label: false };

    assert_eq!(enabled_menu_actions(&automaton, &label(id)), vec![MenuAction::RemoveEdgeLabel]);
    assert_eq!(
        enabled_menu_actions(&automaton, &label(loop_id)),
        vec![MenuAction::RemoveEdgeLabel, MenuAction::FlipEdge]
    );
    assert_eq!(enabled_menu_actions(&automaton, &body(id)), vec![MenuAction::RemoveEdge]);
    assert_eq!(
        enabled_menu_actions(&automaton, &body(loop_id)),
        vec![MenuAction::RemoveEdge, MenuAction::FlipEdge]
    );
}

#[test]
fn test_menu_for_deterministic_edges() {
    let mut automaton = Automaton::with_alphabet(Mode::Deterministic, false, ["a", "b"]);
    let q1 = automaton.add_node(400.0, 240.0);
    automaton.remove_edge_group(NodeId(0), NodeId(0));
    let across = automaton
        .add_or_merge_edge(NodeId(0), q1, SymbolMask::from_bits(vec![true, true]))
        .unwrap();
    let (loop_id, _) = automaton.edges().find(|(_, edge)| edge.is_reflexive()).unwrap();

    for over_label in [true, false] {
        let on_loop = Hover { node: None, edge: Some(loop_id), over_label };
        assert_eq!(enabled_menu_actions(&automaton, &on_loop), vec![MenuAction::FlipEdge]);
        let on_across = Hover { node: None, edge: Some(across), over_label };
        assert!(enabled_menu_actions(&automaton, &on_across).is_empty());
    }
}

#[test]
fn test_menu_commands() {
    let (mut automaton, q1, id) = with_edge();
    let loop_id = automaton
        .add_or_merge_edge(q1, q1, SymbolMask::single(2, 0))
        .unwrap();
    crate::layout::resolve(&mut automaton);
    let at = Point::new(50.0, 60.0);
    let node = Hover { node: Some(q1), ..Hover::default() };
    let label = Hover { node: None, edge: Some(id), over_label: true };
    let body = Hover { node: None, edge: Some(id), over_label: false };
    let on_loop = Hover { node: None, edge: Some(loop_id), over_label: true };

    assert_eq!(
        menu_commands(&automaton, MenuAction::Add, &Hover::default(), at),
        vec![Command::AddNode { x: 50.0, y: 60.0 }]
    );
    assert_eq!(menu_commands(&automaton, MenuAction::Remove, &node, at), vec![Command::RemoveNode(q1)]);
    assert_eq!(menu_commands(&automaton, MenuAction::Final, &node, at), vec![Command::ToggleAccepting(q1)]);
    assert_eq!(menu_commands(&automaton, MenuAction::Init, &node, at), vec![Command::SetInitial(q1)]);
    assert_eq!(menu_commands(&automaton, MenuAction::Flip, &node, at), vec![Command::ToggleFlip(q1)]);
    assert_eq!(
        menu_commands(&automaton, MenuAction::FlipEdge, &on_loop, at),
        vec![Command::ToggleFlip(q1)]
    );
    assert_eq!(
        menu_commands(&automaton, MenuAction::RemoveEdge, &body, at),
        vec![Command::RemoveEdgeGroup { source: NodeId(0), target: q1 }]
    );
    assert_eq!(menu_commands(&automaton, MenuAction::RemoveEdgeLabel, &label, at), vec![Command::RemoveEdge(id)]);
}

#[test]
fn test_menu_commands_ignore_unoffered_actions() {
    let (automaton, q1, id) = with_edge();
    let at = Point::new(50.0, 60.0);
    let initial = Hover { node: Some(NodeId(0)), ..Hover::default() };
    let label = Hover { node: None, edge: Some(id), over_label: true };

    assert!(menu_commands(&automaton, MenuAction::Remove, &Hover::default(), at).is_empty());
    assert!(menu_commands(&automaton, MenuAction::Remove, &initial, at).is_empty());
    assert!(menu_commands(&automaton, MenuAction::NonFinal, &Hover { node: Some(q1), ..Hover::default() }, at).is_empty());
    assert!(menu_commands(&automaton, MenuAction::RemoveEdge, &label, at).is_empty());
    assert!(menu_commands(&automaton, MenuAction::FlipEdge, &label, at).is_empty());
}

#[test]
fn test_deterministic_menu_cannot_remove_transitions() {
    let mut automaton = Automaton::with_alphabet(Mode::Deterministic, false, ["a", "b"]);
    automaton.add_node(400.0, 240.0);
    let (loop_id, _) = automaton.edges().find(|(_, edge)| edge.is_reflexive()).unwrap();
    let at = Point::new(0.0, 0.0);

    for over_label in [true, false] {
        let hover = Hover { node: None, edge: Some(loop_id), over_label };
        assert!(menu_commands(&automaton, MenuAction::RemoveEdge, &hover, at).is_empty());
        assert!(menu_commands(&automaton, MenuAction::RemoveEdgeLabel, &hover, at).is_empty());
    }
}
