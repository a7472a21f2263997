//! Gesture Controller
//! Turns pointer event sequences into structural edits. The controller owns
//! the in-flight gesture and hover state; edits leave as `Command`s for the
//! editor to apply against the model.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::fsm::{Automaton, EdgeId, NodeId, SymbolMask};
use crate::geometry::{Canvas, HitTarget, Point};

#[cfg(test)]
mod tests;

pub const INITIAL_NODE_WARNING: &str = "Cannot delete initial node";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Secondary,
    Middle,
}

/// Pointer input, already hit-tested by the frontend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down {
        button: Button,
        pos: Point,
        target: HitTarget,
    },
    Move {
        pos: Point,
        target: HitTarget,
    },
    Up {
        button: Button,
        pos: Point,
        target: HitTarget,
    },
    DoubleClick {
        pos: Point,
        target: HitTarget,
    },
}

impl PointerEvent {
    pub fn pos(&self) -> Point {
        match *self {
            PointerEvent::Down { pos, .. }
            | PointerEvent::Move { pos, .. }
            | PointerEvent::Up { pos, .. }
            | PointerEvent::DoubleClick { pos, .. } => pos,
        }
    }
}

/// The gesture in progress
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    HoverMenuOpen {
        node: NodeId,
    },
    DraggingNode {
        node: NodeId,
        /// Pointer position relative to the node centre at grab time
        offset: Point,
    },
    DraggingNewEdge {
        source: NodeId,
        mask: SymbolMask,
    },
    DraggingExistingEdge {
        source: NodeId,
        original_target: NodeId,
        mask: SymbolMask,
    },
    DraggingEdgeGroup {
        source: NodeId,
        original_target: NodeId,
        mask: SymbolMask,
    },
}

impl Gesture {
    /// Source state and carried symbols of an edge being dragged.
    pub fn edge_payload(&self) -> Option<(NodeId, &SymbolMask)> {
        match self {
            Gesture::DraggingNewEdge { source, mask }
            | Gesture::DraggingExistingEdge { source, mask, .. }
            | Gesture::DraggingEdgeGroup { source, mask, .. } => Some((*source, mask)),
            _ => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        !matches!(self, Gesture::Idle | Gesture::HoverMenuOpen { .. })
    }
}

/// What the pointer is currently over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Hover {
    pub node: Option<NodeId>,
    pub edge: Option<EdgeId>,
    pub over_label: bool,
}

/// A model edit produced by a gesture or a context-menu action
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddNode { x: f32, y: f32 },
    MoveNode { node: NodeId, x: f32, y: f32 },
    RemoveNode(NodeId),
    /// Put a state back at the default position
    ResetNodePosition(NodeId),
    ToggleAccepting(NodeId),
    SetInitial(NodeId),
    ToggleFlip(NodeId),
    DetachEdge(EdgeId),
    DetachGroup { source: NodeId, target: NodeId },
    InsertEdge { source: NodeId, target: NodeId, mask: SymbolMask },
    InsertGroup { source: NodeId, target: NodeId, mask: SymbolMask },
    RemoveEdge(EdgeId),
    RemoveEdgeGroup { source: NodeId, target: NodeId },
    /// Back to a single initial state
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Warning(String),
}

/// Result of handling one pointer event
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transition {
    pub commands: Vec<Command>,
    pub feedback: Option<Feedback>,
}

impl Transition {
    fn none() -> Self {
        Self::default()
    }

    fn command(command: Command) -> Self {
        Self {
            commands: vec![command],
            feedback: None,
        }
    }
}

pub struct GestureController {
    canvas: Canvas,
    gesture: Gesture,
    hover: Hover,
    pointer: Option<Point>,
}

impl GestureController {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            gesture: Gesture::Idle,
            hover: Hover::default(),
            pointer: None,
        }
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn hover(&self) -> &Hover {
        &self.hover
    }

    pub fn pointer(&self) -> Option<Point> {
        self.pointer
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// The state whose hover menu is shown, if any.
    pub fn menu_node(&self) -> Option<NodeId> {
        match self.gesture {
            Gesture::HoverMenuOpen { node } => Some(node),
            _ => None,
        }
    }

    /// Drop any gesture in progress and forget hover state.
    pub fn reset(&mut self) {
        self.gesture = Gesture::Idle;
        self.hover = Hover::default();
    }

    pub fn handle(&mut self, automaton: &Automaton, event: PointerEvent) -> Transition {
        self.pointer = Some(event.pos());
        let transition = match event {
            PointerEvent::Down { button, pos, target } => {
                if button != Button::Primary {
                    return Transition::none();
                }
                self.pointer_down(automaton, pos, target)
            }
            PointerEvent::Move { pos, target } => self.pointer_move(automaton, pos, target),
            PointerEvent::Up { pos, target, .. } => self.pointer_up(automaton, pos, target),
            PointerEvent::DoubleClick { target, .. } => match target {
                HitTarget::Node(node) => Transition::command(Command::ToggleAccepting(node)),
                _ => Transition::none(),
            },
        };
        log::trace!("{:?} -> {:?}", event, self.gesture);
        transition
    }

    fn pointer_down(&mut self, automaton: &Automaton, pos: Point, target: HitTarget) -> Transition {
        if self.gesture.is_dragging() {
            return Transition::none();
        }

        match target {
            HitTarget::ClearButton => {
                self.reset();
                Transition::command(Command::Reset)
            }
            HitTarget::Trash | HitTarget::MenuRing(_) => Transition::none(),
            HitTarget::Canvas => {
                self.gesture = Gesture::Idle;
                if self.canvas.in_trash(pos) || self.canvas.in_clear_button(pos) {
                    return Transition::none();
                }
                Transition::command(Command::AddNode { x: pos.x, y: pos.y })
            }
            HitTarget::Node(node) => {
                let Some(state) = automaton.node(node) else {
                    return Transition::none();
                };
                self.gesture = Gesture::DraggingNode {
                    node,
                    offset: Point::new(pos.x - state.x, pos.y - state.y),
                };
                log::debug!("dragging state {}", node);
                Transition::none()
            }
            HitTarget::EdgeLabel(id) => {
                let Some(edge) = automaton.edge(id) else {
                    return Transition::none();
                };
                self.gesture = Gesture::DraggingExistingEdge {
                    source: edge.source,
                    original_target: edge.target,
                    mask: edge.symbols.clone(),
                };
                log::debug!("dragging transition {} -> {}", edge.source, edge.target);
                Transition::command(Command::DetachEdge(id))
            }
            HitTarget::EdgeBody(id) => {
                let Some(edge) = automaton.edge(id) else {
                    return Transition::none();
                };
                let (source, target) = (edge.source, edge.target);
                self.gesture = Gesture::DraggingEdgeGroup {
                    source,
                    original_target: target,
                    mask: automaton.pair_symbols(source, target),
                };
                log::debug!("dragging all transitions {} -> {}", source, target);
                Transition::command(Command::DetachGroup { source, target })
            }
            HitTarget::MenuSymbol { node, symbol } => {
                if automaton.mode().is_deterministic() || symbol >= automaton.alphabet().len() {
                    return Transition::none();
                }
                self.gesture = Gesture::DraggingNewEdge {
                    source: node,
                    mask: SymbolMask::single(automaton.alphabet().len(), symbol),
                };
                log::debug!("new transition from {} reading {:?}", node, automaton.alphabet().symbol(symbol));
                Transition::none()
            }
        }
    }

    fn pointer_move(&mut self, automaton: &Automaton, pos: Point, target: HitTarget) -> Transition {
        self.track_hover(target);

        match self.gesture.clone() {
            Gesture::DraggingNode { node, offset } => {
                let next = Point::new(pos.x - offset.x, pos.y - offset.y);
                if !self.canvas.contains(next) {
                    log::debug!("drag of state {} left the canvas", node);
                    self.gesture = Gesture::Idle;
                    return Transition::none();
                }
                Transition::command(Command::MoveNode {
                    node,
                    x: next.x,
                    y: next.y,
                })
            }
            Gesture::Idle | Gesture::HoverMenuOpen { .. } => {
                self.gesture = match target {
                    HitTarget::Node(node) if !automaton.mode().is_deterministic() => {
                        Gesture::HoverMenuOpen { node }
                    }
                    HitTarget::MenuSymbol { node, .. } | HitTarget::MenuRing(node)
                        if self.menu_node() == Some(node) =>
                    {
                        Gesture::HoverMenuOpen { node }
                    }
                    _ => Gesture::Idle,
                };
                Transition::none()
            }
            _ => Transition::none(),
        }
    }

    fn track_hover(&mut self, target: HitTarget) {
        self.hover = match target {
            HitTarget::Node(node) => Hover {
                node: Some(node),
                ..Hover::default()
            },
            HitTarget::EdgeLabel(edge) => Hover {
                node: None,
                edge: Some(edge),
                over_label: true,
            },
            HitTarget::EdgeBody(edge) => Hover {
                node: None,
                edge: Some(edge),
                over_label: false,
            },
            _ => Hover::default(),
        };
    }

    fn pointer_up(&mut self, automaton: &Automaton, pos: Point, target: HitTarget) -> Transition {
        let gesture = std::mem::take(&mut self.gesture);
        let over_trash = target == HitTarget::Trash || self.canvas.in_trash(pos);
        let deterministic = automaton.mode().is_deterministic();

        match gesture {
            Gesture::DraggingNode { node, .. } if over_trash => {
                let initial = automaton.node(node).is_some_and(|state| state.initial);
                if initial {
                    log::debug!("refused to delete initial state {}", node);
                    Transition {
                        commands: vec![Command::ResetNodePosition(node)],
                        feedback: Some(Feedback::Warning(INITIAL_NODE_WARNING.to_string())),
                    }
                } else {
                    Transition::command(Command::RemoveNode(node))
                }
            }
            Gesture::DraggingNewEdge { source, mask } => match target {
                HitTarget::Node(node) => Transition::command(Command::InsertEdge {
                    source,
                    target: node,
                    mask,
                }),
                _ => {
                    log::debug!("discarded new transition from {}", source);
                    Transition::none()
                }
            },
            Gesture::DraggingExistingEdge {
                source,
                original_target,
                mask,
            } => {
                let target = match target {
                    HitTarget::Node(node) => node,
                    _ if over_trash && !deterministic => {
                        log::debug!("trashed transition {} -> {}", source, original_target);
                        return Transition::none();
                    }
                    _ => original_target,
                };
                Transition::command(Command::InsertEdge { source, target, mask })
            }
            Gesture::DraggingEdgeGroup {
                source,
                original_target,
                mask,
            } => {
                let target = match target {
                    HitTarget::Node(node) => node,
                    _ if over_trash && !deterministic => {
                        log::debug!("trashed transitions {} -> {}", source, original_target);
                        return Transition::none();
                    }
                    _ => original_target,
                };
                Transition::command(Command::InsertGroup { source, target, mask })
            }
            Gesture::DraggingNode { .. } | Gesture::Idle | Gesture::HoverMenuOpen { .. } => {
                Transition::none()
            }
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown menu action {0}")]
pub struct UnknownAction(pub String);

/// Context menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuAction {
    Add,
    Remove,
    Final,
    NonFinal,
    Init,
    Flip,
    FlipEdge,
    RemoveEdge,
    RemoveEdgeLabel,
}

impl MenuAction {
    pub const ALL: [MenuAction; 9] = [
        MenuAction::Add,
        MenuAction::Remove,
        MenuAction::Final,
        MenuAction::NonFinal,
        MenuAction::Init,
        MenuAction::Flip,
        MenuAction::FlipEdge,
        MenuAction::RemoveEdge,
        MenuAction::RemoveEdgeLabel,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            MenuAction::Add => "add",
            MenuAction::Remove => "remove",
            MenuAction::Final => "final",
            MenuAction::NonFinal => "non-final",
            MenuAction::Init => "init",
            MenuAction::Flip => "flip",
            MenuAction::FlipEdge => "flip_edge",
            MenuAction::RemoveEdge => "remove_edge",
            MenuAction::RemoveEdgeLabel => "remove_edge_label",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            MenuAction::Add => "Add state",
            MenuAction::Remove => "Remove state",
            MenuAction::Final => "Make accepting",
            MenuAction::NonFinal => "Make non-accepting",
            MenuAction::Init => "Make initial",
            MenuAction::Flip => "Flip loops",
            MenuAction::FlipEdge => "Flip loop",
            MenuAction::RemoveEdge => "Remove transitions",
            MenuAction::RemoveEdgeLabel => "Remove transition",
        }
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for MenuAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MenuAction::ALL
            .into_iter()
            .find(|action| action.keyword() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// Menu entries that apply to what is hovered.
pub fn enabled_menu_actions(automaton: &Automaton, hover: &Hover) -> Vec<MenuAction> {
    let deterministic = automaton.mode().is_deterministic();

    if let Some(node) = hover.node.and_then(|id| automaton.node(id)) {
        let mut actions = vec![if node.accepting {
            MenuAction::NonFinal
        } else {
            MenuAction::Final
        }];
        if node.reflexive_count > 0 {
            actions.push(MenuAction::Flip);
        }
        if !node.initial {
            actions.extend([MenuAction::Remove, MenuAction::Init]);
        }
        return actions;
    }

    if let Some(edge) = hover.edge.and_then(|id| automaton.edge(id)) {
        let reflexive = edge.is_reflexive();
        return match (hover.over_label, deterministic, reflexive) {
            (true, false, true) => vec![MenuAction::RemoveEdgeLabel, MenuAction::FlipEdge],
            (true, false, false) => vec![MenuAction::RemoveEdgeLabel],
            (false, false, true) => vec![MenuAction::RemoveEdge, MenuAction::FlipEdge],
            (_, true, true) => vec![MenuAction::FlipEdge],
            (false, false, false) => vec![MenuAction::RemoveEdge],
            (_, true, false) => Vec::new(),
        };
    }

    vec![MenuAction::Add]
}

/// Commands for a menu entry chosen while `hover` was current; `pos` is
/// where the menu was opened. Entries not offered for `hover` do nothing.
pub fn menu_commands(automaton: &Automaton, action: MenuAction, hover: &Hover, pos: Point) -> Vec<Command> {
    if !enabled_menu_actions(automaton, hover).contains(&action) {
        log::debug!("menu action {} not available here", action);
        return Vec::new();
    }
    let node = hover.node;
    let edge = hover.edge.and_then(|id| automaton.edge(id).map(|edge| (id, edge)));

    let command = match action {
        MenuAction::Add => Some(Command::AddNode { x: pos.x, y: pos.y }),
        MenuAction::Remove => node.map(Command::RemoveNode),
        MenuAction::Final | MenuAction::NonFinal => node.map(Command::ToggleAccepting),
        MenuAction::Init => node.map(Command::SetInitial),
        MenuAction::Flip => node.map(Command::ToggleFlip),
        MenuAction::FlipEdge => edge.map(|(_, edge)| Command::ToggleFlip(edge.source)),
        MenuAction::RemoveEdge => edge.map(|(_, edge)| Command::RemoveEdgeGroup {
            source: edge.source,
            target: edge.target,
        }),
        MenuAction::RemoveEdgeLabel => edge.map(|(id, _)| Command::RemoveEdge(id)),
    };
    command.into_iter().collect()
}
