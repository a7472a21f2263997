//! Editor
//! One editable document: the automaton, its layout and the gesture state.
//! Hosts drive it with pointer events, menu actions and document operations.

use crate::config::{DiagramStyle, EditorConfig, StyleError, DEFAULT_INITIAL_POSITION};
use crate::export::{export_alphabet, export_automaton, export_automaton_hint};
use crate::fsm::{Automaton, EditError, EditResult, NodeId};
use crate::geometry::{self, Canvas, HitTarget, Point};
use crate::gesture::{
    self, Command, Feedback, Gesture, GestureController, Hover, MenuAction, PointerEvent,
};
use crate::layout::{self, EdgeLayout};
use crate::parser::{parse_automaton, ParseResult};


pub struct Editor {
    config: EditorConfig,
    automaton: Automaton,
    layout: EdgeLayout,
    controller: GestureController,
    locked: bool,
    warning: Option<String>,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        let mut automaton = Automaton::new(config.mode(), config.epsilon_enabled());
        let layout = layout::resolve(&mut automaton);
        let controller = GestureController::new(Canvas::new(config.width, config.height));
        log::info!(
            "editor ready: style {}, {:?}, {}x{}",
            config.style,
            config.mode(),
            config.width,
            config.height
        );
        Self {
            config,
            automaton,
            layout,
            controller,
            locked: false,
            warning: None,
        }
    }

    /// Editor with default settings for the named diagram style.
    pub fn from_style(style: &str) -> Result<Self, StyleError> {
        Ok(Self::new(EditorConfig::default().with_style(style)?))
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn style(&self) -> DiagramStyle {
        self.config.style
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    pub fn layout(&self) -> &EdgeLayout {
        &self.layout
    }

    pub fn gesture(&self) -> &Gesture {
        self.controller.gesture()
    }

    pub fn hover(&self) -> &Hover {
        self.controller.hover()
    }

    pub fn pointer(&self) -> Option<Point> {
        self.controller.pointer()
    }

    pub fn canvas(&self) -> &Canvas {
        self.controller.canvas()
    }

    pub fn menu_node(&self) -> Option<NodeId> {
        self.controller.menu_node()
    }

    /// Message to show over the canvas, if any.
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn dismiss_warning(&mut self) {
        self.warning = None;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Turn the canvas into a static display; pointer input is ignored.
    pub fn lock(&mut self) {
        self.locked = true;
        self.controller.reset();
        log::debug!("canvas locked");
    }

    pub fn unlock(&mut self) {
        self.locked = false;
        log::debug!("canvas unlocked");
    }

    /// Reset to a single initial state at the default position.
    pub fn initialize(&mut self) {
        self.automaton.initialize();
        self.after_reset();
        log::info!("document initialized");
    }

    /// Remove every state and transition.
    pub fn clear(&mut self) {
        self.automaton.clear();
        self.after_reset();
        log::info!("document cleared");
    }

    pub fn set_alphabet<I, S>(&mut self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.automaton.set_alphabet(symbols);
        self.after_reset();
    }

    pub fn set_epsilon(&mut self, enabled: bool) {
        self.automaton.set_epsilon(enabled);
        self.after_reset();
    }

    /// Replace the document with an imported one. On error the current
    /// document is left untouched.
    pub fn load_xml(&mut self, xml: &str) -> ParseResult<()> {
        let doc = parse_automaton(xml)?;
        let automaton = Automaton::from_document(
            &doc,
            self.automaton.mode(),
            self.automaton.epsilon_requested(),
        )?;
        self.automaton = automaton;
        self.after_reset();
        log::info!(
            "loaded automaton with {} states and {} transitions",
            self.automaton.node_count(),
            self.automaton.edge_count()
        );
        Ok(())
    }

    pub fn export_xml(&self) -> String {
        export_automaton(&self.automaton)
    }

    pub fn export_alphabet(&self) -> String {
        export_alphabet(&self.automaton)
    }

    pub fn export_hint_xml(&self, level: &str, metrics: &[String]) -> String {
        export_automaton_hint(&self.automaton, level, metrics)
    }

    /// Topmost element at `p`, taking the open hover menu into account.
    pub fn hit_test(&self, p: Point) -> HitTarget {
        geometry::hit_test(
            &self.automaton,
            &self.layout,
            self.controller.canvas(),
            self.controller.menu_node(),
            p,
        )
    }

    /// Feed one pointer event through the gesture controller and apply the
    /// resulting edits.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        if self.locked {
            return;
        }
        if matches!(event, PointerEvent::Down { .. }) {
            self.warning = None;
        }

        let transition = self.controller.handle(&self.automaton, event);
        if let Some(Feedback::Warning(message)) = transition.feedback {
            self.warning = Some(message);
        }
        self.apply(transition.commands);
    }

    pub fn enabled_menu_actions(&self, hover: &Hover) -> Vec<MenuAction> {
        if self.locked {
            return Vec::new();
        }
        gesture::enabled_menu_actions(&self.automaton, hover)
    }

    /// Run a context-menu entry picked while `hover` was current, with the
    /// menu opened at `pos`.
    pub fn apply_menu_action(&mut self, action: MenuAction, hover: &Hover, pos: Point) {
        if self.locked {
            return;
        }
        log::debug!("menu action {}", action);
        let commands = gesture::menu_commands(&self.automaton, action, hover, pos);
        self.apply(commands);
    }

    fn after_reset(&mut self) {
        self.controller.reset();
        self.warning = None;
        self.layout = layout::resolve(&mut self.automaton);
    }

    fn apply(&mut self, commands: Vec<Command>) {
        if commands.is_empty() {
            return;
        }
        for command in commands {
            match self.apply_command(command) {
                Ok(()) => {}
                Err(EditError::InitialNodeProtected) => {
                    self.warning = Some(EditError::InitialNodeProtected.to_string());
                }
                Err(err) => log::debug!("edit ignored: {}", err),
            }
        }
        self.layout = layout::resolve(&mut self.automaton);
    }

    fn apply_command(&mut self, command: Command) -> EditResult<()> {
        let automaton = &mut self.automaton;
        match command {
            Command::AddNode { x, y } => {
                automaton.add_node(x, y);
            }
            Command::MoveNode { node, x, y } => automaton.move_node(node, x, y)?,
            Command::RemoveNode(node) => automaton.remove_node(node)?,
            Command::ResetNodePosition(node) => {
                let (x, y) = DEFAULT_INITIAL_POSITION;
                automaton.move_node(node, x, y)?;
            }
            Command::ToggleAccepting(node) => automaton.toggle_accepting(node)?,
            Command::SetInitial(node) => automaton.set_initial(node)?,
            Command::ToggleFlip(node) => automaton.toggle_flip(node)?,
            Command::DetachEdge(id) | Command::RemoveEdge(id) => {
                automaton.remove_edge(id)?;
            }
            Command::DetachGroup { source, target } | Command::RemoveEdgeGroup { source, target } => {
                automaton.remove_edge_group(source, target);
            }
            Command::InsertEdge { source, target, mask } => {
                automaton.add_or_merge_edge(source, target, mask)?;
            }
            Command::InsertGroup { source, target, mask } => {
                automaton.add_edge_group(source, target, &mask);
            }
            Command::Reset => {
                automaton.initialize();
                self.controller.reset();
                log::info!("canvas reset");
            }
        }
        Ok(())
    }
}
