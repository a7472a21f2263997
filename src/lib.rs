//! automaton-canvas - Interactive Editor for Automaton Diagrams
//! Draw Büchi automata and game arenas, and exchange them as XML

pub mod config;
pub mod editor;
pub mod export;
pub mod fsm;
pub mod geometry;
pub mod gesture;
pub mod layout;
pub mod parser;

pub use config::{DiagramStyle, EditorConfig, Mode};
pub use editor::Editor;
pub use export::{export_automaton, export_automaton_hint};
pub use fsm::*;
pub use parser::parse_automaton;
