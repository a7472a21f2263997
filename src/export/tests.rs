//! Unit tests for the document exporter

use crate::config::Mode;
use crate::export::{export_automaton, export_automaton_hint, escape_xml};
use crate::fsm::{Automaton, NodeId, SymbolMask};
use crate::parser::parse_automaton;

#[test]
fn test_export_layout_is_exact() {
    let automaton = Automaton::with_alphabet(Mode::Deterministic, false, ["a"]);
    let expected = "<automaton>\n\
\t<alphabet>\n \
<symbol>a</symbol>\n\
\t</alphabet>\n\
\t<stateSet>\n\
\t\t<state sid='0' ><label>0</label><posX>200</posX><posY>240</posY></state>\n\
\t</stateSet>\n\
\t<transitionSet>\n\
\t\t<transition tid='0'>\n\
\t\t\t<from>0</from>\n\
\t\t\t<to>0</to>\n\
\t\t\t<read>a</read>\n\
\t\t\t<edgeDistance>30</edgeDistance>\n\
\t\t</transition>\n\
\t</transitionSet>\n\
\t<acceptingSet>\n\
\t</acceptingSet>\n\
<initState><state sid='0' /></initState></automaton>\n";
    assert_eq!(export_automaton(&automaton), expected);
}

#[test]
fn test_multi_symbol_edge_expands_per_symbol() {
    let mut automaton = Automaton::with_alphabet(Mode::NonDeterministic, false, ["a", "b", "c"]);
    let target = automaton.add_node(300.0, 240.0);
    automaton
        .add_or_merge_edge(NodeId(0), target, SymbolMask::from_bits(vec![true, false, true]))
        .unwrap();

    let xml = export_automaton(&automaton);
    assert!(xml.contains("<transition tid='0'>\n\t\t\t<from>0</from>\n\t\t\t<to>1</to>\n\t\t\t<read>a</read>"));
    assert!(xml.contains("<transition tid='1'>\n\t\t\t<from>0</from>\n\t\t\t<to>1</to>\n\t\t\t<read>c</read>"));
    assert!(!xml.contains("tid='2'"));
}

#[test]
fn test_positions_round_half_up() {
    let mut automaton = Automaton::with_alphabet(Mode::NonDeterministic, false, ["a"]);
    automaton.move_node(NodeId(0), 10.5, -3.5).unwrap();
    let xml = export_automaton(&automaton);
    assert!(xml.contains("<posX>11</posX><posY>-3</posY>"));
}

#[test]
fn test_accepting_states_are_listed() {
    let mut automaton = Automaton::with_alphabet(Mode::NonDeterministic, false, ["a"]);
    let second = automaton.add_node(10.0, 10.0);
    automaton.toggle_accepting(second).unwrap();
    let xml = export_automaton(&automaton);
    assert!(xml.contains("\t<acceptingSet>\n\t\t<state sid='1'/>\n\t</acceptingSet>\n"));
}

#[test]
fn test_hint_wrapper() {
    let automaton = Automaton::with_alphabet(Mode::Deterministic, false, ["a"]);
    let hint = export_automaton_hint(&automaton, "2", &["size".to_string(), "language".to_string()]);
    assert!(hint.starts_with("<automatonHint>\n<automaton>\n"));
    assert!(hint.ends_with("</automaton>\n<level>2</level>\n<metrics>size,language</metrics>\n</automatonHint>"));
}

#[test]
fn test_export_then_import_round_trip() {
    let mut automaton = Automaton::with_alphabet(Mode::NonDeterministic, true, ["a", "b"]);
    let q1 = automaton.add_node(320.0, 100.0);
    let q2 = automaton.add_node(420.0, 300.0);
    automaton
        .add_or_merge_edge(NodeId(0), q1, SymbolMask::from_bits(vec![true, true, false]))
        .unwrap();
    automaton
        .add_or_merge_edge(q1, q2, SymbolMask::single(3, 1))
        .unwrap();
    automaton.add_or_merge_edge(q2, q2, SymbolMask::single(3, 2)).unwrap();
    automaton.toggle_accepting(q2).unwrap();
    automaton.set_initial(q1).unwrap();

    let doc = parse_automaton(&export_automaton(&automaton)).expect("Should parse export");
    let restored = Automaton::from_document(&doc, Mode::NonDeterministic, true).expect("Should rebuild");

    assert_eq!(restored.alphabet(), automaton.alphabet());
    for node in automaton.nodes() {
        let other = restored.node(node.id).expect("state survives");
        assert_eq!((other.x, other.y), (node.x, node.y));
        assert_eq!(other.initial, node.initial);
        assert_eq!(other.accepting, node.accepting);
    }
    for (_, edge) in automaton.edges() {
        assert_eq!(restored.pair_symbols(edge.source, edge.target), edge.symbols);
    }
    assert_eq!(restored.edge_count(), automaton.edge_count());
}

#[test]
fn test_escape_special_xml_chars() {
    assert_eq!(escape_xml("a<b & 'c'"), "a&lt;b &amp; &apos;c&apos;");
}
