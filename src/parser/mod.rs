//! Automaton Document Parser
//! Reads the `<automaton>` XML exchange format into a plain document record

use std::str::FromStr;

use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::Event as XmlEvent;
use quick_xml::reader::Reader as XmlReader;
use serde::{Deserialize, Serialize};
use thiserror::Error;


#[derive(Error, Debug)]
pub enum ParseError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Malformed document: {0}")]
    MalformedDocument(String),
    #[error("Invalid number in <{element}>: '{value}'")]
    InvalidNumber { element: String, value: String },
}

pub type ParseResult<T> = Result<T, ParseError>;

/// A `<state>` of the `<stateSet>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    /// Numeric label, used as the state id
    pub label: u32,
    pub x: f32,
    pub y: f32,
}

/// A `<transition>`; each one reads exactly one symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: u32,
    pub to: u32,
    pub read: String,
}

/// The document as written, before any coalescing of transitions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AutomatonDocument {
    pub alphabet: Vec<String>,
    pub states: Vec<StateRecord>,
    pub transitions: Vec<TransitionRecord>,
    pub accepting: Vec<u32>,
    pub initial: u32,
}

/// Parse an `<automaton>` document. Sections are located anywhere in the
/// tree, so a document wrapped in `<automatonHint>` is accepted too.
pub fn parse_automaton(xml: &str) -> ParseResult<AutomatonDocument> {
    let root = parse_tree(xml)?;

    let alphabet = root
        .find("alphabet")
        .ok_or_else(|| missing("alphabet"))?
        .descendants("symbol")
        .iter()
        .map(|symbol| symbol.text.trim().to_string())
        .collect();

    let states = root
        .find("stateSet")
        .ok_or_else(|| missing("stateSet"))?
        .descendants("state")
        .into_iter()
        .map(parse_state)
        .collect::<ParseResult<Vec<_>>>()?;

    let transitions = match root.find("transitionSet") {
        Some(set) => set
            .descendants("transition")
            .into_iter()
            .map(parse_transition)
            .collect::<ParseResult<Vec<_>>>()?,
        None => Vec::new(),
    };

    let accepting = match root.find("acceptingSet") {
        Some(set) => set
            .descendants("state")
            .into_iter()
            .map(|state| state_ref(state, "acceptingSet"))
            .collect::<ParseResult<Vec<_>>>()?,
        None => Vec::new(),
    };

    let init_state = root
        .find("initState")
        .ok_or_else(|| missing("initState"))?
        .find("state")
        .ok_or_else(|| missing("initState/state"))?;
    let initial = state_ref(init_state, "initState")?;

    Ok(AutomatonDocument {
        alphabet,
        states,
        transitions,
        accepting,
        initial,
    })
}

fn missing(element: &str) -> ParseError {
    ParseError::MalformedDocument(format!("missing <{}>", element))
}

fn parse_state(state: &Element) -> ParseResult<StateRecord> {
    Ok(StateRecord {
        label: required_number(state, "label")?,
        x: required_number(state, "posX")?,
        y: required_number(state, "posY")?,
    })
}

fn parse_transition(transition: &Element) -> ParseResult<TransitionRecord> {
    let read = transition.find("read").ok_or_else(|| missing("transition/read"))?;
    Ok(TransitionRecord {
        from: required_number(transition, "from")?,
        to: required_number(transition, "to")?,
        read: read.text.trim().to_string(),
    })
}

fn state_ref(state: &Element, section: &str) -> ParseResult<u32> {
    let sid = state
        .attr("sid")
        .ok_or_else(|| ParseError::MalformedDocument(format!("<state> in <{}> has no sid", section)))?;
    number(sid, "state")
}

fn required_number<T: FromStr>(parent: &Element, name: &str) -> ParseResult<T> {
    let element = parent.find(name).ok_or_else(|| missing(name))?;
    number(&element.text, name)
}

fn number<T: FromStr>(value: &str, element: &str) -> ParseResult<T> {
    value.trim().parse().map_err(|_| ParseError::InvalidNumber {
        element: element.to_string(),
        value: value.to_string(),
    })
}

/// Minimal element tree; the exchange format is small enough to hold whole.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn new(name: String, attrs: Vec<(String, String)>) -> Self {
        Self {
            name,
            attrs,
            ..Default::default()
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First descendant with the given name, in document order.
    fn find(&self, name: &str) -> Option<&Element> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants with the given name, in document order.
    fn descendants(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.name == name {
                found.push(child);
            }
            child.collect_descendants(name, found);
        }
    }
}

fn element_from(e: &quick_xml::events::BytesStart<'_>) -> Element {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let attrs = e
        .attributes()
        .filter_map(|a| a.ok())
        .map(|a| {
            (
                String::from_utf8_lossy(a.key.as_ref()).to_string(),
                String::from_utf8_lossy(&a.value).to_string(),
            )
        })
        .collect();
    Element::new(name, attrs)
}

fn resolve_reference(name: &str) -> Option<String> {
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => code.parse().ok()?,
        };
        return char::from_u32(value).map(String::from);
    }
    resolve_predefined_entity(name).map(str::to_string)
}

fn parse_tree(xml: &str) -> ParseResult<Element> {
    // Text is kept untrimmed: entity references arrive as separate events,
    // and fields are trimmed once the element is complete.
    let mut reader = XmlReader::from_str(xml);

    let mut stack: Vec<Element> = vec![Element::default()];
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            XmlEvent::Start(ref e) => stack.push(element_from(e)),
            XmlEvent::Empty(ref e) => {
                let element = element_from(e);
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(element);
                }
            }
            XmlEvent::End(_) => {
                if stack.len() > 1 {
                    if let Some(element) = stack.pop() {
                        if let Some(parent) = stack.last_mut() {
                            parent.children.push(element);
                        }
                    }
                }
            }
            XmlEvent::Text(ref e) => {
                let raw = e.decode().unwrap_or_default();
                let text = unescape(&raw).map(|t| t.into_owned()).unwrap_or_else(|_| raw.to_string());
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&text);
                }
            }
            XmlEvent::CData(ref e) => {
                let text = String::from_utf8_lossy(e).to_string();
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&text);
                }
            }
            XmlEvent::GeneralRef(ref e) => {
                let name = e.decode().unwrap_or_default();
                if let (Some(text), Some(element)) = (resolve_reference(&name), stack.last_mut()) {
                    element.text.push_str(&text);
                }
            }
            XmlEvent::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if stack.len() != 1 {
        return Err(ParseError::MalformedDocument("unclosed element".to_string()));
    }
    Ok(stack.pop().unwrap_or_default())
}
