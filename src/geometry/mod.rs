//! Diagram Geometry
//! Curves, label anchors and hit regions derived from the model and its
//! edge layout. Everything here is in canvas coordinates (y grows downward).

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::fsm::{Automaton, Edge, EdgeId, Node, NodeId};
use crate::layout::EdgeLayout;


pub const NODE_RADIUS: f32 = 15.0;
/// Offset of a curved edge's control points per link index
pub const EDGE_DEVIATION: f32 = 30.0;
/// Extra distance between a label and its curve
pub const LABEL_OFFSET: f32 = 14.0;
/// Horizontal spacing between labels of self-loops on the same state
pub const LOOP_LABEL_SPACING: f32 = 15.0;
/// Radius of the ring around a state that holds the symbol menu
pub const HOVER_MENU_RADIUS: f32 = NODE_RADIUS + 20.0;
pub const TRASH_RADIUS: f32 = 100.0;
/// Nodes may not be dragged closer than this to the canvas border
pub const CANVAS_MARGIN: f32 = 5.0;

const LOOP_EXTENT: f32 = 80.0;
const LOOP_LABEL_EXTENT: f32 = 70.0;
const LOOP_TIP: f32 = 6.0;
const ARROW_GAP: f32 = 4.0;
const EDGE_HIT_DISTANCE: f32 = 6.0;
const CURVE_SAMPLES: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    fn offset(self, angle: f32, length: f32) -> Point {
        Point::new(self.x + length * angle.cos(), self.y + length * angle.sin())
    }

    fn towards(self, other: Point, length: f32) -> Point {
        let distance = self.distance(other);
        if distance == 0.0 {
            return self;
        }
        Point::new(
            self.x + length * (other.x - self.x) / distance,
            self.y + length * (other.y - self.y) / distance,
        )
    }
}

impl From<&Node> for Point {
    fn from(node: &Node) -> Self {
        Point::new(node.x, node.y)
    }
}

/// A cubic Bézier segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicCurve {
    pub from: Point,
    pub ctrl1: Point,
    pub ctrl2: Point,
    pub to: Point,
}

impl CubicCurve {
    pub fn point_at(&self, t: f32) -> Point {
        let u = 1.0 - t;
        let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
        Point::new(
            a * self.from.x + b * self.ctrl1.x + c * self.ctrl2.x + d * self.to.x,
            a * self.from.y + b * self.ctrl1.y + c * self.ctrl2.y + d * self.to.y,
        )
    }

    pub fn sample(&self, segments: usize) -> Vec<Point> {
        (0..=segments)
            .map(|i| self.point_at(i as f32 / segments as f32))
            .collect()
    }

    /// Approximate distance from `p` to the curve.
    pub fn distance_to(&self, p: Point) -> f32 {
        self.sample(CURVE_SAMPLES)
            .windows(2)
            .map(|pair| distance_to_segment(p, pair[0], pair[1]))
            .fold(f32::INFINITY, f32::min)
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let length_sq = dx * dx + dy * dy;
    if length_sq == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / length_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

/// The angle self-loops leave a state at: above when flipped, below otherwise.
fn loop_angle(node: &Node) -> f32 {
    if node.flip {
        3.0 * FRAC_PI_2
    } else {
        FRAC_PI_2
    }
}

fn rounded(value: f32) -> f32 {
    (value + 0.5).floor()
}

/// Self-loop drawn as a teardrop leaving the state boundary at `angle`.
pub fn loop_curve(center: Point, angle: f32) -> CubicCurve {
    let from = Point::new(
        rounded(center.x + NODE_RADIUS * angle.cos()),
        rounded(center.y + NODE_RADIUS * angle.sin()),
    );
    let relative = |length: f32, theta: f32| {
        Point::new(
            from.x + rounded(length * theta.cos()),
            from.y + rounded(length * theta.sin()),
        )
    };
    CubicCurve {
        from,
        ctrl1: relative(LOOP_EXTENT, angle + FRAC_PI_4),
        ctrl2: relative(LOOP_EXTENT, angle - FRAC_PI_4),
        to: relative(LOOP_TIP, angle - FRAC_PI_4),
    }
}

/// Signed control-point offset for a non-reflexive edge.
pub fn deviation(flat: bool, link_index: usize) -> f32 {
    if flat {
        0.0
    } else {
        EDGE_DEVIATION * link_index as f32
    }
}

/// Curve between two distinct states, bowed to the left of the travel
/// direction by `deviation` and trimmed to the state boundaries.
pub fn edge_curve(source: Point, target: Point, deviation: f32) -> CubicCurve {
    let angle = (target.y - source.y).atan2(target.x - source.x);
    let normal = angle + FRAC_PI_2;

    let third1 = Point::new((2.0 * source.x + target.x) / 3.0, (2.0 * source.y + target.y) / 3.0);
    let third2 = Point::new((source.x + 2.0 * target.x) / 3.0, (source.y + 2.0 * target.y) / 3.0);
    let ctrl1 = third1.offset(normal, deviation);
    let ctrl2 = third2.offset(normal, deviation);

    CubicCurve {
        from: source.towards(ctrl1, NODE_RADIUS),
        ctrl1,
        ctrl2,
        to: target.towards(ctrl2, NODE_RADIUS + ARROW_GAP),
    }
}

/// Curve for a stored transition.
pub fn curve_for(automaton: &Automaton, layout: &EdgeLayout, id: EdgeId) -> Option<CubicCurve> {
    let edge = automaton.edge(id)?;
    let source = automaton.node(edge.source)?;
    if edge.is_reflexive() {
        return Some(loop_curve(source.into(), loop_angle(source)));
    }
    let target = automaton.node(edge.target)?;
    let placement = layout.placement(id)?;
    Some(edge_curve(
        source.into(),
        target.into(),
        deviation(placement.flat, placement.link_index),
    ))
}

/// Where a transition's label is drawn.
pub fn label_anchor(automaton: &Automaton, layout: &EdgeLayout, id: EdgeId) -> Option<Point> {
    let edge = automaton.edge(id)?;
    let source = automaton.node(edge.source)?;
    let placement = layout.placement(id)?;

    if edge.is_reflexive() {
        return Some(loop_label_anchor(source, placement.link_index, placement.group_size));
    }

    let target = automaton.node(edge.target)?;
    let (source, target) = (Point::from(source), Point::from(target));
    let angle = (target.y - source.y).atan2(target.x - source.x);
    let normal = angle + FRAC_PI_2;
    let offset = deviation(placement.flat, placement.link_index);
    let mid = Point::new((source.x + target.x) / 2.0, (source.y + target.y) / 2.0);
    let side = if placement.flat { -LABEL_OFFSET } else { LABEL_OFFSET };
    // A curve with both control points at `offset` peaks at three quarters of it.
    Some(mid.offset(normal, offset * 0.75 + side))
}

fn loop_label_anchor(node: &Node, link_index: usize, loops: usize) -> Point {
    let angle = loop_angle(node);
    let from = Point::from(node).offset(angle, NODE_RADIUS);
    let tip = Point::new(
        ((angle + FRAC_PI_4).cos() + (angle - FRAC_PI_4).cos()) * LOOP_LABEL_EXTENT / 2.0,
        ((angle + FRAC_PI_4).sin() + (angle - FRAC_PI_4).sin()) * LOOP_LABEL_EXTENT / 2.0,
    );
    let spread = if loops > 1 {
        LOOP_LABEL_SPACING * (link_index as f32 - 0.5 - loops as f32 / 2.0)
    } else {
        0.0
    };
    let below = if node.flip { 0.0 } else { 10.0 };
    Point::new(from.x + tip.x + spread, from.y + tip.y + below)
}

/// Positions of the symbol entries in a state's hover menu, one per alphabet
/// slot. With epsilon enabled the epsilon entry sits alone below the state.
pub fn hover_menu_slots(automaton: &Automaton, node: &Node) -> Vec<Point> {
    let alphabet = automaton.alphabet();
    let len = alphabet.len() as f32;
    let center = Point::from(node);
    let start = 3.0 * FRAC_PI_2 - len * PI / 12.0;

    (0..alphabet.len())
        .map(|i| {
            let angle = if alphabet.epsilon_index() == Some(i) {
                FRAC_PI_2
            } else if alphabet.has_epsilon() {
                start + (i as f32 + 1.0) * PI / 6.0
            } else {
                start + (i as f32 + 0.5) * PI / 6.0
            };
            center.offset(angle, NODE_RADIUS + 10.0)
        })
        .collect()
}

/// Start and end of the arrow pointing into the initial state.
pub fn initial_arrow(node: &Node) -> (Point, Point) {
    (
        Point::new(node.x - 48.0 - NODE_RADIUS, node.y),
        Point::new(node.x - 5.0 - NODE_RADIUS, node.y),
    )
}

/// Rough text box of a label, used for hit testing.
pub fn label_extent(label: &str) -> (f32, f32) {
    (label.chars().count() as f32 * 7.0 + 6.0, 14.0)
}

/// Canvas dimensions and the fixed regions within them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether a dragged state may sit at `p`.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= CANVAS_MARGIN
            && p.x <= self.width - CANVAS_MARGIN
            && p.y >= CANVAS_MARGIN
            && p.y <= self.height - CANVAS_MARGIN
    }

    pub fn trash_center(&self) -> Point {
        Point::new(self.width, self.height)
    }

    pub fn in_trash(&self, p: Point) -> bool {
        p.distance(self.trash_center()) <= TRASH_RADIUS
    }

    /// The "Reset Canvas" button in the top right corner: (x, y, w, h).
    pub fn clear_button(&self) -> (f32, f32, f32, f32) {
        (self.width - 104.0, -1.0, 105.0, 26.0)
    }

    pub fn in_clear_button(&self, p: Point) -> bool {
        let (x, y, w, h) = self.clear_button();
        p.x >= x && p.x <= x + w && p.y >= y && p.y <= y + h
    }
}

/// What lies under the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Canvas,
    Node(NodeId),
    EdgeLabel(EdgeId),
    EdgeBody(EdgeId),
    MenuSymbol { node: NodeId, symbol: usize },
    MenuRing(NodeId),
    Trash,
    ClearButton,
}

/// Resolve the topmost element at `p`. `menu` is the state whose hover menu
/// is currently shown, if any.
pub fn hit_test(
    automaton: &Automaton,
    layout: &EdgeLayout,
    canvas: &Canvas,
    menu: Option<NodeId>,
    p: Point,
) -> HitTarget {
    if canvas.in_clear_button(p) {
        return HitTarget::ClearButton;
    }

    if let Some(node) = menu.and_then(|id| automaton.node(id)) {
        let hit = hover_menu_slots(automaton, node)
            .into_iter()
            .position(|slot| slot.distance(p) <= 8.0);
        if let Some(symbol) = hit {
            return HitTarget::MenuSymbol { node: node.id, symbol };
        }
    }

    // Later states are drawn on top.
    let node_hit = automaton
        .nodes()
        .filter(|node| Point::from(*node).distance(p) <= NODE_RADIUS)
        .last();
    if let Some(node) = node_hit {
        return HitTarget::Node(node.id);
    }

    if canvas.in_trash(p) {
        return HitTarget::Trash;
    }

    if let Some(node) = menu.and_then(|id| automaton.node(id)) {
        if Point::from(node).distance(p) <= HOVER_MENU_RADIUS {
            return HitTarget::MenuRing(node.id);
        }
    }

    for (id, edge) in automaton.edges() {
        if let Some(anchor) = label_anchor(automaton, layout, id) {
            if label_contains(automaton, edge, anchor, p) {
                return HitTarget::EdgeLabel(id);
            }
        }
    }

    for (id, _) in automaton.edges() {
        if let Some(curve) = curve_for(automaton, layout, id) {
            if curve.distance_to(p) <= EDGE_HIT_DISTANCE {
                return HitTarget::EdgeBody(id);
            }
        }
    }

    HitTarget::Canvas
}

fn label_contains(automaton: &Automaton, edge: &Edge, anchor: Point, p: Point) -> bool {
    let (w, h) = label_extent(&automaton.label(&edge.symbols));
    (p.x - anchor.x).abs() <= w / 2.0 && (p.y - anchor.y).abs() <= h / 2.0
}
