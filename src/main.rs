//! automaton-canvas GUI - Automaton Diagram Editor
//! Native canvas for drawing states and transitions, with XML import/export

use std::path::PathBuf;

use eframe::egui;

use automaton_canvas::config::EditorConfig;
use automaton_canvas::editor::Editor;
use automaton_canvas::fsm::{Automaton, Node};
use automaton_canvas::geometry::{
    self, CubicCurve, Point, HOVER_MENU_RADIUS, NODE_RADIUS, TRASH_RADIUS,
};
use automaton_canvas::gesture::{Button, Hover, MenuAction, PointerEvent};

const BACKGROUND: egui::Color32 = egui::Color32::from_rgb(25, 28, 32);
const EDGE_COLOR: egui::Color32 = egui::Color32::from_rgb(160, 175, 195);
const LABEL_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 230, 120);
const NODE_FILL: egui::Color32 = egui::Color32::from_rgb(40, 55, 75);
const NODE_STROKE: egui::Color32 = egui::Color32::from_rgb(100, 120, 145);
const INITIAL_STROKE: egui::Color32 = egui::Color32::from_rgb(100, 220, 100);
const WARNING_COLOR: egui::Color32 = egui::Color32::from_rgb(240, 90, 80);

fn app_icon() -> egui::IconData {
    // 64x64 accepting-state glyph: two concentric rings on a dark background.
    let w: u32 = 64;
    let h: u32 = 64;
    let mut rgba = vec![0u8; (w * h * 4) as usize];
    let cx = (w as f32 - 1.0) * 0.5;
    let cy = (h as f32 - 1.0) * 0.5;

    for y in 0..h {
        for x in 0..w {
            let d = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
            let on_ring = (d - 26.0).abs() < 2.5 || (d - 19.0).abs() < 2.0;
            let (r, g, b) = if on_ring { (100, 220, 100) } else { (20, 24, 30) };
            let a = if d > 29.0 { 0 } else { 255 };

            let idx = ((y * w + x) * 4) as usize;
            rgba[idx] = r;
            rgba[idx + 1] = g;
            rgba[idx + 2] = b;
            rgba[idx + 3] = a;
        }
    }

    egui::IconData { rgba, width: w, height: h }
}

fn main() -> eframe::Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => EditorConfig::load(&path).unwrap_or_else(|e| {
            log::error!("Could not load config '{}': {}", path.display(), e);
            EditorConfig::default()
        }),
        None => EditorConfig::default(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.width + 40.0, config.height + 140.0])
            .with_title("automaton-canvas")
            .with_icon(app_icon()),
        ..Default::default()
    };

    eframe::run_native(
        "automaton-canvas",
        options,
        Box::new(|cc| Ok(Box::new(CanvasApp::new(cc, config)))),
    )
}

struct CanvasApp {
    editor: Editor,
    /// Alphabet text field, symbols separated by commas or whitespace
    alphabet_input: String,
    epsilon: bool,
    locked: bool,
    /// Feedback level written into hint exports
    hint_level: String,
    /// Comma-separated metric names for hint exports
    hint_metrics: String,
    /// Last file operation error or confirmation
    status: Option<String>,
    /// Hover snapshot taken when the context menu opened
    menu_hover: Hover,
    menu_pos: Point,
}

impl CanvasApp {
    fn new(_cc: &eframe::CreationContext<'_>, config: EditorConfig) -> Self {
        let epsilon = config.epsilon_enabled();
        Self {
            editor: Editor::new(config),
            alphabet_input: String::new(),
            epsilon,
            locked: false,
            hint_level: "0".to_string(),
            hint_metrics: String::new(),
            status: None,
            menu_hover: Hover::default(),
            menu_pos: Point::default(),
        }
    }

    fn apply_alphabet(&mut self) {
        let symbols: Vec<String> = self
            .alphabet_input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        self.editor.set_alphabet(symbols);
    }

    fn sync_alphabet_input(&mut self) {
        self.alphabet_input = self.editor.automaton().alphabet().user_symbols().join(", ");
    }

    fn open_xml(&mut self) {
        let Some(path) = rfd::FileDialog::new().add_filter("XML", &["xml"]).pick_file() else {
            return;
        };
        let result = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|xml| self.editor.load_xml(&xml).map_err(|e| e.to_string()));
        match result {
            Ok(()) => {
                self.sync_alphabet_input();
                self.status = Some(format!("Loaded {}", path.display()));
            }
            Err(e) => self.status = Some(format!("Could not load '{}': {}", path.display(), e)),
        }
    }

    fn save_text(&mut self, text: String) {
        let Some(path) = rfd::FileDialog::new().add_filter("XML", &["xml"]).save_file() else {
            return;
        };
        self.status = Some(match std::fs::write(&path, text) {
            Ok(()) => format!("Saved {}", path.display()),
            Err(e) => format!("Could not write '{}': {}", path.display(), e),
        });
    }

    fn hint_metrics(&self) -> Vec<String> {
        self.hint_metrics
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Translate raw pointer input over the canvas into editor events.
    fn handle_input(&mut self, ui: &egui::Ui, response: &egui::Response) {
        let rect = response.rect;
        let (latest, moved, pressed, released, double, secondary) = ui.input(|i| {
            (
                i.pointer.latest_pos(),
                i.pointer.delta() != egui::Vec2::ZERO,
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.button_double_clicked(egui::PointerButton::Primary),
                i.pointer.secondary_pressed(),
            )
        });
        let Some(screen) = latest else {
            return;
        };
        let pos = Point::new(screen.x - rect.min.x, screen.y - rect.min.y);
        // Popups such as the context menu cover the canvas.
        let inside = rect.contains(screen) && response.contains_pointer();

        if moved {
            let target = self.editor.hit_test(pos);
            self.editor.handle_pointer(PointerEvent::Move { pos, target });
        }
        if pressed && inside {
            let target = self.editor.hit_test(pos);
            self.editor.handle_pointer(PointerEvent::Down {
                button: Button::Primary,
                pos,
                target,
            });
        }
        if released {
            let target = self.editor.hit_test(pos);
            self.editor.handle_pointer(PointerEvent::Up {
                button: Button::Primary,
                pos,
                target,
            });
        }
        if double && inside {
            let target = self.editor.hit_test(pos);
            self.editor.handle_pointer(PointerEvent::DoubleClick { pos, target });
        }
        if secondary && inside {
            self.menu_hover = *self.editor.hover();
            self.menu_pos = pos;
        }
    }

    fn draw_canvas(&self, painter: &egui::Painter, rect: egui::Rect) {
        let to_screen = |p: Point| rect.min + egui::vec2(p.x, p.y);
        let editor = &self.editor;
        let automaton = editor.automaton();
        let layout = editor.layout();
        let canvas = editor.canvas();

        painter.rect_filled(rect, 0.0, BACKGROUND);

        if !editor.is_locked() {
            draw_trash(painter, to_screen(canvas.trash_center()), editor.gesture().is_dragging());
        }

        // Transitions
        for (id, edge) in automaton.edges() {
            if let Some(curve) = geometry::curve_for(automaton, layout, id) {
                let highlighted = editor.hover().edge == Some(id);
                draw_curve(painter, &curve, &to_screen, highlighted);
            }
            if let Some(anchor) = geometry::label_anchor(automaton, layout, id) {
                painter.text(
                    to_screen(anchor),
                    egui::Align2::CENTER_CENTER,
                    automaton.label(&edge.symbols),
                    egui::FontId::proportional(14.0),
                    LABEL_COLOR,
                );
            }
        }

        // Initial arrow
        if editor.style().shows_initial_arrow() {
            if let Some(initial) = automaton.initial_node() {
                let (from, to) = geometry::initial_arrow(initial);
                draw_arrow(painter, to_screen(from), to_screen(to), EDGE_COLOR);
            }
        }

        // States
        for node in automaton.nodes() {
            let center = to_screen(Point::from(node));
            let stroke_color = if node.initial { INITIAL_STROKE } else { NODE_STROKE };
            painter.circle_filled(center, NODE_RADIUS, NODE_FILL);
            painter.circle_stroke(center, NODE_RADIUS, egui::Stroke::new(2.0, stroke_color));
            if node.accepting {
                painter.circle_stroke(center, NODE_RADIUS - 4.0, egui::Stroke::new(1.5, stroke_color));
            }
            painter.text(
                center,
                egui::Align2::CENTER_CENTER,
                node.id.to_string(),
                egui::FontId::proportional(12.0),
                egui::Color32::WHITE,
            );
        }

        // Hover menu
        if let Some(node) = editor.menu_node().and_then(|id| automaton.node(id)) {
            draw_hover_menu(painter, automaton, node, &to_screen);
        }

        // Edge being dragged
        if let (Some((source, mask)), Some(pointer)) = (editor.gesture().edge_payload(), editor.pointer()) {
            if let Some(source) = automaton.node(source) {
                let from = to_screen(Point::from(source));
                let to = to_screen(pointer);
                draw_arrow(painter, from, to, LABEL_COLOR);
                painter.text(
                    from + (to - from) * 0.5 + egui::vec2(0.0, -12.0),
                    egui::Align2::CENTER_CENTER,
                    automaton.label(mask),
                    egui::FontId::proportional(14.0),
                    LABEL_COLOR,
                );
            }
        }

        // Reset button
        if !editor.is_locked() {
            let (x, y, w, h) = canvas.clear_button();
            let button = egui::Rect::from_min_size(to_screen(Point::new(x, y)), egui::vec2(w, h));
            painter.rect_filled(button, 3.0, egui::Color32::from_rgb(120, 60, 60));
            painter.text(
                button.center(),
                egui::Align2::CENTER_CENTER,
                "Reset Canvas",
                egui::FontId::proportional(13.0),
                egui::Color32::WHITE,
            );
        }

        if let Some(warning) = editor.warning() {
            painter.text(
                to_screen(Point::new(canvas.width / 2.0, 30.0)),
                egui::Align2::CENTER_CENTER,
                warning,
                egui::FontId::proportional(16.0),
                WARNING_COLOR,
            );
        }
    }
}

/// Cubic transition curve with an arrowhead at its end
fn draw_curve(
    painter: &egui::Painter,
    curve: &CubicCurve,
    to_screen: &impl Fn(Point) -> egui::Pos2,
    highlighted: bool,
) {
    let width = if highlighted { 2.5 } else { 1.5 };
    let points = [
        to_screen(curve.from),
        to_screen(curve.ctrl1),
        to_screen(curve.ctrl2),
        to_screen(curve.to),
    ];
    painter.add(egui::epaint::CubicBezierShape::from_points_stroke(
        points,
        false,
        egui::Color32::TRANSPARENT,
        egui::Stroke::new(width, EDGE_COLOR),
    ));
    draw_arrowhead(painter, points[2], points[3], EDGE_COLOR);
}

fn draw_arrow(painter: &egui::Painter, from: egui::Pos2, to: egui::Pos2, color: egui::Color32) {
    painter.line_segment([from, to], egui::Stroke::new(1.5, color));
    draw_arrowhead(painter, from, to, color);
}

fn draw_arrowhead(painter: &egui::Painter, prev: egui::Pos2, last: egui::Pos2, color: egui::Color32) {
    let delta = last - prev;
    if delta.length() < f32::EPSILON {
        return;
    }
    let dir = delta.normalized();
    let arrow_size = 9.0;
    let perp = egui::vec2(-dir.y, dir.x);
    let p1 = last - dir * arrow_size + perp * arrow_size * 0.4;
    let p2 = last - dir * arrow_size - perp * arrow_size * 0.4;

    painter.add(egui::Shape::convex_polygon(
        vec![last, p1, p2],
        color,
        egui::Stroke::NONE,
    ));
}

fn draw_hover_menu(
    painter: &egui::Painter,
    automaton: &Automaton,
    node: &Node,
    to_screen: &impl Fn(Point) -> egui::Pos2,
) {
    let center = to_screen(Point::from(node));
    painter.circle_stroke(
        center,
        HOVER_MENU_RADIUS,
        egui::Stroke::new(10.0, egui::Color32::from_rgba_unmultiplied(100, 120, 145, 60)),
    );
    for (index, slot) in geometry::hover_menu_slots(automaton, node).into_iter().enumerate() {
        let symbol = automaton.alphabet().symbol(index).unwrap_or_default();
        painter.text(
            to_screen(slot),
            egui::Align2::CENTER_CENTER,
            symbol,
            egui::FontId::proportional(13.0),
            LABEL_COLOR,
        );
    }
}

fn draw_trash(painter: &egui::Painter, corner: egui::Pos2, active: bool) {
    let alpha = if active { 70 } else { 35 };
    painter.circle_filled(
        corner,
        TRASH_RADIUS,
        egui::Color32::from_rgba_unmultiplied(200, 80, 80, alpha),
    );
    painter.text(
        corner - egui::vec2(35.0, 35.0),
        egui::Align2::CENTER_CENTER,
        "🗑",
        egui::FontId::proportional(28.0),
        egui::Color32::from_rgb(220, 200, 200),
    );
}

impl eframe::App for CanvasApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("➕ New").clicked() {
                        self.editor.initialize();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("📂 Open XML...").clicked() {
                        self.open_xml();
                        ui.close_menu();
                    }
                    if ui.button("💾 Save XML...").clicked() {
                        let xml = self.editor.export_xml();
                        self.save_text(xml);
                        ui.close_menu();
                    }
                    if ui.button("📤 Export Hint XML...").clicked() {
                        let xml = self.editor.export_hint_xml(&self.hint_level, &self.hint_metrics());
                        self.save_text(xml);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Edit", |ui| {
                    if ui.button("Clear").clicked() {
                        self.editor.clear();
                        ui.close_menu();
                    }
                    if ui.button("📋 Copy XML").clicked() {
                        ui.output_mut(|o| o.copied_text = self.editor.export_xml());
                        ui.close_menu();
                    }
                });
            });
        });

        // Toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Alphabet:");
                let field = ui.add(
                    egui::TextEdit::singleline(&mut self.alphabet_input)
                        .hint_text("a, b, c")
                        .desired_width(160.0),
                );
                let submitted = field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Apply").clicked() || submitted {
                    self.apply_alphabet();
                }

                ui.separator();
                if !self.editor.automaton().mode().is_deterministic()
                    && ui.checkbox(&mut self.epsilon, "ε-transitions").changed()
                {
                    self.editor.set_epsilon(self.epsilon);
                }
                if ui.checkbox(&mut self.locked, "🔒 Lock").changed() {
                    if self.locked {
                        self.editor.lock();
                    } else {
                        self.editor.unlock();
                    }
                }

                ui.separator();
                ui.label("Hint level:");
                ui.add(egui::TextEdit::singleline(&mut self.hint_level).desired_width(30.0));
                ui.label("Metrics:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.hint_metrics)
                        .hint_text("size, det")
                        .desired_width(120.0),
                );
            });
        });

        // Bottom panel: Info
        egui::TopBottomPanel::bottom("info_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let automaton = self.editor.automaton();
                ui.label(format!("Style: {}", self.editor.style()));
                ui.separator();
                ui.label(format!(
                    "{} states, {} transitions",
                    automaton.node_count(),
                    automaton.edge_count()
                ));
                ui.separator();
                ui.label("Click: add state | Drag: move | Double-click: accepting | Right-click: menu");
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let canvas = *self.editor.canvas();
            let (response, painter) = ui.allocate_painter(
                egui::vec2(canvas.width, canvas.height),
                egui::Sense::click_and_drag(),
            );
            let rect = response.rect;

            self.handle_input(ui, &response);
            self.draw_canvas(&painter.with_clip_rect(rect), rect);

            let actions = self.editor.enabled_menu_actions(&self.menu_hover);
            let mut chosen: Option<MenuAction> = None;
            if !actions.is_empty() {
                response.context_menu(|ui| {
                    for action in &actions {
                        if ui.button(action.title()).clicked() {
                            chosen = Some(*action);
                            ui.close_menu();
                        }
                    }
                });
            }
            if let Some(action) = chosen {
                let hover = self.menu_hover;
                self.editor.apply_menu_action(action, &hover, self.menu_pos);
            }
        });

        if self.editor.gesture().is_dragging() {
            ctx.request_repaint();
        }
    }
}
