//! Interactive sandpile viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the simulation state
//! (pile and pending configuration) and implements [`eframe::App`]
//! to render the height field and drive drops through an egui UI.

use eframe::App;
use glam::Vec2;
use sandpile_core::{
    config::Config,
    sandpile::Sandpile,
    types::{AvalancheSize, TOPPLE_THRESHOLD},
};

/// Cell fill colors indexed by height, clamped to the stable range 0..=3.
const PALETTE: [egui::Color32; TOPPLE_THRESHOLD as usize] = [
    egui::Color32::from_rgb(0, 0, 0),
    egui::Color32::from_rgb(255, 236, 203),
    egui::Color32::from_rgb(255, 207, 121),
    egui::Color32::from_rgb(255, 178, 38),
];

/// Grid lines are only drawn when a cell is at least this many pixels wide.
const GRID_LINE_MIN_CELL_PX: f32 = 6.0;

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The simulation core: one [`Sandpile`] plus the pending [`Config`]
///   used when the pile is rebuilt with a new size or seed.
/// - UI state (pan/zoom, speed, grid overlay).
/// - eframe/egui callbacks for drawing and user interaction.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions / input.
/// 2. If `running` is `true` and enough time has passed, call
///    [`Viewer::drop_once`] — auto-run pauses only between drops, so the
///    grid on screen is always a stable post-relaxation state.
/// 3. Render the height field and the status bar.
///
/// ### Fields
/// - `pile` - The live sandpile being dropped on.
/// - `cfg` - Pending grid size and seed, applied by the Rebuild button.
///
/// - `running` - Whether drops are auto-advancing.
/// - `drops_per_second` - Auto-run pacing (1-60 drops per second).
/// - `last_drop_time` - Time stamp of the last auto drop (egui time).
///
/// - `show_grid_lines` - Whether to overlay cell borders.
/// - `zoom` - Zoom factor on top of the fit-to-panel cell size.
/// - `pan` - Screen-space pan offset in pixels.
///
/// - `drops_done` - Total drops performed since the last reset/rebuild.
/// - `last_avalanche` - Size of the most recent avalanche, if any.
pub struct Viewer {
    pile: Sandpile,
    cfg: Config,

    running: bool,
    drops_per_second: u32,
    last_drop_time: f64,

    show_grid_lines: bool,
    zoom: f32,
    pan: egui::Vec2,

    drops_done: u64,
    last_avalanche: Option<AvalancheSize>,
}

impl Viewer {
    /// Creates a viewer over a fresh default-sized pile.
    ///
    /// The camera starts fitted to the panel with no pan, auto-run is off,
    /// and the grid overlay is on.
    ///
    /// ### Returns
    /// A fully-initialized [`Viewer`] ready to be passed to
    /// `eframe::run_native`.
    pub fn new() -> Self {
        let cfg = Config::default();
        let pile = Sandpile::from_config(&cfg).expect("default configuration is valid");

        Self {
            pile,
            cfg,
            running: false,
            drops_per_second: 10,
            last_drop_time: 0.0,
            show_grid_lines: true,
            zoom: 1.0,
            pan: egui::vec2(0.0, 0.0),
            drops_done: 0,
            last_avalanche: None,
        }
    }

    /// Zeroes all heights while keeping the pile and its picker.
    ///
    /// Auto-run stops and the drop counters are cleared; the random target
    /// sequence continues where it left off.
    fn reset(&mut self) {
        self.running = false;
        self.pile.reset();
        self.drops_done = 0;
        self.last_avalanche = None;
    }

    /// Replaces the pile with a fresh one built from the pending config.
    ///
    /// Rejected configurations leave the current pile untouched; the size
    /// control's input range makes that unreachable from the UI.
    fn rebuild(&mut self) {
        if let Ok(pile) = Sandpile::from_config(&self.cfg) {
            self.pile = pile;
            self.running = false;
            self.drops_done = 0;
            self.last_avalanche = None;
        }
    }

    /// Drops one grain, relaxes the pile, and records the avalanche size.
    fn drop_once(&mut self) {
        let size = self.pile.drop_grain_and_relax();
        self.drops_done += 1;
        self.last_avalanche = Some(size);
    }

    /// Pixel edge length of one cell for the given drawing area.
    ///
    /// The grid is fitted to the shorter panel axis and scaled by `zoom`.
    fn cell_px(&self, rect: egui::Rect) -> f32 {
        let n = self.pile.size() as f32;
        (rect.width().min(rect.height()) / n) * self.zoom
    }

    /// Converts a world-space position (grid units, y down) to screen-space.
    ///
    /// World coordinates are measured in cells: cell `(row, col)` spans
    /// `x: [col, col + 1]`, `y: [row, row + 1]`, and the grid center maps
    /// to the panel center before panning.
    ///
    /// ### Parameters
    /// - `p` - World-space position.
    /// - `rect` - Screen-space rectangle representing the drawing area.
    ///
    /// ### Returns
    /// The corresponding egui position in screen-space.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let n = self.pile.size() as f32;
        let px = self.cell_px(rect);
        let center = rect.center();
        egui::pos2(
            center.x + (p.x - n * 0.5) * px + self.pan.x,
            center.y + (p.y - n * 0.5) * px + self.pan.y,
        )
    }

    /// Converts a screen-space position back to world-space.
    ///
    /// This is the inverse of [`Viewer::world_to_screen`] (up to floating
    /// point rounding), using the same `zoom`, `pan`, and `rect` center.
    ///
    /// ### Parameters
    /// - `p` - Screen-space position in egui coordinates.
    /// - `rect` - Screen-space rectangle representing the drawing area.
    ///
    /// ### Returns
    /// The corresponding position in world-space.
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let n = self.pile.size() as f32;
        let px = self.cell_px(rect);
        let center = rect.center();
        Vec2::new(
            (p.x - center.x - self.pan.x) / px + n * 0.5,
            (p.y - center.y - self.pan.y) / px + n * 0.5,
        )
    }

    /// Builds the top panel UI (drop controls, pacing, rebuild, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Drop 1").clicked() {
                    // A manual drop always pauses the auto-run first.
                    self.running = false;
                    self.drop_once();
                }

                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                ui.add(
                    egui::Slider::new(&mut self.drops_per_second, 1..=60).text("drops/s"),
                );

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                ui.separator();
                ui.label("n:");
                ui.add(egui::DragValue::new(&mut self.cfg.size).range(1..=512).speed(1.0));
                ui.label("seed:");
                ui.add(egui::DragValue::new(&mut self.cfg.seed).speed(1.0));
                if ui.button("Rebuild").clicked() {
                    self.rebuild();
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 0.1..=10.0).text("Zoom"));
                ui.checkbox(&mut self.show_grid_lines, "Grid");
            });
        });
    }

    /// Builds the bottom status bar (grain total, last avalanche, drops).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("n = {}", self.pile.size()));
                ui.separator();
                ui.label(format!("grains = {}", self.pile.total_grains()));
                ui.label(match self.last_avalanche {
                    Some(size) => format!("avalanche = {size}"),
                    None => "avalanche = -".to_owned(),
                });
                ui.label(format!("drops = {}", self.drops_done));
            });
        });
    }

    /// Draws one frame of the height field into the central panel.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                let delta = response.drag_delta();
                self.pan += delta;
            }

            // Zoom around the mouse cursor.
            if ui.ctx().input(|i| i.raw_scroll_delta.y != 0.0) {
                let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
                if scroll != 0.0 {
                    let pointer_screen = response.hover_pos().unwrap_or(rect.center());

                    let world_before = self.screen_to_world(pointer_screen, rect);

                    let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                    let new_zoom = (self.zoom * factor).clamp(0.1, 10.0);
                    self.zoom = new_zoom;

                    let screen_after = self.world_to_screen(world_before, rect);

                    let delta = pointer_screen - screen_after;
                    self.pan += delta;
                }
            }

            // Draw cells colored by height.
            let heights = self.pile.snapshot();
            let n = self.pile.size();
            for (row, cells) in heights.iter().enumerate() {
                for (col, &h) in cells.iter().enumerate() {
                    let min = self.world_to_screen(Vec2::new(col as f32, row as f32), rect);
                    let max =
                        self.world_to_screen(Vec2::new(col as f32 + 1.0, row as f32 + 1.0), rect);
                    let idx = (h as usize).min(PALETTE.len() - 1);
                    painter.rect_filled(
                        egui::Rect::from_min_max(min, max),
                        egui::CornerRadius::ZERO,
                        PALETTE[idx],
                    );
                }
            }

            // Cell borders, only once they are wide enough to read.
            if self.show_grid_lines && self.cell_px(rect) >= GRID_LINE_MIN_CELL_PX {
                let stroke = egui::Stroke::new(1.0, egui::Color32::from_black_alpha(70));
                for i in 0..=n {
                    let a = self.world_to_screen(Vec2::new(0.0, i as f32), rect);
                    let b = self.world_to_screen(Vec2::new(n as f32, i as f32), rect);
                    painter.line_segment([a, b], stroke);

                    let a = self.world_to_screen(Vec2::new(i as f32, 0.0), rect);
                    let b = self.world_to_screen(Vec2::new(i as f32, n as f32), rect);
                    painter.line_segment([a, b], stroke);
                }
            }

            // Auto-run: one drop per pacing interval, pausing only between
            // drops so the visible grid is always stable.
            if self.running {
                let now = ctx.input(|i| i.time);
                let interval = 1.0 / f64::from(self.drops_per_second);
                if now - self.last_drop_time >= interval {
                    self.drop_once();
                    self.last_drop_time = now;
                }

                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    ///
    /// This method:
    /// - Renders the top control bar and status bar.
    /// - Draws the central height-field view and handles interactions.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_central_panel(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(0.0, 0.0), egui::vec2(800.0, 600.0))
    }

    #[test]
    fn world_to_screen_and_back_is_roundtrip() {
        let mut viewer = Viewer::new();
        // Use non-trivial zoom and pan to exercise the math.
        viewer.zoom = 2.0;
        viewer.pan = egui::vec2(15.0, -7.0);
        let rect = test_rect();

        let world_points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(16.0, 16.0),
            Vec2::new(3.5, 28.25),
        ];

        let eps = 1e-4;

        for p in world_points {
            let screen = viewer.world_to_screen(p, rect);
            let back = viewer.screen_to_world(screen, rect);

            assert!(
                (back.x - p.x).abs() < eps && (back.y - p.y).abs() < eps,
                "roundtrip mismatch: p={:?}, back={:?}",
                p,
                back
            );
        }
    }

    #[test]
    fn grid_corners_map_symmetrically_around_the_panel_center() {
        let viewer = Viewer::new();
        let rect = test_rect();
        let n = viewer.pile.size() as f32;

        let top_left = viewer.world_to_screen(Vec2::new(0.0, 0.0), rect);
        let bottom_right = viewer.world_to_screen(Vec2::new(n, n), rect);
        let center = rect.center();

        let eps = 1e-3;
        assert!((center.x - top_left.x - (bottom_right.x - center.x)).abs() < eps);
        assert!((center.y - top_left.y - (bottom_right.y - center.y)).abs() < eps);
    }

    #[test]
    fn drop_once_updates_counters_and_keeps_the_pile_stable() {
        let mut viewer = Viewer::new();
        assert_eq!(viewer.drops_done, 0);
        assert!(viewer.last_avalanche.is_none());

        for expected in 1..=50u64 {
            viewer.drop_once();
            assert_eq!(viewer.drops_done, expected);
            assert!(viewer.last_avalanche.is_some());
            assert!(viewer.pile.is_stable());
        }
    }

    #[test]
    fn reset_restores_basic_state() {
        let mut viewer = Viewer::new();

        for _ in 0..20 {
            viewer.drop_once();
        }
        viewer.running = true;

        viewer.reset();

        // Heights are gone, counters cleared, auto-run stopped.
        assert_eq!(viewer.pile.total_grains(), 0);
        assert_eq!(viewer.drops_done, 0);
        assert!(viewer.last_avalanche.is_none());
        assert!(!viewer.running);

        // The pile itself survives with its configured size.
        assert_eq!(viewer.pile.size(), viewer.cfg.size);
    }

    #[test]
    fn rebuild_applies_the_pending_config() {
        let mut viewer = Viewer::new();
        viewer.drop_once();
        viewer.running = true;

        viewer.cfg.size = 8;
        viewer.cfg.seed = 99;
        viewer.rebuild();

        assert_eq!(viewer.pile.size(), 8);
        assert_eq!(viewer.pile.total_grains(), 0);
        assert_eq!(viewer.drops_done, 0);
        assert!(viewer.last_avalanche.is_none());
        assert!(!viewer.running);
    }

    #[test]
    fn palette_covers_every_stable_height() {
        // Heights 0..=3 each get a distinct color; anything above the
        // stable range (never visible between drops) clamps to the last.
        assert_eq!(PALETTE.len(), 4);
        for w in PALETTE.windows(2) {
            assert_ne!(w[0], w[1]);
        }
    }
}
