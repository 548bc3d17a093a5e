use super::{Config, Viewer};
use crate::NiceInt;
use eframe::egui::{pos2, vec2, Button, Rect, RichText, Sense, Slider, Stroke, Ui, Vec2};

impl Viewer {
    fn new_text(text: &str) -> RichText {
        RichText::new(text)
            .color(Config::TEXT_COLOR)
            .size(Config::TEXT_SIZE)
    }

    fn new_button(text: &str) -> Button {
        Button::new(Self::new_text(text))
            .fill(Config::BUTTON_FILL_COLOR)
            .stroke(Stroke::new(
                Config::BUTTON_STROKE_WIDTH,
                Config::BUTTON_STROKE_COLOR,
            ))
    }

    fn draw_controls(&mut self, ui: &mut Ui) {
        ui.vertical(|ui| {
            ui.set_width(Config::CONTROL_PANEL_WIDTH);

            ui.horizontal(|ui| {
                let text = if self.is_running { "Stop" } else { "Start" };
                if ui.add(Self::new_button(text)).clicked() {
                    self.toggle_running();
                }
                if ui.add_enabled(!self.is_running, Self::new_button("Step")).clicked() {
                    self.request_step();
                }
            });
            ui.add_space(Config::WIDGET_GAP);

            ui.group(|ui| {
                ui.label(Self::new_text("Simulation speed"));
                ui.horizontal(|ui| {
                    ui.label(Self::new_text("FPS: "));
                    ui.add(Slider::new(&mut self.fps, Config::FPS_RANGE));
                });
            });
            ui.add_space(Config::WIDGET_GAP);

            ui.checkbox(&mut self.show_grid_lines, Self::new_text("Show grid lines"));
            ui.add_space(Config::WIDGET_GAP);

            ui.group(|ui| {
                ui.label(Self::new_text(&format!(
                    "Generation: {}",
                    NiceInt::from(self.generation)
                )));
                ui.label(Self::new_text(&format!(
                    "Grid: {}x{}",
                    self.grid.width(),
                    self.grid.height()
                )));
                ui.label(Self::new_text(&format!(
                    "Last step: {:.3} ms",
                    self.last_step_duration * 1e3
                )));
                ui.label(Self::new_text(&self.status()));
            });
        });
    }

    fn draw_field(&self, ui: &mut Ui, area: Vec2) {
        let (w, h) = (self.grid.width() as f32, self.grid.height() as f32);
        let cell = (area.x / w).min(area.y / h).max(f32::MIN_POSITIVE);
        let (response, painter) = ui.allocate_painter(vec2(w * cell, h * cell), Sense::hover());
        let field = response.rect;
        painter.rect_filled(field, 0., Config::DEAD_COLOR);

        for (row, col) in self.grid.live_cells() {
            let min = field.min + vec2(col as f32 * cell, row as f32 * cell);
            painter.rect_filled(
                Rect::from_min_size(min, Vec2::splat(cell)),
                0.,
                Config::ALIVE_COLOR,
            );
        }

        if self.show_grid_lines && cell >= Config::MIN_CELL_PX_FOR_LINES {
            let stroke = Stroke::new(1., Config::GRID_LINE_COLOR);
            for col in 0..=self.grid.width() {
                let x = field.min.x + col as f32 * cell;
                painter.line_segment([pos2(x, field.min.y), pos2(x, field.max.y)], stroke);
            }
            for row in 0..=self.grid.height() {
                let y = field.min.y + row as f32 * cell;
                painter.line_segment([pos2(field.min.x, y), pos2(field.max.x, y)], stroke);
            }
        }
    }

    pub fn draw(&mut self, ui: &mut Ui) {
        ui.horizontal_top(|ui| {
            self.draw_controls(ui);
            ui.add_space(Config::FRAME_MARGIN);
            let area = ui.available_size();
            self.draw_field(ui, area);
        });
    }
}
