use eframe::egui::Color32;
use std::ops::RangeInclusive;

pub struct Config;

impl Config {
    pub const WINDOW_SIZE: [f32; 2] = [1100., 800.];
    pub const MIN_WINDOW_SIZE: [f32; 2] = [640., 360.];

    pub const FRAME_MARGIN: f32 = 10.;
    pub const CONTROL_PANEL_WIDTH: f32 = 280.;
    pub const TEXT_SIZE: f32 = 14.;
    pub const TEXT_COLOR: Color32 = Color32::BLACK;
    pub const BUTTON_STROKE_WIDTH: f32 = 2.;
    pub const BUTTON_STROKE_COLOR: Color32 = Color32::DARK_GRAY;
    pub const BUTTON_FILL_COLOR: Color32 = Color32::LIGHT_GRAY;
    pub const WIDGET_GAP: f32 = 12.;

    pub const ALIVE_COLOR: Color32 = Color32::BLACK;
    pub const DEAD_COLOR: Color32 = Color32::WHITE;
    pub const GRID_LINE_COLOR: Color32 = Color32::LIGHT_GRAY;
    /// Grid lines are skipped when cells get smaller than this many pixels.
    pub const MIN_CELL_PX_FOR_LINES: f32 = 4.;

    pub const DEFAULT_FPS: u32 = 10;
    pub const FPS_RANGE: RangeInclusive<u32> = 1..=60;
}
