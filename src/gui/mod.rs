mod app;
mod config;
mod draw;
mod fps_limit;

pub use app::Viewer;
use config::Config;
use fps_limit::FpsLimiter;

use crate::{BitGrid, EngineKind, StepEngine};

/// Opens the viewer window and blocks until it is closed.
pub fn run_viewer(
    grid: BitGrid,
    engine: Box<dyn StepEngine>,
    mode: EngineKind,
) -> Result<(), eframe::Error> {
    use eframe::egui::{vec2, ViewportBuilder};

    let [w, h] = Config::WINDOW_SIZE;
    let [min_w, min_h] = Config::MIN_WINDOW_SIZE;
    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size(vec2(w, h))
            .with_min_inner_size(vec2(min_w, min_h)),
        follow_system_theme: false,
        default_theme: eframe::Theme::Light,
        ..Default::default()
    };
    let title = Viewer::title(mode);
    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(Viewer::new(grid, engine, mode)))),
    )
}
