use super::{Config, FpsLimiter};
use crate::{BitGrid, EngineKind, StepEngine};
use eframe::egui::{CentralPanel, Color32, Context, Frame, Key, Margin};
use std::time::Instant;

/// Window showing one grid advanced by one engine.
///
/// The grid is only ever changed through `engine.step`.
pub struct Viewer {
    pub(super) grid: BitGrid,
    pub(super) engine: Box<dyn StepEngine>,
    pub(super) mode: EngineKind,
    pub(super) is_running: bool,
    pub(super) do_one_step: bool,
    pub(super) fps: u32,                  // Requested generations per second.
    pub(super) show_grid_lines: bool,
    pub(super) generation: u64,
    pub(super) last_step_duration: f64,  // Seconds.
    pub(super) error: Option<String>,     // Last step failure, stops the animation.
    pub(super) fps_limiter: FpsLimiter,
}

impl Viewer {
    pub fn new(grid: BitGrid, engine: Box<dyn StepEngine>, mode: EngineKind) -> Self {
        Self {
            grid,
            engine,
            mode,
            is_running: false,
            do_one_step: false,
            fps: Config::DEFAULT_FPS,
            show_grid_lines: true,
            generation: 0,
            last_step_duration: 0.,
            error: None,
            fps_limiter: FpsLimiter::default(),
        }
    }

    pub fn title(mode: EngineKind) -> String {
        format!(
            "Conway's Game of Life - {} Mode",
            mode.to_string().to_uppercase()
        )
    }

    pub fn grid(&self) -> &BitGrid {
        &self.grid
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn toggle_running(&mut self) {
        self.is_running = !self.is_running;
        if self.is_running {
            self.error = None;
            self.fps_limiter.restart();
        }
    }

    pub fn request_step(&mut self) {
        self.do_one_step = true;
    }

    pub fn status(&self) -> String {
        if let Some(err) = &self.error {
            format!("Error: {}", err)
        } else if self.is_running {
            format!(
                "Running: {:.1} steps/s, {} live cells",
                self.fps_limiter.fps(),
                self.grid.popcount()
            )
        } else {
            format!("Ready: {} live cells", self.grid.popcount())
        }
    }

    pub(super) fn update_engine(&mut self) {
        if !self.is_running && !self.do_one_step {
            return;
        }
        self.do_one_step = false;

        let timer = Instant::now();
        match self.engine.step(&mut self.grid) {
            Ok(()) => {
                self.generation += 1;
                self.last_step_duration = timer.elapsed().as_secs_f64();
            }
            Err(err) => {
                log::error!("{} engine failed: {}", self.mode, err);
                self.is_running = false;
                self.error = Some(err.to_string());
            }
        }
    }

    fn handle_keys(&mut self, ctx: &Context) {
        ctx.input(|input| {
            if input.key_pressed(Key::Space) {
                self.do_one_step = true;
            }
            if input.key_pressed(Key::Enter) {
                self.toggle_running();
            }
        });
    }
}

impl eframe::App for Viewer {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        CentralPanel::default()
            .frame(
                Frame::default()
                    .inner_margin(Margin::same(Config::FRAME_MARGIN))
                    .fill(Color32::LIGHT_GRAY),
            )
            .show(ctx, |ui| {
                self.handle_keys(ctx);
                self.draw(ui);
                self.update_engine();
            });

        if self.is_running {
            ctx.request_repaint();
            self.fps_limiter.set_max_fps(self.fps as f64);
            self.fps_limiter.delay();
        }
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.engine.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::Viewer;
    use crate::{BitGrid, EngineKind, LifeError, Result, SequentialEngine, StepEngine};

    struct FailingEngine;

    impl StepEngine for FailingEngine {
        fn name(&self) -> String {
            "failing".to_string()
        }

        fn step(&mut self, _grid: &mut BitGrid) -> Result<()> {
            Err(LifeError::LaunchFailure("device lost".to_string()))
        }
    }

    fn blinker() -> BitGrid {
        let mut grid = BitGrid::new(5, 5).unwrap();
        for col in 1..4 {
            grid.set(2, col, true);
        }
        grid
    }

    #[test]
    fn test_title() {
        assert_eq!(
            Viewer::title(EngineKind::Parallel),
            "Conway's Game of Life - PARALLEL Mode"
        );
    }

    #[test]
    fn test_single_step() {
        let mut viewer = Viewer::new(blinker(), Box::new(SequentialEngine), EngineKind::Sequential);
        viewer.update_engine();
        assert_eq!(viewer.generation(), 0);

        viewer.request_step();
        viewer.update_engine();
        assert_eq!(viewer.generation(), 1);
        assert!(viewer.grid().get(1, 2) && viewer.grid().get(3, 2));
        assert!(!viewer.is_running());
        assert_eq!(viewer.status(), "Ready: 3 live cells");
    }

    #[test]
    fn test_failure_stops_animation() {
        let mut viewer = Viewer::new(blinker(), Box::new(FailingEngine), EngineKind::Gpu);
        viewer.toggle_running();
        viewer.update_engine();
        assert!(!viewer.is_running());
        assert_eq!(viewer.generation(), 0);
        assert!(viewer.status().contains("device lost"));
        // the grid keeps the last completed generation
        assert_eq!(viewer.grid(), &blinker());
    }
}
