use std::{
    thread::sleep,
    time::{Duration, Instant},
};

/// Paces animation frames and tracks the achieved frame rate.
pub struct FpsLimiter {
    target_frametime: Duration,
    frame_timer: Instant,
    frametime_smoothed: f64,
}

impl Default for FpsLimiter {
    fn default() -> Self {
        Self {
            target_frametime: Duration::ZERO,
            frame_timer: Instant::now(),
            frametime_smoothed: 0.,
        }
    }
}

impl FpsLimiter {
    /// Smoothed frame rate, 0 until the first frame has been timed.
    pub fn fps(&self) -> f64 {
        if self.frametime_smoothed > 0. {
            1. / self.frametime_smoothed
        } else {
            0.
        }
    }

    pub fn set_max_fps(&mut self, max_fps: f64) {
        self.target_frametime = Duration::from_secs_f64(1. / max_fps.max(1.));
    }

    /// Forgets the frame in progress, e.g. when the animation is resumed.
    pub fn restart(&mut self) {
        self.frame_timer = Instant::now();
    }

    pub fn delay(&mut self) {
        let before_wait = self.frame_timer.elapsed();
        if self.target_frametime > before_wait {
            sleep(self.target_frametime - before_wait);
        }

        let frametime = self.frame_timer.elapsed().as_secs_f64();
        if self.frametime_smoothed == 0. {
            self.frametime_smoothed = frametime;
        } else {
            self.frametime_smoothed += (frametime - self.frametime_smoothed) * 0.1;
        }
        self.frame_timer = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::FpsLimiter;

    #[test]
    fn test_frames_are_paced() {
        let mut limiter = FpsLimiter::default();
        assert_eq!(limiter.fps(), 0.);
        limiter.set_max_fps(50.);
        limiter.restart();
        for _ in 0..3 {
            limiter.delay();
        }
        // at most 50 frames per second, measured over whole frames
        assert!(limiter.fps() > 0. && limiter.fps() <= 50.5);
    }
}
