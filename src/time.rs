//! Frame clock for the viewer.
//!
//! The engine performs no timing of its own; the viewer measures wall-clock
//! time between frames with [`FrameClock`] and passes the result to
//! [`ParticleEngine::tick`](crate::ParticleEngine::tick).
//!
//! # Example
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//!
//! // Once per frame:
//! let dt = clock.tick();
//! engine.tick(dt);
//! ```

use std::time::{Duration, Instant};

/// Longest frame delta handed to the simulation, in seconds.
pub const DEFAULT_MAX_DELTA: f32 = 0.1;

/// Per-frame timing: delta, elapsed simulation time, frame count and FPS.
#[derive(Debug)]
pub struct FrameClock {
    last_frame: Instant,
    /// Simulated seconds, affected by pause and time scale.
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    paused: bool,
    fixed_delta: Option<f32>,
    time_scale: f32,
    max_delta: f32,
}

impl FrameClock {
    /// Create a clock starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
            max_delta: DEFAULT_MAX_DELTA,
        }
    }

    /// Mark the start of a frame and return the simulation delta in seconds.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> f32 {
        let raw = now.saturating_duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frame_count += 1;

        let fps_elapsed = now.saturating_duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.delta_secs = if self.paused {
            0.0
        } else {
            self.fixed_delta.unwrap_or(raw).min(self.max_delta) * self.time_scale
        };
        self.elapsed_secs += self.delta_secs;
        self.delta_secs
    }

    /// Delta returned by the last [`FrameClock::tick`].
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Total simulated seconds.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Measured frames per second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Stop simulated time. Frames keep counting.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Use a fixed delta instead of wall-clock time. `None` restores real timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }

    /// Set time scale multiplier. Negative values clamp to zero.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Cap on the unscaled delta of a single frame.
    pub fn set_max_delta(&mut self, max_delta: f32) {
        self.max_delta = max_delta.max(0.0);
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
