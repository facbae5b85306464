//! Time Management
//!
//! Fixed-step timing for deterministic simulation loops. The host loop owns
//! the clock and hands each tick's `dt` to the systems it drives.

/// Fixed time step configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedTimeStep {
    /// Fixed timestep in seconds
    pub step: f64,
    /// Maximum number of fixed updates per frame (to prevent spiral of death)
    pub max_updates: u32,
}

impl Default for FixedTimeStep {
    fn default() -> Self {
        Self {
            step: 1.0 / 60.0, // 60 Hz
            max_updates: 8,
        }
    }
}

impl FixedTimeStep {
    /// Create a new fixed time step with the given frequency.
    ///
    /// Non-positive frequencies fall back to the 60 Hz default.
    pub fn from_hz(hz: f64) -> Self {
        if hz > 0.0 {
            Self {
                step: 1.0 / hz,
                ..Self::default()
            }
        } else {
            Self::default()
        }
    }

    /// Set the maximum number of updates per frame
    pub fn with_max_updates(mut self, max: u32) -> Self {
        self.max_updates = max;
        self
    }

    /// Step length as f32, the precision simulation code works in
    pub fn step_secs(&self) -> f32 {
        self.step as f32
    }
}

/// Tick counter for a fixed-step simulation.
#[derive(Debug, Clone, Default)]
pub struct SimulationClock {
    step: FixedTimeStep,
    ticks: u64,
    accumulator: f64,
}

impl SimulationClock {
    pub fn new(step: FixedTimeStep) -> Self {
        Self {
            step,
            ticks: 0,
            accumulator: 0.0,
        }
    }

    pub fn step(&self) -> FixedTimeStep {
        self.step
    }

    /// Number of completed ticks
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated time at the start of the next tick
    pub fn elapsed(&self) -> f64 {
        self.ticks as f64 * self.step.step
    }

    /// Advance exactly one tick and return its `dt`
    pub fn tick(&mut self) -> f32 {
        self.ticks += 1;
        self.step.step_secs()
    }

    /// Feed frame time and return how many fixed ticks should run now.
    ///
    /// Capped at `max_updates`; time beyond the cap is discarded.
    pub fn advance(&mut self, frame_time: f64) -> u32 {
        self.accumulator += frame_time.max(0.0);
        let mut due = 0;
        while self.accumulator >= self.step.step && due < self.step.max_updates {
            self.accumulator -= self.step.step;
            due += 1;
        }
        if due == self.step.max_updates {
            self.accumulator = self.accumulator.min(self.step.step);
        }
        due
    }

    /// Interpolation factor for rendering between fixed ticks
    pub fn interpolation(&self) -> f64 {
        (self.accumulator / self.step.step).clamp(0.0, 1.0)
    }
}
