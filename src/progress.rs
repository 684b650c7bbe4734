//! Progress bar for batch runs
//!
//! Shows closed trades against the batch target using the indicatif crate.

use crate::simulation::report::TerminationReason;
use indicatif::{ProgressBar, ProgressStyle};

pub struct SimulationProgress {
    pub progress: ProgressBar,
    pub target: usize,
}

impl SimulationProgress {
    /// Create a new progress bar counting towards `target` closed trades
    pub fn new(target: usize) -> Self {
        let progress = ProgressBar::new(target as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} trades\n{msg}")
        {
            progress.set_style(style.progress_chars("#>-"));
        }

        Self { progress, target }
    }

    /// A bar that draws nothing, for quiet runs and tests
    pub fn hidden() -> Self {
        Self {
            progress: ProgressBar::hidden(),
            target: 0,
        }
    }

    pub fn update(&self, closed: usize, tick: u64) {
        self.progress.set_position(closed as u64);
        self.progress.set_message(format!("⏱️  Tick {}", tick));
    }

    pub fn finish(&self, reason: TerminationReason, closed: usize) {
        match reason {
            TerminationReason::TargetReached => self
                .progress
                .finish_with_message(format!("✅ Run complete! {} trades closed", closed)),
            other => self
                .progress
                .finish_with_message(format!("⏹️  Stopped ({}) with {} trades closed", other, closed)),
        }
    }
}
