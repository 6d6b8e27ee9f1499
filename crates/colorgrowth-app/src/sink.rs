//! Observation sink wiring the engine's hooks to disk and to the log: a
//! progress-snapshot image overwritten as the run advances, numbered
//! animation frames, and periodic painted-count reports.

use colorgrowth_core::{CanvasGrid, GrowthObserver, PassSummary};
use colorgrowth_render::{FrameWriter, save_png};
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub struct RunObserver {
    state_path: PathBuf,
    frames: Option<FrameWriter>,
    last_summary: Option<PassSummary>,
}

impl RunObserver {
    pub fn new(state_path: PathBuf, frames: Option<FrameWriter>) -> Self {
        Self {
            state_path,
            frames,
            last_summary: None,
        }
    }
}

impl GrowthObserver for RunObserver {
    fn on_pass(&mut self, summary: &PassSummary) {
        debug!(
            pass = summary.pass,
            painted = summary.painted,
            recruited = summary.recruited,
            reclaimed = summary.reclaimed,
            "pass complete"
        );
        self.last_summary = Some(*summary);
    }

    fn on_snapshot(&mut self, grid: &CanvasGrid) {
        if let Err(err) = save_png(grid, &self.state_path) {
            warn!(path = %self.state_path.display(), "failed to save progress snapshot: {err}");
        }
        if let Some(summary) = &self.last_summary {
            info!(
                "painted {} of desired {} coordinates (on a canvas of {} pixels)",
                summary.painted, summary.fill_quota, summary.total_cells
            );
        }
    }

    fn on_frame(&mut self, grid: &CanvasGrid, frame: u32) {
        if let Some(writer) = &mut self.frames {
            if let Err(err) = writer.write_frame(grid) {
                warn!(frame, "failed to save animation frame: {err}");
            }
        }
    }
}
