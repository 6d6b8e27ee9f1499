//! Raster output for colorgrowth canvases: final images, in-flight progress
//! snapshots, and numbered animation frames.

use colorgrowth_core::CanvasGrid;
use image::{Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while writing raster output.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("image encode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("frame directory error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rasterize a canvas, one pixel per cell. Channels truncate from the
/// engine's clamped [0, 255] floats; never-settled cells come out as the
/// canvas background.
#[must_use]
pub fn render_image(grid: &CanvasGrid) -> RgbImage {
    RgbImage::from_fn(grid.width(), grid.height(), |x, y| {
        let color = grid.cell_at(x, y).mutated_color();
        Rgb(color.map(|channel| channel as u8))
    })
}

/// Rasterize and encode a canvas to a PNG on disk.
pub fn save_png(grid: &CanvasGrid, path: &Path) -> Result<(), RenderError> {
    render_image(grid).save(path)?;
    Ok(())
}

/// Writes a numbered PNG sequence into a frame directory, zero-padding the
/// file names to the decimal width of the run's fill quota so the series
/// sorts correctly for video assembly.
#[derive(Debug)]
pub struct FrameWriter {
    dir: PathBuf,
    pad: usize,
    next: u32,
}

impl FrameWriter {
    /// Create the frame directory (and parents) and prepare numbering.
    pub fn create(dir: impl Into<PathBuf>, fill_quota: usize) -> Result<Self, RenderError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let pad = fill_quota.max(1).to_string().len();
        Ok(Self { dir, pad, next: 0 })
    }

    /// Append the next frame, returning its path.
    pub fn write_frame(&mut self, grid: &CanvasGrid) -> Result<PathBuf, RenderError> {
        let path = self
            .dir
            .join(format!("{:0pad$}.png", self.next, pad = self.pad));
        save_png(grid, &path)?;
        self.next += 1;
        Ok(path)
    }

    /// Number of frames written so far.
    #[must_use]
    pub const fn frames_written(&self) -> u32 {
        self.next
    }

    /// The directory frames land in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
