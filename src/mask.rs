//! Obstacle masks: which cells carry pressure (air) and which are walls.
//!
//! A mask is built once per session, either from a floor-plan image or as the
//! all-air fallback, and is read-only afterwards.

use crate::error::{Result, SimError};
use image::imageops::{self, FilterType};
use image::GrayImage;
use ndarray::Array2;
use std::path::Path;
use tracing::{info, warn};

/// Mask value of a wall cell.
pub const WALL: f32 = 0.0;
/// Mask value of an air cell.
pub const AIR: f32 = 1.0;

/// Normalized brightness below which a floor-plan pixel becomes a wall.
pub const WALL_THRESHOLD: f32 = 0.7;
/// Percentage of the histogram clipped at each end by auto-contrast.
pub const AUTOCONTRAST_CUTOFF_PERCENT: f32 = 5.0;
/// Side of the square min filter that thickens dark strokes.
pub const MIN_FILTER_SIZE: usize = 3;

/// Binary per-cell obstacle mask, `W × H`, indexed `[x, y]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleMask {
    cells: Array2<f32>,
}

impl ObstacleMask {
    /// Mask with every cell open to propagation.
    pub fn all_air(width: usize, height: usize) -> Self {
        Self {
            cells: Array2::from_elem((width, height), AIR),
        }
    }

    /// Wrap an existing array; every value must be exactly 0.0 or 1.0.
    pub fn from_array(cells: Array2<f32>) -> Result<Self> {
        if let Some(bad) = cells.iter().find(|&&v| v != WALL && v != AIR) {
            return Err(SimError::invalid_config(format!(
                "obstacle mask values must be 0.0 or 1.0, found {}",
                bad
            )));
        }
        Ok(Self { cells })
    }

    /// Build a mask from a predicate over `(x, y)` returning `true` for walls.
    pub fn from_fn(width: usize, height: usize, mut is_wall: impl FnMut(usize, usize) -> bool) -> Self {
        Self {
            cells: Array2::from_shape_fn((width, height), |(x, y)| {
                if is_wall(x, y) {
                    WALL
                } else {
                    AIR
                }
            }),
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.cells.dim()
    }

    pub fn cells(&self) -> &Array2<f32> {
        &self.cells
    }

    pub fn is_wall(&self, x: usize, y: usize) -> bool {
        self.cells[[x, y]] == WALL
    }

    pub fn wall_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v == WALL).count()
    }
}

/// Obtain the session mask, falling back to all air on cancellation or failure.
///
/// `path == None` means the user cancelled the floor-plan selection.
pub fn acquire(path: Option<&Path>, width: usize, height: usize) -> ObstacleMask {
    let Some(path) = path else {
        info!("No floor plan selected, simulating open air");
        return ObstacleMask::all_air(width, height);
    };

    info!("Loading floor plan: {}", path.display());
    match from_image(path, width, height) {
        Ok(mask) => {
            info!(
                "Floor plan ready: {} of {} cells are walls",
                mask.wall_count(),
                width * height
            );
            mask
        }
        Err(e) => {
            warn!("Failed to load floor plan {}: {e}; using open air", path.display());
            ObstacleMask::all_air(width, height)
        }
    }
}

/// Load a floor-plan image from disk and convert it to a `width × height` mask.
pub fn from_image(path: &Path, width: usize, height: usize) -> Result<ObstacleMask> {
    let gray = image::open(path)?.to_luma8();
    Ok(from_luma(&gray, width, height))
}

/// Convert a grayscale floor plan into a mask.
///
/// Steps: auto-contrast, Lanczos resize to the grid, min filter (dark lines
/// grow), threshold. Dark pixels become walls, light pixels air.
pub fn from_luma(gray: &GrayImage, width: usize, height: usize) -> ObstacleMask {
    let mut gray = gray.clone();
    autocontrast(&mut gray, AUTOCONTRAST_CUTOFF_PERCENT);
    let resized = imageops::resize(&gray, width as u32, height as u32, FilterType::Lanczos3);

    let brightness = Array2::from_shape_fn((width, height), |(x, y)| {
        f32::from(resized.get_pixel(x as u32, y as u32).0[0]) / 255.0
    });
    let eroded = min_filter(&brightness, MIN_FILTER_SIZE);

    ObstacleMask {
        cells: eroded.mapv(|v| if v < WALL_THRESHOLD { WALL } else { AIR }),
    }
}

/// Stretch the histogram so the darkest/lightest `cutoff_percent` of pixels
/// saturate, mapping the remaining range onto 0..=255.
fn autocontrast(img: &mut GrayImage, cutoff_percent: f32) {
    let mut histogram = [0usize; 256];
    for p in img.pixels() {
        histogram[usize::from(p.0[0])] += 1;
    }
    let total: usize = histogram.iter().sum();
    let cut = (total as f32 * cutoff_percent / 100.0) as usize;

    let lo = clipped_bound(histogram.iter().enumerate(), cut);
    let hi = clipped_bound(histogram.iter().enumerate().rev(), cut);
    let (Some(lo), Some(hi)) = (lo, hi) else {
        return;
    };
    if hi <= lo {
        return;
    }

    let scale = 255.0 / (hi - lo) as f32;
    for p in img.pixels_mut() {
        let v = (f32::from(p.0[0]) - lo as f32) * scale;
        p.0[0] = v.round().clamp(0.0, 255.0) as u8;
    }
}

/// First histogram bin still populated after discarding `cut` pixels from
/// the side the iterator starts on.
fn clipped_bound<'a>(bins: impl Iterator<Item = (usize, &'a usize)>, cut: usize) -> Option<usize> {
    let mut remaining = cut;
    for (level, &count) in bins {
        if count > remaining {
            return Some(level);
        }
        remaining -= count;
    }
    None
}

/// Square minimum filter with edge clamping.
fn min_filter(values: &Array2<f32>, size: usize) -> Array2<f32> {
    let (width, height) = values.dim();
    let reach = size / 2;
    Array2::from_shape_fn((width, height), |(x, y)| {
        let mut min = f32::INFINITY;
        for nx in x.saturating_sub(reach)..=(x + reach).min(width - 1) {
            for ny in y.saturating_sub(reach)..=(y + reach).min(height - 1) {
                min = min.min(values[[nx, ny]]);
            }
        }
        min
    })
}
