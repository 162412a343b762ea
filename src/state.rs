//! Field storage for one simulation session.

use crate::error::{Result, SimError};
use crate::mask::ObstacleMask;
use ndarray::parallel::prelude::*;
use ndarray::{s, Array2};

/// RGB triple with channels in [0, 1].
pub type Rgb = [f32; 3];

/// All per-cell arrays of a session, allocated once and never resized.
///
/// `u_next` is scratch: its contents are meaningless between steps.
pub struct SimulationState {
    pub(crate) u: Array2<f32>,
    pub(crate) u_prev: Array2<f32>,
    pub(crate) u_next: Array2<f32>,
    pub(crate) walls: ObstacleMask,
    pub(crate) pixels: Array2<Rgb>,
}

impl SimulationState {
    /// Smallest grid with at least one interior cell per axis.
    pub const MIN_SIDE: usize = 3;

    /// Zero-initialized fields shaped after `walls`.
    ///
    /// # Panics
    /// If `walls` is smaller than 3×3; the stencil needs an interior.
    /// [`with_mask`](Self::with_mask) reports this as an error instead.
    pub fn new(walls: ObstacleMask) -> Self {
        let dim = walls.dim();
        assert!(
            dim.0 >= Self::MIN_SIDE && dim.1 >= Self::MIN_SIDE,
            "grid {}x{} has no interior cells",
            dim.0,
            dim.1
        );
        Self {
            u: Array2::zeros(dim),
            u_prev: Array2::zeros(dim),
            u_next: Array2::zeros(dim),
            walls,
            pixels: Array2::from_elem(dim, [0.0; 3]),
        }
    }

    /// Zero-initialized fields on a `width × height` grid, checking the mask fits.
    pub fn with_mask(width: usize, height: usize, walls: ObstacleMask) -> Result<Self> {
        if walls.dim() != (width, height) {
            return Err(SimError::MaskShape {
                expected: (width, height),
                got: walls.dim(),
            });
        }
        if width < Self::MIN_SIDE || height < Self::MIN_SIDE {
            return Err(SimError::invalid_config(format!(
                "grid must be at least {}x{}, got {}x{}",
                Self::MIN_SIDE,
                Self::MIN_SIDE,
                width,
                height
            )));
        }
        Ok(Self::new(walls))
    }

    pub fn width(&self) -> usize {
        self.u.dim().0
    }

    pub fn height(&self) -> usize {
        self.u.dim().1
    }

    pub fn u(&self) -> &Array2<f32> {
        &self.u
    }

    pub fn u_prev(&self) -> &Array2<f32> {
        &self.u_prev
    }

    pub fn walls(&self) -> &ObstacleMask {
        &self.walls
    }

    pub fn pixels(&self) -> &Array2<Rgb> {
        &self.pixels
    }

    /// Whether `(i, j)` lies on the outermost ring of cells.
    pub fn is_border(&self, i: usize, j: usize) -> bool {
        i == 0 || j == 0 || i == self.width() - 1 || j == self.height() - 1
    }

    /// Silence the field without reallocating. The mask is kept.
    pub fn reset(&mut self) {
        self.u.fill(0.0);
        self.u_prev.fill(0.0);
        self.u_next.fill(0.0);
    }

    /// Largest |u| over the grid.
    pub fn peak_amplitude(&self) -> f32 {
        self.u.iter().fold(0.0_f32, |acc, &v| acc.max(v.abs()))
    }

    /// Whether both settled pressure fields hold only finite values.
    pub fn is_finite(&self) -> bool {
        self.u.par_iter().all(|v| v.is_finite()) && self.u_prev.par_iter().all(|v| v.is_finite())
    }

    /// Copy the border ring of `u` into `u_next` so a commit leaves it untouched.
    pub(crate) fn seed_border(&mut self) {
        let (w, h) = self.u.dim();
        self.u_next.slice_mut(s![0, ..]).assign(&self.u.slice(s![0, ..]));
        self.u_next.slice_mut(s![w - 1, ..]).assign(&self.u.slice(s![w - 1, ..]));
        self.u_next.slice_mut(s![.., 0]).assign(&self.u.slice(s![.., 0]));
        self.u_next.slice_mut(s![.., h - 1]).assign(&self.u.slice(s![.., h - 1]));
    }

    /// `u_prev ← u; u ← u_next` for every cell at once, as a buffer rotation.
    pub(crate) fn commit(&mut self) {
        std::mem::swap(&mut self.u_prev, &mut self.u);
        std::mem::swap(&mut self.u, &mut self.u_next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_silent() {
        let state = SimulationState::new(ObstacleMask::all_air(8, 6));
        assert_eq!(state.width(), 8);
        assert_eq!(state.height(), 6);
        assert_eq!(state.peak_amplitude(), 0.0);
        assert!(state.is_finite());
        assert!(state.pixels().iter().all(|p| *p == [0.0; 3]));
    }

    #[test]
    fn test_mask_shape_mismatch() {
        let err = SimulationState::with_mask(8, 8, ObstacleMask::all_air(8, 7));
        assert!(matches!(err, Err(SimError::MaskShape { .. })));
    }

    #[test]
    fn test_too_small_grid_rejected() {
        let err = SimulationState::with_mask(2, 5, ObstacleMask::all_air(2, 5));
        assert!(matches!(err, Err(SimError::InvalidConfig(_))));
        assert!(SimulationState::with_mask(3, 3, ObstacleMask::all_air(3, 3)).is_ok());
    }

    #[test]
    #[should_panic(expected = "no interior cells")]
    fn test_new_panics_without_interior() {
        SimulationState::new(ObstacleMask::all_air(1, 8));
    }

    #[test]
    fn test_commit_rotates_buffers() {
        let mut state = SimulationState::new(ObstacleMask::all_air(4, 4));
        state.u.fill(1.0);
        state.u_prev.fill(2.0);
        state.u_next.fill(3.0);
        state.commit();
        assert!(state.u.iter().all(|&v| v == 3.0));
        assert!(state.u_prev.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_seed_border_copies_ring_only() {
        let mut state = SimulationState::new(ObstacleMask::all_air(5, 4));
        state.u.fill(7.0);
        state.seed_border();
        for ((i, j), &v) in state.u_next.indexed_iter() {
            let expected = if state.is_border(i, j) { 7.0 } else { 0.0 };
            assert_eq!(v, expected, "cell ({i}, {j})");
        }
    }

    #[test]
    fn test_reset_keeps_mask() {
        let walls = ObstacleMask::from_fn(6, 6, |x, _| x == 3);
        let mut state = SimulationState::new(walls.clone());
        state.u.fill(4.0);
        state.u_prev.fill(-4.0);
        state.reset();
        assert_eq!(state.peak_amplitude(), 0.0);
        assert!(state.u_prev.iter().all(|&v| v == 0.0));
        assert_eq!(state.walls(), &walls);
    }

    #[test]
    fn test_non_finite_detected() {
        let mut state = SimulationState::new(ObstacleMask::all_air(4, 4));
        state.u[[1, 2]] = f32::NAN;
        assert!(!state.is_finite());
    }
}
