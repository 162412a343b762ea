//! Click-driven energy injection.

use crate::mask::WALL;
use crate::state::SimulationState;
use tracing::debug;

/// Set `u` and `u_prev` to `value` on the square of half-width `radius`
/// around the normalized position `(x, y)`.
///
/// Equal current and previous values give a stationary impulse with zero
/// initial velocity. Only cells with `0 < i < W` and `0 < j < H` are written,
/// and wall cells never receive pressure. Returns the number of cells set.
pub fn excite(state: &mut SimulationState, x: f32, y: f32, radius: usize, value: f32) -> usize {
    if !x.is_finite() || !y.is_finite() {
        return 0;
    }
    let (width, height) = (state.width() as i64, state.height() as i64);
    let ix = (x * width as f32).floor() as i64;
    let iy = (y * height as f32).floor() as i64;
    let r = i64::try_from(radius).unwrap_or(i64::MAX);

    // Float-to-int casts saturate, so far-off clicks must not overflow here.
    let i_range = ix.saturating_sub(r).max(1)..=ix.saturating_add(r).min(width - 1);
    let j_range = iy.saturating_sub(r).max(1)..=iy.saturating_add(r).min(height - 1);

    let mut written = 0;
    for i in i_range {
        for j in j_range.clone() {
            let cell = [i as usize, j as usize];
            if state.walls.cells()[cell] == WALL {
                continue;
            }
            state.u[cell] = value;
            state.u_prev[cell] = value;
            written += 1;
        }
    }

    if written > 0 {
        debug!("Excited {} cells around ({}, {})", written, ix, iy);
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::ObstacleMask;

    #[test]
    fn test_centre_click_fills_square() {
        let mut state = SimulationState::new(ObstacleMask::all_air(20, 20));
        let written = excite(&mut state, 0.5, 0.5, 3, 10.0);
        assert_eq!(written, 49);
        assert_eq!(state.u()[[10, 10]], 10.0);
        assert_eq!(state.u_prev()[[7, 13]], 10.0);
        assert_eq!(state.u()[[6, 10]], 0.0);
        assert_eq!(state.u()[[10, 14]], 0.0);
    }

    #[test]
    fn test_corner_click_is_clipped() {
        let mut state = SimulationState::new(ObstacleMask::all_air(20, 20));
        let written = excite(&mut state, 0.0, 0.0, 3, 10.0);
        // Cells 1..=3 on each axis; index 0 is excluded.
        assert_eq!(written, 9);
        assert_eq!(state.u()[[0, 0]], 0.0);
        assert_eq!(state.u()[[1, 1]], 10.0);
    }

    #[test]
    fn test_far_edge_reaches_border() {
        let mut state = SimulationState::new(ObstacleMask::all_air(20, 20));
        excite(&mut state, 0.99, 0.5, 3, 10.0);
        assert_eq!(state.u()[[19, 10]], 10.0);
    }

    #[test]
    fn test_out_of_range_is_noop() {
        let mut state = SimulationState::new(ObstacleMask::all_air(20, 20));
        assert_eq!(excite(&mut state, 3.0, 0.5, 3, 10.0), 0);
        assert_eq!(excite(&mut state, -1.0, -1.0, 3, 10.0), 0);
        assert_eq!(excite(&mut state, f32::NAN, 0.5, 3, 10.0), 0);
        assert_eq!(state.peak_amplitude(), 0.0);
    }

    #[test]
    fn test_huge_coordinates_are_noop() {
        let mut state = SimulationState::new(ObstacleMask::all_air(20, 20));
        assert_eq!(excite(&mut state, 1e30, 0.5, 3, 10.0), 0);
        assert_eq!(excite(&mut state, -1e30, 0.5, 3, 10.0), 0);
        assert_eq!(excite(&mut state, 0.5, f32::MAX, 3, 10.0), 0);
        assert_eq!(excite(&mut state, f32::MIN, f32::MIN, 3, 10.0), 0);
        assert_eq!(state.peak_amplitude(), 0.0);
    }

    #[test]
    fn test_oversized_radius_is_clipped_to_grid() {
        let mut state = SimulationState::new(ObstacleMask::all_air(10, 10));
        assert_eq!(excite(&mut state, 0.5, 0.5, usize::MAX, 1.0), 81);
        assert_eq!(excite(&mut state, 0.5, 0.5, i64::MAX as usize, 1.0), 81);
        assert_eq!(state.u()[[0, 0]], 0.0);
        assert_eq!(state.u()[[9, 9]], 1.0);
    }

    #[test]
    fn test_repeated_click_is_idempotent() {
        let mut state = SimulationState::new(ObstacleMask::all_air(16, 16));
        excite(&mut state, 0.3, 0.6, 2, 4.0);
        let first = state.u().clone();
        excite(&mut state, 0.3, 0.6, 2, 4.0);
        assert_eq!(state.u(), &first);
    }

    #[test]
    fn test_walls_are_skipped() {
        let walls = ObstacleMask::from_fn(20, 20, |x, _| x == 10);
        let mut state = SimulationState::new(walls);
        let written = excite(&mut state, 0.5, 0.5, 3, 10.0);
        assert_eq!(written, 42);
        assert_eq!(state.u()[[10, 10]], 0.0);
        assert_eq!(state.u()[[9, 10]], 10.0);
    }
}
