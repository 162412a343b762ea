//! Finite-difference time-domain integration of the 2D wave equation.
//!
//! Leapfrog scheme on a 5-point Laplacian:
//! `u[n+1] = (2u[n] - u[n-1] + (c·dt/dx)² ∇²u[n]) · damping · wall`

use crate::config::SimConfig;
use crate::state::SimulationState;
use ndarray::{s, Zip};

/// Advances a [`SimulationState`] by fixed time steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stepper {
    courant_sq: f32,
    damping: f32,
}

impl Stepper {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            courant_sq: config.courant_sq(),
            damping: config.damping,
        }
    }

    pub fn courant_sq(&self) -> f32 {
        self.courant_sq
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    /// One stencil pass over the interior followed by a whole-grid commit.
    ///
    /// The stencil reads only `u`, `u_prev` and the mask and writes only
    /// `u_next`, so cells are computed in parallel. The commit runs after the
    /// parallel pass has joined.
    pub fn step(&self, state: &mut SimulationState) {
        let c2 = self.courant_sq;
        let damping = self.damping;
        {
            let SimulationState {
                u,
                u_prev,
                u_next,
                walls,
                ..
            } = &mut *state;
            let u = &*u;

            Zip::indexed(u_next.slice_mut(s![1..-1, 1..-1]))
                .and(u_prev.slice(s![1..-1, 1..-1]))
                .and(walls.cells().slice(s![1..-1, 1..-1]))
                .par_for_each(|(i, j), next, &prev, &wall| {
                    // Interior views start at (1, 1).
                    let (i, j) = (i + 1, j + 1);
                    let centre = u[[i, j]];
                    let laplacian =
                        u[[i + 1, j]] + u[[i - 1, j]] + u[[i, j + 1]] + u[[i, j - 1]] - 4.0 * centre;
                    let raw = 2.0 * centre - prev + c2 * laplacian;
                    *next = raw * damping * wall;
                });
        }

        state.seed_border();
        state.commit();
    }

    pub fn step_n(&self, state: &mut SimulationState, steps: usize) {
        for _ in 0..steps {
            self.step(state);
        }
    }

    /// Discrete energy of the damped leapfrog scheme,
    /// `|u|² + d|u_prev|² - d⟨u, (2 + c²∇²) u_prev⟩` over interior cells.
    ///
    /// While the border ring is silent and walls carry no pressure, one
    /// [`step`](Self::step) multiplies this quantity by exactly `damping`.
    pub fn energy(&self, state: &SimulationState) -> f64 {
        let (u, u_prev) = (&state.u, &state.u_prev);
        let (w, h) = u.dim();
        let c2 = f64::from(self.courant_sq);
        let d = f64::from(self.damping);

        let mut kinetic = 0.0_f64;
        let mut coupling = 0.0_f64;
        for i in 1..w - 1 {
            for j in 1..h - 1 {
                let now = f64::from(u[[i, j]]);
                let prev = f64::from(u_prev[[i, j]]);
                let laplacian = f64::from(
                    u_prev[[i + 1, j]] + u_prev[[i - 1, j]] + u_prev[[i, j + 1]] + u_prev[[i, j - 1]],
                ) - 4.0 * prev;
                kinetic += now * now + d * prev * prev;
                coupling += now * (2.0 * prev + c2 * laplacian);
            }
        }
        kinetic - d * coupling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::ObstacleMask;

    fn stepper() -> Stepper {
        Stepper::new(&SimConfig::default())
    }

    #[test]
    fn test_silent_field_stays_silent() {
        let mut state = SimulationState::new(ObstacleMask::all_air(16, 16));
        stepper().step_n(&mut state, 50);
        assert_eq!(state.peak_amplitude(), 0.0);
    }

    #[test]
    fn test_point_impulse_spreads_one_cell_per_step() {
        let mut state = SimulationState::new(ObstacleMask::all_air(11, 11));
        state.u[[5, 5]] = 1.0;
        state.u_prev[[5, 5]] = 1.0;

        let stepper = stepper();
        stepper.step(&mut state);

        let c2 = stepper.courant_sq();
        let d = stepper.damping();
        assert!((state.u[[5, 5]] - (1.0 - 4.0 * c2) * d).abs() < 1e-6);
        for (i, j) in [(4, 5), (6, 5), (5, 4), (5, 6)] {
            assert!((state.u[[i, j]] - c2 * d).abs() < 1e-6);
        }
        assert_eq!(state.u[[5, 7]], 0.0);
        assert_eq!(state.u[[7, 7]], 0.0);
        assert_eq!(state.u_prev[[5, 5]], 1.0);
    }

    #[test]
    fn test_wall_cells_forced_to_zero() {
        let walls = ObstacleMask::from_fn(12, 12, |x, y| x == 6 && y > 2);
        let mut state = SimulationState::new(walls);
        state.u.fill(1.0);
        state.u_prev.fill(1.0);
        stepper().step(&mut state);
        for y in 3..11 {
            assert_eq!(state.u[[6, y]], 0.0);
        }
        assert!(state.u[[3, 3]] != 0.0);
    }

    #[test]
    fn test_border_preserved_across_steps() {
        let mut state = SimulationState::new(ObstacleMask::all_air(9, 9));
        state.u[[8, 4]] = 3.0;
        state.u_prev[[8, 4]] = 3.0;
        state.u[[4, 4]] = 2.0;
        stepper().step_n(&mut state, 25);
        assert_eq!(state.u[[8, 4]], 3.0);
        assert_eq!(state.u[[0, 4]], 0.0);
    }

    #[test]
    fn test_energy_contracts_by_damping() {
        let mut state = SimulationState::new(ObstacleMask::all_air(20, 20));
        for i in 8..12 {
            for j in 8..12 {
                state.u[[i, j]] = 1.0;
                state.u_prev[[i, j]] = 1.0;
            }
        }
        let stepper = stepper();
        let before = stepper.energy(&state);
        stepper.step(&mut state);
        let after = stepper.energy(&state);
        assert!(before > 0.0);
        let ratio = after / before;
        assert!(
            (ratio - f64::from(stepper.damping())).abs() < 1e-4,
            "energy ratio {ratio}"
        );
    }
}
