//! False-color rendering of the pressure field.

use crate::mask::{ObstacleMask, WALL};
use crate::state::{Rgb, SimulationState};
use image::{Rgb as ImageRgb, RgbImage};
use ndarray::{Array2, Zip};

/// Color of wall cells, independent of pressure.
pub const WALL_COLOR: Rgb = [0.3, 0.3, 0.3];

/// Amplified pressure above which the ramp starts whitening.
const HOT_THRESHOLD: f32 = 0.8;

/// Map an amplified pressure value to a color.
///
/// Positive pressure ramps black → red, then red → white past 0.8; negative
/// pressure does the same on the blue channel.
pub fn color_for(val: f32) -> Rgb {
    let mut color = [0.0; 3];
    if val > 0.0 {
        color[0] = val.min(1.0);
        if val > HOT_THRESHOLD {
            let white = ((val - HOT_THRESHOLD) * 2.0).min(1.0);
            color[1] = white;
            color[2] = white;
        }
    } else if val < 0.0 {
        color[2] = (-val).min(1.0);
        if val < -HOT_THRESHOLD {
            let white = ((-val - HOT_THRESHOLD) * 2.0).min(1.0);
            color[0] = white;
            color[1] = white;
        }
    }
    color
}

/// Fill `pixels` from `u` and the mask. Pure: output depends only on the inputs.
pub fn render(u: &Array2<f32>, walls: &ObstacleMask, gain: f32, pixels: &mut Array2<Rgb>) {
    Zip::from(pixels)
        .and(u)
        .and(walls.cells())
        .par_for_each(|pixel, &value, &wall| {
            *pixel = if wall == WALL {
                WALL_COLOR
            } else {
                color_for(value * gain)
            };
        });
}

/// Renders a session's field into its color buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderer {
    gain: f32,
}

impl Renderer {
    pub fn new(gain: f32) -> Self {
        Self { gain }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn render(&self, state: &mut SimulationState) {
        let SimulationState {
            u, walls, pixels, ..
        } = state;
        render(u, walls, self.gain, pixels);
    }
}

/// Quantize a color buffer into an 8-bit image, `x` across and `y` down.
pub fn to_rgb_image(pixels: &Array2<Rgb>) -> RgbImage {
    let (width, height) = pixels.dim();
    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let [r, g, b] = pixels[[x as usize, y as usize]];
        ImageRgb([quantize(r), quantize(g), quantize(b)])
    })
}

/// Round a [0, 1] channel to 8 bits, clamping out-of-range values.
pub fn quantize(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_is_black() {
        assert_eq!(color_for(0.0), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_positive_ramp() {
        assert_eq!(color_for(0.5), [0.5, 0.0, 0.0]);
        let hot = color_for(0.9);
        assert_relative_eq!(hot[0], 0.9);
        assert_relative_eq!(hot[1], 0.2, epsilon = 1e-6);
        assert_relative_eq!(hot[2], 0.2, epsilon = 1e-6);
        assert_eq!(color_for(5.0), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_negative_ramp_mirrors_positive() {
        assert_eq!(color_for(-0.5), [0.0, 0.0, 0.5]);
        let cold = color_for(-0.9);
        assert_relative_eq!(cold[2], 0.9);
        assert_relative_eq!(cold[0], 0.2, epsilon = 1e-6);
        assert_relative_eq!(cold[1], 0.2, epsilon = 1e-6);
        assert_eq!(color_for(-5.0), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_walls_are_gray_regardless_of_pressure() {
        let walls = ObstacleMask::from_fn(3, 3, |x, y| x == 1 && y == 1);
        let u = Array2::from_elem((3, 3), 0.1_f32);
        let mut pixels = Array2::from_elem((3, 3), [0.0; 3]);
        render(&u, &walls, 5.0, &mut pixels);
        assert_eq!(pixels[[1, 1]], WALL_COLOR);
        assert_eq!(pixels[[0, 0]], [0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_quantize_rounds_and_clamps() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(1.0), 255);
        assert_eq!(quantize(0.999), 255);
        assert_eq!(quantize(0.5), 128);
        assert_eq!(quantize(-0.2), 0);
        assert_eq!(quantize(3.0), 255);
    }

    #[test]
    fn test_to_rgb_image_orientation() {
        let mut pixels = Array2::from_elem((4, 2), [0.0; 3]);
        pixels[[3, 0]] = [1.0, 0.0, 0.0];
        let img = to_rgb_image(&pixels);
        assert_eq!(img.dimensions(), (4, 2));
        assert_eq!(img.get_pixel(3, 0).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(0, 1).0, [0, 0, 0]);
    }
}
