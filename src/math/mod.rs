pub mod matrix;
pub mod tensor;

use rand::Rng;
use std::f64::consts::PI;

/// Samples a single value from N(0, 1) using the Box-Muller transform.
/// Both u1 and u2 must be uniform on (0, 1].
pub(crate) fn sample_standard_normal(rng: &mut impl Rng) -> f64 {
    // Draw two independent uniform samples in (0, 1] to avoid log(0).
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = 1.0 - rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}
