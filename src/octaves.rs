//! Layered (octave) noise evaluator.
//!
//! Sums successively smaller, higher-frequency copies of a smooth noise
//! primitive and normalizes the result into [0, 1]. Pure function of the
//! seeded noise source, the octave parameters and the coordinate.

use noise::NoiseFn;

use crate::levels::OctaveParams;

/// Evaluate fractal noise at a continuous coordinate.
///
/// The source primitive is expected to return values in roughly [-1, 1];
/// the sum is divided by the accumulated amplitude (seeded with `max_amp`)
/// and shifted into [0, 1]. Parameters must have been validated: a zero
/// octave count would divide by zero here.
pub fn layered_noise<N: NoiseFn<f64, 2>>(
    source: &N,
    params: &OctaveParams,
    x: f64,
    y: f64,
) -> f64 {
    debug_assert!(params.num_iterations > 0);
    let mut amp = 1.0;
    let mut freq = params.init_frequency;
    let mut sum = 0.0;
    let mut amp_total = params.max_amp;

    for _ in 0..params.num_iterations {
        sum += source.get([x * freq, y * freq]) * amp;
        amp_total += amp;
        amp *= params.persistence;
        freq *= 2.0;
    }

    (sum / amp_total + 1.0) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use noise::Simplex;

    fn params(num_iterations: u32) -> OctaveParams {
        OctaveParams {
            num_iterations,
            persistence: 0.6,
            init_frequency: 2.0,
            max_amp: 0.0,
        }
    }

    #[test]
    fn test_output_in_unit_range() {
        let source = Simplex::new(42);
        let p = params(5);
        for i in 0..50 {
            for j in 0..50 {
                let v = layered_noise(&source, &p, i as f64 * 0.073, j as f64 * 0.091);
                assert!((0.0..=1.0).contains(&v), "out of range: {}", v);
            }
        }
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        let a = layered_noise(&Simplex::new(42), &params(5), 0.731, 1.207);
        let b = layered_noise(&Simplex::new(42), &params(5), 0.731, 1.207);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_seeds_produce_different_fields() {
        let p = params(5);
        let a = layered_noise(&Simplex::new(1), &p, 0.625, 0.875);
        let b = layered_noise(&Simplex::new(2), &p, 0.625, 0.875);
        assert_ne!(a, b);
    }

    #[test]
    fn test_max_amp_damps_amplitude() {
        let source = Simplex::new(7);
        let plain = params(5);
        let damped = OctaveParams {
            max_amp: 10.0,
            ..plain
        };
        let a = layered_noise(&source, &plain, 0.66, 0.77) - 0.5;
        let b = layered_noise(&source, &damped, 0.66, 0.77) - 0.5;
        assert!(b.abs() <= a.abs());
    }
}
