//! Named phase initializers for mesh parameters.
//!
//! Maps the initializer names used across the mesh builders to concrete
//! sampling routines. `random_*` names draw uniform phases; the `haar_*`
//! family draws internal phases θ = 2·asin(u^(1/2α)) whose per-slot
//! sensitivity α makes the assembled mesh approximately Haar-uniform
//! (triangular ramp for the Reck mesh, checkerboard depth for the
//! rectangular families). Under the Hadamard convention θ maps to π − θ.

use std::f64::consts::PI;

use ndarray::{Array, Array1, Array2, Dimension};
use rand::Rng;

use crate::error::MeshError;

/// Phase basis convention for the mesh's 2×2 blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseBasis {
    /// Bloch-sphere symmetric phase placement.
    Bloch,
    /// Single-mode (external arm) phase placement.
    SingleMode,
}

/// A named initial-value tensor, the differentiable-variable form of a
/// mesh parameter handed to downstream transform layers.
#[derive(Debug, Clone)]
pub struct Parameter<D: Dimension> {
    pub name: &'static str,
    pub values: Array<f64, D>,
}

/// Registered phase initializer, resolved from its registry name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseInitializer {
    HaarRect,
    HaarTri,
    HaarPrm,
    RandomTheta,
    RandomPhi,
    RandomGamma,
}

impl PhaseInitializer {
    /// Look up an initializer by registry name.
    pub fn from_name(name: &str) -> Result<Self, MeshError> {
        match name {
            "haar_rect" => Ok(Self::HaarRect),
            "haar_tri" => Ok(Self::HaarTri),
            "haar_prm" => Ok(Self::HaarPrm),
            "random_theta" => Ok(Self::RandomTheta),
            "random_phi" => Ok(Self::RandomPhi),
            "random_gamma" => Ok(Self::RandomGamma),
            _ => Err(MeshError::UnknownInitializer {
                name: name.to_string(),
            }),
        }
    }

    /// Registry name of this initializer.
    pub fn name(&self) -> &'static str {
        match self {
            Self::HaarRect => "haar_rect",
            Self::HaarTri => "haar_tri",
            Self::HaarPrm => "haar_prm",
            Self::RandomTheta => "random_theta",
            Self::RandomPhi => "random_phi",
            Self::RandomGamma => "random_gamma",
        }
    }

    /// Whether this initializer draws the Haar internal-phase
    /// distribution. Haar names only describe per-MZI theta fields and
    /// cannot shape a per-mode parameter.
    pub fn is_haar(&self) -> bool {
        matches!(self, Self::HaarRect | Self::HaarTri | Self::HaarPrm)
    }

    /// Sample a (num_layers, units/2) per-MZI phase array.
    pub fn layer_values<R: Rng + ?Sized>(
        &self,
        units: usize,
        num_layers: usize,
        hadamard: bool,
        rng: &mut R,
    ) -> Array2<f64> {
        let width = units / 2;
        match self {
            Self::RandomTheta | Self::RandomPhi | Self::RandomGamma => {
                Array2::from_shape_fn((num_layers, width), |_| 2.0 * PI * rng.gen::<f64>())
            }
            Self::HaarTri => Array2::from_shape_fn((num_layers, width), |(layer, _)| {
                haar_theta(tri_alpha(units, layer), hadamard, rng)
            }),
            Self::HaarRect | Self::HaarPrm => {
                Array2::from_shape_fn((num_layers, width), |(layer, slot)| {
                    haar_theta(rect_alpha(units, num_layers, layer, slot), hadamard, rng)
                })
            }
        }
    }

    /// Sample a (units,) per-mode phase array: always Uniform[0, 2π),
    /// since no per-mode Haar form exists (see [`Self::is_haar`]).
    pub fn mode_values<R: Rng + ?Sized>(&self, units: usize, rng: &mut R) -> Array1<f64> {
        Array1::from_shape_fn(units, |_| 2.0 * PI * rng.gen::<f64>())
    }
}

/// Haar internal phase: θ = 2·asin(u^(1/2α)), flipped to π − θ under the
/// Hadamard convention.
fn haar_theta<R: Rng + ?Sized>(alpha: f64, hadamard: bool, rng: &mut R) -> f64 {
    let u: f64 = rng.gen();
    let theta = 2.0 * u.powf(1.0 / (2.0 * alpha)).asin();
    if hadamard {
        PI - theta
    } else {
        theta
    }
}

/// Sensitivity for the triangular (Reck) mesh: the diamond ramp
/// 1, 2, …, N−1, …, 2, 1 over the 2N−3 layers.
fn tri_alpha(units: usize, layer: usize) -> f64 {
    let up = layer + 1;
    let down = (2 * units).saturating_sub(3 + layer);
    up.min(down).clamp(1, units - 1) as f64
}

/// Sensitivity for the rectangular mesh: distance of the MZI from the
/// nearest mesh boundary, in layers or in modes, whichever is closer.
fn rect_alpha(units: usize, num_layers: usize, layer: usize, slot: usize) -> f64 {
    let top_mode = 2 * slot + layer % 2;
    let depth = (layer + 1).min(num_layers - layer);
    let span = (top_mode + 1).min(units.saturating_sub(top_mode + 1));
    depth.min(span).max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn names_round_trip() {
        for name in [
            "haar_rect",
            "haar_tri",
            "haar_prm",
            "random_theta",
            "random_phi",
            "random_gamma",
        ] {
            assert_eq!(PhaseInitializer::from_name(name).unwrap().name(), name);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = PhaseInitializer::from_name("haar_hex").unwrap_err();
        assert!(matches!(err, MeshError::UnknownInitializer { .. }));
    }

    #[test]
    fn layer_values_have_mesh_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let theta = PhaseInitializer::HaarRect.layer_values(8, 8, false, &mut rng);
        assert_eq!(theta.shape(), &[8, 4]);
    }

    #[test]
    fn random_phases_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(11);
        let phi = PhaseInitializer::RandomPhi.layer_values(6, 6, false, &mut rng);
        assert!(phi.iter().all(|&v| (0.0..2.0 * PI).contains(&v)));
    }

    #[test]
    fn haar_theta_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(13);
        for initializer in [
            PhaseInitializer::HaarRect,
            PhaseInitializer::HaarTri,
            PhaseInitializer::HaarPrm,
        ] {
            let theta = initializer.layer_values(8, 13, false, &mut rng);
            assert!(theta.iter().all(|&v| (0.0..=PI).contains(&v)));
        }
    }

    #[test]
    fn hadamard_convention_flips_haar_theta() {
        // Same seed: the Hadamard draw must mirror the beamsplitter draw.
        let mut rng_a = StdRng::seed_from_u64(17);
        let mut rng_b = StdRng::seed_from_u64(17);
        let plain = PhaseInitializer::HaarRect.layer_values(4, 4, false, &mut rng_a);
        let flipped = PhaseInitializer::HaarRect.layer_values(4, 4, true, &mut rng_b);
        for (a, b) in plain.iter().zip(flipped.iter()) {
            assert!((a + b - PI).abs() < 1e-12);
        }
    }

    #[test]
    fn mode_values_cover_every_mode() {
        let mut rng = StdRng::seed_from_u64(19);
        let gamma = PhaseInitializer::RandomGamma.mode_values(5, &mut rng);
        assert_eq!(gamma.len(), 5);
        assert!(gamma.iter().all(|&v| (0.0..2.0 * PI).contains(&v)));
    }

    #[test]
    fn tri_alpha_matches_diamond_ramp() {
        // units=4: layers 0..5 ramp 1,2,3,2,1.
        let ramp: Vec<f64> = (0..5).map(|l| tri_alpha(4, l)).collect();
        assert_eq!(ramp, vec![1.0, 2.0, 3.0, 2.0, 1.0]);
    }
}
