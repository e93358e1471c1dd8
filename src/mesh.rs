//! Shared mesh model: schedule validation, inverse routing, tunability
//! mask and the stochastic beamsplitter fabrication-error model.
//!
//! A `MeshModel` is fully determined at construction. The only
//! non-deterministic surface is error sampling, which redraws on every
//! access: each draw represents an independent stochastic measurement of
//! the fabricated device. Seeded draws build a fresh local `StdRng` per
//! call, so two models never race on shared generator state.

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::error::MeshError;
use crate::initializer::{Parameter, PhaseBasis, PhaseInitializer};
use crate::permutation::{invert_permutation, is_permutation};

/// Which physical facet of the beamsplitter an error field belongs to.
///
/// The two facets of one splitter may be fabricated with correlated or
/// independent deviations; the right facet draws with seed + 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Left,
    Right,
}

impl Facet {
    fn seed_offset(&self) -> u64 {
        match self {
            Facet::Left => 0,
            Facet::Right => 1,
        }
    }
}

/// Construction options shared by every mesh topology.
#[derive(Debug, Clone)]
pub struct MeshOptions {
    /// Hadamard convention for the 2×2 blocks (beamsplitter otherwise).
    pub hadamard: bool,
    /// Standard deviation of the fractional beamsplitter split error.
    pub bs_error: f64,
    /// Base seed for error sampling; `None` draws unseeded.
    pub bs_error_seed: Option<u64>,
    /// Draw the two facets independently instead of reusing one field.
    pub use_different_errors: bool,
    /// Registry name of the theta initializer.
    pub theta_init: String,
    /// Registry name of the phi initializer.
    pub phi_init: String,
    /// Registry name of the gamma initializer.
    pub gamma_init: String,
    /// Phase basis convention.
    pub basis: PhaseBasis,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            hadamard: false,
            bs_error: 0.0,
            bs_error_seed: None,
            use_different_errors: false,
            theta_init: "random_theta".to_string(),
            phi_init: "random_phi".to_string(),
            gamma_init: "random_gamma".to_string(),
            basis: PhaseBasis::SingleMode,
        }
    }
}

/// The four sign-combination error tensors consumed by transform layers.
///
/// Field names give the sign applied to the left and right facet error
/// in `sqrt(1 ± e_l) · sqrt(1 ± e_r)`, striped to full mesh width and
/// cast to complex. Slots with no tunable MZI carry the neutral value 1.
#[derive(Debug, Clone)]
pub struct ErrorTensors {
    pub nn: Array2<Complex64>,
    pub np: Array2<Complex64>,
    pub pn: Array2<Complex64>,
    pub pp: Array2<Complex64>,
}

/// Mesh topology and error model shared by all topology builders.
#[derive(Debug, Clone)]
pub struct MeshModel {
    /// Mesh width N: dimension of the transformed vector.
    pub units: usize,
    /// Number of tunable layers L.
    pub num_layers: usize,
    /// Forward permutation schedule, (L+1, N).
    pub perm_idx: Array2<usize>,
    /// Inverse schedule: `inv_perm_idx[l][perm_idx[l][j]] == j`.
    pub inv_perm_idx: Array2<usize>,
    /// Active-MZI count per tunable layer.
    pub num_mzis: Vec<usize>,
    /// Tunability mask, (L, N/2): 1.0 for live slots, 0.0 for bypassed.
    pub mask: Array2<f64>,
    pub hadamard: bool,
    pub bs_error: f64,
    pub bs_error_seed: Option<u64>,
    pub use_different_errors: bool,
    pub theta_init: PhaseInitializer,
    pub phi_init: PhaseInitializer,
    pub gamma_init: PhaseInitializer,
    pub basis: PhaseBasis,
}

impl MeshModel {
    /// Build and validate a mesh model from a forward schedule and its
    /// per-layer active-MZI profile.
    ///
    /// Fails on a mesh narrower than 2 modes, a profile that does not
    /// cover every layer, a layer claiming more MZIs than fit in the
    /// mesh width, a schedule row that is not a bijection, an unknown
    /// initializer name, or a Haar initializer configured for the
    /// per-mode gamma parameter. No partial model is ever returned.
    pub fn new(
        perm_idx: Array2<usize>,
        num_mzis: Vec<usize>,
        options: MeshOptions,
    ) -> Result<Self, MeshError> {
        let units = perm_idx.ncols();
        let num_layers = perm_idx.nrows().saturating_sub(1);
        if units < 2 {
            return Err(MeshError::UnitsTooSmall { units });
        }
        if num_mzis.len() != num_layers {
            return Err(MeshError::LayerCountMismatch {
                profile_len: num_mzis.len(),
                num_layers,
            });
        }
        let width = units / 2;
        for (layer, &count) in num_mzis.iter().enumerate() {
            if count > width {
                return Err(MeshError::MziCountOutOfRange {
                    layer,
                    count,
                    max: width,
                });
            }
        }
        for (layer, row) in perm_idx.rows().into_iter().enumerate() {
            if !is_permutation(row) {
                return Err(MeshError::InvalidPermutation { layer });
            }
        }
        let gamma_init = PhaseInitializer::from_name(&options.gamma_init)?;
        if gamma_init.is_haar() {
            return Err(MeshError::IncompatibleInitializer {
                name: gamma_init.name().to_string(),
                reason: "the per-mode gamma parameter".to_string(),
            });
        }

        let mut inv_perm_idx = Array2::zeros(perm_idx.raw_dim());
        for (layer, row) in perm_idx.rows().into_iter().enumerate() {
            inv_perm_idx.row_mut(layer).assign(&invert_permutation(row));
        }

        let mut mask = Array2::zeros((num_layers, width));
        for (layer, &count) in num_mzis.iter().enumerate() {
            for slot in 0..count {
                mask[[layer, slot]] = 1.0;
            }
        }

        Ok(Self {
            units,
            num_layers,
            perm_idx,
            inv_perm_idx,
            num_mzis,
            mask,
            hadamard: options.hadamard,
            bs_error: options.bs_error,
            bs_error_seed: options.bs_error_seed,
            use_different_errors: options.use_different_errors,
            theta_init: PhaseInitializer::from_name(&options.theta_init)?,
            phi_init: PhaseInitializer::from_name(&options.phi_init)?,
            gamma_init,
            basis: options.basis,
        })
    }

    /// Initial parameter values as plain arrays: theta and phi shaped
    /// (L, N/2) and gated by the tunability mask, gamma shaped (N,).
    pub fn initial_values<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> (Array2<f64>, Array2<f64>, Array1<f64>) {
        let theta =
            self.theta_init
                .layer_values(self.units, self.num_layers, self.hadamard, rng)
                * &self.mask;
        let phi = self
            .phi_init
            .layer_values(self.units, self.num_layers, self.hadamard, rng)
            * &self.mask;
        let gamma = self.gamma_init.mode_values(self.units, rng);
        (theta, phi, gamma)
    }

    /// Initial parameters in named-variable form, for callers that hand
    /// them to a differentiable backend.
    pub fn initial_variables<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> (
        Parameter<ndarray::Ix2>,
        Parameter<ndarray::Ix2>,
        Parameter<ndarray::Ix1>,
    ) {
        let (theta, phi, gamma) = self.initial_values(rng);
        (
            Parameter {
                name: "theta",
                values: theta,
            },
            Parameter {
                name: "phi",
                values: phi,
            },
            Parameter {
                name: "gamma",
                values: gamma,
            },
        )
    }

    /// Draw one facet's beamsplitter error field: (L, N/2) standard
    /// Gaussian scaled by `bs_error` and gated by the tunability mask,
    /// so bypassed slots report exactly zero error.
    ///
    /// The left facet seeds with the base seed, the right with seed + 1;
    /// an unseeded model draws from the thread RNG.
    pub fn bs_error_matrix(&self, facet: Facet) -> Array2<f64> {
        match self.bs_error_seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(facet.seed_offset()));
                self.draw_error_field(&mut rng)
            }
            None => self.draw_error_field(&mut rand::thread_rng()),
        }
    }

    fn draw_error_field<R: Rng + ?Sized>(&self, rng: &mut R) -> Array2<f64> {
        let width = self.units / 2;
        let gaussian = Array2::from_shape_fn((self.num_layers, width), |_| {
            rng.sample::<f64, _>(StandardNormal)
        });
        gaussian * self.bs_error * &self.mask
    }

    /// The pair (e_left, e_right) of facet error fields. With
    /// `use_different_errors` unset the right facet reuses the left
    /// field (perfectly correlated fabrication); otherwise it is an
    /// independent seed+1 draw.
    pub fn mzi_error_matrices(&self) -> (Array2<f64>, Array2<f64>) {
        let e_left = self.bs_error_matrix(Facet::Left);
        let e_right = if self.use_different_errors {
            self.bs_error_matrix(Facet::Right)
        } else {
            e_left.clone()
        };
        (e_left, e_right)
    }

    /// The four sign-combination tensors `sqrt(1 ± e_l) · sqrt(1 ± e_r)`,
    /// striped to full mesh width and cast to complex. This is the only
    /// surface exposed for perturbing an ideal unitary computation.
    pub fn mzi_error_tensors(&self) -> ErrorTensors {
        let (e_l, e_r) = self.mzi_error_matrices();
        let sl_minus = e_l.mapv(|e| (1.0 - e).sqrt());
        let sl_plus = e_l.mapv(|e| (1.0 + e).sqrt());
        let sr_minus = e_r.mapv(|e| (1.0 - e).sqrt());
        let sr_plus = e_r.mapv(|e| (1.0 + e).sqrt());
        ErrorTensors {
            nn: to_striped_complex(&(&sl_minus * &sr_minus), self.units),
            np: to_striped_complex(&(&sl_minus * &sr_plus), self.units),
            pn: to_striped_complex(&(&sl_plus * &sr_minus), self.units),
            pp: to_striped_complex(&(&sl_plus * &sr_plus), self.units),
        }
    }

    /// Total number of tunable MZIs across all layers.
    pub fn tunable_mzis(&self) -> usize {
        self.num_mzis.iter().sum()
    }
}

/// Stripe a half-width (L, N/2) per-MZI array to full mesh width (L, N)
/// by duplicating each value onto both modes of its MZI pair. An
/// unpaired final mode (odd N) receives `fill`.
pub fn to_striped(values: &Array2<f64>, units: usize, fill: f64) -> Array2<f64> {
    let mut striped = Array2::from_elem((values.nrows(), units), fill);
    for (layer, row) in values.rows().into_iter().enumerate() {
        for (slot, &v) in row.iter().enumerate() {
            striped[[layer, 2 * slot]] = v;
            striped[[layer, 2 * slot + 1]] = v;
        }
    }
    striped
}

fn to_striped_complex(values: &Array2<f64>, units: usize) -> Array2<Complex64> {
    to_striped(values, units, 1.0).mapv(|v| Complex64::new(v, 0.0))
}
