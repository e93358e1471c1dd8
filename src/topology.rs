//! Topology-specific mesh builders.
//!
//! Each topology variant computes its permutation schedule and
//! active-MZI-count profile, then delegates validation, inverse routing
//! and the error model to the shared `MeshModel`.

use crate::error::MeshError;
use crate::initializer::PhaseBasis;
use crate::mesh::{MeshModel, MeshOptions};
use crate::permutation::{
    butterfly_permutation, default_coarse_grain_block_sizes, efficient_coarse_grain_block_sizes,
    grid_permutation, prm_permutation,
};

/// Mesh topology family for an N×N programmable transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshTopology {
    /// Brick-wall rectangular (Clements-style) mesh.
    /// `num_layers` defaults to `units`.
    Rectangular {
        units: usize,
        num_layers: Option<usize>,
    },

    /// Triangular (Reck-style) mesh with 2N−3 layers and a diamond
    /// active region.
    Triangular { units: usize },

    /// FFT butterfly mesh on 2^num_layers modes; every slot tunable.
    Butterfly { num_layers: usize },

    /// Permuting rectangular mesh: tunable rectangular blocks
    /// interleaved with fixed coarse permutations. The block structure
    /// comes from the explicit lists, from the per-block layer budget,
    /// or from the default coarse-graining when neither is given.
    PermutingRectangular {
        units: usize,
        tunable_layers_per_block: Option<usize>,
        block_sizes: Option<Vec<usize>>,
        sampling_frequencies: Option<Vec<usize>>,
    },
}

impl MeshTopology {
    /// Default theta initializer for this topology.
    fn default_theta_init(&self) -> &'static str {
        match self {
            MeshTopology::Rectangular { .. } => "haar_rect",
            MeshTopology::Triangular { .. } => "haar_tri",
            MeshTopology::Butterfly { .. } => "random_theta",
            MeshTopology::PermutingRectangular { .. } => "haar_prm",
        }
    }

    /// Default phase basis for this topology.
    fn default_basis(&self) -> PhaseBasis {
        match self {
            MeshTopology::Rectangular { .. } | MeshTopology::Triangular { .. } => PhaseBasis::Bloch,
            MeshTopology::Butterfly { .. } | MeshTopology::PermutingRectangular { .. } => {
                PhaseBasis::SingleMode
            }
        }
    }
}

/// Full configuration for building a mesh model.
///
/// `None` initializer and basis fields fall back to the topology's
/// defaults.
#[derive(Debug, Clone)]
pub struct MeshConfig {
    pub topology: MeshTopology,
    pub hadamard: bool,
    pub bs_error: f64,
    pub bs_error_seed: Option<u64>,
    pub use_different_errors: bool,
    pub theta_init: Option<String>,
    pub phi_init: Option<String>,
    pub gamma_init: Option<String>,
    pub basis: Option<PhaseBasis>,
}

impl MeshConfig {
    /// Configuration with an ideal (error-free) device and all defaults.
    pub fn new(topology: MeshTopology) -> Self {
        Self {
            topology,
            hadamard: false,
            bs_error: 0.0,
            bs_error_seed: None,
            use_different_errors: false,
            theta_init: None,
            phi_init: None,
            gamma_init: None,
            basis: None,
        }
    }
}

/// Build a validated mesh model for the configured topology.
pub fn build_mesh(config: &MeshConfig) -> Result<MeshModel, MeshError> {
    let theta_init = config
        .theta_init
        .clone()
        .unwrap_or_else(|| config.topology.default_theta_init().to_string());

    let (schedule, num_mzis) = match &config.topology {
        MeshTopology::Rectangular { units, num_layers } => {
            let layers = num_layers.unwrap_or(*units);
            (
                grid_permutation(*units, layers),
                rectangular_mzi_profile(*units, layers),
            )
        }
        MeshTopology::Triangular { units } => {
            let layers = (2 * units).saturating_sub(3);
            (grid_permutation(*units, layers), triangular_mzi_profile(*units))
        }
        MeshTopology::Butterfly { num_layers } => {
            let schedule = butterfly_permutation(*num_layers)?;
            let units = schedule.ncols();
            (schedule, vec![units / 2; *num_layers])
        }
        MeshTopology::PermutingRectangular {
            units,
            tunable_layers_per_block,
            block_sizes,
            sampling_frequencies,
        } => {
            let (blocks, frequencies) = match (
                tunable_layers_per_block,
                block_sizes,
                sampling_frequencies,
            ) {
                (Some(per_block), _, _) => {
                    // The haar_prm initializer assumes the default block
                    // structure and cannot honor a per-block budget.
                    if theta_init == "haar_prm" {
                        return Err(MeshError::IncompatibleInitializer {
                            name: theta_init,
                            reason: "setting tunable_layers_per_block".to_string(),
                        });
                    }
                    efficient_coarse_grain_block_sizes(*units, *per_block)
                }
                (None, Some(blocks), Some(frequencies)) => {
                    (blocks.clone(), frequencies.clone())
                }
                _ => default_coarse_grain_block_sizes(*units),
            };
            let mut profile = Vec::with_capacity(blocks.iter().sum());
            for &block in &blocks {
                profile.extend(rectangular_mzi_profile(*units, block));
            }
            (prm_permutation(*units, &blocks, &frequencies)?, profile)
        }
    };

    let options = MeshOptions {
        hadamard: config.hadamard,
        bs_error: config.bs_error,
        bs_error_seed: config.bs_error_seed,
        use_different_errors: config.use_different_errors,
        theta_init,
        phi_init: config
            .phi_init
            .clone()
            .unwrap_or_else(|| "random_phi".to_string()),
        gamma_init: config
            .gamma_init
            .clone()
            .unwrap_or_else(|| "random_gamma".to_string()),
        basis: config.basis.unwrap_or_else(|| config.topology.default_basis()),
    };
    MeshModel::new(schedule, num_mzis, options)
}

/// Brick-wall active-MZI profile: even layers hold N/2 pairs, odd layers
/// one fewer when N is even.
fn rectangular_mzi_profile(units: usize, num_layers: usize) -> Vec<usize> {
    (0..num_layers)
        .map(|layer| {
            if layer % 2 == 0 {
                units / 2
            } else {
                (units - 1) / 2
            }
        })
        .collect()
}

/// Diamond active-MZI profile for the triangular mesh: the ramp
/// 1, 2, …, N−1, …, 2, 1 mapped through (ramp + 1) / 2.
fn triangular_mzi_profile(units: usize) -> Vec<usize> {
    let num_layers = (2 * units).saturating_sub(3);
    (0..num_layers)
        .map(|layer| {
            let ramp = if layer < units - 1 {
                layer + 1
            } else {
                2 * units - 3 - layer
            };
            (ramp + 1) / 2
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permutation::is_permutation;

    #[test]
    fn rectangular_units_4_profile_and_mask() {
        // Scenario A: units=4, default num_layers=4.
        let model = build_mesh(&MeshConfig::new(MeshTopology::Rectangular {
            units: 4,
            num_layers: None,
        }))
        .unwrap();
        assert_eq!(model.num_layers, 4);
        assert_eq!(model.num_mzis, vec![2, 1, 2, 1]);
        assert_eq!(model.mask.shape(), &[4, 2]);
        assert_eq!(
            model.mask,
            ndarray::arr2(&[[1.0, 1.0], [1.0, 0.0], [1.0, 1.0], [1.0, 0.0]])
        );
    }

    #[test]
    fn rectangular_mask_shape_matches_units() {
        for units in [4, 6, 8] {
            let model = build_mesh(&MeshConfig::new(MeshTopology::Rectangular {
                units,
                num_layers: None,
            }))
            .unwrap();
            assert_eq!(model.mask.shape(), &[units, units / 2]);
        }
    }

    #[test]
    fn rectangular_honors_explicit_layer_count() {
        let model = build_mesh(&MeshConfig::new(MeshTopology::Rectangular {
            units: 6,
            num_layers: Some(3),
        }))
        .unwrap();
        assert_eq!(model.num_layers, 3);
        assert_eq!(model.perm_idx.shape(), &[4, 6]);
    }

    #[test]
    fn triangular_units_4_profile() {
        // Scenario B: ramp [1,2,3,2,1] through (r+1)/2 gives [1,1,2,1,1].
        let model =
            build_mesh(&MeshConfig::new(MeshTopology::Triangular { units: 4 })).unwrap();
        assert_eq!(model.num_layers, 5);
        assert_eq!(model.num_mzis, vec![1, 1, 2, 1, 1]);
    }

    #[test]
    fn triangular_layer_count_is_2n_minus_3() {
        for units in [2, 3, 4, 8] {
            let model =
                build_mesh(&MeshConfig::new(MeshTopology::Triangular { units })).unwrap();
            assert_eq!(model.num_layers, 2 * units - 3);
        }
    }

    #[test]
    fn butterfly_units_are_power_of_two() {
        // Scenario C: num_layers=3 means 8 modes, every row an involution.
        let model =
            build_mesh(&MeshConfig::new(MeshTopology::Butterfly { num_layers: 3 })).unwrap();
        assert_eq!(model.units, 8);
        assert_eq!(model.num_mzis, vec![4, 4, 4]);
        for row in model.perm_idx.rows() {
            for j in 0..model.units {
                assert_eq!(row[row[j]], j, "butterfly rows must be involutions");
            }
        }
    }

    #[test]
    fn prm_default_structure_covers_units_layers() {
        let model = build_mesh(&MeshConfig::new(MeshTopology::PermutingRectangular {
            units: 8,
            tunable_layers_per_block: None,
            block_sizes: None,
            sampling_frequencies: None,
        }))
        .unwrap();
        assert_eq!(model.num_layers, 8);
        assert_eq!(model.perm_idx.nrows(), 9);
        for row in model.perm_idx.rows() {
            assert!(is_permutation(row));
        }
    }

    #[test]
    fn prm_explicit_blocks_concatenate_rectangular_profiles() {
        let config = MeshConfig {
            theta_init: Some("random_theta".to_string()),
            ..MeshConfig::new(MeshTopology::PermutingRectangular {
                units: 8,
                tunable_layers_per_block: None,
                block_sizes: Some(vec![3, 2]),
                sampling_frequencies: Some(vec![2]),
            })
        };
        let model = build_mesh(&config).unwrap();
        assert_eq!(model.num_mzis, vec![4, 3, 4, 4, 3]);
    }

    #[test]
    fn prm_oversized_frequency_fails_construction() {
        // User-supplied frequencies must come back as a configuration
        // error from the builder, never an index panic.
        let err = build_mesh(&MeshConfig::new(MeshTopology::PermutingRectangular {
            units: 8,
            tunable_layers_per_block: None,
            block_sizes: Some(vec![4, 4]),
            sampling_frequencies: Some(vec![100]),
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            MeshError::InvalidSamplingFrequency {
                frequency: 100,
                units: 8
            }
        ));
    }

    #[test]
    fn prm_rejects_haar_prm_with_layer_budget() {
        let err = build_mesh(&MeshConfig::new(MeshTopology::PermutingRectangular {
            units: 8,
            tunable_layers_per_block: Some(2),
            block_sizes: None,
            sampling_frequencies: None,
        }))
        .unwrap_err();
        assert!(matches!(err, MeshError::IncompatibleInitializer { .. }));
    }

    #[test]
    fn prm_layer_budget_allowed_with_other_theta_init() {
        let config = MeshConfig {
            theta_init: Some("haar_rect".to_string()),
            ..MeshConfig::new(MeshTopology::PermutingRectangular {
                units: 8,
                tunable_layers_per_block: Some(2),
                block_sizes: None,
                sampling_frequencies: None,
            })
        };
        let model = build_mesh(&config).unwrap();
        assert_eq!(model.num_layers, 8);
    }

    #[test]
    fn topology_defaults_select_initializers() {
        let rect = build_mesh(&MeshConfig::new(MeshTopology::Rectangular {
            units: 4,
            num_layers: None,
        }))
        .unwrap();
        assert_eq!(rect.theta_init.name(), "haar_rect");
        assert_eq!(rect.basis, PhaseBasis::Bloch);

        let butterfly =
            build_mesh(&MeshConfig::new(MeshTopology::Butterfly { num_layers: 2 })).unwrap();
        assert_eq!(butterfly.theta_init.name(), "random_theta");
        assert_eq!(butterfly.basis, PhaseBasis::SingleMode);
    }

    #[test]
    fn config_overrides_win_over_defaults() {
        let config = MeshConfig {
            theta_init: Some("random_theta".to_string()),
            basis: Some(PhaseBasis::SingleMode),
            ..MeshConfig::new(MeshTopology::Triangular { units: 4 })
        };
        let model = build_mesh(&config).unwrap();
        assert_eq!(model.theta_init.name(), "random_theta");
        assert_eq!(model.basis, PhaseBasis::SingleMode);
    }
}
