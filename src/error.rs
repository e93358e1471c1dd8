//! Fatal configuration errors for mesh model construction.
//!
//! Every error here is raised at the point of detection and never
//! downgraded; a failed construction must not hand back a usable model.

use thiserror::Error;

/// Errors raised while building a mesh model or resolving its initializers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// The mesh must transform at least a 2-vector.
    #[error("units must be at least 2, got {units}")]
    UnitsTooSmall { units: usize },

    /// The active-MZI-count profile does not cover every tunable layer.
    #[error("active-MZI profile has {profile_len} entries but the schedule has {num_layers} layers")]
    LayerCountMismatch {
        profile_len: usize,
        num_layers: usize,
    },

    /// A layer claims more active MZIs than physically fit in the mesh width.
    #[error("layer {layer} requests {count} active MZIs but only {max} slots exist")]
    MziCountOutOfRange {
        layer: usize,
        count: usize,
        max: usize,
    },

    /// A schedule row is not a bijection on {0..units-1}.
    #[error("schedule row {layer} is not a valid permutation")]
    InvalidPermutation { layer: usize },

    /// PRM block and sampling-frequency lists are inconsistent:
    /// B blocks need exactly B-1 fixed permutations between them.
    #[error("{blocks} tunable blocks cannot take {frequencies} sampling frequencies")]
    BlockFrequencyMismatch { blocks: usize, frequencies: usize },

    /// A PRM sampling frequency that cannot route modes within the mesh.
    #[error("sampling frequency {frequency} is outside 1..{units}")]
    InvalidSamplingFrequency { frequency: usize, units: usize },

    /// Initializer name not present in the registry.
    #[error("unknown initializer name: {name}")]
    UnknownInitializer { name: String },

    /// Initializer/topology combination that cannot be honored.
    #[error("initializer {name} is incompatible with {reason}")]
    IncompatibleInitializer { name: String, reason: String },

    /// Butterfly meshes need at least one doubling layer.
    #[error("butterfly mesh requires at least 1 layer")]
    EmptyButterfly,
}
