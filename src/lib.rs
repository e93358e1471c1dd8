//! # photonic-mesh-model
//!
//! Topology and fabrication-error model for programmable photonic
//! meshes: layered networks of tunable Mach-Zehnder interferometers
//! (MZIs) and fixed permutations realizing N×N linear transforms.
//!
//! For each topology family (rectangular, triangular, butterfly and the
//! permuting rectangular mesh) the crate computes the permutation
//! schedule routing modes between layers, the tunability mask selecting
//! live MZI slots, and a seed-reproducible Gaussian model of
//! beamsplitter split-ratio errors, exposed as the four striped complex
//! tensors downstream transform layers consume.
//!
//! ## Usage
//!
//! ```
//! use photonic_mesh_model::prelude::*;
//!
//! let config = MeshConfig {
//!     bs_error: 0.01,
//!     bs_error_seed: Some(42),
//!     ..MeshConfig::new(MeshTopology::Rectangular { units: 8, num_layers: None })
//! };
//! let mesh = build_mesh(&config).unwrap();
//! let (e_left, e_right) = mesh.mzi_error_matrices();
//! assert_eq!(e_left, e_right);
//! ```

pub mod error;
pub mod initializer;
pub mod mesh;
pub mod permutation;
pub mod topology;

pub mod prelude {
    pub use crate::error::*;
    pub use crate::initializer::*;
    pub use crate::mesh::*;
    pub use crate::permutation::*;
    pub use crate::topology::*;
}
