//! Mesh topology comparison: builds the four topology families at a
//! fixed size and reports layer counts, tunable-MZI totals and the
//! norm of a seeded beamsplitter error draw.
//!
//! Run with:
//!   cargo run --example mesh_comparison

use photonic_mesh_model::prelude::*;

fn main() {
    let units = 8;
    let bs_error = 0.02;
    let seed = 42;

    let topologies: Vec<(&str, MeshTopology)> = vec![
        (
            "rectangular",
            MeshTopology::Rectangular {
                units,
                num_layers: None,
            },
        ),
        ("triangular", MeshTopology::Triangular { units }),
        ("butterfly", MeshTopology::Butterfly { num_layers: 3 }),
        (
            "prm",
            MeshTopology::PermutingRectangular {
                units,
                tunable_layers_per_block: None,
                block_sizes: None,
                sampling_frequencies: None,
            },
        ),
    ];

    println!("Mesh Topology Comparison (N={} modes)", units);
    println!("{:-<64}", "");
    println!(
        "{:<14} {:>8} {:>14} {:>12} {:>12}",
        "Topology", "Layers", "Tunable MZIs", "Theta init", "|e_l|"
    );
    println!("{:-<64}", "");

    for (label, topology) in topologies {
        let config = MeshConfig {
            bs_error,
            bs_error_seed: Some(seed),
            ..MeshConfig::new(topology)
        };
        let mesh = match build_mesh(&config) {
            Ok(mesh) => mesh,
            Err(err) => {
                eprintln!("{:<14} failed to build: {}", label, err);
                continue;
            }
        };

        let (e_left, _) = mesh.mzi_error_matrices();
        let norm = e_left.iter().map(|e| e * e).sum::<f64>().sqrt();
        println!(
            "{:<14} {:>8} {:>14} {:>12} {:>12.5}",
            label,
            mesh.num_layers,
            mesh.tunable_mzis(),
            mesh.theta_init.name(),
            norm
        );
    }
    println!("{:-<64}", "");

    println!();
    println!("Error tensors for the rectangular mesh (layer 0, left-facet minus):");
    let mesh = build_mesh(&MeshConfig {
        bs_error,
        bs_error_seed: Some(seed),
        ..MeshConfig::new(MeshTopology::Rectangular {
            units,
            num_layers: None,
        })
    })
    .expect("rectangular mesh");
    let tensors = mesh.mzi_error_tensors();
    let row: Vec<String> = tensors
        .nn
        .row(0)
        .iter()
        .map(|c| format!("{:.4}", c.re))
        .collect();
    println!("  nn[0] = [{}]", row.join(", "));
}
