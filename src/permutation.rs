//! Permutation schedules routing optical modes between mesh layers.
//!
//! A schedule is an (L+1, N) index matrix: row `i` is the permutation
//! applied to the mode vector entering tunable layer `i`, and row `L` is
//! the exit boundary restoring canonical mode order. Rows use gather
//! semantics: `x_next[j] = x_prev[row[j]]`.
//!
//! Three families are generated here: the brick-wall grid schedule shared
//! by rectangular and triangular meshes, the FFT-style butterfly schedule,
//! and the PRM schedule that glues fixed coarse permutations between
//! tunable rectangular blocks.

use ndarray::{Array1, Array2, ArrayView1};

use crate::error::MeshError;

/// Identity permutation on `units` modes.
pub fn identity_permutation(units: usize) -> Array1<usize> {
    Array1::from_iter(0..units)
}

/// Check that `row` is a bijection on {0..units-1}.
pub fn is_permutation(row: ArrayView1<usize>) -> bool {
    let units = row.len();
    let mut seen = vec![false; units];
    for &idx in row.iter() {
        if idx >= units || seen[idx] {
            return false;
        }
        seen[idx] = true;
    }
    true
}

/// Invert a permutation row: the returned `q` satisfies `q[p[j]] == j`.
///
/// Pure index inversion, O(N); the caller guarantees `p` is a bijection.
pub fn invert_permutation(p: ArrayView1<usize>) -> Array1<usize> {
    let mut q = Array1::zeros(p.len());
    for (j, &pj) in p.iter().enumerate() {
        q[pj] = j;
    }
    q
}

/// Compose two gather-semantics rows: `first` is applied to the mode
/// vector before `second`, so the result is `first[second[j]]`.
fn compose(first: ArrayView1<usize>, second: ArrayView1<usize>) -> Array1<usize> {
    second.mapv(|j| first[j])
}

/// Brick-wall grid schedule for a rectangular or triangular mesh.
///
/// Even layers couple mode pairs (0,1),(2,3),…; odd layers couple
/// (1,2),(3,4),…. The alternation is expressed as a rotation by one mode
/// at each interior boundary (left entering an odd layer, right entering
/// an even one), with the exit row undoing any residual rotation.
pub fn grid_permutation(units: usize, num_layers: usize) -> Array2<usize> {
    let left_roll = Array1::from_iter((0..units).map(|j| (j + 1) % units));
    let right_roll = Array1::from_iter((0..units).map(|j| (j + units - 1) % units));

    let mut schedule = Array2::zeros((num_layers + 1, units));
    schedule.row_mut(0).assign(&identity_permutation(units));
    for boundary in 1..num_layers {
        let row = if boundary % 2 == 1 {
            &left_roll
        } else {
            &right_roll
        };
        schedule.row_mut(boundary).assign(row);
    }
    if num_layers > 0 {
        // The mesh exits rolled exactly when the last layer is odd.
        let exit = if num_layers % 2 == 0 {
            right_roll
        } else {
            identity_permutation(units)
        };
        schedule.row_mut(num_layers).assign(&exit);
    }
    schedule
}

/// Single butterfly layer: swaps elements separated by `frequency`.
///
/// `units` and `frequency` must be powers of two with `frequency < units`;
/// the result is an involution.
pub fn butterfly_layer_permutation(units: usize, frequency: usize) -> Array1<usize> {
    Array1::from_iter((0..units).map(|j| j ^ frequency))
}

/// Full butterfly schedule: layer `l` swaps elements separated by `2^l`,
/// matching FFT butterfly connectivity on `2^num_layers` modes.
pub fn butterfly_permutation(num_layers: usize) -> Result<Array2<usize>, MeshError> {
    if num_layers == 0 {
        return Err(MeshError::EmptyButterfly);
    }
    let units = 1usize << num_layers;
    let mut schedule = Array2::zeros((num_layers + 1, units));
    for layer in 0..num_layers {
        schedule
            .row_mut(layer)
            .assign(&butterfly_layer_permutation(units, 1 << layer));
    }
    schedule
        .row_mut(num_layers)
        .assign(&identity_permutation(units));
    Ok(schedule)
}

/// Fixed coarse permutation inserted between PRM tunable blocks.
///
/// Even modes shift down by `frequency`, odd modes shift up, reflecting
/// off the mesh boundary where the shift would leave [0, units). A
/// single reflection only lands back in range for
/// `1 <= frequency < units`; `prm_permutation` enforces that bound.
pub fn rectangular_permutation(units: usize, frequency: usize) -> Array1<usize> {
    Array1::from_iter((0..units).map(|j| {
        let offset = frequency as isize;
        let mut idx = if j % 2 == 0 {
            j as isize - offset
        } else {
            j as isize + offset
        };
        if idx < 0 {
            idx = -1 - idx;
        }
        let top = units as isize - 1;
        if idx > top {
            idx = 2 * units as isize - 1 - idx;
        }
        idx as usize
    }))
}

/// PRM schedule: tunable rectangular blocks interleaved with fixed
/// rectangular permutations at the given sampling frequencies.
///
/// `block_sizes[b]` is the number of tunable layers in block `b`; a fixed
/// permutation at `sampling_frequencies[b]` is glued into the boundary
/// between blocks `b` and `b+1`, so `block_sizes` must have exactly one
/// more entry than `sampling_frequencies`, and every frequency must lie
/// in `1..units`. Schedule height is `sum(block_sizes) + 1`.
pub fn prm_permutation(
    units: usize,
    block_sizes: &[usize],
    sampling_frequencies: &[usize],
) -> Result<Array2<usize>, MeshError> {
    if block_sizes.is_empty() || block_sizes.len() != sampling_frequencies.len() + 1 {
        return Err(MeshError::BlockFrequencyMismatch {
            blocks: block_sizes.len().max(1),
            frequencies: sampling_frequencies.len(),
        });
    }
    for &frequency in sampling_frequencies {
        if frequency == 0 || frequency >= units {
            return Err(MeshError::InvalidSamplingFrequency { frequency, units });
        }
    }

    let grids: Vec<Array2<usize>> = block_sizes
        .iter()
        .map(|&b| grid_permutation(units, b))
        .collect();

    let mut rows: Vec<Array1<usize>> = Vec::new();
    for row in grids[0].rows().into_iter().take(block_sizes[0]) {
        rows.push(row.to_owned());
    }
    for (idx, &frequency) in sampling_frequencies.iter().enumerate() {
        let exit = grids[idx].row(block_sizes[idx]);
        let fixed = rectangular_permutation(units, frequency);
        let entry = grids[idx + 1].row(0);
        let glued = compose(compose(exit, fixed.view()).view(), entry);
        rows.push(glued);
        for row in grids[idx + 1]
            .rows()
            .into_iter()
            .take(block_sizes[idx + 1])
            .skip(1)
        {
            rows.push(row.to_owned());
        }
    }
    let last = grids.len() - 1;
    rows.push(grids[last].row(block_sizes[last]).to_owned());

    let mut schedule = Array2::zeros((rows.len(), units));
    for (i, row) in rows.iter().enumerate() {
        schedule.row_mut(i).assign(row);
    }
    Ok(schedule)
}

/// Default PRM coarse-graining: about log2(N) equal tunable blocks whose
/// layer counts sum to `units`, with sampling frequencies doubling at
/// each block boundary (2, 4, 8, …, capped at N/2).
pub fn default_coarse_grain_block_sizes(units: usize) -> (Vec<usize>, Vec<usize>) {
    let num_blocks = ((units as f64).log2().round() as usize).max(1);
    let base = units / num_blocks;
    let remainder = units % num_blocks;
    let block_sizes: Vec<usize> = (0..num_blocks)
        .map(|b| if b < remainder { base + 1 } else { base })
        .collect();
    let frequencies = doubling_frequencies(units, num_blocks - 1);
    (block_sizes, frequencies)
}

/// Efficient PRM coarse-graining for a target number of tunable layers
/// per block: `ceil(units / t)` blocks of exactly `t` layers.
pub fn efficient_coarse_grain_block_sizes(
    units: usize,
    tunable_layers_per_block: usize,
) -> (Vec<usize>, Vec<usize>) {
    let t = tunable_layers_per_block.max(1);
    let num_blocks = (units + t - 1) / t;
    let block_sizes = vec![t; num_blocks.max(1)];
    let frequencies = doubling_frequencies(units, block_sizes.len() - 1);
    (block_sizes, frequencies)
}

/// Doubling frequency sequence 2, 4, 8, … per block boundary, cycling
/// once the stride would exceed half the mesh width.
fn doubling_frequencies(units: usize, count: usize) -> Vec<usize> {
    let max_stride = (units / 2).max(1);
    let cycle = (usize::BITS - max_stride.leading_zeros()) as usize;
    (0..count)
        .map(|b| (1usize << ((b % cycle.max(1)) + 1)).min(max_stride))
        .collect()
}
