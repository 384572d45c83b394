//! Lossy bone-count reduction: k' -> k per-vertex truncation with
//! renormalization.

use crate::error::{VbacError, VbacResult};
use rayon::prelude::*;

/// Reduces every vertex from `k_in` influences to `k_out` influences,
/// keeping the `k_out` largest weights and renormalizing them to sum to
/// one. `indices`/`weights` are flat, `vertex_count * k_in`-length arrays;
/// `out_indices` is `vertex_count * k_out`, and `out_weights` is
/// `vertex_count * k_out` if `write_last_weight` else `vertex_count * (k_out - 1)`
/// (the dropped slot is the largest weight, always derivable as `1 - sum(rest)`).
///
/// Output influences are sorted ascending by weight, matching the sorted
/// tuple invariant the rest of the crate assumes.
pub fn reduce_bone_count(
    out_indices: &mut [u16],
    out_weights: &mut [f32],
    indices: &[u16],
    weights: &[f32],
    k_out: u32,
    k_in: u32,
    vertex_count: usize,
    write_last_weight: bool,
) -> VbacResult<()> {
    if k_in > 13 {
        return Err(VbacError::InvalidParams {
            reason: "k_in exceeds the maximum supported bone count of 13",
        });
    }
    if k_out < 2 {
        return Err(VbacError::InvalidParams {
            reason: "k_out must be at least 2",
        });
    }
    if k_out > k_in {
        return Err(VbacError::InvalidParams {
            reason: "k_out must not exceed k_in",
        });
    }

    log::debug!(
        "reduce_bone_count: {vertex_count} vertices, k_in={k_in} k_out={k_out} write_last_weight={write_last_weight}"
    );

    let k_in = k_in as usize;
    let k_out = k_out as usize;
    let out_weight_width = if write_last_weight { k_out } else { k_out - 1 };

    let out_indices_chunks = out_indices.par_chunks_mut(k_out);
    let out_weights_chunks = out_weights.par_chunks_mut(out_weight_width);

    out_indices_chunks
        .zip(out_weights_chunks)
        .enumerate()
        .for_each(|(v, (out_idx, out_w))| {
            let base = v * k_in;
            let mut influences: Vec<(u16, f32)> = (0..k_in)
                .map(|i| (indices[base + i], weights[base + i]))
                .collect();
            influences.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

            let kept = &influences[k_in - k_out..];
            let sum: f32 = kept.iter().map(|(_, w)| w).sum();
            let normalized: Vec<(u16, f32)> = if sum > 0.0 {
                kept.iter().map(|&(id, w)| (id, w / sum)).collect()
            } else {
                kept.to_vec()
            };

            for (i, &(id, _)) in normalized.iter().enumerate() {
                out_idx[i] = id;
            }
            for (i, &(_, w)) in normalized.iter().take(out_weight_width).enumerate() {
                out_w[i] = w;
            }
        });

    Ok(())
}
