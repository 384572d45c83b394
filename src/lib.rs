//! Vertex-skinning blend-attribute compression.
//!
//! Compresses per-vertex bone weights and indices into a fixed-size payload
//! plus a shared bone-index table. See [`params::CodecParams`] for the
//! entry point into parameter selection, [`compress_buffers`] for the main
//! encode pipeline, and [`reduce::reduce_bone_count`] for lossy bone-count
//! reduction.

pub mod bitpack;
pub mod dedup;
pub mod encode;
pub mod error;
pub mod oss;
pub mod params;
pub mod permutation;
pub mod quantize;
pub mod reduce;

pub use dedup::{DedupOutcome, SENTINEL};
pub use encode::Influence;
pub use error::{VbacError, VbacResult};
pub use params::{CodecParams, Method};
pub use reduce::reduce_bone_count;

/// Output of [`compress_buffers`]: the compressed vertex bytes plus the
/// shared bone-index table they reference.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedBuffers {
    /// `vertex_count * params.vertex_size` bytes, one `vertex_size`-byte
    /// payload per vertex in input order.
    pub compressed: Vec<u8>,
    /// Representative bone-index tuples, truncated at `max_table_size` if
    /// the pass overflowed.
    pub table: Vec<Vec<u16>>,
    /// Total representatives the pass would have produced uncapped; exceeds
    /// `table.len()` exactly when [`VbacError::TableOverflow`] is returned.
    pub table_size: u64,
}

/// Flattens `table` into a single `table.len() * k_max`-length row-major
/// `u16` array, padding short rows with [`SENTINEL`]. This is the layout an
/// external `out_table` buffer (as in [`compress_buffers`]'s C-style
/// counterpart) expects.
pub fn flatten_table(table: &[Vec<u16>], k_max: usize) -> Vec<u16> {
    let mut flat = vec![SENTINEL; table.len() * k_max];
    for (i, row) in table.iter().enumerate() {
        flat[i * k_max..i * k_max + row.len()].copy_from_slice(row);
    }
    flat
}

/// Byte view of [`flatten_table`]'s output, for callers that want to write
/// the table straight into a raw buffer.
pub fn table_bytes(table: &[Vec<u16>], k_max: usize) -> Vec<u8> {
    bytemuck::cast_slice(&flatten_table(table, k_max)).to_vec()
}

/// Compresses `vertex_count` vertices, each with `params.k_max` `(bone_id,
/// weight)` influences, into fixed-size payloads plus a shared tuple table.
///
/// `indices` and `weights` are flat, `vertex_count * params.k_max`-length
/// arrays. `params` must already be completed via [`CodecParams::complete`].
///
/// Returns [`VbacError::TableOverflow`] if the deduplicated table needed
/// more than `max_table_size` rows; the returned [`CompressedBuffers`] is
/// still valid in that case, with `table` truncated at `max_table_size`.
pub fn compress_buffers(
    indices: &[u16],
    weights: &[f32],
    params: &CodecParams,
    vertex_count: usize,
    max_table_size: u64,
) -> VbacResult<CompressedBuffers> {
    dedup::validate(params)?;
    log::debug!(
        "compress_buffers: {vertex_count} vertices, method={:?}, k_max={}",
        params.method,
        params.k_max
    );

    let k_max = params.k_max as usize;
    let sorted_vertices: Vec<(u32, Vec<Influence>)> = (0..vertex_count)
        .map(|v| {
            let base = v * k_max;
            let mut influences: Vec<Influence> = (0..k_max)
                .map(|i| Influence {
                    bone_id: indices[base + i],
                    weight: weights[base + i],
                })
                .collect();
            encode::sort_by_weight(&mut influences);
            (v as u32, influences)
        })
        .collect();

    let rows = dedup::build_rows(&sorted_vertices, params);
    let outcome = dedup::build_table(rows, vertex_count, max_table_size);

    let vertex_size = params.vertex_size as usize;
    let mut compressed = vec![0u8; vertex_size * vertex_count];
    compressed
        .chunks_mut(vertex_size)
        .zip(sorted_vertices.iter())
        .zip(outcome.tuple_indices.iter())
        .for_each(|((out, (_, sorted)), &tuple_index)| {
            encode::encode_vertex(params, sorted, tuple_index, out);
        });

    let result = CompressedBuffers {
        compressed,
        table: outcome.table,
        table_size: outcome.table_size,
    };

    if outcome.table_size > max_table_size {
        log::warn!(
            "tuple table overflow: needed {} rows, capacity {}",
            outcome.table_size,
            max_table_size
        );
        return Err(VbacError::TableOverflow {
            needed: outcome.table_size,
            capacity: max_table_size,
        });
    }

    Ok(result)
}
