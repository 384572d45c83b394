//! Bone-index deduplication: build the shared tuple table and assign each
//! vertex an index into it (or, for singletons, the surviving bone id
//! directly).

use crate::encode::Influence;
use crate::error::{VbacError, VbacResult};
use crate::params::{CodecParams, Method};
use rayon::prelude::*;

/// Marks a position in an effective tuple whose weight degenerated to zero.
pub const SENTINEL: u16 = 0xFFFF;

/// One vertex's effective tuple, ready for the sort-and-sweep pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleRow {
    /// Index of the vertex this row was derived from.
    pub vertex_id: u32,
    /// Sorted-ascending bone ids with degenerate positions replaced by
    /// [`SENTINEL`].
    pub tuple: Vec<u16>,
}

/// Result of a full deduplication pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupOutcome {
    /// Representative tuples, in first-encountered order. Truncated at
    /// `max_table_size` if the pass overflowed.
    pub table: Vec<Vec<u16>>,
    /// Per-vertex tuple index: either a row index into `table`, or (for
    /// singleton vertices) the surviving bone id stored directly.
    pub tuple_indices: Vec<u64>,
    /// Total number of representatives the pass would have produced with
    /// no capacity limit.
    pub table_size: u64,
}

/// Rejects deduplication requests that can't produce a meaningful table.
pub fn validate(params: &CodecParams) -> VbacResult<()> {
    if params.method == Method::None {
        return Err(VbacError::InvalidParams {
            reason: "deduplication requires a compressing method",
        });
    }
    if !(2..=13).contains(&params.k_max) {
        return Err(VbacError::InvalidParams {
            reason: "k_max out of range [2, 13]",
        });
    }
    Ok(())
}

/// Builds one [`TupleRow`] per vertex. `zero_mask` bit `i` set means rank
/// `i` (ascending) degenerated to zero under the chosen codec -- see
/// [`crate::encode::flag_zero_compressed_weights`]. Runs in parallel over
/// vertices; each vertex writes its own disjoint row.
pub fn build_rows(vertices: &[(u32, Vec<Influence>)], params: &CodecParams) -> Vec<TupleRow> {
    vertices
        .par_iter()
        .map(|(vertex_id, sorted)| {
            let zero_mask = crate::encode::flag_zero_compressed_weights(sorted, params);
            let tuple = sorted
                .iter()
                .enumerate()
                .map(|(rank, influence)| {
                    if zero_mask & (1 << rank) != 0 {
                        SENTINEL
                    } else {
                        influence.bone_id
                    }
                })
                .collect();
            TupleRow {
                vertex_id: *vertex_id,
                tuple,
            }
        })
        .collect()
}

/// Orders two effective tuples by their reversed (largest-weight-first)
/// bone ids. [`SENTINEL`] is `0xFFFF`, already the maximum `u16`, so a
/// wildcard position naturally sorts after any concrete bone id at the same
/// rank -- this is what lets a fully concrete tuple become the
/// representative and a less-specific tuple merge into it afterward.
fn cmp_reversed(a: &[u16], b: &[u16]) -> std::cmp::Ordering {
    a.iter().rev().cmp(b.iter().rev())
}

fn is_singleton(tuple: &[u16]) -> bool {
    tuple[..tuple.len() - 1].iter().all(|&b| b == SENTINEL)
}

fn compatible(representative: &[u16], tuple: &[u16]) -> bool {
    representative
        .iter()
        .zip(tuple.iter())
        .all(|(&r, &t)| t == SENTINEL || r == t)
}

/// Sorts `rows` lexicographically on the reversed tuple (serial, per the
/// determinism contract), then sweeps to assign representatives. `rows` is
/// consumed; `vertex_count` sizes the output index array.
pub fn build_table(mut rows: Vec<TupleRow>, vertex_count: usize, max_table_size: u64) -> DedupOutcome {
    rows.sort_by(|a, b| cmp_reversed(&a.tuple, &b.tuple));

    let mut table: Vec<Vec<u16>> = Vec::new();
    let mut tuple_indices = vec![0u64; vertex_count];
    let mut cur_repr: Option<Vec<u16>> = None;
    let mut logical_index: u64 = 0;

    for row in &rows {
        if is_singleton(&row.tuple) {
            let bone = *row.tuple.last().unwrap();
            tuple_indices[row.vertex_id as usize] = bone as u64;
            continue;
        }

        let matches_cur = cur_repr
            .as_ref()
            .map(|r| compatible(r, &row.tuple))
            .unwrap_or(false);

        if !matches_cur {
            cur_repr = Some(row.tuple.clone());
            if (table.len() as u64) < max_table_size {
                table.push(row.tuple.clone());
            }
            tuple_indices[row.vertex_id as usize] = logical_index;
            logical_index += 1;
        } else {
            tuple_indices[row.vertex_id as usize] = logical_index - 1;
        }
    }

    DedupOutcome {
        table,
        tuple_indices,
        table_size: logical_index,
    }
}
