//! Codec parameters and parameter completion.
//!
//! [`CodecParams`] doubles as this crate's configuration surface: a caller
//! states an intent (method, bone count, vertex size, tuple count) and
//! [`CodecParams::complete`] repairs it into a realizable, fully-specified
//! bundle. Completion never fails; it may downgrade `method` to
//! [`Method::None`] when permutation coding's `max_tuple_count` is
//! unrealizably large.

use crate::permutation::{self, CodecRow};

/// Per-rank bit savings for power-of-two AABB, starting with the second
/// largest weight. Index 0 corresponds to the second-largest rank.
pub const PO2_AABB_SAVINGS: [u32; 12] = [0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2];

/// The compression method and its method-specific parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Method {
    /// No compression: raw `u16` indices and `f32` weights.
    None,
    /// Independent uniform quantization of each weight.
    UnitCube,
    /// Per-rank bit budgets shrinking with rank, per [`PO2_AABB_SAVINGS`].
    Po2Aabb,
    /// Optimal simplex sampling for exactly 4 bones, with the given weight
    /// bit budget (19, 22, or 35).
    Oss {
        /// Bit count for the weight code; must be a key of `oss::LUT_N`.
        bit_count: u32,
    },
    /// Mixed-radix permutation coding.
    Permutation {
        /// The table row selected during completion.
        #[cfg_attr(feature = "serde", serde(skip))]
        row: PermutationRowSlot,
    },
}

/// Wraps a [`CodecRow`] so `Method` can derive the common traits even though
/// `CodecRow` borrows `'static` table data; the slot is empty until
/// completion has run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PermutationRowSlot(pub Option<RowHandle>);

/// Coordinates identifying a row in [`permutation::PERMUTATION_CODECS`],
/// cheap to copy and compare, resolved back to a [`CodecRow`] on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowHandle {
    pub(crate) class: usize,
    pub(crate) k_max: u32,
    pub(crate) vertex_size: u32,
}

impl RowHandle {
    /// Resolves this handle back to its table row.
    pub fn row(&self) -> CodecRow {
        permutation::lookup(self.class, self.k_max, self.vertex_size)
            .expect("RowHandle is only constructed from a validated lookup")
    }
}

/// A fully- or partially-specified compression parameter bundle.
///
/// Construct with the fields you care about and call [`CodecParams::complete`]
/// to fill in the rest. All fields are public; there is no builder, matching
/// this crate's preference for plain data over ceremony.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodecParams {
    /// Requested or completed method.
    pub method: Method,
    /// Maximum bone influences per vertex, clamped to `[2, 13]`.
    pub k_max: u32,
    /// Fixed payload size per vertex, in bytes.
    pub vertex_size: u32,
    /// Per-weight bit width for `UnitCube`/`Po2Aabb`; unused otherwise.
    pub weight_base_bit_count: u32,
    /// Bits dedicated to the tuple index within the payload.
    pub tuple_index_bit_count: u32,
    /// Upper bound on distinct bone-index tuples the table must support.
    pub max_tuple_count: u64,
}

impl CodecParams {
    /// Starts from a bare method request; all other fields are completed.
    pub fn new(method: Method, k_max: u32, vertex_size: u32, max_tuple_count: u64) -> Self {
        CodecParams {
            method,
            k_max,
            vertex_size,
            weight_base_bit_count: 0,
            tuple_index_bit_count: 0,
            max_tuple_count,
        }
    }

    /// Produces a realizable, fully-specified bundle from this request.
    /// Idempotent: `p.complete().complete() == p.complete()`.
    pub fn complete(mut self) -> Self {
        self.k_max = self.k_max.clamp(2, 13);

        let mut tuple_index_bit_count = 0u32;
        while (1u64 << tuple_index_bit_count) < self.max_tuple_count.max(1) {
            tuple_index_bit_count += 1;
        }

        match self.method {
            Method::UnitCube => {
                if (self.vertex_size as u64) * 8 <= tuple_index_bit_count as u64 {
                    self.vertex_size = (tuple_index_bit_count + 15) / 8;
                }
                // Sizing a weight bit width from a too-small starting vertex_size can
                // clamp upward, which in turn grows vertex_size past what the clamped
                // width actually needed -- so converge to a fixed point before
                // recording the result, or a single completion pass could disagree
                // with itself on a second call.
                let mut vertex_size = self.vertex_size;
                let mut bits = 0u32;
                for _ in 0..16 {
                    let total_weight_bits = vertex_size * 8 - tuple_index_bit_count;
                    bits = (total_weight_bits / (self.k_max - 1)).clamp(2, 23);
                    let total_bits = bits * (self.k_max - 1) + tuple_index_bit_count;
                    let new_vertex_size = (total_bits + 7) / 8;
                    if new_vertex_size == vertex_size {
                        break;
                    }
                    vertex_size = new_vertex_size;
                }
                self.weight_base_bit_count = bits;
                self.vertex_size = vertex_size;
                self.tuple_index_bit_count = tuple_index_bit_count;
                self.max_tuple_count = 1u64 << tuple_index_bit_count;
            }
            Method::Po2Aabb => {
                if (self.vertex_size as u64) * 8 <= tuple_index_bit_count as u64 {
                    self.vertex_size = (tuple_index_bit_count + 15) / 8;
                }
                let saved: u32 = PO2_AABB_SAVINGS[..(self.k_max - 1) as usize].iter().sum();
                let mut vertex_size = self.vertex_size;
                let mut bits = 0u32;
                for _ in 0..16 {
                    let total_weight_bits = vertex_size * 8 - tuple_index_bit_count;
                    bits = ((total_weight_bits + saved) / (self.k_max - 1)).clamp(2, 22);
                    let total_bits = bits * (self.k_max - 1) - saved + tuple_index_bit_count;
                    let new_vertex_size = (total_bits + 7) / 8;
                    if new_vertex_size == vertex_size {
                        break;
                    }
                    vertex_size = new_vertex_size;
                }
                self.weight_base_bit_count = bits;
                self.vertex_size = vertex_size;
                self.tuple_index_bit_count = tuple_index_bit_count;
                self.max_tuple_count = 1u64 << tuple_index_bit_count;
            }
            Method::Oss { bit_count } => {
                self.k_max = 4;
                self.vertex_size = (bit_count + tuple_index_bit_count + 7) / 8;
                self.tuple_index_bit_count = tuple_index_bit_count;
                self.max_tuple_count = 1u64 << tuple_index_bit_count;
            }
            Method::Permutation { .. } => {
                self.vertex_size = self.vertex_size.min(8);
                match permutation::tuple_count_class_for(self.max_tuple_count) {
                    None => {
                        log::warn!(
                            "permutation coding cannot realize max_tuple_count={}; downgrading to Method::None",
                            self.max_tuple_count
                        );
                        self.method = Method::None;
                        self.vertex_size = self.k_max * (4 + 2);
                    }
                    Some(class) => {
                        self.max_tuple_count = permutation::PERMUTATION_TUPLE_COUNTS[class];
                        while self.vertex_size < 8
                            && !row_supported(class, self.k_max, self.vertex_size)
                        {
                            self.vertex_size += 1;
                        }
                        while self.vertex_size > 1
                            && !row_supported(class, self.k_max, self.vertex_size)
                        {
                            self.vertex_size -= 1;
                        }
                        self.method = Method::Permutation {
                            row: PermutationRowSlot(Some(RowHandle {
                                class,
                                k_max: self.k_max,
                                vertex_size: self.vertex_size,
                            })),
                        };
                    }
                }
            }
            Method::None => {
                self.vertex_size = self.k_max * (4 + 2);
            }
        }
        self
    }
}

fn row_supported(class: usize, k_max: u32, vertex_size: u32) -> bool {
    permutation::lookup(class, k_max, vertex_size).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_cube_completion_fits_in_vertex_size() {
        let p = CodecParams::new(Method::UnitCube, 4, 4, 128).complete();
        assert_eq!(p.vertex_size, 4);
        assert!(p.weight_base_bit_count >= 2 && p.weight_base_bit_count <= 23);
        let total =
            p.weight_base_bit_count * (p.k_max - 1) + p.tuple_index_bit_count;
        assert!(total <= p.vertex_size * 8);
    }

    #[test]
    fn completion_is_idempotent() {
        let p = CodecParams::new(Method::Po2Aabb, 6, 3, 300).complete();
        let p2 = p.complete();
        assert_eq!(p, p2);
    }

    #[test]
    fn oss_forces_k_max_to_4() {
        let p = CodecParams::new(Method::Oss { bit_count: 19 }, 8, 4, 128).complete();
        assert_eq!(p.k_max, 4);
        assert_eq!(p.vertex_size, (19 + p.tuple_index_bit_count + 7) / 8);
    }

    #[test]
    fn permutation_selects_a_supported_row() {
        let p = CodecParams::new(
            Method::Permutation {
                row: PermutationRowSlot(None),
            },
            4,
            4,
            128,
        )
        .complete();
        match p.method {
            Method::Permutation { row } => {
                let handle = row.0.expect("row should be resolved");
                let _ = handle.row();
            }
            _ => panic!("expected permutation method to survive completion"),
        }
    }

    #[test]
    fn permutation_downgrades_to_none_when_unrealizable() {
        let p = CodecParams::new(
            Method::Permutation {
                row: PermutationRowSlot(None),
            },
            4,
            4,
            10_000_000,
        )
        .complete();
        assert_eq!(p.method, Method::None);
    }

    #[test]
    fn none_method_sizes_vertex_to_raw_data() {
        let p = CodecParams::new(Method::None, 5, 0, 0).complete();
        assert_eq!(p.vertex_size, 5 * 6);
    }
}
