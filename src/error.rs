//! Error types shared across the crate.

use thiserror::Error;

/// Result alias used throughout `vbac`.
pub type VbacResult<T> = Result<T, VbacError>;

/// Failure modes of the compression pipeline.
///
/// `CodecParams::complete` never returns this type: it is the designated
/// policy layer and silently repairs unrealizable requests instead.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum VbacError {
    /// A structural parameter is out of its supported range, e.g. `k_max`
    /// outside `[2, 13]`, or `k_out > k_in` in a bone-count reduction.
    #[error("invalid parameters: {reason}")]
    InvalidParams {
        /// Human-readable explanation.
        reason: &'static str,
    },

    /// The permutation codec has no table row for the requested
    /// `(tuple-count class, k_max, vertex_size)` combination. Only reachable
    /// if `CodecParams::complete` was bypassed.
    #[error("no permutation codec row for k_max={k_max}, vertex_size={vertex_size}")]
    UnsupportedParams {
        /// Requested bone count.
        k_max: u32,
        /// Requested vertex size in bytes.
        vertex_size: u32,
    },

    /// Optimal simplex sampling was asked for a bit count not present in
    /// `oss::LUT_N`.
    #[error("unsupported optimal simplex sampling bit count: {bit_count}")]
    UnsupportedBitCount {
        /// The rejected bit count.
        bit_count: u32,
    },

    /// Deduplication produced more distinct representative tuples than the
    /// caller's `max_table_size`. The table was truncated at the cap; the
    /// full required size is reported alongside.
    #[error("tuple table overflow: needed {needed}, capacity {capacity}")]
    TableOverflow {
        /// Table rows actually required.
        needed: u64,
        /// Caller-provided capacity.
        capacity: u64,
    },
}
