//! Per-vertex encoding: sort influences by weight, dispatch on the codec
//! method, write the fixed-size payload.

use crate::bitpack;
use crate::oss::OssInfo;
use crate::params::{CodecParams, Method, PO2_AABB_SAVINGS};
use crate::permutation;
use crate::quantize;

/// A single `(bone id, weight)` influence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Influence {
    /// Index of the bone this influence refers to.
    pub bone_id: u16,
    /// Blend weight, expected non-negative.
    pub weight: f32,
}

/// Sorts `influences` by ascending weight (stable), matching the ordering
/// every codec in this crate assumes.
pub fn sort_by_weight(influences: &mut [Influence]) {
    influences.sort_by(|a, b| a.weight.partial_cmp(&b.weight).unwrap());
}

/// Determines which sorted weights become zero after quantizing (and, where
/// relevant, dequantizing) under `params`. Bit `i` set means rank `i` is
/// degenerate. This mirrors the reference implementation's cheap shortcut:
/// it decodes only as much as needed to learn the zero mask, not a full
/// encode/decode round trip (see the dedup module for why that matters).
pub fn flag_zero_compressed_weights(sorted: &[Influence], params: &CodecParams) -> u32 {
    let k = sorted.len();
    let mut weights: Vec<f32> = sorted.iter().map(|i| i.weight).collect();
    match params.method {
        Method::UnitCube => {
            for w in weights.iter_mut().take(k - 1) {
                let q = quantize::quantize_unit(*w, params.weight_base_bit_count);
                *w = q as f32;
            }
        }
        Method::Po2Aabb => {
            for w in weights.iter_mut().take(k - 1) {
                let q = quantize::quantize_half(*w, params.weight_base_bit_count);
                *w = q as f32;
            }
        }
        Method::Oss { bit_count } => {
            if let Ok(info) = OssInfo::for_bit_count(bit_count) {
                let reverted = [weights[3], weights[2], weights[1], weights[0]];
                let code = crate::oss::compress(reverted, &info);
                let decoded = crate::oss::decompress(code, &info);
                weights[0] = decoded[3];
                weights[1] = decoded[2];
                weights[2] = decoded[1];
                weights[3] = decoded[0];
            }
        }
        Method::Permutation { row } => {
            if let Some(handle) = row.0 {
                let row = handle.row();
                let code = permutation::compress(&weights, 0, &row);
                let (decoded, _) = permutation::decompress(code, &row);
                weights = decoded;
            }
        }
        Method::None => {}
    }
    let mut result = 0u32;
    for (i, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            result |= 1 << i;
        }
    }
    result
}

/// Writes the compressed representation of one vertex into `out`, which
/// must be exactly `params.vertex_size` bytes (and is zeroed by the caller
/// or otherwise free of stale bits the method doesn't overwrite).
pub fn encode_vertex(params: &CodecParams, sorted: &[Influence], tuple_index: u64, out: &mut [u8]) {
    let k = sorted.len();
    match params.method {
        Method::UnitCube => {
            for (i, influence) in sorted.iter().take(k - 1).enumerate() {
                let q = quantize::quantize_unit(influence.weight, params.weight_base_bit_count);
                bitpack::insert(
                    out,
                    q,
                    i as u32 * params.weight_base_bit_count,
                    params.weight_base_bit_count,
                );
            }
            bitpack::insert(
                out,
                tuple_index as u32,
                (k as u32 - 1) * params.weight_base_bit_count,
                params.tuple_index_bit_count,
            );
        }
        Method::Po2Aabb => {
            let mut next_bit = 0u32;
            for i in 0..k - 1 {
                let weight = sorted[k - 2 - i].weight;
                let q = quantize::quantize_half(weight, params.weight_base_bit_count);
                let bits = params.weight_base_bit_count - PO2_AABB_SAVINGS[i];
                bitpack::insert(out, q, next_bit, bits);
                next_bit += bits;
            }
            bitpack::insert(out, tuple_index as u32, next_bit, params.tuple_index_bit_count);
        }
        Method::Oss { bit_count } => {
            let info = OssInfo::for_bit_count(bit_count)
                .expect("CodecParams::complete only selects supported OSS bit counts");
            let reverted = [
                sorted[3].weight,
                sorted[2].weight,
                sorted[1].weight,
                sorted[0].weight,
            ];
            let mut code = crate::oss::compress(reverted, &info);
            code |= tuple_index << bit_count;
            write_low_bytes(out, code);
        }
        Method::Permutation { row } => {
            let row = row
                .0
                .expect("CodecParams::complete resolves a row for permutation coding")
                .row();
            let weights: Vec<f32> = sorted.iter().map(|i| i.weight).collect();
            let code = permutation::compress(&weights, tuple_index, &row);
            write_low_bytes(out, code);
        }
        Method::None => {
            for (i, influence) in sorted.iter().enumerate() {
                out[i * 6..i * 6 + 2].copy_from_slice(&influence.bone_id.to_le_bytes());
                out[i * 6 + 2..i * 6 + 6].copy_from_slice(&influence.weight.to_le_bytes());
            }
        }
    }
}

fn write_low_bytes(out: &mut [u8], code: u64) {
    let bytes = code.to_le_bytes();
    out.copy_from_slice(&bytes[..out.len()]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{CodecParams, Method};

    #[test]
    fn sort_by_weight_orders_ascending() {
        let mut influences = vec![
            Influence { bone_id: 1, weight: 0.4 },
            Influence { bone_id: 2, weight: 0.1 },
            Influence { bone_id: 3, weight: 0.5 },
        ];
        sort_by_weight(&mut influences);
        assert_eq!(influences[0].bone_id, 2);
        assert_eq!(influences[2].bone_id, 3);
    }

    #[test]
    fn unit_cube_round_trip() {
        let params = CodecParams::new(Method::UnitCube, 4, 4, 128).complete();
        let sorted = vec![
            Influence { bone_id: 1, weight: 0.10 },
            Influence { bone_id: 2, weight: 0.20 },
            Influence { bone_id: 3, weight: 0.30 },
            Influence { bone_id: 4, weight: 0.40 },
        ];
        let mut out = vec![0u8; params.vertex_size as usize];
        encode_vertex(&params, &sorted, 7, &mut out);

        for (i, influence) in sorted.iter().take(3).enumerate() {
            let q = bitpack::extract(
                &out,
                i as u32 * params.weight_base_bit_count,
                params.weight_base_bit_count,
            );
            let decoded = quantize::dequantize_unit(q, params.weight_base_bit_count);
            assert!((decoded - influence.weight).abs() < 0.02);
        }
        let tuple_index = bitpack::extract(
            &out,
            3 * params.weight_base_bit_count,
            params.tuple_index_bit_count,
        );
        assert_eq!(tuple_index, 7);
    }

    #[test]
    fn degenerate_weight_flagged_under_unit_cube() {
        let params = CodecParams::new(Method::UnitCube, 4, 3, 8).complete();
        let sorted = vec![
            Influence { bone_id: 9, weight: 0.0 },
            Influence { bone_id: 9, weight: 0.0 },
            Influence { bone_id: 9, weight: 0.0 },
            Influence { bone_id: 42, weight: 1.0 },
        ];
        let mask = flag_zero_compressed_weights(&sorted, &params);
        assert_eq!(mask & 0b0111, 0b0111);
    }
}
