//! Property tests: round-trip and idempotence invariants that should hold
//! for arbitrary inputs, not just the hand-picked cases in unit tests.

use proptest::prelude::*;
use vbac::params::{CodecParams, Method, PermutationRowSlot};

proptest! {
    #[test]
    fn bitpack_insert_extract_round_trips(
        value in any::<u32>(),
        bit_offset in 0u32..200,
        bit_count in 0u32..=32,
    ) {
        let mut buf = vec![0u8; 32];
        vbac::bitpack::insert(&mut buf, value, bit_offset, bit_count);
        let extracted = vbac::bitpack::extract(&buf, bit_offset, bit_count);
        let expected = if bit_count == 32 { value } else { value & ((1u32 << bit_count) - 1) };
        prop_assert_eq!(extracted, expected);
    }

    #[test]
    fn bitpack_insert_does_not_disturb_bits_outside_the_field(
        bit_offset in 8u32..64,
        bit_count in 1u32..24,
    ) {
        let mut buf = vec![0xffu8; 16];
        vbac::bitpack::insert(&mut buf, 0, bit_offset, bit_count);
        for bit in 0..(16 * 8) {
            if bit < bit_offset || bit >= bit_offset + bit_count {
                let byte = (bit / 8) as usize;
                let shift = bit % 8;
                prop_assert_eq!((buf[byte] >> shift) & 1, 1, "bit {} disturbed", bit);
            }
        }
    }

    #[test]
    fn quantize_unit_round_trips_through_grid(
        bit_count in 2u32..16,
        q in 0u32..((1u32 << 16) - 1),
    ) {
        let q = q & ((1u32 << bit_count) - 1);
        let w = vbac::quantize::dequantize_unit(q, bit_count);
        prop_assert_eq!(vbac::quantize::quantize_unit(w, bit_count), q);
    }

    #[test]
    fn oss_round_trip_is_stable_under_recompression(
        a in 0.0f32..1.0,
        b in 0.0f32..1.0,
        c in 0.0f32..1.0,
    ) {
        let sum = a + b + c + 0.001;
        let weights = [0.0f32, a / sum, b / sum, c / sum];
        let info = vbac::oss::OssInfo::for_bit_count(19).unwrap();
        let code1 = vbac::oss::compress(weights, &info);
        let decoded1 = vbac::oss::decompress(code1, &info);
        let code2 = vbac::oss::compress(decoded1, &info);
        prop_assert_eq!(code1, code2);
    }

    #[test]
    fn permutation_round_trips_tuple_index(
        tuple_index in 0u64..100,
        w0 in 0.0f32..1.0,
        w1 in 0.0f32..1.0,
        w2 in 0.0f32..1.0,
        w3 in 0.0f32..1.0,
    ) {
        let row = vbac::permutation::lookup(0, 4, 4).unwrap();
        let sum = w0 + w1 + w2 + w3 + 0.001;
        let weights = [w0 / sum, w1 / sum, w2 / sum, w3 / sum];
        let code = vbac::permutation::compress(&weights, tuple_index % row.payload_value_count_over_factorial, &row);
        let (_, decoded_index) = vbac::permutation::decompress(code, &row);
        prop_assert_eq!(decoded_index, tuple_index % row.payload_value_count_over_factorial);
    }

    #[test]
    fn codec_params_completion_is_idempotent(
        k_max in 2u32..14,
        vertex_size in 1u32..16,
        max_tuple_count in 1u64..10_000,
    ) {
        let p = CodecParams::new(Method::UnitCube, k_max, vertex_size, max_tuple_count).complete();
        let p2 = p.complete();
        prop_assert_eq!(p, p2);
    }

    #[test]
    fn permutation_completion_is_idempotent(
        k_max in 2u32..14,
        max_tuple_count in 1u64..8_000,
    ) {
        let p = CodecParams::new(
            Method::Permutation { row: PermutationRowSlot(None) },
            k_max,
            4,
            max_tuple_count,
        )
        .complete();
        let p2 = p.complete();
        prop_assert_eq!(p, p2);
    }
}
