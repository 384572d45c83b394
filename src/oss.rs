//! Optimal simplex sampling (OSS) for 4-tuples of sorted weights summing to
//! one: a bijection between the lattice points of the sorted simplex and
//! integers in `[0, N(B))`, following Kuth & Meyer 2021.
//!
//! The encoding uses a "shear alias delta" scheme: three nested clamped
//! ranks (`k`, `j`, `i`) are peeled off from the weight with the narrowest
//! remaining range inward, each contributing a cubic or quadratic base
//! offset. Decoding inverts each base offset in turn, using a closed-form
//! cube root for the cubic stage and a closed-form square root for the
//! quadratic stage, both with an integer off-by-one fixup against the true
//! (integer) inverse.

use crate::error::{VbacError, VbacResult};

/// `N(B)` for bit budgets `B` in `[0, 64]`. Transcribed verbatim from the
/// reference implementation, including the repeated value at index 62
/// (equal to index 52) -- that duplication is present in the original
/// table, not introduced here.
pub const LUT_N: [u64; 65] = [
    0, 1, 2, 3, 5, 6, 9, 11, 15, 19, 24, 31, 40, 51, 65, 82, 104, 131, 166, 209, 264, 333, 421,
    531, 669, 843, 1063, 1340, 1689, 2128, 2682, 3379, 4258, 5365, 6760, 8518, 10733, 13523,
    17038, 21467, 27047, 34078, 42936, 54097, 68158, 85874, 108196, 136318, 171751, 216393,
    272639, 343504, 432788, 545279, 687010, 865578, 1090561, 1374021, 1731159, 2181124, 2748045,
    3462320, 432788, 5496091, 6924641,
];

/// Precomputed constants for a chosen bit budget.
#[derive(Debug, Clone, Copy)]
pub struct OssInfo {
    /// Grid resolution for this bit budget.
    pub n: u64,
    mi4: u64,
    scale: f64,
}

impl OssInfo {
    /// Derives grid constants for a `bit_count` supported by [`LUT_N`].
    pub fn for_bit_count(bit_count: u32) -> VbacResult<Self> {
        let n = *LUT_N
            .get(bit_count as usize)
            .ok_or(VbacError::UnsupportedBitCount { bit_count })?;
        let mi4 = base_idx4(0, n);
        let scale = 0.5 / (n - 1) as f64;
        Ok(OssInfo { n, mi4, scale })
    }
}

/// Encodes one weight 4-tuple `[x, y, z, w]` (with `x = 1 - y - z - w` the
/// implicit largest component) into an integer code using the grid
/// described by `info`. Only `y`, `z`, `w` are read; `x` is not needed by
/// the encoder because it is recovered from the others on decode.
pub fn compress(weights: [f32; 4], info: &OssInfo) -> u64 {
    let mut n = info.n;
    let v2 = weights[1] as f64;
    let v3 = weights[2] as f64;
    let v4 = weights[3] as f64;

    let mut k = (v4 / info.scale + 0.5) as u64;
    k = k.min((n as f64 / 2.0 - 0.5) as u64);
    let v4 = k as f64 * info.scale;
    let tok = info.mi4 - base_idx4(k, n);
    n -= 2 * k;

    let mut j = ((v3 - v4) / info.scale + 0.5) as u64;
    j = j.min(((2 * n + 1) as f64 / 3.0 - 1.0) as u64);
    let v3 = j as f64 * info.scale;
    let toj = n as f64 * j as f64 - j as f64 * j as f64 * 3.0 / 4.0 + j as f64 / 2.0 + 0.25;
    let toj = toj as u64;
    n -= (3 * j) / 2;

    let mut i = ((v2 - v3 - v4) / info.scale + 0.5) as u64;
    i = i.min(n - 1);

    i + toj + tok
}

/// Inverse of [`compress`]: returns `[x, y, z, w]` with `x = 1 - y - z - w`.
pub fn decompress(code: u64, info: &OssInfo) -> [f32; 4] {
    let mut n = info.n;
    let k = solve_for_i4(code, n, info.mi4);

    let mut code = code - (info.mi4 - base_idx4(k, n));
    n -= 2 * k;
    let j = solve_for_i3(code, n);

    code -= (n * n + n + 1) / 3 - base_idx3(j, n);
    let i = code;

    // Shear alias delta code: undo the nested shrinking.
    let j = j + k;
    let i = i + j;

    let y = i as f64 * info.scale;
    let z = j as f64 * info.scale;
    let w = k as f64 * info.scale;
    let x = 1.0 - y - z - w;

    [x as f32, y as f32, z as f32, w as f32]
}

fn base_idx3(ic: u64, n: u64) -> u64 {
    let a = 2 * n - 3 * ic + 1;
    let a2 = a * a;
    let r = a2 % 12;
    a2 / 12 + if r >= 6 { 1 } else { 0 }
}

fn solve_for_i3(code: u64, n: u64) -> u64 {
    let x = base_idx3(0, n) - code;
    let a = (2.0 * n as f64 + 1.0 - ((12 * x) as f64).sqrt()) as u64;
    let ic = a / 3;

    let lower = base_idx3(ic, n);
    let upper = base_idx3(ic + 1, n);

    ic - u64::from(x > lower) + u64::from(x <= upper)
}

fn base_idx4(id: u64, n: u64) -> u64 {
    let a: i64 = 2 * id as i64 - n as i64 - 1;
    let a2: i64 = (a * a) / 36;
    let a2r: i64 = (a * a) % 36;
    let b: i64 = 3 - 2 * a;
    let i: i64 = a2 * b + (a2r * b + 18) / 36;
    i as u64
}

fn solve_for_i4(code: u64, n: u64, mi4: u64) -> u64 {
    let x = mi4 - code;
    let b = x as f64 * 144.0;
    let cr = b.cbrt();
    let f = cr + 1.0 / cr;
    let f_int = f as i64;
    let numerator = n as i64 * 2 + 3 - f_int;
    let id = (numerator / 4) as u64;
    let lower = base_idx4(id, n);
    id - u64::from(x > lower)
}
