//! Zigzag scan orders. Entry `i` is the raster position of the `i`-th
//! coefficient in coding order.

#[rustfmt::skip]
pub const ZIGZAG_4X4: [u8; 16] = [
     0,  4,  1,  2,
     5,  8, 12,  9,
     6,  3,  7, 10,
    13, 14, 11, 15,
];

#[rustfmt::skip]
pub const ZIGZAG_8X8: [u8; 64] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

/// Reorders a raster block into coding order.
pub fn to_zigzag<const N: usize>(raster: &[i32; N], order: &[u8; N]) -> [i32; N] {
    let mut out = [0i32; N];
    for (dst, &pos) in out.iter_mut().zip(order.iter()) {
        *dst = raster[pos as usize];
    }
    out
}

/// Inverse of [`to_zigzag`].
pub fn from_zigzag<T: Copy + Default, const N: usize>(linear: &[T; N], order: &[u8; N]) -> [T; N] {
    let mut out = [T::default(); N];
    for (&value, &pos) in linear.iter().zip(order.iter()) {
        out[pos as usize] = value;
    }
    out
}
