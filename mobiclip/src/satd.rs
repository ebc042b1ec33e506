/// 4-point Walsh-Hadamard butterfly over `v[start]`, `v[start + step]`, ...
fn butterfly(v: &mut [i32; 16], start: usize, step: usize) {
    let [a, b, c, d] = [0, 1, 2, 3].map(|k| v[start + k * step]);
    let (sum_ab, diff_ab) = (a + b, a - b);
    let (sum_cd, diff_cd) = (c + d, c - d);
    v[start] = sum_ab + sum_cd;
    v[start + step] = diff_ab + diff_cd;
    v[start + 2 * step] = sum_ab - sum_cd;
    v[start + 3 * step] = diff_ab - diff_cd;
}

/// Sum of absolute Hadamard-transformed differences between two square
/// blocks of `size` pixels per side (4 or 8), both stored contiguously.
pub fn block_satd(source: &[u8], reconstruction: &[u8], size: usize) -> u32 {
    debug_assert!(size.is_multiple_of(4));
    debug_assert!(source.len() >= size * size && reconstruction.len() >= size * size);

    let mut satd = 0u32;
    let mut residual = [0i32; 16];
    for by in (0..size).step_by(4) {
        for bx in (0..size).step_by(4) {
            for y in 0..4 {
                for x in 0..4 {
                    let idx = (by + y) * size + bx + x;
                    residual[y * 4 + x] = i32::from(source[idx]) - i32::from(reconstruction[idx]);
                }
            }
            for line in 0..4 {
                butterfly(&mut residual, line * 4, 1);
            }
            for line in 0..4 {
                butterfly(&mut residual, line, 4);
            }
            let chunk: u32 = residual.iter().map(|c| c.unsigned_abs()).sum();
            // Halved to stay near the SAD range
            satd += chunk / 2;
        }
    }
    satd
}
