//! Row-wise fp8 (e4m3) quantization.
//!
//! One scale per matrix row: `scale = max_abs(row) / FP8_E4M3_MAX`, every
//! element stored as `e4m3(value / scale)`, and dequantization multiplies the
//! decoded element back by the row scale. Encoded bytes are packed four per
//! little-endian u32 word along the K dimension, the layout the quantized
//! kernel consumes directly.

use std::sync::OnceLock;

use half::bf16;

/// Largest finite e4m3 magnitude.
pub const FP8_E4M3_MAX: f32 = 448.0;

/// Encoded elements per packed u32 word.
pub const FP8_PACK_FACTOR: usize = 4;

/// Decode one e4m3 byte. `S.1111.111` is NaN (the format has no infinities).
pub fn fp8_e4m3_decode(byte: u8) -> f32 {
    let sign = if byte & 0x80 != 0 { -1.0f32 } else { 1.0f32 };
    let exp = ((byte >> 3) & 0xf) as i32;
    let mant = (byte & 0x7) as f32;
    if exp == 0 {
        // subnormal: mant * 2^-9
        sign * mant * 2f32.powi(-9)
    } else if exp == 15 && byte & 0x7 == 0x7 {
        f32::NAN
    } else {
        // normal: (8 + mant) * 2^(exp - 10), bias 7
        sign * (8.0 + mant) * 2f32.powi(exp - 10)
    }
}

/// All non-negative finite codes sorted by decoded value, for nearest-match
/// encoding. 126 entries: exponents 0..=15 with mantissas 0..=7, minus NaN.
fn positive_codes() -> &'static [(f32, u8)] {
    static CODES: OnceLock<Vec<(f32, u8)>> = OnceLock::new();
    CODES.get_or_init(|| {
        let mut codes: Vec<(f32, u8)> = (0u8..=0x7e).map(|c| (fp8_e4m3_decode(c), c)).collect();
        codes.sort_by(|a, b| a.0.total_cmp(&b.0));
        codes
    })
}

/// Encode one f32 as e4m3 with round-to-nearest (ties to even mantissa),
/// saturating at +-448. NaN encodes as NaN.
pub fn fp8_e4m3_encode(value: f32) -> u8 {
    if value.is_nan() {
        return 0x7f;
    }
    let sign = if value.is_sign_negative() { 0x80u8 } else { 0 };
    let mag = value.abs();
    let codes = positive_codes();
    if mag >= FP8_E4M3_MAX {
        return sign | 0x7e;
    }
    let idx = codes.partition_point(|&(v, _)| v < mag);
    // idx is the first code >= mag; idx > 0 since mag >= 0 == codes[0].
    if idx == 0 {
        return sign | codes[0].1;
    }
    let (lo_v, lo_c) = codes[idx - 1];
    let (hi_v, hi_c) = codes[idx];
    let d_lo = mag - lo_v;
    let d_hi = hi_v - mag;
    if d_lo < d_hi {
        sign | lo_c
    } else if d_hi < d_lo {
        sign | hi_c
    } else if lo_c & 1 == 0 {
        sign | lo_c
    } else {
        sign | hi_c
    }
}

fn pack4(bytes: [u8; 4]) -> u32 {
    u32::from_le_bytes(bytes)
}

/// Quantize a `[rows, cols]` row-major matrix row by row.
///
/// Returns the packed code words (`rows * cols / 4` of them) and one f32
/// scale per row such that `decode(code) * scale[row]` reconstructs the
/// input up to e4m3 rounding. An all-zero row gets scale 1 so dequantization
/// stays exact.
pub fn quantize_fp8_row(values: &[f32], rows: usize, cols: usize) -> (Vec<u32>, Vec<f32>) {
    assert_eq!(values.len(), rows * cols, "values must cover rows * cols");
    assert!(
        cols.is_multiple_of(FP8_PACK_FACTOR),
        "cols must be divisible by the pack factor ({FP8_PACK_FACTOR})"
    );

    let mut packed = Vec::with_capacity(rows * cols / FP8_PACK_FACTOR);
    let mut scales = Vec::with_capacity(rows);

    for r in 0..rows {
        let row = &values[r * cols..(r + 1) * cols];
        let max_abs = row.iter().fold(0f32, |acc, v| acc.max(v.abs()));
        let scale = if max_abs == 0.0 {
            1.0
        } else {
            max_abs / FP8_E4M3_MAX
        };
        scales.push(scale);

        for chunk in row.chunks_exact(FP8_PACK_FACTOR) {
            packed.push(pack4([
                fp8_e4m3_encode(chunk[0] / scale),
                fp8_e4m3_encode(chunk[1] / scale),
                fp8_e4m3_encode(chunk[2] / scale),
                fp8_e4m3_encode(chunk[3] / scale),
            ]));
        }
    }

    (packed, scales)
}

/// bf16 front-end for [`quantize_fp8_row`].
pub fn quantize_fp8_row_bf16(values: &[bf16], rows: usize, cols: usize) -> (Vec<u32>, Vec<f32>) {
    let widened: Vec<f32> = values.iter().map(|v| v.to_f32()).collect();
    quantize_fp8_row(&widened, rows, cols)
}

/// Unpack one word back to four decoded f32 values. Host-side mirror of the
/// kernel's unpacking, used by reference implementations in tests.
pub fn unpack_fp8x4_host(word: u32) -> [f32; 4] {
    let bytes = word.to_le_bytes();
    [
        fp8_e4m3_decode(bytes[0]),
        fp8_e4m3_decode(bytes[1]),
        fp8_e4m3_decode(bytes[2]),
        fp8_e4m3_decode(bytes[3]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_known_codes() {
        assert_eq!(fp8_e4m3_decode(0x00), 0.0);
        assert_eq!(fp8_e4m3_decode(0x38), 1.0);
        assert_eq!(fp8_e4m3_decode(0xb8), -1.0);
        assert_eq!(fp8_e4m3_decode(0x7e), 448.0);
        // smallest subnormal
        assert_eq!(fp8_e4m3_decode(0x01), 2f32.powi(-9));
        assert!(fp8_e4m3_decode(0x7f).is_nan());
    }

    #[test]
    fn encode_is_exact_for_representable_values() {
        for code in 0u8..=0x7e {
            let value = fp8_e4m3_decode(code);
            assert_eq!(fp8_e4m3_encode(value), code, "code {code:#x}");
        }
    }

    #[test]
    fn encode_saturates() {
        assert_eq!(fp8_e4m3_encode(1000.0), 0x7e);
        assert_eq!(fp8_e4m3_encode(-1000.0), 0xfe);
    }

    #[test]
    fn encode_rounds_to_nearest() {
        // 1.0 = 0x38, next code 1.125 = 0x39
        assert_eq!(fp8_e4m3_encode(1.05), 0x38);
        assert_eq!(fp8_e4m3_encode(1.1), 0x39);
        // tie at 1.0625 goes to the even mantissa (1.0)
        assert_eq!(fp8_e4m3_encode(1.0625), 0x38);
    }

    #[test]
    fn roundtrip_error_is_bounded_by_mantissa_step() {
        for &x in &[0.017f32, 0.3, 1.7, 3.14, 255.0, 447.9, -12.5] {
            let back = fp8_e4m3_decode(fp8_e4m3_encode(x));
            let rel = ((back - x) / x).abs();
            assert!(rel <= 1.0 / 16.0, "x={x} back={back} rel={rel}");
        }
    }

    #[test]
    fn rowwise_quantization_reconstructs_within_tolerance() {
        let rows = 3;
        let cols = 8;
        let values: Vec<f32> = (0..rows * cols)
            .map(|i| ((i * 37 + 11) % 101) as f32 * 0.3 - 15.0)
            .collect();
        let (packed, scales) = quantize_fp8_row(&values, rows, cols);
        assert_eq!(packed.len(), rows * cols / 4);
        assert_eq!(scales.len(), rows);

        for r in 0..rows {
            let row_max = values[r * cols..(r + 1) * cols]
                .iter()
                .fold(0f32, |acc, v| acc.max(v.abs()));
            for c in 0..cols {
                let word = packed[(r * cols + c) / 4];
                let deq = unpack_fp8x4_host(word)[c % 4] * scales[r];
                let err = (deq - values[r * cols + c]).abs();
                // half a mantissa step of the largest magnitude in the row
                assert!(err <= row_max / 16.0 + 1e-6, "r={r} c={c} err={err}");
            }
        }
    }

    #[test]
    fn zero_row_gets_unit_scale() {
        let (packed, scales) = quantize_fp8_row(&[0.0; 8], 2, 4);
        assert_eq!(scales, vec![1.0, 1.0]);
        assert!(packed.iter().all(|&w| w == 0));
    }

    #[test]
    fn bf16_rows_quantize_like_their_f32_widening() {
        let values: Vec<f32> = (0..16).map(|i| i as f32 * 0.25 - 2.0).collect();
        let as_bf16: Vec<bf16> = values.iter().map(|&v| bf16::from_f32(v)).collect();
        let widened: Vec<f32> = as_bf16.iter().map(|v| v.to_f32()).collect();
        assert_eq!(
            quantize_fp8_row_bf16(&as_bf16, 4, 4),
            quantize_fp8_row(&widened, 4, 4)
        );
    }
}
