//! Block-copy descriptors.
//!
//! A descriptor names a rectangular window into a row-major matrix: base
//! element offset, global row/column extent, and the row stride. Input
//! descriptors (A and B) are launch-invariant, so they travel as compile-time
//! geometry. The output descriptor changes with every group a worker visits;
//! each worker rebuilds it in its private workspace slot on the device and
//! fences it before the first tile of the group.
//!
//! Tile loads zero-fill rows past the descriptor's extent, so the compute
//! loop never needs masking; stores are masked against the output
//! descriptor's extent instead.

use cubecl::prelude::*;
use cubecl::std::tensor::layout::linear::LinearView;

use super::workspace::DESCRIPTOR_WORDS;

/// Launch-invariant window geometry for an input matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockDescriptor {
    /// Global rows backing the window; loads beyond this zero-fill.
    pub rows: usize,
    /// Elements per row.
    pub cols: usize,
    /// Elements between consecutive rows (equals `cols` for contiguous
    /// matrices).
    pub row_stride: usize,
}

impl BlockDescriptor {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            row_stride: cols,
        }
    }
}

/// Rebuild the calling worker's output descriptor for a new group and fence
/// it. The leading barrier keeps unit 0 from clobbering a slot other units of
/// this cube may still be reading for the previous group; the trailing one
/// publishes the new words before any unit consumes them.
#[cube]
pub(crate) fn create_output_descriptor(
    workspace: &mut LinearView<u32, ReadWrite>,
    base: u32,
    rows: u32,
    cols: u32,
    row_stride: u32,
) {
    let slot = CUBE_POS as usize * DESCRIPTOR_WORDS;
    sync_cube();
    if UNIT_POS == 0 {
        workspace[slot] = base;
        workspace[slot + 1] = rows;
        workspace[slot + 2] = cols;
        workspace[slot + 3] = row_stride;
    }
    sync_cube();
}

/// Cooperative copy of one `[block_rows, block_k]` tile into lined shared
/// memory. `row0` is the window row of the tile's first row and `k_line0`
/// the first K line of this K step; rows at or past `desc.rows` zero-fill.
#[cube]
#[allow(clippy::too_many_arguments)]
pub(crate) fn load_block<F: Float>(
    src: &LinearView<Line<F>>,
    stage: &mut SharedMemory<Line<F>>,
    row0: usize,
    k_line0: usize,
    #[comptime] desc: BlockDescriptor,
    #[comptime] block_rows: usize,
    #[comptime] block_k: usize,
    #[comptime] line_size: usize,
    #[comptime] total_units: usize,
) {
    let k_lines = block_k / line_size;
    let row_stride_lines = desc.row_stride / line_size;
    let total_lines = block_rows * k_lines;

    let mut t = UNIT_POS as usize;
    while t < total_lines {
        let r = t / k_lines;
        let kl = t % k_lines;
        let global_row = row0 + r;
        let mut value = Line::<F>::empty(line_size).fill(F::cast_from(0));
        if global_row < desc.rows {
            value = src[global_row * row_stride_lines + k_line0 + kl];
        }
        stage[t] = value;
        t += total_units;
    }
}

/// Packed-fp8 variant of [`load_block`]: every u32 word holds four e4m3
/// codes along K, decoded to f32 on the way into shared memory.
#[cube]
#[allow(clippy::too_many_arguments)]
pub(crate) fn load_block_fp8(
    src: &LinearView<u32>,
    stage: &mut SharedMemory<Line<f32>>,
    row0: usize,
    k_word0: usize,
    #[comptime] desc: BlockDescriptor,
    #[comptime] block_rows: usize,
    #[comptime] block_k: usize,
    #[comptime] line_size: usize,
    #[comptime] total_units: usize,
) {
    let k_words = block_k / line_size;
    let row_stride_words = desc.row_stride / line_size;
    let total_words = block_rows * k_words;

    let mut t = UNIT_POS as usize;
    while t < total_words {
        let r = t / k_words;
        let kw = t % k_words;
        let global_row = row0 + r;
        let mut value = Line::<f32>::empty(line_size).fill(0.0f32);
        if global_row < desc.rows {
            value = unpack_fp8x4(src[global_row * row_stride_words + k_word0 + kw]);
        }
        stage[t] = value;
        t += total_units;
    }
}

/// Decode the four e4m3 codes of one little-endian word.
#[cube]
fn unpack_fp8x4(word: u32) -> Line<f32> {
    let mut out = Line::<f32>::empty(4usize);

    #[unroll]
    for i in 0..4usize {
        out[i] = fp8_e4m3_to_f32((word >> (i as u32 * 8)) & 0xff);
    }
    out
}

/// e4m3: 1 sign, 4 exponent (bias 7), 3 mantissa. Subnormals are
/// `mant * 2^-9`; the quantizer never emits the NaN code so it is not
/// special-cased here.
#[cube]
fn fp8_e4m3_to_f32(byte: u32) -> f32 {
    let exp = (byte >> 3) & 0xf;
    let mant = byte & 0x7;
    let two = f32::cast_from(2u32);

    let sub = f32::cast_from(mant) * (1.0f32 / 512.0f32);
    let norm = f32::cast_from(mant + 8) * two.powf(f32::cast_from(exp) - 10.0f32);
    let mag = select(exp != 0, norm, sub);
    select((byte >> 7) & 1 == 1, -mag, mag)
}
