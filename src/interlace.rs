//! Rewrites a decoded index buffer from GIF's 4-pass interlace order into
//! raster (top-to-bottom) order.

/// `(starting_row, row_stride)` for each of the 4 interlace passes, in the
/// order rows for each pass are stored in the compressed stream.
const PASSES: [(usize, usize); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

/// Reorders `data`, which holds `width * height` indices written in
/// interlace-pass order, into raster order, in place.
pub(crate) fn deinterlace(data: &mut [u8], width: u16, height: u16) {
    let width = width as usize;
    let height = height as usize;

    let mut out = vec![0u8; data.len()];
    let mut src_row = 0usize;

    for &(start, stride) in &PASSES {
        if start >= height {
            continue;
        }
        let num_rows = (height - start).div_ceil(stride);
        for k in 0..num_rows {
            let dst_row = start + k * stride;
            let src_off = src_row * width;
            let dst_off = dst_row * width;
            out[dst_off..dst_off + width].copy_from_slice(&data[src_off..src_off + width]);
            src_row += 1;
        }
    }

    data.copy_from_slice(&out);
}
