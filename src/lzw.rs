//! Variable-width LZW decompression, GIF-flavored.
//!
//! A 4096-entry code table doubles as an arena: `prefix_code` is an index
//! into the table itself, never an owned string, so a code's string is
//! only ever materialized on demand by walking the prefix chain into a
//! scratch stack buffer.

use log::{debug, trace};

use crate::cursor::Cursor;
use crate::error::{bad_data, eof, fault, nomem, Result};

const NO_PREFIX: u16 = 0xFFFF;
const TABLE_SIZE: usize = 4096;

#[derive(Clone, Copy)]
struct Code {
    in_use: bool,
    length: u16,
    prefix_code: u16,
    suffix_index: u8,
    first_index: u8,
}

impl Code {
    const EMPTY: Code = Code {
        in_use: false,
        length: 0,
        prefix_code: NO_PREFIX,
        suffix_index: 0,
        first_index: 0,
    };
}

/// Reads bytes out of GIF's chained length-prefixed sub-block structure as
/// a single logical byte stream, transparently crossing sub-block
/// boundaries. A zero-length sub-block is the terminator.
struct SubBlockReader<'c, 'a> {
    cursor: &'c mut Cursor<'a>,
    remaining_in_block: usize,
}

impl<'c, 'a> SubBlockReader<'c, 'a> {
    fn new(cursor: &'c mut Cursor<'a>) -> Self {
        SubBlockReader {
            cursor,
            remaining_in_block: 0,
        }
    }

    /// Returns the next data byte, or `Ok(None)` once the zero-length
    /// terminator is reached.
    fn next_byte(&mut self) -> Result<Option<u8>> {
        if self.remaining_in_block == 0 {
            self.cursor.require(1)?;
            let n = self.cursor.u8_at(0) as usize;
            self.cursor.advance(1)?;
            if n == 0 {
                return Ok(None);
            }
            self.remaining_in_block = n;
        }
        self.cursor.require(1)?;
        let b = self.cursor.u8_at(0);
        self.cursor.advance(1)?;
        self.remaining_in_block -= 1;
        Ok(Some(b))
    }

    /// Called once an EOI code has been read: discards whatever is left of
    /// the current sub-block, then unconditionally consumes exactly one
    /// more byte without inspecting it. This is not a general skip over
    /// the rest of the chain -- it does not loop, and it does not verify
    /// that the byte it consumes is the zero-length terminator. A stream
    /// with extra non-empty sub-blocks between the EOI code and the real
    /// terminator is not specially detected here; the cursor simply ends
    /// up one byte past wherever the EOI code stopped.
    fn drain_rest(&mut self) -> Result<()> {
        if self.remaining_in_block > 0 {
            self.cursor.advance(self.remaining_in_block)?;
            self.remaining_in_block = 0;
        }
        self.cursor.advance(1)
    }
}

/// Skips a chain of length-prefixed sub-blocks starting at the cursor's
/// current position, up to and including the zero-length terminator.
/// Never inspects the skipped bytes; used for extension blocks whose
/// content this decoder does not interpret.
pub(crate) fn skip_blocks(cursor: &mut Cursor) -> Result<()> {
    loop {
        cursor.require(1)?;
        let n = cursor.u8_at(0) as usize;
        cursor.advance(1)?;
        if n == 0 {
            return Ok(());
        }
        cursor.advance(n)?;
    }
}

/// Accumulates bits LSB-first from a `SubBlockReader` and yields codes of
/// a caller-specified width.
struct BitReader<'c, 'a> {
    blocks: SubBlockReader<'c, 'a>,
    buffer: u32,
    bits: u32,
}

impl<'c, 'a> BitReader<'c, 'a> {
    fn new(blocks: SubBlockReader<'c, 'a>) -> Self {
        BitReader {
            blocks,
            buffer: 0,
            bits: 0,
        }
    }

    fn next_code(&mut self, width: u32) -> Result<u16> {
        while self.bits < width {
            match self.blocks.next_byte()? {
                Some(b) => {
                    self.buffer |= (b as u32) << self.bits;
                    self.bits += 8;
                }
                None => {
                    return Err(eof!(
                        "LZW code stream ended before an end-of-information code"
                    ))
                }
            }
        }
        let mask = (1u32 << width) - 1;
        let code = (self.buffer & mask) as u16;
        self.buffer >>= width;
        self.bits -= width;
        Ok(code)
    }

    fn drain_rest(&mut self) -> Result<()> {
        self.blocks.drain_rest()
    }
}

/// Walks the prefix chain of `code` and writes the string it represents,
/// in forward order, into `stack` (which is cleared first).
fn emit_string(table: &[Code; TABLE_SIZE], code: u16, stack: &mut Vec<u8>) -> Result<()> {
    stack.clear();
    let mut c = code;
    loop {
        let entry = table
            .get(c as usize)
            .ok_or_else(|| fault!("LZW code {} is out of code table bounds", c))?;
        if !entry.in_use {
            return Err(fault!("LZW prefix chain referenced unused code {}", c));
        }
        stack.push(entry.suffix_index);
        if stack.len() > TABLE_SIZE {
            return Err(fault!("LZW prefix chain exceeded the code table size"));
        }
        if entry.prefix_code == NO_PREFIX {
            break;
        }
        c = entry.prefix_code;
    }
    stack.reverse();
    Ok(())
}

/// Allocates the output buffer for `required` decoded indices, surfacing
/// allocation failure as `Error::NoMem` rather than aborting. `required` is
/// `width * height`, both attacker-controlled, so for pathological
/// dimensions this is the one allocation in the crate worth checking.
fn allocate_indices(required: usize) -> Result<Vec<u8>> {
    let mut indices = Vec::new();
    indices
        .try_reserve_exact(required)
        .map_err(|_| nomem!("failed to allocate {} bytes for decoded indices", required))?;
    Ok(indices)
}

/// Decodes one image's LZW-compressed data.
///
/// `cursor` must be positioned at the minimum code size byte that precedes
/// the chain of sub-blocks; on success it is left positioned just past the
/// terminating zero-length sub-block. `num_colors` is the effective
/// palette size in force for this image (local table if present, else
/// global). Returns exactly `width * height` palette indices in raster
/// (pre-interlace) order.
pub(crate) fn decode(
    cursor: &mut Cursor,
    num_colors: usize,
    width: u16,
    height: u16,
) -> Result<Vec<u8>> {
    cursor.require(1)?;
    let min_code_size = cursor.u8_at(0);
    cursor.advance(1)?;

    if !(2..=8).contains(&min_code_size) || num_colors > (1usize << min_code_size) {
        return Err(bad_data!(
            "invalid LZW minimum code size {} for a {}-color palette",
            min_code_size,
            num_colors
        ));
    }

    cursor.require(1)?;
    if cursor.u8_at(0) == 0 {
        return Err(bad_data!("image data has no LZW sub-blocks"));
    }

    let clear_code = 1u16 << min_code_size;
    let eoi_code = clear_code + 1;
    let required = width as usize * height as usize;

    let mut table = [Code::EMPTY; TABLE_SIZE];
    for i in 0..num_colors {
        table[i] = Code {
            in_use: true,
            length: 1,
            prefix_code: NO_PREFIX,
            suffix_index: i as u8,
            first_index: i as u8,
        };
    }
    let reset_additions = |table: &mut [Code; TABLE_SIZE]| {
        for slot in &mut table[num_colors..] {
            slot.in_use = false;
        }
    };

    let mut width_bits = min_code_size as u32 + 1;
    let mut next_code = eoi_code + 1;
    let mut first_after_clear = true;
    let mut previous: u16 = 0;
    let mut indices = allocate_indices(required)?;
    let mut stack = Vec::new();

    let mut bits = BitReader::new(SubBlockReader::new(cursor));

    loop {
        let code = bits.next_code(width_bits)?;

        if code == eoi_code {
            trace!("LZW: end-of-information code");
            bits.drain_rest()?;
            break;
        }

        if code == clear_code {
            debug!("LZW: clear code, resetting table and code width");
            width_bits = min_code_size as u32 + 1;
            next_code = eoi_code + 1;
            reset_additions(&mut table);
            first_after_clear = true;
            continue;
        }

        if code as usize >= TABLE_SIZE {
            return Err(fault!("LZW code {} exceeds the 4096-entry table", code));
        }

        if first_after_clear {
            if code as usize >= num_colors {
                return Err(bad_data!(
                    "first LZW code {} after clear is not a palette index (< {})",
                    code,
                    num_colors
                ));
            }
            if indices.len() < required {
                indices.push(code as u8);
            }
            previous = code;
            first_after_clear = false;
            continue;
        }

        let new_suffix = if table[code as usize].in_use {
            emit_string(&table, code, &mut stack)?;
            table[code as usize].first_index
        } else if code == next_code {
            emit_string(&table, previous, &mut stack)?;
            let append = table[previous as usize].first_index;
            stack.push(append);
            append
        } else {
            return Err(bad_data!(
                "LZW code {} exceeds next unassigned code {}",
                code,
                next_code
            ));
        };

        if indices.len() < required {
            let take = stack.len().min(required - indices.len());
            indices.extend_from_slice(&stack[..take]);
        }

        if (next_code as usize) < TABLE_SIZE {
            let new_length = table[previous as usize].length + 1;
            let first_index = table[previous as usize].first_index;
            table[next_code as usize] = Code {
                in_use: true,
                length: new_length,
                prefix_code: previous,
                suffix_index: new_suffix,
                first_index,
            };
            next_code += 1;
            if next_code as usize == (1usize << width_bits) && width_bits < 12 {
                debug!("LZW: growing code width to {}", width_bits + 1);
                width_bits += 1;
            }
        }

        previous = code;
    }

    if indices.len() != required {
        return Err(bad_data!(
            "LZW stream produced {} indices, expected {}",
            indices.len(),
            required
        ));
    }

    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_codes(min_code_size: u8, widths_and_codes: &[(u32, u16)]) -> Vec<u8> {
        let mut bitbuf: u64 = 0;
        let mut bitcount: u32 = 0;
        let mut bytes = Vec::new();
        for &(width, code) in widths_and_codes {
            bitbuf |= (code as u64) << bitcount;
            bitcount += width;
            while bitcount >= 8 {
                bytes.push((bitbuf & 0xFF) as u8);
                bitbuf >>= 8;
                bitcount -= 8;
            }
        }
        if bitcount > 0 {
            bytes.push((bitbuf & 0xFF) as u8);
        }

        let mut out = vec![min_code_size];
        for chunk in bytes.chunks(255) {
            out.push(chunk.len() as u8);
            out.extend_from_slice(chunk);
        }
        out.push(0);
        out
    }

    #[test]
    fn decodes_minimal_literal_stream() {
        // min_code_size=2 -> clear=4, eoi=5, widths start at 3 bits.
        // Codes: clear, 1, eoi
        let data = encode_codes(2, &[(3, 4), (3, 1), (3, 5)]);
        let mut cursor = Cursor::new(&data);
        let indices = decode(&mut cursor, 4, 1, 1).unwrap();
        assert_eq!(indices, vec![1]);
    }

    #[test]
    fn rejects_code_size_out_of_range() {
        let data = encode_codes(9, &[]);
        let mut cursor = Cursor::new(&data);
        let err = decode(&mut cursor, 4, 1, 1).unwrap_err();
        assert!(matches!(err, crate::error::Error::BadData(_)));
    }

    #[test]
    fn rejects_empty_sub_block_chain() {
        let data = vec![2u8, 0u8];
        let mut cursor = Cursor::new(&data);
        let err = decode(&mut cursor, 4, 1, 1).unwrap_err();
        assert!(matches!(err, crate::error::Error::BadData(_)));
    }

    #[test]
    fn rejects_code_greater_than_next() {
        // min_code_size=2 -> clear=4, eoi=5, next starts at 6.
        // First code after clear must be a literal; then jump straight to
        // a code far beyond `next`.
        let data = encode_codes(2, &[(3, 4), (3, 0), (3, 7)]);
        let mut cursor = Cursor::new(&data);
        let err = decode(&mut cursor, 4, 10, 10).unwrap_err();
        assert!(matches!(err, crate::error::Error::BadData(_)));
    }

    #[test]
    fn kwkwk_self_referential_case() {
        // num_colors=2, min_code_size=2 -> clear=4, eoi=5, next starts at 6.
        // clear, 0 (literal; `previous` becomes 0, `next` is still
        // unassigned 6), 6 (== next: the KwKwK case -- emits the string
        // of `previous` (just "0") followed by its first index (0), i.e.
        // "00"), eoi. Total output: [0] ++ [0, 0] = [0, 0, 0].
        let data = encode_codes(2, &[(3, 4), (3, 0), (3, 6), (3, 5)]);
        let mut cursor = Cursor::new(&data);
        let indices = decode(&mut cursor, 2, 3, 1).unwrap();
        assert_eq!(indices, vec![0, 0, 0]);
    }

    #[test]
    fn nomem_on_unsatisfiable_allocation() {
        // try_reserve_exact rejects any request beyond isize::MAX bytes
        // outright, with no real allocation attempted -- a deterministic
        // way to exercise the NoMem path without depending on actually
        // exhausting memory.
        let err = allocate_indices(usize::MAX).unwrap_err();
        assert!(matches!(err, crate::error::Error::NoMem(_)));
    }

    #[test]
    fn truncates_overrunning_output_but_requires_final_exact_count() {
        // clear, 0, 1, eoi against a 1-index target: the literal '0'
        // alone already satisfies the target, so the table-lookup code
        // '1' that follows is decoded (keeping the table in sync) but its
        // output is discarded rather than overflowing the buffer.
        let data = encode_codes(2, &[(3, 4), (3, 0), (3, 1), (3, 5)]);
        let mut cursor = Cursor::new(&data);
        let indices = decode(&mut cursor, 4, 1, 1).unwrap();
        assert_eq!(indices, vec![0]);
    }
}
