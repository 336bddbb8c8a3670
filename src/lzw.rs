use std::io::Read;

use crate::bits::BitSource;
use crate::code_table::{AddResult, CodeTable};
use crate::error::{DecodeError, Result};

/// Drives the LZW state machine described by the specification: CLEAR
/// resets the table and code width, STOP ends the session, and each
/// ordinary code either already names a table entry or names the one
/// about to be added (the "KwKwK" case).
///
/// Generalizes `FrameDecoder`'s `process_symbol`/`emit_entry_chain`/
/// `find_first_symbol_in_chain`, which already compute the KwKwK
/// suffix correctly up front (by walking the current code's chain, or
/// falling back to the previous code's chain when the current one isn't
/// in the table yet) rather than adding a placeholder entry and patching
/// it after emission — the other strategy the specification allows.
pub struct LzwDecoder {
    key_size: u8,
    init_key_size: u8,
    table: CodeTable,
    table_is_full: bool,
    prev_code: Option<u16>,
    grow_pending: bool,
    frm_off: usize,
    total_pixels: usize,
    scratch: Vec<u8>,
}

impl LzwDecoder {
    /// `literal_key_size` is the minimum LZW code size byte read from the
    /// stream (1..=8); `total_pixels` bounds how many indices this
    /// session may write (the frame rectangle's `width * height`).
    pub fn new(literal_key_size: u8, total_pixels: usize) -> Result<Self> {
        if literal_key_size == 0 || literal_key_size > 8 {
            return Err(DecodeError::unsupported(
                "lzw minimum code size out of range",
            ));
        }
        let init_key_size = literal_key_size + 1;
        Ok(LzwDecoder {
            key_size: init_key_size,
            init_key_size,
            table: CodeTable::new(literal_key_size),
            table_is_full: false,
            prev_code: None,
            grow_pending: false,
            frm_off: 0,
            total_pixels,
            scratch: Vec::with_capacity(crate::code_table::MAX_ENTRIES),
        })
    }

    /// Decode the whole image data sub-block chain, calling `write_pixel`
    /// with each linear output offset and its palette index in order.
    pub fn decode_into<R: Read>(
        &mut self,
        bits: &mut BitSource<R>,
        mut write_pixel: impl FnMut(usize, u8) -> Result<()>,
    ) -> Result<()> {
        let clear_code = self.table.clear_code();
        let stop_code = self.table.stop_code();

        let first = bits.get_key(self.key_size)?;
        if first != clear_code {
            return Err(DecodeError::malformed(
                bits.offset(),
                "lzw stream did not begin with a clear code",
            ));
        }
        self.reset();

        loop {
            let code = bits.get_key(self.key_size)?;
            if code == clear_code {
                self.reset();
                continue;
            }
            if code == stop_code {
                break;
            }
            self.process_code(code, bits, &mut write_pixel)?;
            // Width grows right after the code whose table-add triggered
            // it, so it takes effect on the *next* code read, not this one.
            if self.grow_pending && self.key_size < 12 {
                self.key_size += 1;
                self.grow_pending = false;
                log::debug!("lzw: code width grown to {} bits", self.key_size);
            }
        }

        bits.expect_terminator()
    }

    fn reset(&mut self) {
        log::debug!("lzw: clear code, resetting table to {} bits", self.init_key_size);
        self.key_size = self.init_key_size;
        self.table.reset();
        self.table_is_full = false;
        self.prev_code = None;
        self.grow_pending = false;
    }

    fn process_code<R: Read>(
        &mut self,
        code: u16,
        bits: &BitSource<R>,
        write_pixel: &mut impl FnMut(usize, u8) -> Result<()>,
    ) -> Result<()> {
        if let Some(prev_code) = self.prev_code {
            if !self.table_is_full {
                let resolvable = if (code as usize) < self.table.nentries() {
                    code
                } else if code as usize == self.table.nentries() {
                    prev_code
                } else {
                    return Err(DecodeError::malformed(bits.offset(), "lzw code out of range"));
                };
                let new_suffix = self.table.first_suffix(resolvable);
                let new_length = self.table.length(prev_code) + 1;
                match self.table.add(new_length, prev_code, new_suffix) {
                    AddResult::Full => self.table_is_full = true,
                    AddResult::Grow => self.grow_pending = true,
                    AddResult::Ok => {}
                }
            }
        }

        if code as usize >= self.table.nentries() {
            return Err(DecodeError::malformed(bits.offset(), "lzw code out of range"));
        }

        self.emit_entry(code, bits, write_pixel)?;
        self.prev_code = Some(code);
        Ok(())
    }

    fn emit_entry<R: Read>(
        &mut self,
        code: u16,
        bits: &BitSource<R>,
        write_pixel: &mut impl FnMut(usize, u8) -> Result<()>,
    ) -> Result<()> {
        self.scratch.clear();
        let mut cur = code;
        loop {
            self.scratch.push(self.table.suffix(cur));
            match self.table.prefix_of(cur) {
                Some(prefix) => cur = prefix,
                None => break,
            }
        }

        for &pixel in self.scratch.iter().rev() {
            if self.frm_off >= self.total_pixels {
                return Err(DecodeError::malformed(
                    bits.offset(),
                    "lzw decoded more pixels than the frame rect holds",
                ));
            }
            write_pixel(self.frm_off, pixel)?;
            self.frm_off += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ByteSource;

    fn decode(data: &[u8], literal_key_size: u8, total_pixels: usize) -> Vec<u8> {
        let mut src = ByteSource::new(data);
        let mut bits = BitSource::new(&mut src);
        let mut out = vec![0u8; total_pixels];
        let mut decoder = LzwDecoder::new(literal_key_size, total_pixels).unwrap();
        decoder
            .decode_into(&mut bits, |offset, pixel| {
                out[offset] = pixel;
                Ok(())
            })
            .unwrap();
        out
    }

    fn pack_codes(codes: &[(u16, u8)]) -> Vec<u8> {
        // codes: (value, width in bits). Packs LSB-first into a single
        // sub-block followed by the terminator.
        let mut acc: u32 = 0;
        let mut acc_bits: u32 = 0;
        let mut bytes = Vec::new();
        for &(value, width) in codes {
            acc |= (value as u32) << acc_bits;
            acc_bits += width as u32;
            while acc_bits >= 8 {
                bytes.push((acc & 0xFF) as u8);
                acc >>= 8;
                acc_bits -= 8;
            }
        }
        if acc_bits > 0 {
            bytes.push((acc & 0xFF) as u8);
        }
        let mut out = vec![bytes.len() as u8];
        out.extend_from_slice(&bytes);
        out.push(0);
        out
    }

    #[test]
    fn s2_clear_then_literals_then_stop() {
        // 2x2 frame over a palette padded to 4 entries: CLEAR 0 1 2 3 STOP.
        // nentries hits 8 (a power of two) while adding the entry for code
        // 2, so code 3 and STOP are read at the widened 4-bit size.
        let codes = pack_codes(&[(4, 3), (0, 3), (1, 3), (2, 3), (3, 4), (5, 4)]);
        let pixels = decode(&codes, 2, 4);
        assert_eq!(pixels, vec![0, 1, 2, 3]);
    }

    #[test]
    fn s3_kwkwk_produces_alternating_pattern() {
        // Minimum code size 2 -> clear=4, stop=5, initial key_size=3,
        // nentries starts at 6.
        //
        // CLEAR(4) a(0) b(1) 6 8 STOP(5):
        //   a(0): prev=None, no add. emits [0].
        //   b(1): adds entry6="a"+"b" (len2). nentries 6->7. emits [1].
        //   6:    adds entry7="b"+firstchar(6="ab")="b"+"a" (len2).
        //         nentries 7->8, a power of two -> code width grows to 4
        //         for the *next* read. emits entry6="ab" -> [0,1].
        //   8:    not yet a valid entry (nentries==8==code): the classic
        //         forward reference. Resolves via the previous code (6)
        //         -> entry8 = "ab"+firstchar("ab")="ab"+"a" (len3), read
        //         with the widened 4-bit code. emits [0,1,0].
        // Total emitted: [0], [1], [0,1], [0,1,0] -> 7 pixels.
        let codes = pack_codes(&[(4, 3), (0, 3), (1, 3), (6, 3), (8, 4), (5, 4)]);
        let pixels = decode(&codes, 2, 7);
        assert_eq!(pixels, vec![0, 1, 0, 1, 0, 1, 0]);
    }

    #[test]
    fn rejects_stream_not_starting_with_clear() {
        let codes = pack_codes(&[(0, 3)]);
        let mut src = ByteSource::new(&codes[..]);
        let mut bits = BitSource::new(&mut src);
        let mut decoder = LzwDecoder::new(2, 1).unwrap();
        let result = decoder.decode_into(&mut bits, |_, _| Ok(()));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_write_beyond_frame_rect() {
        // CLEAR 0 1 2 3 STOP decoded into a buffer too small to hold it.
        let codes = pack_codes(&[(4, 3), (0, 3), (1, 3), (2, 3), (3, 3), (5, 3)]);
        let mut src = ByteSource::new(&codes[..]);
        let mut bits = BitSource::new(&mut src);
        let mut decoder = LzwDecoder::new(2, 2).unwrap();
        let result = decoder.decode_into(&mut bits, |_, _| Ok(()));
        assert!(result.is_err());
    }
}
