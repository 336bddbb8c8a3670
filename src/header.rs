use std::io::Read;

use crate::error::{DecodeError, Result};
use crate::source::ByteSource;

/// An RGB palette entry.
pub type Rgb = [u8; 3];

/// Up to 256 RGB triplets; always a power of two in `{2,4,...,256}`.
#[derive(Clone, Debug)]
pub struct Palette(Vec<Rgb>);

impl Palette {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn entries(&self) -> &[Rgb] {
        &self.0
    }

    fn read<R: Read>(src: &mut ByteSource<R>, size: usize) -> Result<Self> {
        let mut entries = Vec::with_capacity(size);
        for _ in 0..size {
            let mut rgb = [0u8; 3];
            src.read_exact(&mut rgb)?;
            entries.push(rgb);
        }
        Ok(Palette(entries))
    }
}

/// Header fields parsed once, at `Decoder::open`.
pub struct ScreenDescriptor {
    pub width: u16,
    pub height: u16,
    pub background_index: u8,
    pub global_palette: Palette,
}

const MAGIC: &[u8; 6] = b"GIF89a";

/// Reads the 6-byte magic/version, the logical screen descriptor, and the
/// global color table (generalizes
/// `GifDecoder::validate_header`/`parse_logical_screen_descriptor`/
/// `parse_global_color_table`, which read into a fixed RGB565
/// framebuffer table; here the palette is returned as-is, in whatever
/// bit depth the caller wants to convert it to).
pub fn read_header<R: Read>(src: &mut ByteSource<R>) -> Result<ScreenDescriptor> {
    let mut magic = [0u8; 6];
    src.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(DecodeError::InvalidMagic { found: magic });
    }

    let width = src.read_u16_le()?;
    let height = src.read_u16_le()?;
    let packed = src.read_u8()?;
    let background_index = src.read_u8()?;
    src.read_u8()?; // pixel aspect ratio: read but unused

    let has_global_table = packed & 0b1000_0000 != 0;
    let color_depth = (packed & 0b0111_0000) >> 4;
    let gct_exp = packed & 0b0000_0111;

    if !has_global_table {
        return Err(DecodeError::unsupported("no global color table present"));
    }
    if color_depth != 0b111 {
        return Err(DecodeError::unsupported("color depth is not 8 bits per channel"));
    }

    let global_palette = Palette::read(src, 1usize << (gct_exp + 1))?;

    Ok(ScreenDescriptor {
        width,
        height,
        background_index,
        global_palette,
    })
}

/// Reads a local color table of `1 << (exp + 1)` entries, following an
/// image descriptor whose local-color-table flag was set.
pub fn read_local_palette<R: Read>(src: &mut ByteSource<R>, exp: u8) -> Result<Palette> {
    Palette::read(src, 1usize << (exp + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(mut header: Vec<u8>, extra: &[u8]) -> Vec<u8> {
        header.extend_from_slice(extra);
        header
    }

    #[test]
    fn parses_minimal_header_with_global_palette() {
        let mut data = b"GIF89a".to_vec();
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.push(0b1111_0000); // GCT present, depth 8, gct_exp=0 -> 2 entries
        data.push(0);
        data.push(0);
        data.extend_from_slice(&[0, 0, 0, 255, 255, 255]);
        let data = bytes(data, &[]);

        let mut src = ByteSource::new(&data[..]);
        let header = read_header(&mut src).unwrap();
        assert_eq!(header.width, 1);
        assert_eq!(header.height, 1);
        assert_eq!(header.global_palette.len(), 2);
        assert_eq!(header.global_palette.entries()[1], [255, 255, 255]);
    }

    #[test]
    fn rejects_wrong_magic() {
        let data = b"GIF87a".to_vec();
        let mut src = ByteSource::new(&data[..]);
        assert!(matches!(
            read_header(&mut src),
            Err(DecodeError::InvalidMagic { .. })
        ));
    }

    #[test]
    fn rejects_missing_global_table() {
        let mut data = b"GIF89a".to_vec();
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.push(0b0111_0000); // GCT absent
        data.push(0);
        data.push(0);
        let mut src = ByteSource::new(&data[..]);
        assert!(matches!(
            read_header(&mut src),
            Err(DecodeError::UnsupportedFormat { .. })
        ));
    }
}
