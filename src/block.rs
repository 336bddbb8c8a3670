use std::io::Read;

use crate::error::{DecodeError, Result};
use crate::frame::{Disposal, FrameMeta};
use crate::source::ByteSource;

const SEP_IMAGE: u8 = 0x2C;
const SEP_EXTENSION: u8 = 0x21;
const SEP_TRAILER: u8 = 0x3B;

const LABEL_PLAIN_TEXT: u8 = 0x01;
const LABEL_GRAPHIC_CONTROL: u8 = 0xF9;
const LABEL_COMMENT: u8 = 0xFE;
const LABEL_APPLICATION: u8 = 0xFF;

/// An unread image descriptor: position, size and color-table/interlace
/// flags, with whatever `FrameMeta` the most recent Graphic Control
/// Extension set bound to it.
pub struct ImageDescriptor {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub has_local_table: bool,
    pub local_table_exp: u8,
    pub interlaced: bool,
    pub meta: FrameMeta,
}

pub enum NextBlock {
    Image(ImageDescriptor),
    EndOfStream,
}

/// Drives the top-level block syntax between image descriptors:
/// `{ Extension | Image } Trailer`. Generalizes
/// `GifDecoder::parse_frame_metadata`'s separator dispatch, adding the
/// Plain Text, Comment and Application/Netscape handling the teacher
/// omits, and fixing its unknown-extension-label bug (sub-blocks must be
/// skipped, not left unconsumed, per the specification's open question).
pub struct BlockReader {
    loop_count: Option<u16>,
}

impl BlockReader {
    pub fn new() -> Self {
        BlockReader { loop_count: None }
    }

    pub fn loop_count(&self) -> Option<u16> {
        self.loop_count
    }

    /// Consume extensions until an image descriptor or the trailer is
    /// reached.
    pub fn advance<R: Read>(&mut self, src: &mut ByteSource<R>) -> Result<NextBlock> {
        let mut meta = FrameMeta::default();

        loop {
            let separator = src.read_u8()?;
            match separator {
                SEP_IMAGE => {
                    let descriptor = self.read_image_descriptor(src, meta)?;
                    return Ok(NextBlock::Image(descriptor));
                }
                SEP_EXTENSION => {
                    let label = src.read_u8()?;
                    match label {
                        LABEL_GRAPHIC_CONTROL => {
                            meta = self.read_graphic_control(src)?;
                        }
                        LABEL_PLAIN_TEXT => {
                            log::warn!("ignoring plain text extension (not rendered)");
                            src.skip(13)?;
                            src.skip_sub_blocks()?;
                        }
                        LABEL_COMMENT => {
                            src.skip_sub_blocks()?;
                        }
                        LABEL_APPLICATION => {
                            self.read_application(src)?;
                        }
                        other => {
                            log::warn!("skipping unknown extension label {other:#04x}");
                            src.skip_sub_blocks()?;
                        }
                    }
                }
                SEP_TRAILER => return Ok(NextBlock::EndOfStream),
                _ => {
                    return Err(DecodeError::malformed(
                        src.offset(),
                        "invalid block separator",
                    ));
                }
            }
        }
    }

    fn read_graphic_control<R: Read>(&mut self, src: &mut ByteSource<R>) -> Result<FrameMeta> {
        let block_size = src.read_u8()?;
        if block_size != 4 {
            return Err(DecodeError::malformed(
                src.offset(),
                "graphic control extension has the wrong block size",
            ));
        }
        let packed = src.read_u8()?;
        let delay = src.read_u16_le()?;
        let transparent_color = src.read_u8()?;
        let terminator = src.read_u8()?;
        if terminator != 0 {
            return Err(DecodeError::malformed(
                src.offset(),
                "graphic control extension missing its terminator",
            ));
        }

        let disposal = Disposal::from_bits((packed >> 2) & 0b111);
        let user_input = packed & 0b10 != 0;
        let has_transparency = packed & 0b1 != 0;

        Ok(FrameMeta {
            disposal,
            user_input,
            transparent_index: has_transparency.then_some(transparent_color),
            delay,
        })
    }

    fn read_application<R: Read>(&mut self, src: &mut ByteSource<R>) -> Result<()> {
        let block_size = src.read_u8()?;
        if block_size != 11 {
            return Err(DecodeError::malformed(
                src.offset(),
                "application extension has the wrong block size",
            ));
        }
        let mut identifier = [0u8; 8];
        src.read_exact(&mut identifier)?;
        let mut auth_code = [0u8; 3];
        src.read_exact(&mut auth_code)?;

        if &identifier == b"NETSCAPE" {
            if let Some(sub_block) = src.read_sub_block()? {
                if sub_block.len() == 3 && sub_block[0] == 0x01 {
                    self.loop_count = Some(u16::from_le_bytes([sub_block[1], sub_block[2]]));
                }
            }
            src.skip_sub_blocks()?;
        } else {
            src.skip_sub_blocks()?;
        }
        Ok(())
    }

    fn read_image_descriptor<R: Read>(
        &mut self,
        src: &mut ByteSource<R>,
        meta: FrameMeta,
    ) -> Result<ImageDescriptor> {
        let x = src.read_u16_le()?;
        let y = src.read_u16_le()?;
        let width = src.read_u16_le()?;
        let height = src.read_u16_le()?;
        let packed = src.read_u8()?;

        let has_local_table = packed & 0b1000_0000 != 0;
        let interlaced = packed & 0b0100_0000 != 0;
        let local_table_exp = packed & 0b0000_0111;

        Ok(ImageDescriptor {
            x,
            y,
            width,
            height,
            has_local_table,
            local_table_exp,
            interlaced,
            meta,
        })
    }
}

impl Default for BlockReader {
    fn default() -> Self {
        Self::new()
    }
}
