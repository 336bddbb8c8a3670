use std::io::Read;

use crate::block::{BlockReader, NextBlock};
use crate::bits::BitSource;
use crate::error::{DecodeError, Result};
use crate::frame::{FrameMeta, FrameRaster, FrameRect, PendingDisposal};
use crate::header::{read_header, read_local_palette, Palette, Rgb};
use crate::interlace::Placement;
use crate::lzw::LzwDecoder;
use crate::source::ByteSource;

/// Caller-facing knobs with no bearing on the bytes decoded, only on how
/// strictly they're validated. Defaults to lenient, matching the
/// reference decoder's behavior of accepting any `u8` palette index.
#[derive(Clone, Copy, Debug)]
pub struct DecodeOptions {
    pub strict: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions { strict: false }
    }
}

/// A fully decoded frame, borrowed from the `Decoder` that produced it.
/// Invalidated by the next call to `next_frame` (local palettes) or by
/// dropping the decoder (global palette).
pub struct FrameView<'a> {
    pub raster: &'a [u8],
    pub width: u16,
    pub height: u16,
    pub palette: &'a [Rgb],
    pub meta: FrameMeta,
    pub rect: FrameRect,
}

pub enum NextFrame<'a> {
    Frame(FrameView<'a>),
    EndOfStream,
}

/// Top-level decode session: parses the header and global palette once at
/// `open`, then yields frames one at a time. Generalizes `GifDecoder`
/// (construction, `parse_gif_metadata`, `parse_frame_metadata`,
/// `decode_frame_image`), dropping its push-style `&R: ImageRenderer`
/// parameter in favor of an owned `FrameRaster` the caller inspects
/// through the `FrameView` returned by `next_frame`.
pub struct Decoder<R> {
    source: ByteSource<R>,
    blocks: BlockReader,
    raster: FrameRaster,
    pending: PendingDisposal,
    options: DecodeOptions,
    global_palette: Palette,
    local_palette: Option<Palette>,
    current_meta: FrameMeta,
    current_rect: FrameRect,
    finished: bool,
}

impl<R: Read> Decoder<R> {
    pub fn open(source: R) -> Result<Self> {
        Self::open_with_options(source, DecodeOptions::default())
    }

    pub fn open_with_options(source: R, options: DecodeOptions) -> Result<Self> {
        let mut byte_source = ByteSource::new(source);
        let screen = read_header(&mut byte_source)?;

        Ok(Decoder {
            source: byte_source,
            blocks: BlockReader::new(),
            raster: FrameRaster::new(screen.width, screen.height, screen.background_index),
            pending: PendingDisposal::new(screen.background_index),
            options,
            global_palette: screen.global_palette,
            local_palette: None,
            current_meta: FrameMeta::default(),
            current_rect: FrameRect {
                x: 0,
                y: 0,
                width: 0,
                height: 0,
            },
            finished: false,
        })
    }

    /// The loop count from the most recently seen Netscape application
    /// extension, or `None` if none has appeared yet.
    pub fn loop_count(&self) -> Option<u16> {
        self.blocks.loop_count()
    }

    pub fn width(&self) -> u16 {
        self.raster.width()
    }

    pub fn height(&self) -> u16 {
        self.raster.height()
    }

    /// Advance through extensions and one image. Disposal queued by the
    /// previous frame is applied first, before any new block is read.
    pub fn next_frame(&mut self) -> Result<NextFrame<'_>> {
        if self.finished {
            return Ok(NextFrame::EndOfStream);
        }

        self.pending.apply(&mut self.raster);

        let descriptor = match self.blocks.advance(&mut self.source)? {
            NextBlock::EndOfStream => {
                self.finished = true;
                return Ok(NextFrame::EndOfStream);
            }
            NextBlock::Image(descriptor) => descriptor,
        };

        let rect = FrameRect {
            x: descriptor.x,
            y: descriptor.y,
            width: descriptor.width,
            height: descriptor.height,
        };
        log::debug!(
            "decoding frame at ({}, {}) {}x{}, disposal {:?}",
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            descriptor.meta.disposal
        );
        if !rect.fits_within(self.raster.width(), self.raster.height()) {
            return Err(DecodeError::malformed(
                self.source.offset(),
                "image rect exceeds the logical screen",
            ));
        }

        // Snapshot/arm before this frame's own pixels are drawn, so a
        // following restore-previous rolls back to the pre-frame canvas
        // rather than to what this frame itself just drew.
        self.pending.arm(&self.raster, descriptor.meta.disposal, rect);

        let local_palette = if descriptor.has_local_table {
            Some(read_local_palette(&mut self.source, descriptor.local_table_exp)?)
        } else {
            None
        };
        let palette_len = local_palette
            .as_ref()
            .map(Palette::len)
            .unwrap_or_else(|| self.global_palette.len());

        let min_code_size = self.source.read_u8()?;
        let start_offset = self.source.offset();
        let placement = Placement::new(rect.width, rect.height, descriptor.interlaced);
        let mut lzw = LzwDecoder::new(min_code_size, rect.pixel_count())?;
        let strict = self.options.strict;

        {
            let mut bits = BitSource::new(&mut self.source);
            let raster = &mut self.raster;
            lzw.decode_into(&mut bits, |linear_index, pixel| {
                if strict && pixel as usize >= palette_len {
                    return Err(DecodeError::malformed(
                        start_offset,
                        "decoded palette index is out of bounds",
                    ));
                }
                let (row, col) = placement.locate(linear_index);
                raster.set(rect.x + col, rect.y + row, pixel);
                Ok(())
            })?;
        }

        self.local_palette = local_palette;
        self.current_meta = descriptor.meta;
        self.current_rect = rect;

        Ok(NextFrame::Frame(FrameView {
            raster: self.raster.pixels(),
            width: self.raster.width(),
            height: self.raster.height(),
            palette: self
                .local_palette
                .as_ref()
                .map(Palette::entries)
                .unwrap_or_else(|| self.global_palette.entries()),
            meta: self.current_meta,
            rect: self.current_rect,
        }))
    }

    /// Releases the decoder. Dropping it has the same effect; this exists
    /// to make the end of a decode session explicit at call sites.
    pub fn close(self) {}
}
