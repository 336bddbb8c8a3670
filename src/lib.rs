//! GIF89a container demultiplexer and LZW decoder.
//!
//! Decodes a byte-oriented source into a stream of indexed-palette
//! frames: a raster of palette indices per frame, the active palette,
//! and per-frame timing/disposal metadata. Color-space conversion,
//! rendering, and encoding are out of scope; the caller owns what it
//! does with the raw indices.
//!
//! ```no_run
//! use indexed_gif::{Decoder, NextFrame};
//!
//! # fn run(source: impl std::io::Read) -> indexed_gif::Result<()> {
//! let mut decoder = Decoder::open(source)?;
//! while let NextFrame::Frame(frame) = decoder.next_frame()? {
//!     println!("{}x{} frame, delay {}", frame.width, frame.height, frame.meta.delay);
//! }
//! # Ok(())
//! # }
//! ```

mod bits;
mod block;
mod code_table;
mod decoder;
mod error;
mod frame;
mod header;
mod interlace;
mod lzw;
mod source;

pub use decoder::{DecodeOptions, Decoder, FrameView, NextFrame};
pub use error::{DecodeError, Result};
pub use frame::{Disposal, FrameMeta, FrameRect};
pub use header::Rgb;
