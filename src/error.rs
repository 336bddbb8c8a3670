use std::io;

/// Everything that can go wrong while decoding a GIF stream.
///
/// Variants map onto the error taxonomy in the decoder specification:
/// `Io`, `InvalidMagic`, `UnsupportedFormat`, `MalformedStream` and
/// `ResourceExhausted`. Once any variant is returned the decoder that
/// produced it is considered poisoned; callers must not call into it
/// again and should drop it.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("io error reading gif stream: {0}")]
    Io(#[from] io::Error),

    #[error("invalid magic: expected \"GIF89a\", found {found:?}")]
    InvalidMagic { found: [u8; 6] },

    #[error("unsupported format: {reason}")]
    UnsupportedFormat { reason: &'static str },

    #[error("malformed stream at offset {offset}: {reason}")]
    MalformedStream {
        offset: u64,
        reason: &'static str,
    },

    #[error("could not grow code table past {attempted} entries")]
    ResourceExhausted { attempted: usize },
}

impl DecodeError {
    pub(crate) fn malformed(offset: u64, reason: &'static str) -> Self {
        DecodeError::MalformedStream { offset, reason }
    }

    pub(crate) fn unsupported(reason: &'static str) -> Self {
        DecodeError::UnsupportedFormat { reason }
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;
