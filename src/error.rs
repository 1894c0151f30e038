use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TagError>;

#[derive(Debug, Error)]
pub enum TagError {
    #[error("not an ID3v2 file: missing \"ID3\" marker")]
    BadMagic,

    #[error("unsupported ID3v2 version {major}.{revision}, only 2.3.0 is handled")]
    UnsupportedVersion { major: u8, revision: u8 },

    #[error("frame {frame_id} has an unknown byte-order mark {bom}")]
    BadByteOrderMark { frame_id: String, bom: String },

    #[error("truncated {what} at offset {offset}")]
    Truncated { what: &'static str, offset: usize },

    #[error("declared tag end {tag_end} lies beyond the end of the file ({len} bytes)")]
    TagExceedsFile { tag_end: usize, len: usize },

    #[error("frame {frame_id} at offset {start} ends at {end}, past the tag end {tag_end}")]
    FrameOverrun {
        frame_id: String,
        start: usize,
        end: usize,
        tag_end: usize,
    },

    #[error("rewritten tag body of {0} bytes cannot be stored as a synchsafe size")]
    TagTooLarge(usize),

    #[error("frame {frame_id}: {reason}")]
    BadFrame { frame_id: String, reason: String },

    #[error("{0} is not listed in the track info file")]
    UnknownTrack(String),

    #[error("{file}: bad track number {value:?}")]
    BadTrackNumber { file: String, value: String },

    #[error("track info line {line}: {reason}")]
    Config { line: usize, reason: String },

    #[error("track info file has no OUTDIR in [SYSTEM]")]
    MissingOutputDirectory,

    #[error(transparent)]
    Io(#[from] io::Error),
}
