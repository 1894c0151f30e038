use std::borrow::Cow;
use std::fmt::{Debug, Display};

use encoding_rs::{SHIFT_JIS, UTF_16BE, UTF_16LE};
use hex::ToHex;
use log::trace;

use crate::error::{Result, TagError};
use crate::util::ByteCursor;

/// Frame ID, size and flags.
pub const FRAME_HEADER_LEN: usize = 10;

pub const MARKER_ASCII: u8 = 0x00;
pub const MARKER_UTF16: u8 = 0x01;

pub const BOM_LITTLE_ENDIAN: [u8; 2] = [0xff, 0xfe];
pub const BOM_BIG_ENDIAN: [u8; 2] = [0xfe, 0xff];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Marker byte `0x00`.
    Ascii,
    /// Marker byte `0x01` followed by a byte-order mark.
    Utf16(Endian),
    /// No encoding marker at all: the byte where the marker belongs is
    /// already the first character of the text.
    Legacy,
}

/// A frame as found in the original image. Only borrowed, never
/// modified: it is either copied through or replaced as a whole.
#[derive(Clone, PartialEq, Eq)]
pub struct RawFrame<'a> {
    pub start: usize,
    pub end: usize,
    pub flags: [u8; 2],
    pub encoding: TextEncoding,
    bytes: &'a [u8],
    payload_offset: usize,
}

impl<'a> RawFrame<'a> {
    pub fn id(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(&self.bytes[..4])
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The whole frame, header included, exactly as in the source.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Text bytes after the marker and byte-order mark.
    pub fn payload(&self) -> &'a [u8] {
        &self.bytes[self.payload_offset..]
    }

    /// Decoded text. Single byte bodies go through the Shift-JIS codepage,
    /// which leaves plain ASCII as is. Trailing terminators are dropped.
    pub fn text(&self) -> String {
        let payload = self.payload();
        let (text, _) = match self.encoding {
            TextEncoding::Ascii | TextEncoding::Legacy => {
                SHIFT_JIS.decode_without_bom_handling(payload)
            }
            TextEncoding::Utf16(Endian::Little) => UTF_16LE.decode_without_bom_handling(payload),
            TextEncoding::Utf16(Endian::Big) => UTF_16BE.decode_without_bom_handling(payload),
        };
        text.trim_end_matches('\0').to_string()
    }
}

impl Debug for RawFrame<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "RawFrame {{ id = {}, range = {}..{}, flags = {}, encoding = {:?} }}",
            self.id(),
            self.start,
            self.end,
            self.flags.encode_hex::<String>(),
            self.encoding
        ))
    }
}

impl Display for RawFrame<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{} {}", self.id(), self.text()))
    }
}

/// Walks the frames of a tag, from just after the file header up to the
/// first padding byte or the declared tag end.
pub struct FrameWalker<'a> {
    data: &'a [u8],
    pos: usize,
    tag_end: usize,
    done: bool,
}

impl<'a> FrameWalker<'a> {
    pub fn new(data: &'a [u8], start: usize, tag_end: usize) -> Self {
        Self {
            data,
            pos: start,
            tag_end,
            done: false,
        }
    }

    /// Where the next frame would start. After the walk has finished this
    /// is the end of the last frame.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn read_frame(&mut self) -> Result<RawFrame<'a>> {
        let start = self.pos;
        let mut cursor = ByteCursor::at(self.data, start);
        let id: [u8; 4] = cursor.read_array("frame id")?;
        let size = cursor.read_u32_be("frame size")? as usize;
        let flags: [u8; 2] = cursor.read_array("frame flags")?;

        let end = start + FRAME_HEADER_LEN + size;
        if end > self.tag_end {
            return Err(TagError::FrameOverrun {
                frame_id: String::from_utf8_lossy(&id).to_string(),
                start,
                end,
                tag_end: self.tag_end,
            });
        }
        if end > self.data.len() {
            return Err(TagError::Truncated {
                what: "frame body",
                offset: start,
            });
        }

        let (encoding, payload_offset) = match cursor.peek_byte() {
            Some(MARKER_ASCII) if size >= 1 => (TextEncoding::Ascii, FRAME_HEADER_LEN + 1),
            Some(MARKER_UTF16) if size >= 1 => {
                cursor.skip(1, "encoding marker")?;
                if size < 3 {
                    return Err(TagError::BadFrame {
                        frame_id: String::from_utf8_lossy(&id).to_string(),
                        reason: format!("{} bytes leave no room for a byte-order mark", size),
                    });
                }
                let bom: [u8; 2] = cursor.read_array("byte-order mark")?;
                let endian = match bom {
                    BOM_LITTLE_ENDIAN => Endian::Little,
                    BOM_BIG_ENDIAN => Endian::Big,
                    _ => {
                        return Err(TagError::BadByteOrderMark {
                            frame_id: String::from_utf8_lossy(&id).to_string(),
                            bom: bom.encode_hex(),
                        });
                    }
                };
                (TextEncoding::Utf16(endian), FRAME_HEADER_LEN + 3)
            }
            _ => (TextEncoding::Legacy, FRAME_HEADER_LEN),
        };

        let frame = RawFrame {
            start,
            end,
            flags,
            encoding,
            bytes: &self.data[start..end],
            payload_offset,
        };
        trace!("walked {:?}", frame);
        Ok(frame)
    }
}

impl<'a> Iterator for FrameWalker<'a> {
    type Item = Result<RawFrame<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.tag_end {
            return None;
        }

        match self.data.get(self.pos) {
            Some(0x00) => {
                trace!("padding reached at offset {}", self.pos);
                self.done = true;
                return None;
            }
            None => {
                self.done = true;
                return Some(Err(TagError::Truncated {
                    what: "frame id",
                    offset: self.pos,
                }));
            }
            Some(_) => {}
        }

        match self.read_frame() {
            Ok(frame) => {
                self.pos = frame.end;
                Some(Ok(frame))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
