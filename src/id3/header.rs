use log::{trace, warn};

use crate::error::{Result, TagError};
use crate::util::{ByteCursor, bytes_match_at, decode_synchsafe, encode_synchsafe};

pub const HEADER_LEN: usize = 10;

const MAGIC: &[u8] = b"ID3";
const VERSION: [u8; 2] = [0x03, 0x00];
const SIZE_OFFSET: usize = 6;

const FLAG_UNSYNCHRONISATION: u8 = 0x80;
const FLAG_EXTENDED_HEADER: u8 = 0x40;

/// The fixed ten byte ID3v2.3 file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub flags: u8,
    /// Size of everything after the header, padding included.
    pub body_size: u32,
}

impl TagHeader {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if !bytes_match_at(data, 0, MAGIC) {
            return Err(TagError::BadMagic);
        }
        if !bytes_match_at(data, MAGIC.len(), &VERSION) {
            let mut cursor = ByteCursor::at(data, MAGIC.len());
            let [major, revision] = cursor.read_array("version")?;
            return Err(TagError::UnsupportedVersion { major, revision });
        }

        let mut cursor = ByteCursor::new(data);
        cursor.skip(MAGIC.len() + VERSION.len(), "version")?;
        let flags = cursor.read_byte("header flags")?;
        let body_size = decode_synchsafe(cursor.read_array("tag size")?);
        trace!("ID3v2.3 header: flags {:#04x}, body size {}", flags, body_size);

        if flags & (FLAG_UNSYNCHRONISATION | FLAG_EXTENDED_HEADER) != 0 {
            warn!(
                "header flags {:#04x} request unsynchronisation or an extended header, neither is interpreted",
                flags
            );
        }

        Ok(Self { flags, body_size })
    }

    /// Offset of the first byte after the tag, where the audio data
    /// begins.
    pub fn tag_end(&self) -> usize {
        self.body_size as usize + HEADER_LEN
    }
}

/// Overwrite the size field of an already copied header.
pub fn set_body_size(header: &mut [u8], body_size: usize) -> Result<()> {
    let encoded = u32::try_from(body_size)
        .ok()
        .and_then(encode_synchsafe)
        .ok_or(TagError::TagTooLarge(body_size))?;
    header
        .get_mut(SIZE_OFFSET..SIZE_OFFSET + 4)
        .ok_or(TagError::Truncated {
            what: "tag size",
            offset: SIZE_OFFSET,
        })?
        .copy_from_slice(&encoded);
    Ok(())
}
