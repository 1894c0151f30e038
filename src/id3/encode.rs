use bytes::BufMut;
use encoding_rs::SHIFT_JIS;
use log::trace;

use crate::error::{Result, TagError};
use crate::id3::frame::{BOM_LITTLE_ENDIAN, FRAME_HEADER_LEN, MARKER_ASCII, MARKER_UTF16};

/// Build a complete replacement text frame for `frame_id`.
///
/// When every character of `value` maps to a single Shift-JIS byte the
/// body is marker `0x00` plus those bytes. Anything else is written as
/// marker `0x01`, a little-endian BOM and UTF-16LE text. No terminator is
/// appended and the flags are always zero.
pub fn encode_text_frame(frame_id: &str, value: &str) -> Result<Vec<u8>> {
    let id: [u8; 4] = frame_id
        .as_bytes()
        .try_into()
        .map_err(|_| TagError::BadFrame {
            frame_id: frame_id.to_string(),
            reason: "frame ids are exactly four bytes".to_string(),
        })?;

    let payload = encode_payload(value);
    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    frame.put_slice(&id);
    frame.put_u32(payload.len() as u32);
    frame.put_u16(0);
    frame.put_slice(&payload);
    trace!("encoded {} as {} bytes", frame_id, frame.len());
    Ok(frame)
}

fn encode_payload(value: &str) -> Vec<u8> {
    let (sjis, _, unmappable) = SHIFT_JIS.encode(value);
    // Shift_JIS folds U+00A5 and U+203E onto 0x5C and 0x7E, so the bytes
    // must decode back to the same string.
    if !unmappable
        && sjis.len() == value.chars().count()
        && SHIFT_JIS.decode_without_bom_handling(&sjis).0 == value
    {
        let mut payload = Vec::with_capacity(sjis.len() + 1);
        payload.put_u8(MARKER_ASCII);
        payload.put_slice(&sjis);
        return payload;
    }

    let mut payload = Vec::with_capacity(3 + value.len() * 2);
    payload.put_u8(MARKER_UTF16);
    payload.put_slice(&BOM_LITTLE_ENDIAN);
    for unit in value.encode_utf16() {
        payload.put_u16_le(unit);
    }
    payload
}
