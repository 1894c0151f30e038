use bytes::BufMut;
use log::{debug, trace, warn};

use crate::error::{Result, TagError};
use crate::id3::encode::encode_text_frame;
use crate::id3::frame::FrameWalker;
use crate::id3::header::{HEADER_LEN, TagHeader, set_body_size};
use crate::util::copy_range;

/// Produce a new file image from `input` in which every frame that
/// `lookup` has a value for is replaced by a freshly encoded text frame.
///
/// Frames without a replacement are copied byte for byte, the rest of the
/// original tag area is zero filled and everything after the tag is
/// copied unchanged. If the replacements no longer fit into the declared
/// tag size the tag grows and the header size is rewritten to match.
pub fn rewrite_tag<'v>(input: &[u8], lookup: impl Fn(&str) -> Option<&'v str>) -> Result<Vec<u8>> {
    let header = TagHeader::parse(input)?;
    let tag_end = header.tag_end();
    if tag_end > input.len() {
        return Err(TagError::TagExceedsFile {
            tag_end,
            len: input.len(),
        });
    }

    let mut output = Vec::with_capacity(input.len());
    copy_range(input, 0..HEADER_LEN, &mut output, "header")?;

    let (mut replaced, mut copied) = (0, 0);
    let mut walker = FrameWalker::new(input, HEADER_LEN, tag_end);
    for frame in walker.by_ref() {
        let frame = frame?;
        let id = frame.id();
        match lookup(&id[..]) {
            Some(value) => {
                debug!("{} ---> {}", id, value);
                output.put_slice(&encode_text_frame(&id, value)?);
                replaced += 1;
            }
            None => {
                trace!("{} copied ({} bytes)", id, frame.len());
                output.put_slice(frame.bytes());
                copied += 1;
            }
        }
    }
    debug!(
        "{} frames replaced, {} copied, original frames end at {}",
        replaced,
        copied,
        walker.position()
    );

    if output.len() <= tag_end {
        output.resize(tag_end, 0x00);
    } else {
        let body_size = output.len() - HEADER_LEN;
        warn!(
            "replaced frames need {} bytes, tag declared {}; growing the tag",
            body_size, header.body_size
        );
        set_body_size(&mut output[..HEADER_LEN], body_size)?;
    }

    copy_range(input, tag_end..input.len(), &mut output, "audio data")?;
    Ok(output)
}
