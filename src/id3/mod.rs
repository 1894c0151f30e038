//! Reading and rewriting of ID3v2.3 tags.

pub mod encode;
pub mod frame;
pub mod header;
pub mod rewrite;

pub use frame::FrameWalker;
pub use header::{HEADER_LEN, TagHeader};
pub use rewrite::rewrite_tag;
