//! OCC sensor frame decoding.
//!
//! The module follows a layered structure:
//! - `layout`: byte offsets, sizes and tags (source of truth)
//! - `reader`: bounds-checked cursor; all byte access goes through it
//! - `parser`: header validation and tag-dispatched block decoding
//! - `error`: explicit, actionable errors
//!
//! A frame is a 45-byte fixed header (validated by the `SENSOR` marker)
//! followed by `block_count` sensor blocks. Each block is an 8-byte
//! descriptor and `record_count` records spaced `stride` bytes apart. The
//! cursor always advances by the declared stride, never by the logical record
//! size, so padded records cannot desynchronize the scan. Unknown block tags
//! are skipped, not rejected.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::decode;
