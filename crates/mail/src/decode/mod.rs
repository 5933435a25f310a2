//! Text decoding for headers and body parts

pub mod header;

pub use header::{Chunk, HeaderParseError, decode_bytes, decode_header, decode_text, parse_header, try_decode};
