//! Internationalized header decoding
//!
//! Splits a raw header value into RFC 2047 chunks and decodes each chunk
//! with its declared charset, falling back to ISO-8859-1 when the charset
//! is unknown or the bytes are not valid in it. Decoding never fails.

use std::sync::LazyLock;

use base64::prelude::*;
use encoding_rs::Encoding;
use log::debug;
use regex::bytes::Regex;

/// One RFC 2047 encoded word: charset, transfer encoding, encoded text
static ENCODED_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"=\?([^?\s]+)\?([^?\s]*)\?([^?\s]*)\?=").expect("encoded-word pattern is valid")
});

/// A run of header bytes sharing one charset
///
/// `charset` is `None` for text that was not inside an encoded word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub bytes: Vec<u8>,
    pub charset: Option<String>,
}

impl Chunk {
    fn plain(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            charset: None,
        }
    }
}

/// The header contained an encoded word whose payload could not be decoded
#[derive(Debug, thiserror::Error)]
#[error("Malformed encoded word: {0}")]
pub struct HeaderParseError(String);

/// Split a raw header value into decoded-transfer chunks.
///
/// Whitespace between two adjacent encoded words is dropped; all other
/// text is kept exactly, so concatenating the decoded chunks reproduces
/// the header. Adjacent chunks with the same charset are merged so that
/// multi-byte characters split across encoded words survive.
pub fn decode_header(raw: &[u8]) -> Result<Vec<Chunk>, HeaderParseError> {
    let unfolded = unfold(raw);
    let mut chunks: Vec<Chunk> = Vec::new();
    let mut last_end = 0;
    let mut previous_was_encoded = false;

    for captures in ENCODED_WORD.captures_iter(&unfolded) {
        let (Some(word), Some(charset), Some(encoding), Some(text)) =
            (captures.get(0), captures.get(1), captures.get(2), captures.get(3))
        else {
            continue;
        };

        let gap = &unfolded[last_end..word.start()];
        let gap_is_blank = gap.iter().all(u8::is_ascii_whitespace);
        if !gap.is_empty() && !(previous_was_encoded && gap_is_blank) {
            push_chunk(&mut chunks, Chunk::plain(gap));
        }

        let bytes = decode_transfer(encoding.as_bytes(), text.as_bytes())
            .ok_or_else(|| HeaderParseError(String::from_utf8_lossy(word.as_bytes()).into_owned()))?;
        push_chunk(
            &mut chunks,
            Chunk {
                bytes,
                charset: Some(charset_name(charset.as_bytes())),
            },
        );

        last_end = word.end();
        previous_was_encoded = true;
    }

    if last_end < unfolded.len() {
        push_chunk(&mut chunks, Chunk::plain(&unfolded[last_end..]));
    }

    Ok(chunks)
}

/// Split a header into chunks, treating an undecodable header as one plain chunk.
///
/// Some senders emit encoded words with broken base64; rather than reject
/// the header, the whole value is kept as undecoded text.
pub fn try_decode(raw: &[u8]) -> Vec<Chunk> {
    decode_header(raw).unwrap_or_else(|e| {
        debug!("{}; keeping header undecoded", e);
        vec![Chunk::plain(raw)]
    })
}

/// Decode bytes in the given charset, falling back to ISO-8859-1.
///
/// A missing charset means US-ASCII. ISO-8859-1 maps every byte to a
/// character, so the result always has one character per byte when the
/// declared charset does not fit.
pub fn decode_bytes(bytes: &[u8], charset: Option<&str>) -> String {
    let label = charset
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("us-ascii");

    decode_strict(bytes, label).unwrap_or_else(|| latin1(bytes))
}

/// Decode a raw header value into display text
pub fn parse_header(raw: &[u8]) -> String {
    try_decode(raw)
        .iter()
        .map(|chunk| decode_bytes(&chunk.bytes, chunk.charset.as_deref()))
        .collect()
}

/// Decode RFC 2047 words inside text that is already Unicode.
///
/// Used for values a parser has already turned into `str` (such as MIME
/// parameters), where text outside encoded words must not be re-decoded.
pub fn decode_text(text: &str) -> String {
    try_decode(text.as_bytes())
        .iter()
        .map(|chunk| match &chunk.charset {
            Some(charset) => decode_bytes(&chunk.bytes, Some(charset)),
            None => String::from_utf8_lossy(&chunk.bytes).into_owned(),
        })
        .collect()
}

fn decode_strict(bytes: &[u8], label: &str) -> Option<String> {
    if is_ascii_label(label) {
        // encoding_rs treats US-ASCII as windows-1252, which would accept 8-bit bytes
        return bytes.is_ascii().then(|| latin1(bytes));
    }

    let encoding = Encoding::for_label_no_replacement(label.as_bytes())?;
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}

fn is_ascii_label(label: &str) -> bool {
    ["us-ascii", "ascii", "ansi_x3.4-1968", "us"]
        .iter()
        .any(|l| l.eq_ignore_ascii_case(label))
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Charset label with any RFC 2231 language suffix (`utf-8*en`) removed
fn charset_name(raw: &[u8]) -> String {
    let name = String::from_utf8_lossy(raw);
    match name.split_once('*') {
        Some((charset, _language)) => charset.to_string(),
        None => name.into_owned(),
    }
}

fn decode_transfer(encoding: &[u8], text: &[u8]) -> Option<Vec<u8>> {
    match encoding {
        b"b" | b"B" => BASE64_STANDARD
            .decode(text)
            .or_else(|_| BASE64_STANDARD_NO_PAD.decode(text))
            .ok(),
        b"q" | b"Q" => Some(q_decode(text)),
        _ => None,
    }
}

/// Decode the RFC 2047 "Q" encoding. Invalid escapes are kept verbatim.
fn q_decode(text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut i = 0;
    while i < text.len() {
        match text[i] {
            b'_' => out.push(b' '),
            b'=' if i + 2 < text.len() => {
                match (hex_value(text[i + 1]), hex_value(text[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 2;
                    }
                    _ => out.push(b'='),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    out
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Remove header folding (CRLF followed by whitespace)
fn unfold(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        match raw[i] {
            b'\r' if raw.get(i + 1) == Some(&b'\n') && matches!(raw.get(i + 2), Some(b' ' | b'\t')) => {
                i += 2;
            }
            b'\n' if matches!(raw.get(i + 1), Some(b' ' | b'\t')) => {
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    out
}

fn push_chunk(chunks: &mut Vec<Chunk>, chunk: Chunk) {
    if let Some(last) = chunks.last_mut()
        && same_charset(&last.charset, &chunk.charset)
    {
        last.bytes.extend_from_slice(&chunk.bytes);
        return;
    }
    chunks.push(chunk);
}

fn same_charset(a: &Option<String>, b: &Option<String>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}
