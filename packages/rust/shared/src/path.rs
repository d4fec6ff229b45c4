//! URL path segment encoding.
//!
//! [`encode`] escapes every byte outside the RFC 3986 unreserved set,
//! including `! ' ( ) *`, so any project, header or entity name can be
//! used as a single path segment. [`decode`] is its inverse.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::error::{ApiDocError, Result};

/// Everything except `A-Z a-z 0-9 - . _ ~`.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// How route segments are written during route enumeration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SegmentEncoding {
    /// Percent-escaped, decode-safe.
    #[default]
    Escaped,
    /// Written as-is. Not decode-safe; only for matching pre-decoded segments.
    Passthrough,
}

/// Percent-encode `s` for use as one path segment.
pub fn encode(s: &str) -> String {
    utf8_percent_encode(s, SEGMENT).to_string()
}

/// Reverse [`encode`].
pub fn decode(s: &str) -> Result<String> {
    percent_decode_str(s)
        .decode_utf8()
        .map(|cow| cow.into_owned())
        .map_err(|e| ApiDocError::parse(format!("invalid percent-encoded segment {s:?}: {e}")))
}

/// Encode a segment in the given mode.
pub fn encode_segment(s: &str, mode: SegmentEncoding) -> String {
    match mode {
        SegmentEncoding::Escaped => encode(s),
        SegmentEncoding::Passthrough => s.to_string(),
    }
}

/// Encode each segment and join them with `/`.
pub fn join_segments<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    segments
        .into_iter()
        .map(|s| encode(s.as_ref()))
        .collect::<Vec<_>>()
        .join("/")
}
