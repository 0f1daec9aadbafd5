//! multipart/form-data envelope decoding.
//!
//! Parts are located by searching for the `\r\n--<boundary>` delimiter at
//! byte level, so boundaries such as `--WABoundary+D110BF680595D4AEWA` need no
//! escaping and payload bytes are never reinterpreted.

use bytes::Bytes;

use crate::{FileError, FileResult};

const CRLF: &[u8] = b"\r\n";
const HEADER_END: &[u8] = b"\r\n\r\n";

/// Body to decode, either raw bytes or text
#[derive(Debug, Clone, Copy)]
pub enum MultipartBody<'a> {
    Raw(&'a [u8]),
    Text(&'a str),
}

impl<'a> MultipartBody<'a> {
    fn as_bytes(&self) -> &'a [u8] {
        match self {
            MultipartBody::Raw(bytes) => bytes,
            MultipartBody::Text(text) => text.as_bytes(),
        }
    }
}

/// Content of one part, in the mode of the decoded body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Raw(Bytes),
    Text(String),
}

impl FieldValue {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FieldValue::Raw(bytes) => bytes,
            FieldValue::Text(text) => text.as_bytes(),
        }
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            FieldValue::Raw(bytes) => bytes,
            FieldValue::Text(text) => Bytes::from(text),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decoded form: field name to content, in order of first appearance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    fields: Vec<(String, FieldValue)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing an earlier value under the same name in place
    pub fn insert(&mut self, name: String, value: FieldValue) {
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Remove and return a field
    pub fn take(&mut self, name: &str) -> Option<FieldValue> {
        let index = self.fields.iter().position(|(existing, _)| existing == name)?;
        Some(self.fields.remove(index).1)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Extract the boundary parameter from a multipart content type.
///
/// Accepts `boundary="..."` and `boundary=...;`, matching the parameter name
/// case-insensitively.
pub fn extract_boundary(content_type: &str) -> Option<&str> {
    let lower = content_type.to_ascii_lowercase();
    let at = lower.find("boundary=")? + "boundary=".len();
    let rest = &content_type[at..];

    if let Some(quoted) = rest.strip_prefix('"') {
        if let Some(close) = quoted.find('"') {
            if close > 0 {
                return Some(&quoted[..close]);
            }
        }
    }

    let value = rest.split(';').next().unwrap_or_default();
    (!value.is_empty()).then_some(value)
}

/// Decode a multipart body into its named parts.
pub fn decode(body: MultipartBody<'_>, content_type: &str) -> FileResult<MultipartForm> {
    let boundary = extract_boundary(content_type).ok_or(FileError::MalformedContentType)?;
    let mut delimiter = Vec::with_capacity(boundary.len() + 4);
    delimiter.extend_from_slice(b"\r\n--");
    delimiter.extend_from_slice(boundary.as_bytes());

    let bytes = body.as_bytes();
    let segments = split_segments(bytes, &delimiter);

    let mut form = MultipartForm::new();
    let mut field_name: Option<String> = None;

    // First segment is the preamble, last one the closing `--`
    let parts = segments.len().saturating_sub(1);
    for &(start, end) in segments.iter().take(parts).skip(1) {
        let part = &bytes[start..end];
        let (headers, content) = match find(part, HEADER_END) {
            Some(at) => (&part[..at], (start + at + HEADER_END.len(), end)),
            None => (part, (end, end)),
        };

        if let Some(name) = part_name(headers) {
            field_name = Some(name);
        }
        let Some(name) = field_name.clone() else {
            tracing::debug!("skipping multipart part without a field name");
            continue;
        };

        let value = match body {
            MultipartBody::Raw(_) => {
                FieldValue::Raw(Bytes::copy_from_slice(&bytes[content.0..content.1]))
            }
            // Delimiter and header separator are ASCII-led UTF-8 sequences, so
            // every cut lands on a char boundary.
            MultipartBody::Text(text) => FieldValue::Text(text[content.0..content.1].to_string()),
        };
        form.insert(name, value);
    }

    Ok(form)
}

/// Segment offsets of `bytes` split on `delimiter`, as if the body were
/// prefixed with `\r\n` (upstream body handling strips it from the first
/// boundary line).
fn split_segments(bytes: &[u8], delimiter: &[u8]) -> Vec<(usize, usize)> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    // Virtual leading CRLF: a body that opens with `--<boundary>` has an empty
    // preamble.
    let opening = &delimiter[CRLF.len()..];
    if bytes.starts_with(opening) {
        segments.push((0, 0));
        cursor = opening.len();
    }

    while let Some(at) = find(&bytes[cursor..], delimiter) {
        segments.push((cursor, cursor + at));
        cursor += at + delimiter.len();
    }
    segments.push((cursor, bytes.len()));
    segments
}

/// Field name of a part, from the last header line ending in `name="..."`.
/// The first line is the remainder of the boundary line and is skipped.
fn part_name(headers: &[u8]) -> Option<String> {
    let mut name = None;
    for line in split_lines(headers).skip(1) {
        if let Some(value) = header_name_value(line) {
            name = Some(String::from_utf8_lossy(value).into_owned());
        }
    }
    name
}

fn split_lines(block: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut rest = Some(block);
    std::iter::from_fn(move || {
        let current = rest?;
        match find(current, CRLF) {
            Some(at) => {
                rest = Some(&current[at + CRLF.len()..]);
                Some(&current[..at])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}

/// Matches `^.*name="([^"]*)"$` on a single header line.
fn header_name_value(line: &[u8]) -> Option<&[u8]> {
    if line.iter().any(|&b| b == b'\r' || b == b'\n') {
        return None;
    }
    let inner = line.strip_suffix(b"\"")?;
    let open = inner.iter().rposition(|&b| b == b'"')?;
    if !inner[..open].ends_with(b"name=") {
        return None;
    }
    Some(&inner[open + 1..])
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
