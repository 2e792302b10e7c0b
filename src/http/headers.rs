use std::collections::HashMap;

use crate::http::parser::ParseError;

pub(crate) const CRLF: &[u8] = b"\r\n";

/// Case-insensitive HTTP header collection.
///
/// Names are stored lower-cased. Values for a repeated name are joined with
/// `", "` as HTTP multi-value semantics require; use [`HeaderMap::replace`]
/// to overwrite instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: HashMap<String, String>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Adds a value, appending to any existing value for the same name.
    ///
    /// # Example
    ///
    /// ```
    /// # use httpfromtcp::http::headers::HeaderMap;
    /// let mut headers = HeaderMap::new();
    /// headers.set("Trailer", "X-Content-SHA256");
    /// headers.set("trailer", "X-Content-Length");
    /// assert_eq!(headers.get("TRAILER"), Some("X-Content-SHA256, X-Content-Length"));
    /// ```
    pub fn set(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.entries.get_mut(&name) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => {
                self.entries.insert(name, value.to_string());
            }
        }
    }

    /// Replaces any existing value for `name`.
    pub fn replace(&mut self, name: &str, value: &str) {
        self.entries
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.remove(&name.to_ascii_lowercase());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parses at most one header line from the front of `data`.
    ///
    /// Returns the number of bytes consumed and whether the blank line ending
    /// the header block was reached. `(0, false)` means no complete line is
    /// buffered yet; call again with more data from the same offset.
    pub fn parse(&mut self, data: &[u8]) -> Result<(usize, bool), ParseError> {
        let idx = match find_crlf(data) {
            Some(idx) => idx,
            None => return Ok((0, false)),
        };

        if idx == 0 {
            return Ok((2, true));
        }

        let line = &data[..idx];
        let (raw_name, value) = match line.iter().position(|&b| b == b':') {
            Some(colon) => (&line[..colon], Some(&line[colon + 1..])),
            None => (line, None),
        };

        if raw_name.ends_with(b" ") {
            return Err(ParseError::InvalidHeaderName(
                decode_field(raw_name).to_ascii_lowercase(),
            ));
        }

        let name = raw_name.trim_ascii();
        if name.is_empty() || !name.iter().copied().all(is_tchar) {
            return Err(ParseError::InvalidHeaderToken(
                decode_field(name).to_ascii_lowercase(),
            ));
        }

        let value = value.ok_or_else(|| ParseError::MalformedHeaderLine(decode_field(line)))?;
        let name = decode_field(name);
        let value = decode_field(value.trim_ascii());

        self.set(&name, &value);
        Ok((idx + 2, false))
    }

    /// Serializes every entry as `name: value\r\n` followed by the blank line.
    pub(crate) fn write_lines(&self, buf: &mut Vec<u8>) {
        for (name, value) in self.iter() {
            buf.extend_from_slice(name.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(value.as_bytes());
            buf.extend_from_slice(CRLF);
        }
        buf.extend_from_slice(CRLF);
    }
}

pub(crate) fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|w| w == CRLF)
}

/// Decodes a field taken off the wire.
///
/// UTF-8 is kept as is. Anything else is obs-text and is read as ISO-8859-1,
/// one char per byte, so no octet the client sent is lost.
pub(crate) fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// RFC 7230 `tchar`. ASCII only: a header name holding any non-ASCII letter
/// (`é`, `©`) fails the token check, even where the letter is alphabetic.
fn is_tchar(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
