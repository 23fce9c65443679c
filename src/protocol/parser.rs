//! Bulk-fetch (`getmulti`) response parser
//!
//! Wire format:
//!
//! ```text
//! VALUE <key> <declared-length>\r\n
//! <payload line(s)>\r\n
//! VALUE <key2> <declared-length2>\r\n
//! <payload line(s)>\r\n
//! END
//! ```
//!
//! Framing is marker-delimited. A payload may span several lines, so every line
//! after a `VALUE` marker is accumulated until the next `VALUE`, the `END` line,
//! or end-of-stream. The declared length is kept as advisory metadata and is
//! never used to find the end of a payload.

use crate::ProtocolError;
use bytes::Bytes;
use std::collections::HashMap;
use tracing::trace;

const VALUE_PREFIX: &[u8] = b"VALUE ";
const END_MARKER: &[u8] = b"END";

/// One decoded `VALUE` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireBlock {
    pub key: String,
    /// Byte count announced by the server (advisory only)
    pub declared_length: usize,
    pub payload: Bytes,
}

/// Outcome of feeding one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// More lines may follow
    Continue,
    /// `END` seen, later lines are ignored
    End,
}

#[derive(Debug)]
struct OpenBlock {
    key: String,
    declared_length: usize,
    buf: Vec<u8>,
}

/// Incremental line-oriented parser for the bulk-fetch format
#[derive(Debug, Default)]
pub struct BulkParser {
    blocks: Vec<WireBlock>,
    open: Option<OpenBlock>,
    done: bool,
}

impl BulkParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line, including its terminator if it has one
    pub fn feed(&mut self, line: &[u8]) -> Result<Feed, ProtocolError> {
        if self.done {
            return Ok(Feed::End);
        }

        let content = strip_terminator(line);

        if content == END_MARKER {
            self.flush();
            self.done = true;
            return Ok(Feed::End);
        }

        if let Some(header) = content.strip_prefix(VALUE_PREFIX) {
            self.flush();
            self.open = Some(parse_value_line(header)?);
            return Ok(Feed::Continue);
        }

        match self.open.as_mut() {
            Some(block) => {
                block.buf.extend_from_slice(line);
                Ok(Feed::Continue)
            }
            None => Err(ProtocolError::OrphanPayload(
                String::from_utf8_lossy(content).into_owned(),
            )),
        }
    }

    /// True once the `END` line has been seen
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Close any open block and return everything decoded so far
    pub fn finish(mut self) -> Vec<WireBlock> {
        self.flush();
        self.blocks
    }

    fn flush(&mut self) {
        let Some(block) = self.open.take() else {
            return;
        };

        let mut buf = block.buf;
        let keep = strip_terminator(&buf).len();
        buf.truncate(keep);

        if buf.len() != block.declared_length {
            trace!(
                key = %block.key,
                declared = block.declared_length,
                actual = buf.len(),
                "Declared length differs from payload"
            );
        }

        self.blocks.push(WireBlock {
            key: block.key,
            declared_length: block.declared_length,
            payload: Bytes::from(buf),
        });
    }
}

/// Parse a complete bulk-fetch body
pub fn parse_bulk(body: &[u8]) -> Result<Vec<WireBlock>, ProtocolError> {
    let mut parser = BulkParser::new();
    for line in split_lines(body) {
        parser.feed(line)?;
        if parser.is_done() {
            break;
        }
    }
    Ok(parser.finish())
}

/// Collapse blocks into a key → payload map (a repeated key keeps the last payload)
pub fn into_map(blocks: Vec<WireBlock>) -> HashMap<String, Bytes> {
    blocks
        .into_iter()
        .map(|block| (block.key, block.payload))
        .collect()
}

/// Split a buffer into lines, each keeping its `\n` terminator
pub fn split_lines(buf: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut rest = buf;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let end = memchr::memchr(b'\n', rest).map_or(rest.len(), |i| i + 1);
        let (line, tail) = rest.split_at(end);
        rest = tail;
        Some(line)
    })
}

/// Strip exactly one trailing `\r\n` or `\n`
fn strip_terminator(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r\n")
        .or_else(|| line.strip_suffix(b"\n"))
        .unwrap_or(line)
}

/// Parse `<key> <declared-length>` (the part after `VALUE `)
///
/// The key is everything up to the last space, so keys may contain spaces.
fn parse_value_line(header: &[u8]) -> Result<OpenBlock, ProtocolError> {
    let malformed = || ProtocolError::MalformedValueLine(String::from_utf8_lossy(header).into_owned());

    let header = std::str::from_utf8(header).map_err(|_| malformed())?;
    let (key, length) = header.trim_end().rsplit_once(' ').ok_or_else(malformed)?;

    let key = key.trim_end_matches(' ');
    if key.is_empty() {
        return Err(malformed());
    }

    let declared_length = length
        .parse()
        .map_err(|_| ProtocolError::InvalidDeclaredLength(length.to_string()))?;

    Ok(OpenBlock {
        key: key.to_string(),
        declared_length,
        buf: Vec::new(),
    })
}
