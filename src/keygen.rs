//! Batch stream key generation
//!
//! Reads one identifier per line and writes
//! `identifier,publisherToken,viewerToken` for each.

use crate::auth::{Role, StreamKeyCodec};
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Format one output row, newline excluded. Identifiers are raw bytes.
pub fn key_row(codec: &StreamKeyCodec, identifier: &[u8]) -> Vec<u8> {
    let mut row = identifier.to_vec();
    row.push(b',');
    row.extend(codec.encode_bytes(identifier, Role::Publisher));
    row.push(b',');
    row.extend(codec.encode_bytes(identifier, Role::Viewer));
    row
}

/// Write a row per input line. Returns the number of rows written.
///
/// Lines are split on `\n` with one trailing `\r` dropped; a final line
/// without a newline still counts.
pub fn write_key_rows<R, W>(codec: &StreamKeyCodec, mut input: R, mut output: W) -> io::Result<usize>
where
    R: BufRead,
    W: Write,
{
    let mut rows = 0;
    let mut line = Vec::new();
    loop {
        line.clear();
        if input.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        let identifier = trim_line_ending(&line);
        output.write_all(&key_row(codec, identifier))?;
        output.write_all(b"\n")?;
        rows += 1;
    }
    output.flush()?;
    debug!(rows, "Generated stream keys");
    Ok(rows)
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
