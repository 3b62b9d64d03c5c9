//! Decoding of the game's encoded string buffers.
//!
//! Dialog text lives in foreign memory as a null-terminated byte buffer in
//! the client's rich-text encoding: plain UTF-8 runs interleaved with tagged
//! control payloads (colors, item links, icons). The core only needs the
//! plain text for rule matching, but the structured form is kept so chat
//! output can preserve payloads and prepend a plain prefix.
//!
//! Decoding never fails past its caller: malformed or truncated input yields
//! whatever decoded cleanly, down to an empty value.

use crate::ui::{ForeignMemory, RawPtr};

/// Opens a control payload: `0x02 <kind> <len> <data…> 0x03`.
const PAYLOAD_OPEN: u8 = 0x02;
/// Closes a control payload.
const PAYLOAD_CLOSE: u8 = 0x03;

/// Scanning a text pointer stops here even without a terminator. Garbage
/// pointers must not walk the whole address space.
const MAX_SCAN: u64 = 64 * 1024;

/// One segment of an encoded string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A run of plain text.
    Text(String),
    /// A non-text control payload, carried opaquely.
    Control { kind: u8, data: Vec<u8> },
}

/// A decoded rich-text value: an ordered sequence of payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichText {
    pub payloads: Vec<Payload>,
}

impl RichText {
    /// A rich-text value holding a single plain-text run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            payloads: vec![Payload::Text(text.into())],
        }
    }

    /// Decode an encoded byte buffer.
    ///
    /// Control payloads must be well formed (`0x02 kind len data… 0x03`);
    /// a malformed payload ends decoding at that point and everything decoded
    /// so far is returned. Invalid UTF-8 in a text run is replaced lossily.
    pub fn decode(bytes: &[u8]) -> Self {
        let mut payloads = Vec::new();
        let mut run_start = 0;
        let mut pos = 0;

        while pos < bytes.len() {
            if bytes[pos] != PAYLOAD_OPEN {
                pos += 1;
                continue;
            }

            flush_text_run(&mut payloads, &bytes[run_start..pos]);

            // kind byte, length byte, payload, close byte
            let Some(&kind) = bytes.get(pos + 1) else {
                return Self { payloads };
            };
            let Some(&len) = bytes.get(pos + 2) else {
                return Self { payloads };
            };
            let data_start = pos + 3;
            let data_end = data_start + len as usize;
            if bytes.get(data_end) != Some(&PAYLOAD_CLOSE) {
                return Self { payloads };
            }

            payloads.push(Payload::Control {
                kind,
                data: bytes[data_start..data_end].to_vec(),
            });
            pos = data_end + 1;
            run_start = pos;
        }

        flush_text_run(&mut payloads, &bytes[run_start..]);
        Self { payloads }
    }

    /// Flatten to plain text for matching: concatenate only the text runs,
    /// newlines become single spaces, leading/trailing whitespace is trimmed.
    pub fn flatten(&self) -> String {
        let mut out = String::new();
        for payload in &self.payloads {
            if let Payload::Text(text) = payload {
                out.push_str(text);
            }
        }
        out.replace('\n', " ").trim().to_string()
    }

    /// Prepend a plain-text run, keeping every existing payload.
    pub fn insert_prefix(&mut self, prefix: &str) {
        self.payloads.insert(0, Payload::Text(prefix.to_string()));
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

fn flush_text_run(payloads: &mut Vec<Payload>, run: &[u8]) {
    if !run.is_empty() {
        payloads.push(Payload::Text(
            String::from_utf8_lossy(run).into_owned(),
        ));
    }
}

/// Copy a null-terminated byte buffer out of foreign memory.
///
/// Scans forward until a `0x00` terminator, an unreadable byte, or the scan
/// cap, and returns the copied span. A null pointer yields an empty buffer.
pub fn read_terminated(mem: &dyn ForeignMemory, ptr: RawPtr) -> Vec<u8> {
    let mut bytes = Vec::new();
    if ptr.is_null() {
        return bytes;
    }
    let mut offset = 0;
    while offset < MAX_SCAN {
        match mem.read_u8(ptr.offset(offset)) {
            None | Some(0) => break,
            Some(byte) => bytes.push(byte),
        }
        offset += 1;
    }
    bytes
}
