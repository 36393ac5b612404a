//! @ai:module:intent Reassemble server-sent event data lines from byte chunks
//! @ai:module:layer infrastructure
//! @ai:module:public_api SseLineBuffer, MAX_LINE_BYTES
//! @ai:module:stateless false

use crate::error::RequestError;

/// Upper bound on a single unterminated line.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// @ai:intent Buffers partial lines across chunk boundaries and yields `data:` payloads
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// @ai:intent Extract the payload of a `data:` field line
    /// @ai:example ("data: {\"a\":1}") -> Some("{\"a\":1}")
    /// @ai:example ("event: message") -> None
    /// @ai:effects pure
    fn data_payload(line: &str) -> Option<&str> {
        let value = line.strip_prefix("data:")?;
        Some(value.strip_prefix(' ').unwrap_or(value))
    }

    fn take_line(&mut self, end: usize) -> Option<String> {
        let raw: Vec<u8> = self.pending.drain(..=end).collect();
        let line = String::from_utf8_lossy(&raw);
        let line = line.trim_end_matches(['\n', '\r']);

        Self::data_payload(line).map(str::to_string)
    }

    /// @ai:intent Feed a chunk; return payloads of every completed data line
    /// @ai:edge_cases multi-byte characters split across chunks are reassembled
    /// @ai:effects state:write
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<String>, RequestError> {
        self.pending.extend_from_slice(chunk);

        let mut payloads = Vec::new();

        while let Some(end) = self.pending.iter().position(|b| *b == b'\n') {
            if let Some(payload) = self.take_line(end) {
                payloads.push(payload);
            }
        }

        if self.pending.len() > MAX_LINE_BYTES {
            return Err(RequestError::Decode(format!(
                "event line exceeds {} bytes",
                MAX_LINE_BYTES
            )));
        }

        Ok(payloads)
    }

    /// @ai:intent Flush a trailing line left without a newline at close
    /// @ai:effects state:write
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }

        let end = self.pending.len() - 1;
        self.pending.push(b'\n');
        self.take_line(end + 1)
    }
}
